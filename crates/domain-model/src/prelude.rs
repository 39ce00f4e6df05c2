//! Prelude module for convenient imports.
//!
//! ```
//! use domain_model_rs::prelude::*;
//!
//! // Now you have access to:
//! // - Domain, Clause, Operator, BoolOp (domain tree)
//! // - Value, Context (values)
//! // - FieldDescriptor, FieldType, SelectionOption (field metadata)
//! // - ModelError, ModelResult (error handling)
//! ```

pub use crate::domain::{BoolOp, Clause, Domain, Operator};
pub use crate::error::{ModelError, ModelResult};
pub use crate::field::{FieldDescriptor, FieldType, SelectionOption};
pub use crate::value::{Context, Value};
