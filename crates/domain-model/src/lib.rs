//! Data model of the domain expression engine.
//!
//! A *domain* is a nested boolean query over named fields. This crate holds
//! the types shared by the text parser and the inversion engine: the
//! [`Domain`] tree, clause [`Value`]s, [`FieldDescriptor`] metadata and the
//! JSON wire format used to exchange domains with the view layer and the
//! remote query executor.
//!
//! # Quick Start
//!
//! ```
//! use domain_model_rs::prelude::*;
//!
//! let domain = Domain::and(vec![
//!     Domain::leaf("name", Operator::Ilike, "%foo%"),
//!     Domain::leaf("amount", Operator::Gt, 10),
//! ]);
//! assert_eq!(
//!     domain.to_json(),
//!     serde_json::json!([["name", "ilike", "%foo%"], ["amount", ">", 10]])
//! );
//! ```

pub mod domain;
pub mod error;
pub mod field;
pub mod prelude;
pub mod value;

pub use domain::{base_name, BoolOp, Clause, Domain, Operator};
pub use error::{ModelError, ModelResult};
pub use field::{FieldDescriptor, FieldType, SelectionOption};
pub use value::{Context, Value};
