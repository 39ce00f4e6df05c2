//! Domain inversion.
//!
//! Given a domain, one field (the symbol) and the known values of the other
//! fields, computes what the domain still requires of that field.
//!
//! # Rules
//!
//! ```text
//! clause on a known field        evaluated; unknown outcome counts as true
//! clause on an unknown field     dropped (AND), whole group true (OR)
//! `symbol = value`               evaluated if the symbol is known, else dropped
//! other clause on the symbol     kept as residual
//! ```
//!
//! An AND is false as soon as one branch is, an OR true as soon as one
//! branch is. What remains is returned as a residual domain.
//!
//! # Example
//!
//! ```
//! use domain_engine_rs::{domain_inversion, Inversion};
//! use domain_model_rs::{Context, Domain, Value};
//! use serde_json::json;
//!
//! let domain = Domain::from_json(&json!([["a", "=", 1], ["b", "=", 2]])).unwrap();
//!
//! let mut context = Context::new();
//! context.insert("b".to_string(), Value::from(2));
//! assert_eq!(domain_inversion(&domain, "a", &context), Inversion::True);
//!
//! context.insert("b".to_string(), Value::from(3));
//! assert_eq!(domain_inversion(&domain, "a", &context), Inversion::False);
//! ```

mod canonical;
mod evaluator;
mod expression;


use domain_model_rs::{Context, Domain};
use tracing::trace;

pub use canonical::{canonicalize, concat, localize_domain, merge, simplify, sort, unique_value};
pub use evaluator::{eval_domain, eval_leaf, sql_like};
pub use expression::{Expression, Inversion, Kind};

/// Computes what `domain` requires of `symbol` given the other fields'
/// values in `context`.
///
/// Returns [`Inversion::True`] when the domain does not read `symbol`.
pub fn domain_inversion(domain: &Domain, symbol: &str, context: &Context) -> Inversion {
    let expression = Expression::parse(domain);
    if !expression.variables().contains(symbol) {
        trace!(symbol, "domain does not read the field");
        return Inversion::True;
    }
    expression.inverse(symbol, context)
}
