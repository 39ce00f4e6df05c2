//! Filter text parsing and domain inversion.
//!
//! This crate turns the text typed in a search box into a [`Domain`] and
//! back ([`DomainParser`]), suggests completions for partial input, and
//! works out what a domain requires of one field once the others are known
//! ([`domain_inversion`]).
//!
//! # Quick Start
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use domain_engine_rs::{domain_inversion, DomainParser, Inversion};
//! use domain_model_rs::{Context, FieldDescriptor, FieldType, Value};
//!
//! let mut fields = BTreeMap::new();
//! fields.insert("state".to_string(), FieldDescriptor::new("State", FieldType::Char));
//! fields.insert("amount".to_string(), FieldDescriptor::new("Amount", FieldType::Integer));
//! let parser = DomainParser::with_defaults(fields);
//!
//! let domain = parser.parse("amount: >10 state: =done").unwrap();
//!
//! let mut context = Context::new();
//! context.insert("state".to_string(), Value::from("draft"));
//! assert_eq!(domain_inversion(&domain, "amount", &context), Inversion::False);
//! ```
//!
//! [`Domain`]: domain_model_rs::Domain

pub mod config;
pub mod error;
pub mod inversion;
pub mod parser;

pub use config::ParserConfig;
pub use error::{ParseError, ParseResult};
pub use inversion::{
    canonicalize, concat, domain_inversion, eval_domain, eval_leaf, localize_domain, merge,
    simplify, sort, sql_like, unique_value, Expression, Inversion,
};
pub use parser::{DomainParser, Token, Tokenizer};
