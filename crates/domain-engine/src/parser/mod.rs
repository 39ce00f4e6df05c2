//! Filter text parser.
//!
//! Converts the text users type in a search box into a [`Domain`] and back.
//!
//! # Syntax
//!
//! ```text
//! filter  ::= item*
//! item    ::= clause | text | "(" filter ")" | item "|" item | item "&" item
//! clause  ::= label ":" operator? values
//! values  ::= value (";" value)* ";"?
//! operator::= "=" | "!=" | "<" | ">" | "<=" | ">=" | "!"
//! ```
//!
//! - Juxtaposed items are ANDed; `|` binds tighter than juxtaposition and
//!   `&` sits between the two.
//! - Labels are matched case-insensitively; `Party.Name` reaches a field of
//!   a relation.
//! - Without operator the field's default applies (`ilike` for text and
//!   relations, `in` for multiselections, `=` otherwise); `!` negates it.
//! - Numeric and temporal fields accept `low..high` ranges.
//! - Text that names no field searches `rec_name`.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use domain_engine_rs::DomainParser;
//! use domain_model_rs::{FieldDescriptor, FieldType};
//! use serde_json::json;
//!
//! let mut fields = BTreeMap::new();
//! fields.insert("name".to_string(), FieldDescriptor::new("Name", FieldType::Char));
//! fields.insert("amount".to_string(), FieldDescriptor::new("Amount", FieldType::Float));
//! let parser = DomainParser::with_defaults(fields);
//!
//! let domain = parser.parse("name: foo amount: >10").unwrap();
//! assert_eq!(
//!     domain.to_json(),
//!     json!([["name", "ilike", "%foo%"], ["amount", ">", 10.0]])
//! );
//! assert_eq!(parser.string(&domain), "Name: foo Amount: >10");
//! ```

mod completion;
mod convert;
mod format;
mod grouping;
mod text;
mod tokenizer;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use domain_model_rs::{BoolOp, Clause, Domain, FieldDescriptor, FieldType, Operator, Value};
use tracing::debug;

use crate::config::ParserConfig;
use crate::error::ParseResult;
use crate::inversion::simplify;

pub use convert::{parse_timedelta, Locale};
pub use format::format_timedelta;
pub use text::{is_full_text, is_like, likify, quote, strip_full_text, unescape};
pub use tokenizer::{Token, Tokenizer};

use grouping::{Grouped, RawClause, RawValue};

/// Field searched by free text.
pub const REC_NAME: &str = "rec_name";

const REC_NAME_SUFFIX: &str = ".rec_name";

/// Parses filter text into domains, renders domains as filter text and
/// suggests completions.
///
/// The field index is built once and never changes, so a parser can be
/// shared between threads.
#[derive(Debug, Clone)]
pub struct DomainParser {
    /// Indexed fields by dotted name.
    fields: BTreeMap<String, FieldDescriptor>,
    /// Dotted field name by lower-cased label.
    labels: BTreeMap<String, String>,
    locale: Locale,
}

impl DomainParser {
    /// Creates a parser for the given top-level fields.
    ///
    /// Searchable fields other than `rec_name` are indexed by name and by
    /// label; relation sub-fields are indexed as `parent.child` with the
    /// label `Parent.Child`.
    pub fn new(fields: BTreeMap<String, FieldDescriptor>, config: ParserConfig) -> Self {
        let mut parser = Self {
            fields: BTreeMap::new(),
            labels: BTreeMap::new(),
            locale: Locale::new(config),
        };
        parser.index_fields(&fields, "", "");
        parser
    }

    /// Creates a parser with the default configuration.
    pub fn with_defaults(fields: BTreeMap<String, FieldDescriptor>) -> Self {
        Self::new(fields, ParserConfig::default())
    }

    fn index_fields(
        &mut self,
        fields: &BTreeMap<String, FieldDescriptor>,
        name_prefix: &str,
        label_prefix: &str,
    ) {
        for (name, field) in fields {
            if !field.searchable || name == REC_NAME {
                continue;
            }
            let full_name = format!("{}{}", name_prefix, name);
            let label = format!("{}{}", label_prefix, field.label);

            if let Some(relation_fields) = &field.relation_fields {
                self.index_fields(
                    relation_fields,
                    &format!("{}.", full_name),
                    &format!("{}.", label),
                );
            }

            let mut indexed = field.clone();
            indexed.name = full_name.clone();
            indexed.label = label.clone();
            indexed.relation_fields = None;
            self.labels.insert(label.to_lowercase(), full_name.clone());
            self.fields.insert(full_name, indexed);
        }
    }

    /// Indexed fields by dotted name.
    pub fn fields(&self) -> &BTreeMap<String, FieldDescriptor> {
        &self.fields
    }

    /// Looks up a field by its label, ignoring case.
    pub fn field_by_label(&self, label: &str) -> Option<&FieldDescriptor> {
        self.labels
            .get(&label.to_lowercase())
            .and_then(|name| self.fields.get(name))
    }

    pub fn config(&self) -> &ParserConfig {
        self.locale.config()
    }

    /// Parses filter text into a domain.
    ///
    /// Unknown labels and unconvertible values never fail: they become free
    /// text and null values. An unterminated quote is closed and the text
    /// parsed once more.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoEscapedCharacter`](crate::ParseError::NoEscapedCharacter) if the text ends with an
    /// escape character.
    pub fn parse(&self, text: &str) -> ParseResult<Domain> {
        match self.parse_once(text) {
            Err(e) if e.is_recoverable() => {
                debug!(text, error = %e, "closing unterminated quote and retrying");
                self.parse_once(&format!("{}\"", text))
            }
            result => result,
        }
    }

    fn parse_once(&self, text: &str) -> ParseResult<Domain> {
        let tokens = Tokenizer::tokenize(text)?;
        let tokens = grouping::merge_operators(tokens);
        let nested = grouping::parenthesize(tokens);
        let items = grouping::group(nested, &self.labels);
        let items = grouping::operatorize(items, BoolOp::Or);
        let items = grouping::operatorize(items, BoolOp::And);
        Ok(simplify(&Domain::and(self.build(items))))
    }

    fn build(&self, items: Vec<Grouped>) -> Vec<Domain> {
        items
            .into_iter()
            .filter_map(|item| self.build_item(item))
            .collect()
    }

    fn build_item(&self, item: Grouped) -> Option<Domain> {
        match item {
            Grouped::Free(token) => Some(Domain::leaf(
                REC_NAME,
                Operator::Ilike,
                likify(&token.text),
            )),
            Grouped::NegatedFree(token) => Some(Domain::leaf(
                REC_NAME,
                Operator::NotIlike,
                likify(&token.text),
            )),
            Grouped::Clause(raw) => Some(self.build_clause(raw)),
            Grouped::Group(inner) => Some(Domain::and(self.build(inner))),
            Grouped::Bool(op, inner) => Some(Domain::Group(op, self.build(inner))),
            Grouped::Connector(_) => None,
        }
    }

    /// Types a grouped clause against its field.
    fn build_clause(&self, raw: RawClause) -> Domain {
        let Some(field) = self.fields.get(&raw.name) else {
            return Domain::leaf(REC_NAME, Operator::Ilike, likify(&raw.name));
        };
        let field_type = field.field_type;
        let mut field_name = field.name.clone();
        let mut value = raw.value;

        let mut target = None;
        if field_type == FieldType::Reference {
            if let RawValue::Single(text) = &value {
                if let Some((model, rest)) = self.locale.split_target_value(field, text) {
                    target = Some(model);
                    value = RawValue::Single(rest);
                }
            }
        }

        let default = field_type.default_operator();
        let negated = matches!(raw.operator.as_deref(), Some("!") | Some("!="));
        // list values only pair with membership, or exact set matching on a
        // multiselection
        let listed = matches!(value, RawValue::List(_)) || field_type == FieldType::MultiSelection;
        let operator = match raw.operator.as_deref() {
            Some(symbol @ ("=" | "!=")) if field_type == FieldType::MultiSelection => {
                symbol.parse().unwrap_or(default)
            }
            _ if listed && negated => Operator::NotIn,
            symbol if listed => {
                if let Some(symbol @ ("<" | ">" | "<=" | ">=")) = symbol {
                    debug!(field = %field.name, symbol, "list value, comparing by membership");
                }
                Operator::In
            }
            None => default,
            Some("!") => field_type.negated_default_operator(),
            Some(symbol) => symbol.parse().unwrap_or(default),
        };

        if field_type.accepts_range() {
            if let RawValue::Single(text) = &value {
                if let Some((low, high)) = text.split_once("..") {
                    return self.build_range(field, low, high, negated);
                }
            }
        }

        let mut value = match value {
            RawValue::List(items) => {
                if field_type.is_relational() {
                    field_name.push_str(REC_NAME_SUFFIX);
                }
                Value::List(
                    items
                        .iter()
                        .map(|item| self.locale.convert(field, item))
                        .collect(),
                )
            }
            RawValue::Single(text) => self.locale.convert(field, &text),
            RawValue::Missing if operator.is_like() => Value::String(String::new()),
            RawValue::Missing if field_type == FieldType::MultiSelection => Value::List(Vec::new()),
            RawValue::Missing => Value::Null,
        };

        if field_type == FieldType::MultiSelection && !value.is_list() && !value.is_null() {
            value = Value::List(vec![value]);
        }
        if operator.is_like() {
            if let Value::String(text) = &value {
                value = Value::String(likify(text));
            }
        }

        let mut clause = Clause::new(field_name, operator, value);
        if let Some(model) = target {
            clause.field.push_str(REC_NAME_SUFFIX);
            clause.target = Some(model);
        }
        Domain::Leaf(clause)
    }

    /// Expands `low..high` into `>= low` and `<= high`; an empty bound is
    /// left out. A negated range becomes `< low` or `> high`.
    fn build_range(&self, field: &FieldDescriptor, low: &str, high: &str, negated: bool) -> Domain {
        let (op, below, above) = if negated {
            (BoolOp::Or, Operator::Lt, Operator::Gt)
        } else {
            (BoolOp::And, Operator::Ge, Operator::Le)
        };
        let mut bounds = Vec::with_capacity(2);
        if !low.trim().is_empty() {
            bounds.push(Domain::leaf(
                field.name.clone(),
                below,
                self.locale.convert(field, low),
            ));
        }
        if !high.trim().is_empty() {
            bounds.push(Domain::leaf(
                field.name.clone(),
                above,
                self.locale.convert(field, high),
            ));
        }
        simplify(&Domain::Group(op, bounds))
    }

    /// Renders a domain as filter text.
    ///
    /// `parse(string(d))` is equivalent to `d` for any `d` returned by
    /// [`parse`](Self::parse).
    pub fn string(&self, domain: &Domain) -> String {
        self.string_followed(domain, false)
    }

    /// Renders `domain`; `followed` tells whether juxtaposed text comes
    /// after it.
    fn string_followed(&self, domain: &Domain, followed: bool) -> String {
        match domain {
            Domain::Leaf(clause) => {
                let (text, open_ended) = self.string_clause(clause);
                // an open-ended clause would take the next word as its value
                if followed && open_ended {
                    format!("({})", text)
                } else {
                    text
                }
            }
            Domain::Group(op, branches) => {
                let separator = match op {
                    BoolOp::And => " ",
                    BoolOp::Or => " | ",
                };
                let last = branches.len().saturating_sub(1);
                branches
                    .iter()
                    .enumerate()
                    .map(|(index, branch)| {
                        if needs_parentheses(*op, branch) {
                            return format!("({})", self.string_followed(branch, false));
                        }
                        let branch_followed = match op {
                            BoolOp::And => index < last || followed,
                            BoolOp::Or => index == last && followed,
                        };
                        self.string_followed(branch, branch_followed)
                    })
                    .collect::<Vec<_>>()
                    .join(separator)
            }
        }
    }

    /// Renders a clause, telling whether text after it would be read as
    /// part of its value.
    fn string_clause(&self, clause: &Clause) -> (String, bool) {
        let name = clause
            .field
            .strip_suffix(REC_NAME_SUFFIX)
            .unwrap_or(&clause.field);

        let Some(field) = self.fields.get(name) else {
            return self.string_unknown(clause);
        };

        let mut operator = clause.operator;
        let mut value = clause.value.clone();
        if let (true, Value::String(pattern)) = (operator.is_like(), &clause.value) {
            if let Some(inner) = strip_full_text(pattern) {
                value = Value::String(inner.to_string());
            } else if !is_like(pattern) {
                operator = match operator {
                    Operator::Ilike | Operator::Like => Operator::Eq,
                    _ => Operator::Ne,
                };
                value = Value::String(unescape(pattern));
            }
        }

        let default = field.field_type.default_operator();
        let symbol = if operator == default || operator == Operator::In {
            ""
        } else if operator == field.field_type.negated_default_operator()
            || operator == Operator::NotIn
        {
            "!"
        } else {
            match operator {
                Operator::Ne => "!=",
                Operator::Lt => "<",
                Operator::Gt => ">",
                Operator::Le => "<=",
                Operator::Ge => ">=",
                // like operators without text form read as the default
                Operator::Like | Operator::Ilike => "",
                Operator::NotLike | Operator::NotIlike => "!",
                _ => "=",
            }
        };

        let formatted = match (&value, &clause.target) {
            (Value::String(text), Some(model)) => {
                let label = field
                    .selection_label(&Value::String(model.clone()))
                    .unwrap_or(model);
                quote(&format!("{},{}", label, text))
            }
            (Value::String(text), None) if text.is_empty() && operator.is_like() => String::new(),
            (Value::Null, _) => String::new(),
            (Value::List(_), _) => self.locale.format(field, &value),
            _ => quote(&self.locale.format(field, &value)),
        };

        // nothing typed yet, or a one-item list still waiting for items
        let open_ended = formatted.is_empty() || formatted.ends_with(';');
        (
            format!("{}: {}{}", quote(&field.label), symbol, formatted),
            open_ended,
        )
    }

    /// Renders a clause on a field this parser does not know.
    fn string_unknown(&self, clause: &Clause) -> (String, bool) {
        if clause.field == REC_NAME && clause.operator.is_like() {
            if let Value::String(pattern) = &clause.value {
                let text = strip_full_text(pattern).unwrap_or(pattern);
                let negation = match clause.operator {
                    Operator::NotIlike | Operator::NotLike => "!",
                    _ => "",
                };
                return (format!("{}{}", negation, quote(text)), false);
            }
        }
        let value = match &clause.value {
            Value::Null => String::new(),
            Value::List(_) => self.locale.format_plain(&clause.value),
            other => quote(&self.locale.format_plain(other)),
        };
        // comparison symbols read like the ones typed for known fields
        let operator = match clause.operator {
            Operator::Eq | Operator::Ne | Operator::Lt | Operator::Gt | Operator::Le | Operator::Ge => {
                clause.operator.as_str().to_string()
            }
            word if value.is_empty() => word.as_str().to_string(),
            word => format!("{} ", word.as_str()),
        };
        let open_ended = value.is_empty();
        (
            format!("{}: {}{}", quote(&clause.field), operator, value),
            open_ended,
        )
    }

    /// Returns true if [`string`](Self::string) can render every clause of
    /// the domain faithfully.
    ///
    /// Relation clauses must hold text (or nothing) and multiselection
    /// clauses a list.
    pub fn stringable(&self, domain: &Domain) -> bool {
        domain.clauses().iter().all(|clause| self.stringable_clause(clause))
    }

    fn stringable_clause(&self, clause: &Clause) -> bool {
        let name = clause
            .field
            .strip_suffix(REC_NAME_SUFFIX)
            .unwrap_or(&clause.field);
        let Some(field) = self.fields.get(name) else {
            return true;
        };
        let is_text = |value: &Value| matches!(value, Value::String(_) | Value::Null);
        if field.field_type.is_relational() {
            match &clause.value {
                Value::List(items) => items.iter().all(|item| matches!(item, Value::String(_))),
                other => is_text(other),
            }
        } else if field.field_type == FieldType::MultiSelection {
            clause.value.is_list()
        } else {
            true
        }
    }

    /// Suggests completions of partially typed filter text.
    ///
    /// # Errors
    ///
    /// Fails like [`parse`](Self::parse).
    pub fn completion(&self, text: &str) -> ParseResult<Vec<String>> {
        completion::complete(self, text)
    }
}

/// Returns true if `branch` must be parenthesized inside an `op` group.
///
/// OR groups inside an AND need none since `|` binds tighter than
/// juxtaposition.
pub(crate) fn needs_parentheses(op: BoolOp, branch: &Domain) -> bool {
    match branch {
        Domain::Leaf(_) => false,
        Domain::Group(BoolOp::Or, branches) if op == BoolOp::And => branches.is_empty(),
        Domain::Group(_, _) => true,
    }
}
