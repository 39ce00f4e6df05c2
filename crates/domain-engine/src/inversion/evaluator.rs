//! Evaluation of clauses against known field values.
//!
//! A clause evaluates to `Some(bool)` when the context holds what it needs
//! and to `None` ("unknown") otherwise. Callers decide what unknown means;
//! [`eval_domain`] treats it as a match.

use std::cmp::Ordering;

use domain_model_rs::{BoolOp, Clause, Context, Domain, Operator, Value};
use regex::RegexBuilder;
use tracing::{debug, trace};

/// Evaluates a single clause against the context.
///
/// # Example
///
/// ```
/// use domain_engine_rs::eval_leaf;
/// use domain_model_rs::{Clause, Context, Operator, Value};
///
/// let mut context = Context::new();
/// context.insert("amount".to_string(), Value::from(12));
///
/// assert_eq!(eval_leaf(&Clause::new("amount", Operator::Gt, 10), &context), Some(true));
/// assert_eq!(eval_leaf(&Clause::new("other", Operator::Gt, 10), &context), None);
/// ```
pub fn eval_leaf(clause: &Clause, context: &Context) -> Option<bool> {
    if clause.is_dotted() {
        return context.get(clause.base()).map(Value::is_truthy);
    }

    let current = context.get(&clause.field);
    let value = &clause.value;
    match clause.operator {
        Operator::Eq => Some(equals(current, value)),
        Operator::Ne => Some(!equals(current, value)),
        Operator::Lt => compare(current, value).map(Ordering::is_lt),
        Operator::Gt => compare(current, value).map(Ordering::is_gt),
        Operator::Le => compare(current, value).map(Ordering::is_le),
        Operator::Ge => compare(current, value).map(Ordering::is_ge),
        Operator::In => member(current, value),
        Operator::NotIn => member(current, value).map(|found| !found),
        Operator::Like => like(current, value, false),
        Operator::Ilike => like(current, value, true),
        Operator::NotLike => like(current, value, false).map(|found| !found),
        Operator::NotIlike => like(current, value, true).map(|found| !found),
        Operator::ChildOf
        | Operator::NotChildOf
        | Operator::ParentOf
        | Operator::NotParentOf => {
            trace!(field = %clause.field, operator = %clause.operator, "hierarchy not evaluated");
            Some(true)
        }
    }
}

/// Equality where a missing temporal side is the minimum of its type.
fn equals(current: Option<&Value>, value: &Value) -> bool {
    let current = current.cloned().unwrap_or(Value::Null);
    let (current, value) = match (&current, value) {
        (Value::Null, other) if other.is_temporal() => {
            (other.temporal_minimum().unwrap_or(Value::Null), other.clone())
        }
        (other, Value::Null) if other.is_temporal() => {
            (other.clone(), other.temporal_minimum().unwrap_or(Value::Null))
        }
        _ => (current.clone(), value.clone()),
    };
    match (&current, &value) {
        (Value::List(items), scalar) if !scalar.is_list() => {
            items.iter().any(|item| item.loose_eq(scalar))
        }
        _ => current.loose_eq(&value),
    }
}

fn compare(current: Option<&Value>, value: &Value) -> Option<Ordering> {
    let current = current.filter(|current| !current.is_null())?;
    if value.is_null() {
        return None;
    }
    current.loose_cmp(value)
}

fn member(current: Option<&Value>, value: &Value) -> Option<bool> {
    let items = match value {
        Value::List(items) => items.as_slice(),
        scalar => std::slice::from_ref(scalar),
    };
    match current {
        None | Some(Value::Null) => items.iter().any(Value::is_null).then_some(true),
        Some(Value::List(values)) => Some(
            values
                .iter()
                .any(|current| items.iter().any(|item| current.loose_eq(item))),
        ),
        Some(current) => Some(items.iter().any(|item| current.loose_eq(item))),
    }
}

fn like(current: Option<&Value>, pattern: &Value, ignore_case: bool) -> Option<bool> {
    match (current?, pattern) {
        (Value::String(text), Value::String(pattern)) => Some(sql_like(text, pattern, ignore_case)),
        _ => None,
    }
}

/// Matches a value against an SQL `like` pattern.
///
/// `%` matches any run of characters, `_` any single character and a
/// backslash makes the next character literal. The whole value must match.
///
/// ```
/// use domain_engine_rs::sql_like;
///
/// assert!(sql_like("abc", "a%c", false));
/// assert!(!sql_like("abcc", "a_c", false));
/// assert!(sql_like("ABC", "a%", true));
/// ```
pub fn sql_like(value: &str, pattern: &str, ignore_case: bool) -> bool {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => regex.push_str(&regex::escape(&escaped.to_string())),
                None => regex.push_str(&regex::escape("\\")),
            },
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');

    match RegexBuilder::new(&regex).case_insensitive(ignore_case).build() {
        Ok(compiled) => compiled.is_match(value),
        Err(e) => {
            debug!(pattern, error = %e, "like pattern does not compile");
            false
        }
    }
}

/// Evaluates a whole domain; unknown clauses count as matches.
pub fn eval_domain(domain: &Domain, context: &Context) -> bool {
    match domain {
        Domain::Leaf(clause) => eval_leaf(clause, context).unwrap_or(true),
        Domain::Group(BoolOp::And, branches) => {
            branches.iter().all(|branch| eval_domain(branch, context))
        }
        Domain::Group(BoolOp::Or, branches) => {
            branches.is_empty() || branches.iter().any(|branch| eval_domain(branch, context))
        }
    }
}
