//! Completion of partially typed filter text.

use chrono::{Timelike, Utc};
use domain_model_rs::{BoolOp, Clause, Domain, FieldDescriptor, FieldType, Operator, Value};
use strsim::levenshtein;

use super::text::{likify, strip_full_text};
use super::{needs_parentheses, DomainParser, REC_NAME, REC_NAME_SUFFIX};
use crate::error::ParseResult;

/// Largest edit distance at which a label is still suggested for a typo.
const MAX_SUGGESTION_DISTANCE: usize = 3;

pub(super) fn complete(parser: &DomainParser, text: &str) -> ParseResult<Vec<String>> {
    let domain = parser.parse(text)?;
    let closing = trailing_closers(text);
    let ending = ending_clause(&domain);
    let deep = ending
        .map(|(_, depth)| depth)
        .unwrap_or(0)
        .saturating_sub(closing);
    let render = |domain: &Domain| strip_closers(parser.string(domain), deep);

    let mut results = Vec::new();
    let rendered = render(&domain);
    if rendered.trim() != text.trim() {
        results.push(rendered);
    }

    let at_boundary = text.trim().is_empty() || text.ends_with(char::is_whitespace);
    if let (Some((clause, _)), false) = (ending, at_boundary) {
        let replacements = if is_free_text(clause) {
            label_suggestions(parser, clause)
        } else {
            field_suggestions(parser, clause)
        };
        results.extend(
            replacements
                .into_iter()
                .map(|replacement| render(&replace_ending_clause(&domain, replacement))),
        );
    }

    if at_boundary {
        for field in parser.fields().values() {
            let completed = append_ending_clause(&domain, empty_clause(field, None), deep);
            results.push(render(&completed));
        }
    }

    let mut unique: Vec<String> = Vec::with_capacity(results.len());
    for result in results {
        if !unique.contains(&result) {
            unique.push(result);
        }
    }
    Ok(unique)
}

/// Number of `)` among the trailing closers and whitespace of the text.
fn trailing_closers(text: &str) -> usize {
    text.chars()
        .rev()
        .take_while(|c| *c == ')' || c.is_whitespace())
        .filter(|c| *c == ')')
        .count()
}

/// Removes the closers of groups the user has not closed yet.
fn strip_closers(mut text: String, count: usize) -> String {
    for _ in 0..count {
        if text.ends_with(')') {
            text.pop();
        }
    }
    text
}

fn is_free_text(clause: &Clause) -> bool {
    clause.field == REC_NAME && clause.operator == Operator::Ilike
}

/// The last clause of the domain and the number of parenthesized groups
/// around it.
pub fn ending_clause(domain: &Domain) -> Option<(&Clause, usize)> {
    match domain {
        Domain::Leaf(clause) => Some((clause, 0)),
        Domain::Group(op, branches) => {
            let last = branches.last()?;
            let (clause, depth) = ending_clause(last)?;
            Some((clause, depth + usize::from(needs_parentheses(*op, last))))
        }
    }
}

/// Replaces the last clause of the domain.
pub fn replace_ending_clause(domain: &Domain, clause: Clause) -> Domain {
    match domain {
        Domain::Leaf(_) => Domain::Leaf(clause),
        Domain::Group(op, branches) => {
            let mut branches = branches.clone();
            match branches.pop() {
                Some(last) => branches.push(replace_ending_clause(&last, clause)),
                None => branches.push(Domain::Leaf(clause)),
            }
            Domain::Group(*op, branches)
        }
    }
}

/// Appends a clause inside the group `depth` parentheses deep along the
/// last branch.
pub fn append_ending_clause(domain: &Domain, clause: Clause, depth: usize) -> Domain {
    if depth > 0 {
        if let Domain::Group(op, branches) = domain {
            if let Some((last, rest)) = branches.split_last() {
                let child_depth = if needs_parentheses(*op, last) {
                    depth - 1
                } else {
                    depth
                };
                let mut branches = rest.to_vec();
                branches.push(append_ending_clause(last, clause, child_depth));
                return Domain::Group(*op, branches);
            }
        }
    }
    match domain {
        Domain::Group(BoolOp::And, branches) => {
            let mut branches = branches.clone();
            branches.push(Domain::Leaf(clause));
            Domain::and(branches)
        }
        other => Domain::and(vec![other.clone(), Domain::Leaf(clause)]),
    }
}

/// A clause on `field` with nothing typed after the operator.
fn empty_clause(field: &FieldDescriptor, operator: Option<Operator>) -> Clause {
    let operator = operator.unwrap_or_else(|| field.field_type.default_operator());
    let value = if operator.is_like() {
        Value::String(likify(""))
    } else if field.field_type == FieldType::MultiSelection {
        Value::List(Vec::new())
    } else {
        Value::Null
    };
    Clause::new(field.name.clone(), operator, value)
}

/// Labels starting with the free text being typed, or close to it.
fn label_suggestions(parser: &DomainParser, clause: &Clause) -> Vec<Clause> {
    let typed = match &clause.value {
        Value::String(pattern) => strip_full_text(pattern).unwrap_or(pattern).to_lowercase(),
        _ => return Vec::new(),
    };
    if typed.is_empty() {
        return Vec::new();
    }

    let fields = parser.fields().values();
    let mut matches: Vec<&FieldDescriptor> = fields
        .clone()
        .filter(|field| field.label.to_lowercase().starts_with(&typed))
        .collect();

    if matches.is_empty() {
        let mut close: Vec<(usize, &FieldDescriptor)> = fields
            .map(|field| (levenshtein(&typed, &field.label.to_lowercase()), field))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .collect();
        close.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.label.cmp(&b.1.label)));
        matches = close.into_iter().map(|(_, field)| field).collect();
    }

    matches
        .into_iter()
        .map(|field| empty_clause(field, None))
        .collect()
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty() || text == "%",
        Value::List(items) => items.is_empty(),
        _ => false,
    }
}

/// Operators offered while the value of a field is still empty.
fn operator_choices(field_type: FieldType) -> Vec<Operator> {
    if field_type.is_ordered() {
        vec![Operator::Ne, Operator::Lt, Operator::Gt, Operator::Le, Operator::Ge]
    } else if field_type.default_operator().is_like() {
        vec![Operator::NotIlike, Operator::Eq, Operator::Ne]
    } else if field_type == FieldType::MultiSelection {
        vec![Operator::NotIn, Operator::Eq, Operator::Ne]
    } else {
        vec![Operator::Ne]
    }
}

/// Operator and value suggestions for a clause on a known field.
fn field_suggestions(parser: &DomainParser, clause: &Clause) -> Vec<Clause> {
    let name = clause.field.strip_suffix(REC_NAME_SUFFIX).unwrap_or(&clause.field);
    let Some(field) = parser.fields().get(name) else {
        return Vec::new();
    };

    let mut suggestions = Vec::new();
    if is_empty_value(&clause.value) && clause.operator == field.field_type.default_operator() {
        suggestions.extend(
            operator_choices(field.field_type)
                .into_iter()
                .map(|operator| empty_clause(field, Some(operator))),
        );
    }
    suggestions.extend(complete_value(parser, field, clause));
    suggestions
}

/// Text typed so far for a selection-like value.
fn typed_label(field: &FieldDescriptor, value: &Value) -> String {
    let text = match value {
        Value::String(text) => field
            .selection_label(value)
            .unwrap_or(text)
            .trim_matches('%')
            .to_string(),
        Value::Null => String::new(),
        other => field.selection_label(other).unwrap_or_default().to_string(),
    };
    text.to_lowercase()
}

/// Candidate values for the clause being typed.
fn complete_value(parser: &DomainParser, field: &FieldDescriptor, clause: &Clause) -> Vec<Clause> {
    let with_value = |value: Value| Clause {
        value,
        ..clause.clone()
    };
    let now = parser.locale.to_local(Utc::now().naive_utc());
    let now = now.with_nanosecond(0).unwrap_or(now);

    match field.field_type {
        FieldType::Boolean => vec![with_value(Value::Boolean(true)), with_value(Value::Boolean(false))],
        FieldType::Selection => {
            let typed = typed_label(field, &clause.value);
            field
                .options()
                .iter()
                .filter(|option| option.label().to_lowercase().starts_with(&typed))
                .map(|option| with_value(option.key().clone()))
                .collect()
        }
        FieldType::MultiSelection => {
            let (head, last) = match &clause.value {
                Value::List(items) => match items.split_last() {
                    Some((last, head)) => (head.to_vec(), last.clone()),
                    None => (Vec::new(), Value::Null),
                },
                other => (Vec::new(), other.clone()),
            };
            let typed = typed_label(field, &last);
            field
                .options()
                .iter()
                .filter(|option| option.label().to_lowercase().starts_with(&typed))
                .map(|option| {
                    let mut items = head.clone();
                    items.push(option.key().clone());
                    with_value(Value::List(items))
                })
                .collect()
        }
        FieldType::Reference if clause.target.is_none() => {
            let typed = typed_label(field, &clause.value);
            field
                .options()
                .iter()
                .filter(|option| option.label().to_lowercase().starts_with(&typed))
                .filter_map(|option| match option.key() {
                    Value::String(model) => Some(
                        Clause::new(
                            format!("{}{}", field.name, REC_NAME_SUFFIX),
                            clause.operator,
                            likify(""),
                        )
                        .with_target(model.clone()),
                    ),
                    _ => None,
                })
                .collect()
        }
        FieldType::Date => vec![with_value(Value::Date(now.date()))],
        FieldType::DateTime => {
            let utc = Utc::now().naive_utc();
            vec![with_value(Value::DateTime(utc.with_nanosecond(0).unwrap_or(utc)))]
        }
        FieldType::Time => vec![with_value(Value::Time(now.time()))],
        _ => Vec::new(),
    }
}
