//! Token passes between the tokenizer and clause typing.
//!
//! ```text
//! tokens ──merge_operators──▶ tokens ──parenthesize──▶ Nested
//!        ──group──▶ Grouped (clauses) ──operatorize(|, &)──▶ Grouped (boolean tree)
//! ```
//!
//! None of these passes fail: unbalanced parentheses are repaired, dangling
//! connectors are dropped and text that names no field stays free text.

use std::collections::BTreeMap;
use std::mem;

use domain_model_rs::BoolOp;
use tracing::{debug, trace};

use super::tokenizer::Token;

/// Comparison operators that may follow the `:` of a clause.
pub const OPERATORS: [&str; 7] = ["!=", "<=", ">=", "=", "!", "<", ">"];

/// Connector tokens for OR and explicit AND.
pub const OR_TOKEN: &str = "|";
pub const AND_TOKEN: &str = "&";

/// Tokens nested by parentheses.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested {
    Token(Token),
    Group(Vec<Nested>),
}

/// The value part of a clause, still as text.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Nothing was typed after the operator.
    Missing,
    Single(String),
    /// Values separated by `;`.
    List(Vec<String>),
}

/// A clause naming a field, before typing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClause {
    /// Dotted name of the field the label resolved to.
    pub name: String,
    pub operator: Option<String>,
    pub value: RawValue,
}

/// Output of the grouping passes.
#[derive(Debug, Clone, PartialEq)]
pub enum Grouped {
    /// Text that names no field.
    Free(Token),
    /// Free text after a `!`.
    NegatedFree(Token),
    Clause(RawClause),
    /// An unresolved `|` or `&`.
    Connector(BoolOp),
    /// A parenthesized sequence, implicitly ANDed.
    Group(Vec<Grouped>),
    /// Operands joined by `|` or `&`.
    Bool(BoolOp, Vec<Grouped>),
}

/// Merges `<` `=`, `>` `=` and `!` `=` token pairs into one operator.
pub fn merge_operators(tokens: Vec<Token>) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.is("=") {
            if let Some(previous) = merged.last_mut() {
                if previous.is("<") || previous.is(">") || previous.is("!") {
                    previous.text.push('=');
                    continue;
                }
            }
        }
        merged.push(token);
    }
    merged
}

/// Nests the tokens between `(` and `)`.
///
/// A `)` without opener is discarded and parsing continues at the current
/// level; groups still open at the end of input are closed implicitly.
pub fn parenthesize(tokens: Vec<Token>) -> Vec<Nested> {
    let mut current: Vec<Nested> = Vec::new();
    let mut parents: Vec<Vec<Nested>> = Vec::new();

    for token in tokens {
        if token.is("(") {
            parents.push(mem::take(&mut current));
        } else if token.is(")") {
            match parents.pop() {
                Some(mut parent) => {
                    parent.push(Nested::Group(mem::take(&mut current)));
                    current = parent;
                }
                None => debug!(position = token.position, "discarding unmatched ')'"),
            }
        } else {
            current.push(Nested::Token(token));
        }
    }

    if !parents.is_empty() {
        debug!(open = parents.len(), "closing unterminated '(' at end of input");
    }
    while let Some(mut parent) = parents.pop() {
        parent.push(Nested::Group(mem::take(&mut current)));
        current = parent;
    }
    current
}

/// Groups tokens into clauses.
///
/// `labels` maps lower-cased field labels to dotted field names. A label is
/// one or more tokens followed by `:`; when several labels end at the same
/// `:`, the longest wins.
pub fn group(nested: Vec<Nested>, labels: &BTreeMap<String, String>) -> Vec<Grouped> {
    let mut grouped = Vec::new();
    let mut parts: Vec<Token> = Vec::new();

    for item in nested {
        match item {
            Nested::Token(token) => parts.push(token),
            Nested::Group(inner) => {
                group_parts(&mem::take(&mut parts), labels, &mut grouped);
                grouped.push(Grouped::Group(group(inner, labels)));
            }
        }
    }
    group_parts(&parts, labels, &mut grouped);
    fold_negations(grouped)
}

/// Finds the field label ending right before `colon`.
fn find_label<'a>(
    parts: &[Token],
    colon: usize,
    labels: &'a BTreeMap<String, String>,
) -> Option<(usize, &'a String)> {
    (0..colon).find_map(|start| {
        let label = parts[start..colon]
            .iter()
            .map(|token| token.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        labels.get(&label).map(|name| (start, name))
    })
}

/// A clause whose value is not complete yet.
struct Pending {
    name: String,
    operator: Option<String>,
    list: Vec<String>,
}

impl Pending {
    fn finish(self, value: Option<String>) -> Grouped {
        let value = match (value, self.list.is_empty()) {
            (None, true) => RawValue::Missing,
            (Some(value), true) => RawValue::Single(value),
            (value, false) => {
                let mut list = self.list;
                list.extend(value);
                RawValue::List(list)
            }
        };
        Grouped::Clause(RawClause {
            name: self.name,
            operator: self.operator,
            value,
        })
    }
}

/// Emits free tokens; the first one completes a pending clause.
fn emit_free(tokens: &[Token], pending: &mut Option<Pending>, out: &mut Vec<Grouped>) {
    for token in tokens {
        let connector = connector(token);
        match (pending.take(), connector) {
            (Some(clause), None) => out.push(clause.finish(Some(token.text.clone()))),
            (Some(clause), Some(op)) => {
                out.push(clause.finish(None));
                out.push(Grouped::Connector(op));
            }
            (None, Some(op)) => out.push(Grouped::Connector(op)),
            (None, None) => out.push(Grouped::Free(token.clone())),
        }
    }
}

fn connector(token: &Token) -> Option<BoolOp> {
    if token.is(OR_TOKEN) {
        Some(BoolOp::Or)
    } else if token.is(AND_TOKEN) {
        Some(BoolOp::And)
    } else {
        None
    }
}

fn is_operator(token: &Token) -> bool {
    OPERATORS.iter().any(|op| token.is(op))
}

fn group_parts(parts: &[Token], labels: &BTreeMap<String, String>, out: &mut Vec<Grouped>) {
    let mut rest = parts;
    let mut pending: Option<Pending> = None;

    loop {
        let Some(colon) = rest.iter().position(|token| token.is(":")) else {
            emit_free(rest, &mut pending, out);
            break;
        };

        let Some((start, name)) = find_label(rest, colon, labels) else {
            trace!(position = rest[colon].position, "':' follows no known label");
            emit_free(&rest[..colon], &mut pending, out);
            rest = &rest[colon + 1..];
            continue;
        };

        emit_free(&rest[..start], &mut pending, out);
        if let Some(clause) = pending.take() {
            out.push(clause.finish(None));
        }

        let mut index = colon + 1;
        let operator = match rest.get(index) {
            Some(token) if is_operator(token) => {
                index += 1;
                Some(token.text.clone())
            }
            _ => None,
        };

        let mut list = Vec::new();
        while index + 1 < rest.len() && rest[index + 1].is(";") && !rest[index].is(";") {
            list.push(rest[index].text.clone());
            index += 2;
        }

        pending = Some(Pending {
            name: name.clone(),
            operator,
            list,
        });
        rest = &rest[index..];
    }

    if let Some(clause) = pending {
        out.push(clause.finish(None));
    }
}

/// Turns `!` followed by free text into negated free text.
fn fold_negations(items: Vec<Grouped>) -> Vec<Grouped> {
    let mut folded = Vec::with_capacity(items.len());
    let mut items = items.into_iter().peekable();
    while let Some(item) = items.next() {
        match item {
            Grouped::Free(bang) if bang.is("!") => match items.peek() {
                Some(Grouped::Free(_)) => {
                    if let Some(Grouped::Free(token)) = items.next() {
                        folded.push(Grouped::NegatedFree(token));
                    }
                }
                _ => folded.push(Grouped::Free(bang)),
            },
            other => folded.push(other),
        }
    }
    folded
}

/// Resolves `op` connectors into [`Grouped::Bool`] nodes.
///
/// Run once for OR, then once for AND, so OR binds tighter. Leading,
/// trailing and repeated connectors are dropped.
pub fn operatorize(items: Vec<Grouped>, op: BoolOp) -> Vec<Grouped> {
    let mut out: Vec<Grouped> = Vec::with_capacity(items.len());
    let mut joining = false;

    for item in items {
        let item = match item {
            Grouped::Group(inner) => Grouped::Group(operatorize(inner, op)),
            Grouped::Bool(other, inner) => Grouped::Bool(other, operatorize(inner, op)),
            other => other,
        };

        match item {
            Grouped::Connector(connector) if connector == op => {
                if out.is_empty() || matches!(out.last(), Some(Grouped::Connector(_))) {
                    trace!(?op, "dropping leading connector");
                } else {
                    joining = true;
                }
            }
            Grouped::Connector(other) => {
                if joining {
                    trace!(?op, "dropping connector followed by another connector");
                    joining = false;
                }
                out.push(Grouped::Connector(other));
            }
            operand => {
                if !joining {
                    out.push(operand);
                    continue;
                }
                joining = false;
                match out.pop() {
                    Some(Grouped::Bool(existing, mut branches)) if existing == op => {
                        branches.push(operand);
                        out.push(Grouped::Bool(op, branches));
                    }
                    Some(left) => out.push(Grouped::Bool(op, vec![left, operand])),
                    None => out.push(operand),
                }
            }
        }
    }

    if joining {
        trace!(?op, "dropping trailing connector");
    }
    out
}
