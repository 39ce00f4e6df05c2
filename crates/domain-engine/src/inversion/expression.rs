//! Boolean expression tree annotated with the variables it reads.

use std::collections::BTreeSet;

use domain_model_rs::{BoolOp, Clause, Context, Domain, Operator};
use tracing::trace;

use super::canonical::simplify;
use super::evaluator::eval_leaf;

/// Outcome of inverting a domain for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Inversion {
    /// Every value of the field is acceptable.
    True,
    /// No value of the field is acceptable.
    False,
    /// The part of the domain that still constrains the field.
    Residual(Domain),
}

impl Inversion {
    /// Returns the boolean outcome, `None` for a residual domain.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Inversion::True => Some(true),
            Inversion::False => Some(false),
            Inversion::Residual(_) => None,
        }
    }

    /// Encodes the outcome as a JSON boolean or a wire-format domain.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Inversion::True => serde_json::Value::Bool(true),
            Inversion::False => serde_json::Value::Bool(false),
            Inversion::Residual(domain) => domain.to_json(),
        }
    }
}

impl From<bool> for Inversion {
    fn from(value: bool) -> Self {
        if value {
            Inversion::True
        } else {
            Inversion::False
        }
    }
}

/// Node of an [`Expression`].
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Leaf(Clause),
    And(Vec<Expression>),
    Or(Vec<Expression>),
}

/// A domain as an expression tree.
///
/// Each node knows the base variables (first segment of every field path)
/// read below it.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    kind: Kind,
    variables: BTreeSet<String>,
}

/// What a single branch contributes to the inversion of its group.
enum Outcome {
    Resolved(bool),
    Residual(Domain),
    Dropped,
}

impl Expression {
    /// Builds the expression tree of a domain.
    pub fn parse(domain: &Domain) -> Self {
        match domain {
            Domain::Leaf(clause) => Self {
                variables: BTreeSet::from([clause.base().to_string()]),
                kind: Kind::Leaf(clause.clone()),
            },
            Domain::Group(op, branches) => {
                let children: Vec<Expression> = branches.iter().map(Expression::parse).collect();
                let variables = children
                    .iter()
                    .flat_map(|child| child.variables.iter().cloned())
                    .collect();
                let kind = match op {
                    BoolOp::And => Kind::And(children),
                    BoolOp::Or => Kind::Or(children),
                };
                Self { kind, variables }
            }
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Base variables read by this node.
    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    /// Converts the tree back to a domain.
    pub fn to_domain(&self) -> Domain {
        match &self.kind {
            Kind::Leaf(clause) => Domain::Leaf(clause.clone()),
            Kind::And(children) => Domain::and(children.iter().map(Expression::to_domain).collect()),
            Kind::Or(children) => Domain::or(children.iter().map(Expression::to_domain).collect()),
        }
    }

    /// Resolves every branch that does not depend on `symbol` against the
    /// context and returns what remains.
    ///
    /// A bare clause inverts like an AND with that single branch.
    pub fn inverse(&self, symbol: &str, context: &Context) -> Inversion {
        match &self.kind {
            Kind::Leaf(_) => invert_group(BoolOp::And, std::slice::from_ref(self), symbol, context),
            Kind::And(children) => invert_group(BoolOp::And, children, symbol, context),
            Kind::Or(children) => invert_group(BoolOp::Or, children, symbol, context),
        }
    }
}

fn invert_group(op: BoolOp, branches: &[Expression], symbol: &str, context: &Context) -> Inversion {
    // the outcome that decides the whole group on its own
    let absorbing = op == BoolOp::Or;

    if op == BoolOp::Or {
        let unknown = branches
            .iter()
            .flat_map(|branch| branch.variables.iter())
            .find(|variable| variable.as_str() != symbol && !context.contains_key(*variable));
        if let Some(variable) = unknown {
            trace!(symbol, variable = %variable, "OR depends on an unknown field");
            return Inversion::True;
        }
    }

    let mut residuals = Vec::new();
    for branch in branches {
        let outcome = match &branch.kind {
            Kind::Leaf(clause) => invert_leaf(clause, symbol, context),
            _ => match branch.inverse(symbol, context) {
                Inversion::True => Outcome::Resolved(true),
                Inversion::False => Outcome::Resolved(false),
                Inversion::Residual(domain) => Outcome::Residual(domain),
            },
        };
        match outcome {
            Outcome::Resolved(value) if value == absorbing => return Inversion::from(absorbing),
            Outcome::Resolved(_) | Outcome::Dropped => {}
            Outcome::Residual(domain) => residuals.push(domain),
        }
    }

    if residuals.is_empty() {
        Inversion::from(!absorbing)
    } else {
        Inversion::Residual(simplify(&Domain::Group(op, residuals)))
    }
}

fn invert_leaf(clause: &Clause, symbol: &str, context: &Context) -> Outcome {
    let base = clause.base();
    if base == symbol {
        let constrained = clause.field == symbol && clause.operator == Operator::Eq;
        if !constrained {
            return Outcome::Residual(Domain::Leaf(clause.clone()));
        }
        if !context.contains_key(symbol) {
            return Outcome::Dropped;
        }
    } else if !context.contains_key(base) {
        return Outcome::Dropped;
    }

    match eval_leaf(clause, context) {
        Some(value) => Outcome::Resolved(value),
        None => {
            trace!(field = %clause.field, operator = %clause.operator, "clause is unknown");
            Outcome::Resolved(true)
        }
    }
}
