//! The domain tree and its nested-array wire format.
//!
//! A domain is either a single [`Clause`] or a group of sub-domains joined by
//! a [`BoolOp`]. On the wire it is a JSON array:
//!
//! ```text
//! domain ::= clause | "[" ("\"OR\"" | "\"AND\"")? (domain ",")* "]"
//! clause ::= "[" field "," operator "," value ("," target_model)? "]"
//! ```
//!
//! An untagged array means AND.
//!
//! # Example
//!
//! ```
//! use domain_model_rs::Domain;
//! use serde_json::json;
//!
//! let domain = Domain::from_json(&json!(["OR", ["a", "=", 1], ["c", "=", 3]])).unwrap();
//! assert!(matches!(domain, Domain::Group(_, ref branches) if branches.len() == 2));
//! assert_eq!(domain.to_json(), json!(["OR", ["a", "=", 1], ["c", "=", 3]]));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelError, ModelResult};
use crate::value::Value;

/// Boolean operator joining the branches of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    /// The wire tag of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
    Like,
    NotLike,
    Ilike,
    NotIlike,
    ChildOf,
    NotChildOf,
    ParentOf,
    NotParentOf,
}

impl Operator {
    /// All operators, in wire order.
    pub const ALL: [Operator; 16] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Gt,
        Operator::Le,
        Operator::Ge,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::NotLike,
        Operator::Ilike,
        Operator::NotIlike,
        Operator::ChildOf,
        Operator::NotChildOf,
        Operator::ParentOf,
        Operator::NotParentOf,
    ];

    /// The wire spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::Ilike => "ilike",
            Operator::NotIlike => "not ilike",
            Operator::ChildOf => "child_of",
            Operator::NotChildOf => "not child_of",
            Operator::ParentOf => "parent_of",
            Operator::NotParentOf => "not parent_of",
        }
    }

    /// Returns the operator with the opposite meaning.
    pub fn negate(&self) -> Operator {
        match self {
            Operator::Eq => Operator::Ne,
            Operator::Ne => Operator::Eq,
            Operator::Lt => Operator::Ge,
            Operator::Gt => Operator::Le,
            Operator::Le => Operator::Gt,
            Operator::Ge => Operator::Lt,
            Operator::In => Operator::NotIn,
            Operator::NotIn => Operator::In,
            Operator::Like => Operator::NotLike,
            Operator::NotLike => Operator::Like,
            Operator::Ilike => Operator::NotIlike,
            Operator::NotIlike => Operator::Ilike,
            Operator::ChildOf => Operator::NotChildOf,
            Operator::NotChildOf => Operator::ChildOf,
            Operator::ParentOf => Operator::NotParentOf,
            Operator::NotParentOf => Operator::ParentOf,
        }
    }

    /// Returns true for the `like`/`ilike` family.
    pub fn is_like(&self) -> bool {
        matches!(
            self,
            Operator::Like | Operator::NotLike | Operator::Ilike | Operator::NotIlike
        )
    }

    /// Returns true for the hierarchical operators this engine cannot evaluate.
    pub fn is_hierarchical(&self) -> bool {
        matches!(
            self,
            Operator::ChildOf | Operator::NotChildOf | Operator::ParentOf | Operator::NotParentOf
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .copied()
            .ok_or_else(|| ModelError::unknown_operator(s))
    }
}

/// A single comparison `[field, operator, value, target_model?]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Field path, possibly dotted (`partner.name`).
    pub field: String,
    pub operator: Operator,
    pub value: Value,
    /// Target model of a reference-field comparison.
    pub target: Option<String>,
}

impl Clause {
    /// Creates a clause without target model.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            target: None,
        }
    }

    /// Sets the target model of a reference-field comparison.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// The first segment of the field path.
    pub fn base(&self) -> &str {
        base_name(&self.field)
    }

    /// Returns true if the field path traverses a relation.
    pub fn is_dotted(&self) -> bool {
        self.field.contains('.')
    }

    fn to_json(&self) -> serde_json::Value {
        let mut items = vec![
            serde_json::Value::String(self.field.clone()),
            serde_json::Value::String(self.operator.as_str().to_string()),
            self.value.to_json(),
        ];
        if let Some(target) = &self.target {
            items.push(serde_json::Value::String(target.clone()));
        }
        serde_json::Value::Array(items)
    }

    fn from_json(items: &[serde_json::Value]) -> ModelResult<Self> {
        if !(3..=4).contains(&items.len()) {
            return Err(ModelError::invalid_domain(format!(
                "a clause has 3 or 4 elements, got {}",
                items.len()
            )));
        }
        let field = items[0]
            .as_str()
            .ok_or_else(|| ModelError::invalid_domain("clause field must be a string"))?;
        let operator = items[1]
            .as_str()
            .ok_or_else(|| ModelError::invalid_domain("clause operator must be a string"))?
            .parse::<Operator>()?;
        let value = Value::from_json(&items[2])?;
        let target = match items.get(3) {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(target)) => Some(target.clone()),
            Some(_) => {
                return Err(ModelError::invalid_domain(
                    "clause target model must be a string",
                ))
            }
        };
        Ok(Self {
            field: field.to_string(),
            operator,
            value,
            target,
        })
    }
}

/// Returns the first dotted segment of a field path.
pub fn base_name(field: &str) -> &str {
    field.split('.').next().unwrap_or(field)
}

/// A boolean query tree over named fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    Leaf(Clause),
    Group(BoolOp, Vec<Domain>),
}

impl Default for Domain {
    fn default() -> Self {
        Domain::empty()
    }
}

impl Domain {
    /// The empty domain, which matches everything.
    pub fn empty() -> Self {
        Domain::Group(BoolOp::And, Vec::new())
    }

    /// Creates a leaf domain.
    pub fn leaf(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Domain::Leaf(Clause::new(field, operator, value))
    }

    /// Creates an AND group.
    pub fn and(branches: Vec<Domain>) -> Self {
        Domain::Group(BoolOp::And, branches)
    }

    /// Creates an OR group.
    pub fn or(branches: Vec<Domain>) -> Self {
        Domain::Group(BoolOp::Or, branches)
    }

    /// Returns true if this is a single clause.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Domain::Leaf(_))
    }

    /// Returns true for a group without branches.
    pub fn is_empty(&self) -> bool {
        matches!(self, Domain::Group(_, branches) if branches.is_empty())
    }

    /// Returns the clause if this is a leaf.
    pub fn as_clause(&self) -> Option<&Clause> {
        match self {
            Domain::Leaf(clause) => Some(clause),
            Domain::Group(_, _) => None,
        }
    }

    /// Returns the branches of a group, or a one-element slice for a leaf.
    pub fn branches(&self) -> &[Domain] {
        match self {
            Domain::Leaf(_) => std::slice::from_ref(self),
            Domain::Group(_, branches) => branches,
        }
    }

    /// Collects every clause in document order.
    pub fn clauses(&self) -> Vec<&Clause> {
        let mut clauses = Vec::new();
        self.collect_clauses(&mut clauses);
        clauses
    }

    fn collect_clauses<'a>(&'a self, clauses: &mut Vec<&'a Clause>) {
        match self {
            Domain::Leaf(clause) => clauses.push(clause),
            Domain::Group(_, branches) => {
                for branch in branches {
                    branch.collect_clauses(clauses);
                }
            }
        }
    }

    /// Encodes the domain into the nested-array wire format.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Domain::Leaf(clause) => clause.to_json(),
            Domain::Group(op, branches) => {
                let mut items = Vec::with_capacity(branches.len() + 1);
                if *op == BoolOp::Or {
                    items.push(serde_json::Value::String(op.as_str().to_string()));
                }
                items.extend(branches.iter().map(Domain::to_json));
                serde_json::Value::Array(items)
            }
        }
    }

    /// Decodes a domain from the nested-array wire format.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidDomain`] if the structure is neither a
    /// clause nor a list of domains, and [`ModelError::UnknownOperator`] if a
    /// clause uses an operator outside [`Operator::ALL`].
    pub fn from_json(json: &serde_json::Value) -> ModelResult<Self> {
        let items = json
            .as_array()
            .ok_or_else(|| ModelError::invalid_domain(format!("expected an array, got {}", json)))?;

        match items.first() {
            None => Ok(Domain::empty()),
            Some(serde_json::Value::String(tag)) if tag == "AND" || tag == "OR" => {
                let op = if tag == "OR" { BoolOp::Or } else { BoolOp::And };
                let branches = items[1..]
                    .iter()
                    .map(Domain::from_json)
                    .collect::<ModelResult<Vec<_>>>()?;
                Ok(Domain::Group(op, branches))
            }
            Some(serde_json::Value::String(_)) => Clause::from_json(items).map(Domain::Leaf),
            Some(_) => items
                .iter()
                .map(Domain::from_json)
                .collect::<ModelResult<Vec<_>>>()
                .map(Domain::and),
        }
    }
}

impl From<Clause> for Domain {
    fn from(clause: Clause) -> Self {
        Domain::Leaf(clause)
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Domain::from_json(&json).map_err(serde::de::Error::custom)
    }
}
