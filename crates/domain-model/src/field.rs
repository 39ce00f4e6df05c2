//! Field metadata supplied by the model registry.
//!
//! A [`FieldDescriptor`] carries what the parser needs to know about one
//! searchable field: its label, its type and, depending on the type, its
//! selection options, relation sub-fields or numeric factor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Operator;
use crate::value::Value;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Char,
    Text,
    Integer,
    Float,
    Numeric,
    Date,
    DateTime,
    Time,
    TimeDelta,
    Selection,
    MultiSelection,
    Reference,
    Many2One,
    One2One,
    One2Many,
    Many2Many,
}

impl FieldType {
    /// Returns true for fields pointing at records of another model.
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            FieldType::Many2One | FieldType::One2One | FieldType::One2Many | FieldType::Many2Many
        )
    }

    /// Returns true for fields that accept a `low..high` range.
    pub fn accepts_range(&self) -> bool {
        matches!(
            self,
            FieldType::Integer
                | FieldType::Float
                | FieldType::Numeric
                | FieldType::Date
                | FieldType::DateTime
                | FieldType::Time
                | FieldType::TimeDelta
        )
    }

    /// Returns true for fields whose values have a meaningful order.
    pub fn is_ordered(&self) -> bool {
        self.accepts_range()
    }

    /// The operator used when the filter text names none.
    pub fn default_operator(&self) -> Operator {
        match self {
            FieldType::Char
            | FieldType::Text
            | FieldType::Many2One
            | FieldType::Many2Many
            | FieldType::One2Many
            | FieldType::One2One
            | FieldType::Reference => Operator::Ilike,
            FieldType::MultiSelection => Operator::In,
            _ => Operator::Eq,
        }
    }

    /// The operator used for a bare `!`.
    pub fn negated_default_operator(&self) -> Operator {
        self.default_operator().negate()
    }
}

/// One `(key, label)` entry of a selection field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOption(pub Value, pub String);

impl SelectionOption {
    /// Creates an option with a string key.
    pub fn new(key: impl Into<Value>, label: impl Into<String>) -> Self {
        Self(key.into(), label.into())
    }

    /// The stored key.
    pub fn key(&self) -> &Value {
        &self.0
    }

    /// The label shown to the user.
    pub fn label(&self) -> &str {
        &self.1
    }
}

fn default_searchable() -> bool {
    true
}

/// Metadata of a single field.
///
/// # Example
///
/// ```
/// use domain_model_rs::{FieldDescriptor, FieldType};
///
/// let state = FieldDescriptor::new("State", FieldType::Selection)
///     .with_selection(vec![("draft", "Draft"), ("done", "Done")]);
/// assert_eq!(state.selection_label(&"done".into()), Some("Done"));
/// assert_eq!(state.selection_key("draft"), Some(&"draft".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Dotted path of the field; filled in by the parser when indexing.
    #[serde(default)]
    pub name: String,

    /// Human-readable label, matched case-insensitively in filter text.
    #[serde(alias = "string")]
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Fields that are not searchable are never indexed.
    #[serde(default = "default_searchable")]
    pub searchable: bool,

    /// Sub-fields reachable through a relation, keyed by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_fields: Option<BTreeMap<String, FieldDescriptor>>,

    /// Options of selection, multiselection and reference fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Vec<SelectionOption>>,

    /// Display factor: stored values are shown multiplied by it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,

    /// Number of decimals shown for float and numeric fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digits: Option<u32>,

    /// strftime format of time fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FieldDescriptor {
    /// Creates a searchable field with the given label and type.
    pub fn new(label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: String::new(),
            label: label.into(),
            field_type,
            searchable: true,
            relation_fields: None,
            selection: None,
            factor: None,
            digits: None,
            format: None,
        }
    }

    /// Sets the selection options from `(key, label)` pairs.
    pub fn with_selection<K, L>(mut self, options: Vec<(K, L)>) -> Self
    where
        K: Into<Value>,
        L: Into<String>,
    {
        self.selection = Some(
            options
                .into_iter()
                .map(|(key, label)| SelectionOption::new(key, label))
                .collect(),
        );
        self
    }

    /// Sets the sub-fields of a relation.
    pub fn with_relation_fields(mut self, fields: BTreeMap<String, FieldDescriptor>) -> Self {
        self.relation_fields = Some(fields);
        self
    }

    /// Sets the display factor.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    /// Sets the number of displayed decimals.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = Some(digits);
        self
    }

    /// Sets the strftime format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Marks the field as not searchable.
    pub fn not_searchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    /// The display factor, 1 when unset or zero.
    pub fn factor(&self) -> f64 {
        match self.factor {
            Some(factor) if factor != 0.0 => factor,
            _ => 1.0,
        }
    }

    /// Selection options, empty for fields without any.
    pub fn options(&self) -> &[SelectionOption] {
        self.selection.as_deref().unwrap_or_default()
    }

    /// Finds the label of a selection key.
    pub fn selection_label(&self, key: &Value) -> Option<&str> {
        self.options()
            .iter()
            .find(|option| option.key() == key)
            .map(SelectionOption::label)
    }

    /// Finds the key of a selection label (case-insensitive).
    pub fn selection_key(&self, label: &str) -> Option<&Value> {
        let label_lower = label.to_lowercase();
        self.options()
            .iter()
            .find(|option| option.label().to_lowercase() == label_lower)
            .map(SelectionOption::key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_operators() {
        assert_eq!(FieldType::Char.default_operator(), Operator::Ilike);
        assert_eq!(FieldType::Many2One.default_operator(), Operator::Ilike);
        assert_eq!(FieldType::Reference.default_operator(), Operator::Ilike);
        assert_eq!(FieldType::MultiSelection.default_operator(), Operator::In);
        assert_eq!(FieldType::Integer.default_operator(), Operator::Eq);
        assert_eq!(FieldType::Selection.default_operator(), Operator::Eq);
    }

    #[test]
    fn test_negated_default_operators() {
        assert_eq!(
            FieldType::Text.negated_default_operator(),
            Operator::NotIlike
        );
        assert_eq!(
            FieldType::MultiSelection.negated_default_operator(),
            Operator::NotIn
        );
        assert_eq!(FieldType::Date.negated_default_operator(), Operator::Ne);
    }

    #[test]
    fn test_field_type_serde_names() {
        assert_eq!(
            serde_json::to_string(&FieldType::MultiSelection).unwrap(),
            "\"multiselection\""
        );
        assert_eq!(
            serde_json::from_str::<FieldType>("\"many2one\"").unwrap(),
            FieldType::Many2One
        );
        assert_eq!(
            serde_json::from_str::<FieldType>("\"datetime\"").unwrap(),
            FieldType::DateTime
        );
    }

    #[test]
    fn test_descriptor_deserialize_minimal() {
        let json = r#"{"string": "Amount", "type": "float", "factor": 100}"#;
        let field: FieldDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(field.label, "Amount");
        assert_eq!(field.field_type, FieldType::Float);
        assert!(field.searchable);
        assert_eq!(field.factor(), 100.0);
        assert!(field.name.is_empty());
    }

    #[test]
    fn test_descriptor_selection_from_json() {
        let json = r#"{
            "string": "State",
            "type": "selection",
            "selection": [["draft", "Draft"], [null, ""], [1, "One"]]
        }"#;
        let field: FieldDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(field.options().len(), 3);
        assert_eq!(field.selection_label(&Value::Null), Some(""));
        assert_eq!(field.selection_key("ONE"), Some(&Value::Integer(1)));
        assert_eq!(field.selection_key("missing"), None);
    }

    #[test]
    fn test_factor_defaults_to_one() {
        let field = FieldDescriptor::new("Qty", FieldType::Integer);
        assert_eq!(field.factor(), 1.0);
        assert_eq!(field.with_factor(0.0).factor(), 1.0);
    }
}
