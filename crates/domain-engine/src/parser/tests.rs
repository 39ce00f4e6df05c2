//! Tests for filter text parsing, rendering and completion.

use super::*;
use crate::error::ParseError;
use chrono::{NaiveDate, TimeDelta};
use serde_json::json;

// ==================== Test Helpers ====================

fn field(label: &str, field_type: FieldType) -> FieldDescriptor {
    FieldDescriptor::new(label, field_type)
}

fn fields() -> BTreeMap<String, FieldDescriptor> {
    let party_fields = BTreeMap::from([
        ("name".to_string(), field("Name", FieldType::Char)),
        ("code".to_string(), field("Code", FieldType::Char)),
    ]);
    BTreeMap::from([
        ("name".to_string(), field("Name", FieldType::Char)),
        ("amount".to_string(), field("Amount", FieldType::Float)),
        ("quantity".to_string(), field("Quantity", FieldType::Integer)),
        ("price".to_string(), field("Price", FieldType::Float).with_digits(1)),
        ("opens".to_string(), field("Opens", FieldType::Time).with_format("%H:%M")),
        ("active".to_string(), field("Active", FieldType::Boolean)),
        (
            "state".to_string(),
            field("State", FieldType::Selection)
                .with_selection(vec![("draft", "Draft"), ("done", "Done")]),
        ),
        (
            "tags".to_string(),
            field("Tags", FieldType::MultiSelection)
                .with_selection(vec![("a", "Alpha"), ("b", "Beta")]),
        ),
        ("date".to_string(), field("Date", FieldType::Date)),
        ("created".to_string(), field("Created", FieldType::DateTime)),
        ("duration".to_string(), field("Duration", FieldType::TimeDelta)),
        (
            "party".to_string(),
            field("Party", FieldType::Many2One).with_relation_fields(party_fields),
        ),
        (
            "origin".to_string(),
            field("Origin", FieldType::Reference)
                .with_selection(vec![("sale.sale", "Sale"), ("purchase.purchase", "Purchase")]),
        ),
        ("order".to_string(), field("Sale Order", FieldType::Char)),
        ("secret".to_string(), field("Secret", FieldType::Char).not_searchable()),
        ("rec_name".to_string(), field("Record Name", FieldType::Char)),
    ])
}

fn parser() -> DomainParser {
    DomainParser::with_defaults(fields())
}

fn parse(text: &str) -> serde_json::Value {
    parser().parse(text).unwrap().to_json()
}

fn roundtrip(text: &str) -> String {
    let parser = parser();
    parser.string(&parser.parse(text).unwrap())
}

// ==================== Field Index ====================

#[test]
fn test_index_fields() {
    let parser = parser();
    assert!(parser.fields().contains_key("party.name"));
    assert!(parser.fields().contains_key("party.code"));
    assert!(!parser.fields().contains_key("secret"));
    assert!(!parser.fields().contains_key("rec_name"));
    assert_eq!(parser.fields()["party.name"].label, "Party.Name");
}

#[test]
fn test_field_by_label_ignores_case() {
    let parser = parser();
    assert_eq!(parser.field_by_label("PARTY.NAME").unwrap().name, "party.name");
    assert_eq!(parser.field_by_label("sale order").unwrap().name, "order");
    assert!(parser.field_by_label("Secret").is_none());
}

// ==================== Clauses ====================

#[test]
fn test_parse_label_and_default_operators() {
    let mut fields = BTreeMap::new();
    fields.insert("name".to_string(), field("Name", FieldType::Char));
    fields.insert("amount".to_string(), field("Amount", FieldType::Float));
    let parser = DomainParser::with_defaults(fields);

    let domain = parser.parse("name: foo amount: >10").unwrap();
    assert_eq!(
        domain.to_json(),
        json!([["name", "ilike", "%foo%"], ["amount", ">", 10.0]])
    );
    assert_eq!(parser.string(&domain), "Name: foo Amount: >10");
}

#[test]
fn test_parse_multi_word_label() {
    assert_eq!(parse("Sale Order: SO1"), json!(["order", "ilike", "%SO1%"]));
    assert_eq!(
        parse("foo sale order: SO1"),
        json!([["rec_name", "ilike", "%foo%"], ["order", "ilike", "%SO1%"]])
    );
}

#[test]
fn test_parse_dotted_label() {
    assert_eq!(parse("Party.Name: acme"), json!(["party.name", "ilike", "%acme%"]));
}

#[test]
fn test_parse_quoted_value() {
    assert_eq!(parse(r#"Name: "John Doe""#), json!(["name", "ilike", "%John Doe%"]));
}

#[test]
fn test_parse_explicit_operators() {
    assert_eq!(parse("Name: =foo"), json!(["name", "=", "foo"]));
    assert_eq!(parse("Name: !=foo"), json!(["name", "!=", "foo"]));
    assert_eq!(parse("Amount: <= 5"), json!(["amount", "<=", 5.0]));
    assert_eq!(parse("Amount: >=5"), json!(["amount", ">=", 5.0]));
}

#[test]
fn test_parse_negation() {
    assert_eq!(parse("Name: !foo"), json!(["name", "not ilike", "%foo%"]));
    assert_eq!(parse("Amount: !5"), json!(["amount", "!=", 5.0]));
    assert_eq!(parse("Tags: !Alpha"), json!(["tags", "not in", ["a"]]));
}

#[test]
fn test_parse_like_pattern_kept() {
    assert_eq!(parse("Name: foo%"), json!(["name", "ilike", "foo%"]));
    assert_eq!(parse(r#"Name: "50\%""#), json!(["name", "ilike", r"%50\%%"]));
    assert_eq!(parse(r"Name: 50\%"), json!(["name", "ilike", "50%"]));
}

#[test]
fn test_parse_missing_value() {
    assert_eq!(parse("Name:"), json!(["name", "ilike", "%"]));
    assert_eq!(parse("Name: ="), json!(["name", "=", null]));
    assert_eq!(parse("Amount:"), json!(["amount", "=", null]));
    assert_eq!(parse("Tags:"), json!(["tags", "in", []]));
}

#[test]
fn test_parse_value_list() {
    assert_eq!(parse("Amount: 5;6"), json!(["amount", "in", [5.0, 6.0]]));
    assert_eq!(parse("Amount: !5;6"), json!(["amount", "not in", [5.0, 6.0]]));
    assert_eq!(parse("State: Draft;Done"), json!(["state", "in", ["draft", "done"]]));
}

#[test]
fn test_parse_ranges() {
    assert_eq!(
        parse("Amount: 5..10"),
        json!([["amount", ">=", 5.0], ["amount", "<=", 10.0]])
    );
    assert_eq!(parse("Amount: 5.."), json!(["amount", ">=", 5.0]));
    assert_eq!(parse("Quantity: ..10"), json!(["quantity", "<=", 10]));
    assert_eq!(
        parse("Date: 2024-01-01..2024-12-31"),
        json!([
            ["date", ">=", {"__class__": "date", "year": 2024, "month": 1, "day": 1}],
            ["date", "<=", {"__class__": "date", "year": 2024, "month": 12, "day": 31}]
        ])
    );
}

#[test]
fn test_parse_negated_range() {
    assert_eq!(
        parse("Amount: !5..10"),
        json!(["OR", ["amount", "<", 5.0], ["amount", ">", 10.0]])
    );
    assert_eq!(parse("Amount: !..10"), json!(["amount", ">", 10.0]));
}

#[test]
fn test_parse_list_with_comparison() {
    assert_eq!(parse("Amount: >5;6"), json!(["amount", "in", [5.0, 6.0]]));
    assert_eq!(parse("Amount: <=5;6"), json!(["amount", "in", [5.0, 6.0]]));
    assert_eq!(parse("Amount: =5;6"), json!(["amount", "in", [5.0, 6.0]]));
    assert_eq!(parse("Amount: !=5;6"), json!(["amount", "not in", [5.0, 6.0]]));
    assert_eq!(parse("Tags: >Alpha"), json!(["tags", "in", ["a"]]));
}

#[test]
fn test_list_values_only_pair_with_membership() {
    let parser = parser();
    for text in ["Amount: >5;6", "Amount: <5;6", "Quantity: >=1;2", "Tags: <Alpha;Beta", "Name: >a;b"] {
        for clause in parser.parse(text).unwrap().clauses() {
            if clause.value.is_list() {
                assert!(
                    matches!(
                        clause.operator,
                        Operator::In | Operator::NotIn | Operator::Eq | Operator::Ne
                    ),
                    "text {:?} gave {:?}",
                    text,
                    clause.operator
                );
            }
        }
    }
}

#[test]
fn test_parse_boolean() {
    assert_eq!(parse("Active: yes"), json!(["active", "=", true]));
    assert_eq!(parse("Active: T"), json!(["active", "=", true]));
    assert_eq!(parse("Active: no"), json!(["active", "=", false]));
}

#[test]
fn test_parse_selection_label() {
    assert_eq!(parse("State: done"), json!(["state", "=", "done"]));
    assert_eq!(parse("State: Draft"), json!(["state", "=", "draft"]));
    assert_eq!(parse("State: unknown"), json!(["state", "=", "unknown"]));
}

#[test]
fn test_parse_multiselection() {
    assert_eq!(parse("Tags: Alpha"), json!(["tags", "in", ["a"]]));
    assert_eq!(parse("Tags: Alpha;Beta"), json!(["tags", "in", ["a", "b"]]));
    assert_eq!(parse("Tags: =Alpha;Beta"), json!(["tags", "=", ["a", "b"]]));
}

#[test]
fn test_parse_relational_list_uses_rec_name() {
    assert_eq!(parse("Party: acme"), json!(["party", "ilike", "%acme%"]));
    assert_eq!(parse("Party: a;b"), json!(["party.rec_name", "in", ["a", "b"]]));
}

#[test]
fn test_parse_reference_target() {
    assert_eq!(
        parse("Origin: Sale,SO1"),
        json!(["origin.rec_name", "ilike", "%SO1%", "sale.sale"])
    );
    assert_eq!(parse("Origin: SO1"), json!(["origin", "ilike", "%SO1%"]));
}

#[test]
fn test_parse_temporal_values() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    assert_eq!(
        parser().parse("Date: 2024-03-15").unwrap(),
        Domain::leaf("date", Operator::Eq, date)
    );
    assert_eq!(
        parser().parse("Duration: 1d 2h").unwrap(),
        Domain::and(vec![
            Domain::leaf("duration", Operator::Eq, TimeDelta::days(1)),
            Domain::leaf(REC_NAME, Operator::Ilike, "%2h%"),
        ])
    );
    assert_eq!(
        parser().parse(r#"Duration: "1d 2h""#).unwrap(),
        Domain::leaf("duration", Operator::Eq, TimeDelta::hours(26))
    );
}

#[test]
fn test_parse_datetime_in_timezone() {
    let config = ParserConfig {
        timezone: Some("Europe/Brussels".to_string()),
        ..ParserConfig::default()
    };
    let parser = DomainParser::new(fields(), config);
    let text = r#"Created: "2024-01-15 10:30:00""#;
    let domain = parser.parse(text).unwrap();
    let utc = NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    assert_eq!(domain, Domain::leaf("created", Operator::Eq, utc));
    assert_eq!(parser.string(&domain), text);
}

#[test]
fn test_parse_locale_numbers() {
    let config = ParserConfig::from_toml_str("decimal_point = \",\"\nthousands_sep = \".\"").unwrap();
    let parser = DomainParser::new(fields(), config);
    let domain = parser.parse("Amount: 1.234,5").unwrap();
    assert_eq!(domain, Domain::leaf("amount", Operator::Eq, 1234.5));
    assert_eq!(parser.string(&domain), "Amount: 1.234,5");
}

#[test]
fn test_parse_invalid_value_is_null() {
    assert_eq!(parse("Amount: abc"), json!(["amount", "=", null]));
    assert_eq!(parse("Date: someday"), json!(["date", "=", null]));
}

// ==================== Free Text ====================

#[test]
fn test_parse_free_text() {
    assert_eq!(parse("foo"), json!(["rec_name", "ilike", "%foo%"]));
    assert_eq!(
        parse("foo bar"),
        json!([["rec_name", "ilike", "%foo%"], ["rec_name", "ilike", "%bar%"]])
    );
    assert_eq!(parse(r#""name: x""#), json!(["rec_name", "ilike", "%name: x%"]));
}

#[test]
fn test_parse_negated_free_text() {
    assert_eq!(parse("!foo"), json!(["rec_name", "not ilike", "%foo%"]));
}

#[test]
fn test_parse_unknown_label_is_free_text() {
    assert_eq!(
        parse("foo: bar"),
        json!([["rec_name", "ilike", "%foo%"], ["rec_name", "ilike", "%bar%"]])
    );
    assert_eq!(
        parse("Secret: x"),
        json!([["rec_name", "ilike", "%Secret%"], ["rec_name", "ilike", "%x%"]])
    );
}

#[test]
fn test_parse_empty() {
    assert_eq!(parser().parse("").unwrap(), Domain::empty());
    assert_eq!(parser().parse("   ").unwrap(), Domain::empty());
}

// ==================== Boolean Operators ====================

#[test]
fn test_parse_or() {
    assert_eq!(
        parse("foo | bar"),
        json!(["OR", ["rec_name", "ilike", "%foo%"], ["rec_name", "ilike", "%bar%"]])
    );
    assert_eq!(
        parse("Name: a | Amount: 5"),
        json!(["OR", ["name", "ilike", "%a%"], ["amount", "=", 5.0]])
    );
}

#[test]
fn test_or_binds_tighter_than_juxtaposition() {
    assert_eq!(
        parse("a | b c"),
        json!([
            ["OR", ["rec_name", "ilike", "%a%"], ["rec_name", "ilike", "%b%"]],
            ["rec_name", "ilike", "%c%"]
        ])
    );
}

#[test]
fn test_explicit_and() {
    let expected = json!([
        ["OR", ["rec_name", "ilike", "%a%"], ["rec_name", "ilike", "%b%"]],
        ["rec_name", "ilike", "%c%"]
    ]);
    assert_eq!(parse("a | b & c"), expected);
    assert_eq!(
        parse("a & b | c"),
        json!([
            ["rec_name", "ilike", "%a%"],
            ["OR", ["rec_name", "ilike", "%b%"], ["rec_name", "ilike", "%c%"]]
        ])
    );
}

#[test]
fn test_dangling_connectors_dropped() {
    assert_eq!(parse("| a |"), json!(["rec_name", "ilike", "%a%"]));
    assert_eq!(
        parse("a | | b"),
        json!(["OR", ["rec_name", "ilike", "%a%"], ["rec_name", "ilike", "%b%"]])
    );
}

#[test]
fn test_quoted_connector_is_text() {
    assert_eq!(parse(r#""|""#), json!(["rec_name", "ilike", "%|%"]));
}

// ==================== Parentheses ====================

#[test]
fn test_parentheses_group() {
    assert_eq!(
        parse("(a b) | c"),
        json!([
            "OR",
            [["rec_name", "ilike", "%a%"], ["rec_name", "ilike", "%b%"]],
            ["rec_name", "ilike", "%c%"]
        ])
    );
    assert_eq!(
        parse("(a | b) c"),
        json!([
            ["OR", ["rec_name", "ilike", "%a%"], ["rec_name", "ilike", "%b%"]],
            ["rec_name", "ilike", "%c%"]
        ])
    );
}

#[test]
fn test_unbalanced_parentheses() {
    let expected = json!([["rec_name", "ilike", "%a%"], ["rec_name", "ilike", "%b%"]]);
    assert_eq!(parse("a) b"), expected);
    assert_eq!(parse("(a b"), expected);
    assert_eq!(parse("((a) b"), expected);
    assert_eq!(parser().parse("()").unwrap(), Domain::empty());
}

#[test]
fn test_clause_inside_parentheses() {
    assert_eq!(
        parse("(Name: a | Name: b) Amount: 1"),
        json!([
            ["OR", ["name", "ilike", "%a%"], ["name", "ilike", "%b%"]],
            ["amount", "=", 1.0]
        ])
    );
}

// ==================== Errors ====================

#[test]
fn test_unterminated_quote_is_closed() {
    assert_eq!(parse(r#"Name: "foo"#), json!(["name", "ilike", "%foo%"]));
    assert_eq!(parse(r#"Name: "John Doe"#), json!(["name", "ilike", "%John Doe%"]));
}

#[test]
fn test_trailing_escape_fails() {
    let result = parser().parse(r"foo\");
    assert!(matches!(result, Err(ParseError::NoEscapedCharacter { .. })));
}

// ==================== Rendering ====================

#[test]
fn test_string_elides_default_operator() {
    assert_eq!(roundtrip("Name: foo"), "Name: foo");
    assert_eq!(roundtrip("Amount: 5"), "Amount: 5");
    assert_eq!(roundtrip("Tags: Alpha;Beta"), "Tags: Alpha;Beta");
}

#[test]
fn test_string_operators() {
    assert_eq!(roundtrip("Name: !foo"), "Name: !foo");
    assert_eq!(roundtrip("Name: =foo"), "Name: =foo");
    assert_eq!(roundtrip("Name: !=foo"), "Name: !=foo");
    assert_eq!(roundtrip("Amount: !5"), "Amount: !5");
    assert_eq!(roundtrip("Amount: 5..10"), "Amount: >=5 Amount: <=10");
    assert_eq!(roundtrip("Amount: !5;6"), "Amount: !5;6");
}

#[test]
fn test_string_values() {
    assert_eq!(roundtrip(r#"Name: "John Doe""#), r#"Name: "John Doe""#);
    assert_eq!(roundtrip("Active: yes"), "Active: True");
    assert_eq!(roundtrip("State: done"), "State: Done");
    assert_eq!(roundtrip("Tags: Alpha"), "Tags: Alpha;");
    assert_eq!(roundtrip("Duration: 1w"), "Duration: 1w");
    assert_eq!(roundtrip("Origin: Sale,SO1"), "Origin: Sale,SO1");
    assert_eq!(roundtrip("Party: a;b"), "Party: a;b");
    assert_eq!(roundtrip("Name:"), "Name: ");
    assert_eq!(roundtrip("Name: ="), "Name: =");
}

#[test]
fn test_string_free_text() {
    assert_eq!(roundtrip("foo"), "foo");
    assert_eq!(roundtrip("!foo"), "!foo");
    assert_eq!(roundtrip(r#""a b""#), r#""a b""#);
}

#[test]
fn test_string_groups() {
    assert_eq!(roundtrip("a | b c"), "a | b c");
    assert_eq!(roundtrip("(a b) | c"), "(a b) | c");
    assert_eq!(roundtrip("a & (b | c)"), "a b | c");
}

#[test]
fn test_string_wraps_clause_without_value() {
    assert_eq!(
        parse("Amount: (5)"),
        json!([["amount", "=", null], ["rec_name", "ilike", "%5%"]])
    );
    assert_eq!(roundtrip("Amount: (5)"), "(Amount: ) 5");
    assert_eq!(roundtrip("(x | Name: =) y"), "x | (Name: =) y");
    assert_eq!(roundtrip("Name: = | y"), "Name: = | y");
    assert_eq!(roundtrip("Tags: Alpha foo"), "(Tags: Alpha;) foo");
    assert_eq!(
        parse("(Tags: Alpha;) foo"),
        json!([["tags", "in", ["a"]], ["rec_name", "ilike", "%foo%"]])
    );
}

#[test]
fn test_string_non_like_ilike_is_equality() {
    let domain = Domain::leaf("name", Operator::Ilike, "foo");
    assert_eq!(parser().string(&domain), "Name: =foo");
    let domain = Domain::leaf("name", Operator::NotIlike, r"50\%");
    assert_eq!(parser().string(&domain), r"Name: !=50%");
}

#[test]
fn test_string_unknown_field() {
    let parser = parser();
    assert_eq!(parser.string(&Domain::leaf("unknown", Operator::Eq, 5)), "unknown: =5");
    assert_eq!(
        parser.string(&Domain::leaf("unknown", Operator::Ilike, "%x%")),
        "unknown: ilike %x%"
    );
    assert_eq!(
        parser.string(&Domain::leaf("unknown", Operator::NotIn, vec![1, 2])),
        "unknown: not in 1;2"
    );
    assert_eq!(
        parser.string(&Domain::leaf("unknown", Operator::In, Value::Null)),
        "unknown: in"
    );
    assert_eq!(parser.string(&Domain::empty()), "");
}

#[test]
fn test_string_keeps_precision_beyond_digits() {
    let parser = parser();
    let domain = parser.parse("Price: 1.25").unwrap();
    assert_eq!(domain.to_json(), json!(["price", "=", 1.25]));
    assert_eq!(parser.string(&domain), "Price: 1.25");
    assert_eq!(parser.string(&parser.parse("Price: 1.5").unwrap()), "Price: 1.5");
    assert_eq!(parser.string(&parser.parse("Price: 2").unwrap()), "Price: 2.0");
}

#[test]
fn test_string_keeps_seconds_dropped_by_time_format() {
    let parser = parser();
    let time = chrono::NaiveTime::from_hms_opt(8, 5, 30).unwrap();
    let domain = Domain::leaf("opens", Operator::Eq, time);
    assert_eq!(parser.string(&domain), r#"Opens: "08:05:30""#);
    assert_eq!(parser.parse(r#"Opens: "08:05:30""#).unwrap(), domain);

    let on_the_minute = Domain::leaf(
        "opens",
        Operator::Eq,
        chrono::NaiveTime::from_hms_opt(8, 5, 0).unwrap(),
    );
    assert_eq!(parser.string(&on_the_minute), r#"Opens: "08:05""#);
}

#[test]
fn test_string_boolean_with_configured_true_words() {
    let config = ParserConfig {
        true_words: vec!["ja".to_string(), "oui".to_string()],
        ..ParserConfig::default()
    };
    let parser = DomainParser::new(fields(), config);
    let domain = parser.parse("Active: ja").unwrap();
    assert_eq!(domain.to_json(), json!(["active", "=", true]));
    assert_eq!(parser.string(&domain), "Active: ja");
    assert_eq!(parser.parse(&parser.string(&domain)).unwrap(), domain);

    let domain = parser.parse("Active: nein").unwrap();
    assert_eq!(parser.string(&domain), "Active: False");
    assert_eq!(parser.parse("Active: False").unwrap(), domain);
}

#[test]
fn test_parse_string_roundtrip() {
    let parser = parser();
    for text in [
        "Name: foo Amount: >10",
        "Amount: 5..10",
        "Amount: ..10",
        "Tags: Alpha",
        "Tags: =Alpha;Beta",
        "Party: a;b",
        "Party.Name: acme",
        "Origin: Sale,SO1",
        r#"Name: """#,
        "Name: =",
        "Active: no",
        "State: Draft;Done",
        "Date: 2024-01-01..2024-12-31",
        "a | b c",
        "(a b) | c",
        "(a | b) (c | d)",
        "!foo | Name: !bar",
        r#""quoted | text" x"#,
        r#"Name: "50\%""#,
        "Amount: !5..10",
        "Amount: (5) Name: foo",
        "Tags: >Alpha",
        "x | (Name: ) y",
        "Amount: >5;6",
        "Tags: Alpha foo",
        "Price: 1.25",
        "Price: 3",
        r#"Opens: "08:05:30""#,
        r#"Opens: "08:05""#,
    ] {
        let domain = parser.parse(text).unwrap();
        let rendered = parser.string(&domain);
        assert_eq!(parser.parse(&rendered).unwrap(), domain, "text {:?} rendered {:?}", text, rendered);
    }
}

// ==================== Stringable ====================

#[test]
fn test_stringable() {
    let parser = parser();
    assert!(parser.stringable(&parser.parse("Party: acme Tags: Alpha").unwrap()));
    assert!(parser.stringable(&Domain::leaf("party", Operator::Eq, Value::Null)));
    assert!(!parser.stringable(&Domain::leaf("party", Operator::Eq, 5)));
    assert!(!parser.stringable(&Domain::leaf("party.rec_name", Operator::In, vec![1, 2])));
    assert!(!parser.stringable(&Domain::leaf("tags", Operator::Eq, "a")));
    assert!(parser.stringable(&Domain::leaf("tags", Operator::In, vec!["a"])));
    assert!(parser.stringable(&Domain::leaf("unknown", Operator::Eq, 5)));
}

// ==================== Completion ====================

fn small_parser() -> DomainParser {
    DomainParser::with_defaults(BTreeMap::from([
        ("name".to_string(), field("Name", FieldType::Char)),
        ("amount".to_string(), field("Amount", FieldType::Float)),
        ("active".to_string(), field("Active", FieldType::Boolean)),
        (
            "state".to_string(),
            field("State", FieldType::Selection)
                .with_selection(vec![("draft", "Draft"), ("done", "Done")]),
        ),
    ]))
}

#[test]
fn test_completion_empty_text_lists_fields() {
    assert_eq!(
        small_parser().completion("").unwrap(),
        vec!["Active: ", "Amount: ", "Name: ", "State: "]
    );
}

#[test]
fn test_completion_after_clause() {
    let completions = small_parser().completion("Name: foo ").unwrap();
    assert!(completions.contains(&"Name: foo Amount: ".to_string()));
    assert_eq!(completions.len(), 4);
}

#[test]
fn test_completion_label_prefix() {
    assert_eq!(small_parser().completion("Nam").unwrap(), vec!["Name: "]);
    assert_eq!(
        small_parser().completion("a").unwrap(),
        vec!["Active: ", "Amount: "]
    );
}

#[test]
fn test_completion_label_typo() {
    let completions = small_parser().completion("Amout").unwrap();
    assert_eq!(completions.first().map(String::as_str), Some("Amount: "));
}

#[test]
fn test_completion_operators_for_empty_value() {
    let completions = small_parser().completion("Amount:").unwrap();
    assert_eq!(
        completions,
        vec![
            "Amount: ",
            "Amount: !",
            "Amount: <",
            "Amount: >",
            "Amount: <=",
            "Amount: >=",
        ]
    );
}

#[test]
fn test_completion_boolean_values() {
    let completions = small_parser().completion("Active:").unwrap();
    assert!(completions.contains(&"Active: !".to_string()));
    assert!(completions.contains(&"Active: True".to_string()));
    assert!(completions.contains(&"Active: False".to_string()));
}

#[test]
fn test_completion_selection_values() {
    assert_eq!(
        small_parser().completion("State: d").unwrap(),
        vec!["State: Draft", "State: Done"]
    );
    assert_eq!(
        small_parser().completion("State: dr").unwrap(),
        vec!["State: Draft"]
    );
}

#[test]
fn test_completion_inside_open_group() {
    let completions = small_parser().completion("x | (a b ").unwrap();
    assert!(completions.contains(&"x | (a b Name: ".to_string()));
}

#[test]
fn test_completion_fails_on_trailing_escape() {
    assert!(small_parser().completion(r"foo\").is_err());
}
