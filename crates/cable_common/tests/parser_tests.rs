//! Golden tests for the engine response parser.
//!
//! The parser is the trust boundary: every test here either accepts a
//! well-formed answer exactly or rejects a broken one with a precise error.

use cable_common::{
    parse_response, ConductorMaterial, FieldName, ParseError, Status,
};
use serde_json::{json, Value};

fn verdict(field: &str, status: &str, comment: &str) -> Value {
    json!({
        "field": field,
        "provided": "x",
        "expected": "y",
        "status": status,
        "comment": comment,
    })
}

fn response(validation: Vec<Value>) -> Value {
    json!({
        "fields": {
            "standard": "IEC 60502-1",
            "voltage": "0.6/1 kV",
            "conductor_material": "Cu",
            "conductor_class": "Class 2",
            "csa": 10,
            "insulation_material": "PVC",
            "insulation_thickness": 1.0
        },
        "validation": validation,
        "confidence": {"overall": 0.9, "reasoning": "complete specification"},
        "reasoning": "The design meets IEC 60502-1."
    })
}

// === Acceptance ===

#[test]
fn test_parses_well_formed_response() {
    let raw = response(vec![
        verdict("csa", "PASS", "Standard size"),
        verdict("insulation_thickness", "warn", "Borderline"),
    ])
    .to_string();

    let parsed = parse_response(&raw).unwrap();

    assert_eq!(parsed.field_verdicts.len(), 2);
    assert_eq!(parsed.field_verdicts[0].field_name, FieldName::Csa);
    assert_eq!(parsed.field_verdicts[0].status, Status::Pass);
    assert_eq!(parsed.field_verdicts[1].status, Status::Warn);
    assert_eq!(parsed.declared_confidence, Some(0.9));
    assert_eq!(parsed.confidence_reasoning.as_deref(), Some("complete specification"));
    assert_eq!(parsed.raw_reasoning_text, "The design meets IEC 60502-1.");
    assert_eq!(parsed.extracted_fields.csa, Some(10.0));
    assert_eq!(
        parsed.extracted_fields.conductor_material,
        Some(ConductorMaterial::Copper)
    );
}

#[test]
fn test_accepts_markdown_fenced_response() {
    let raw = format!(
        "```json\n{}\n```",
        response(vec![verdict("voltage", "PASS", "Rated 0.6/1 kV")])
    );
    let parsed = parse_response(&raw).unwrap();
    assert_eq!(parsed.field_verdicts[0].field_name, FieldName::Voltage);
}

#[test]
fn test_confidence_may_be_absent_or_bare_number() {
    let mut value = response(vec![verdict("csa", "PASS", "ok")]);
    value.as_object_mut().unwrap().remove("confidence");
    assert_eq!(parse_response(&value.to_string()).unwrap().declared_confidence, None);

    value["confidence"] = json!(0.7);
    assert_eq!(parse_response(&value.to_string()).unwrap().declared_confidence, Some(0.7));

    value["confidence"] = json!({"reasoning": "no number given"});
    assert_eq!(parse_response(&value.to_string()).unwrap().declared_confidence, None);
}

#[test]
fn test_numeric_provided_value_keeps_json_text() {
    let mut item = verdict("csa", "PASS", "ok");
    item["provided"] = json!(10);
    item["expected"] = Value::Null;
    let parsed = parse_response(&response(vec![item]).to_string()).unwrap();

    assert_eq!(parsed.field_verdicts[0].provided_value.as_deref(), Some("10"));
    assert_eq!(parsed.field_verdicts[0].expected_value_or_range, None);
}

#[test]
fn test_verdict_order_is_preserved() {
    let raw = response(vec![
        verdict("insulation_thickness", "FAIL", "Too thin"),
        verdict("standard", "PASS", "ok"),
        verdict("csa", "PASS", "ok"),
    ])
    .to_string();
    let names: Vec<FieldName> = parse_response(&raw)
        .unwrap()
        .field_verdicts
        .iter()
        .map(|v| v.field_name)
        .collect();
    assert_eq!(
        names,
        vec![FieldName::InsulationThickness, FieldName::Standard, FieldName::Csa]
    );
}

// === Rule 1: schema shape ===

#[test]
fn test_rejects_non_json() {
    let err = parse_response("The cable looks fine to me.").unwrap_err();
    assert!(matches!(err, ParseError::Malformed(_)));
}

#[test]
fn test_rejects_non_object_top_level() {
    let err = parse_response("[1, 2, 3]").unwrap_err();
    assert!(matches!(err, ParseError::Malformed(_)));
}

#[test]
fn test_rejects_missing_required_keys() {
    for key in ["fields", "validation", "reasoning"] {
        let mut value = response(vec![verdict("csa", "PASS", "ok")]);
        value.as_object_mut().unwrap().remove(key);
        let err = parse_response(&value.to_string()).unwrap_err();
        assert!(
            matches!(err, ParseError::Malformed(ref m) if m.contains(key)),
            "missing {} gave {:?}",
            key,
            err
        );
    }
}

#[test]
fn test_rejects_string_csa() {
    let mut value = response(vec![verdict("csa", "PASS", "ok")]);
    value["fields"]["csa"] = json!("10 mm²");
    let err = parse_response(&value.to_string()).unwrap_err();
    assert!(matches!(err, ParseError::Malformed(_)));
}

#[test]
fn test_rejects_non_string_status() {
    let mut item = verdict("csa", "PASS", "ok");
    item["status"] = json!(1);
    let err = parse_response(&response(vec![item]).to_string()).unwrap_err();
    assert!(matches!(err, ParseError::Malformed(_)));
}

// === Rule 2: status vocabulary ===

#[test]
fn test_rejects_unknown_status_tokens() {
    for status in ["MISSING", "OK", "PASSED", "", " PASS"] {
        let raw = response(vec![verdict("csa", status, "comment")]).to_string();
        let err = parse_response(&raw).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidStatus {
                field: "csa".to_string(),
                status: status.to_string()
            }
        );
    }
}

#[test]
fn test_status_is_case_insensitive() {
    for status in ["pass", "Pass", "PASS", "pAsS"] {
        let raw = response(vec![verdict("csa", status, "ok")]).to_string();
        assert_eq!(parse_response(&raw).unwrap().field_verdicts[0].status, Status::Pass);
    }
}

// === Rule 3: field vocabulary ===

#[test]
fn test_rejects_unknown_verdict_field() {
    let raw = response(vec![
        verdict("csa", "PASS", "ok"),
        verdict("sheath_material", "PASS", "ok"),
    ])
    .to_string();
    assert_eq!(
        parse_response(&raw).unwrap_err(),
        ParseError::UnknownField("sheath_material".to_string())
    );
}

#[test]
fn test_rejects_unknown_extracted_field() {
    let mut value = response(vec![verdict("csa", "PASS", "ok")]);
    value["fields"]["armour"] = json!("SWA");
    assert_eq!(
        parse_response(&value.to_string()).unwrap_err(),
        ParseError::UnknownField("armour".to_string())
    );
}

#[test]
fn test_rejects_duplicate_verdict_field() {
    let raw = response(vec![
        verdict("csa", "PASS", "ok"),
        verdict("csa", "FAIL", "contradiction"),
    ])
    .to_string();
    assert_eq!(
        parse_response(&raw).unwrap_err(),
        ParseError::DuplicateField(FieldName::Csa)
    );
}

/// Status is checked before field names
#[test]
fn test_rule_order_status_before_field() {
    let raw = response(vec![verdict("armour", "MAYBE", "ok")]).to_string();
    assert!(matches!(
        parse_response(&raw).unwrap_err(),
        ParseError::InvalidStatus { .. }
    ));
}

// === Rule 4: reasoning ===

#[test]
fn test_rejects_empty_comment() {
    for comment in ["", "   "] {
        let raw = response(vec![verdict("voltage", "PASS", comment)]).to_string();
        assert_eq!(
            parse_response(&raw).unwrap_err(),
            ParseError::MissingReasoning("voltage".to_string())
        );
    }
}

#[test]
fn test_rejects_missing_comment_key() {
    let mut item = verdict("voltage", "PASS", "x");
    item.as_object_mut().unwrap().remove("comment");
    assert_eq!(
        parse_response(&response(vec![item]).to_string()).unwrap_err(),
        ParseError::MissingReasoning("voltage".to_string())
    );
}

#[test]
fn test_rejects_empty_overall_reasoning() {
    let mut value = response(vec![verdict("csa", "PASS", "ok")]);
    value["reasoning"] = json!("");
    assert!(matches!(
        parse_response(&value.to_string()).unwrap_err(),
        ParseError::MissingReasoning(_)
    ));
}

// === Confidence range ===

#[test]
fn test_rejects_confidence_out_of_range() {
    let mut value = response(vec![verdict("csa", "PASS", "ok")]);
    value["confidence"]["overall"] = json!(1.5);
    assert_eq!(
        parse_response(&value.to_string()).unwrap_err(),
        ParseError::ConfidenceOutOfRange(1.5)
    );
}

/// An empty verdict list is structurally valid; aggregation rejects it
#[test]
fn test_empty_validation_list_parses() {
    let raw = response(vec![]).to_string();
    assert!(parse_response(&raw).unwrap().field_verdicts.is_empty());
}
