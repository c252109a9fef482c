//! Tests for prompt construction.

use cable_common::prompt::{render_design_block, RESPONSE_SCHEMA, STANDARDS_FRAME};
use cable_common::{
    build_prompt, CanonicalDesign, ConductorClass, ConductorMaterial, DesignFields, FieldName,
    InsulationMaterial, NormalizedInput, Provenance, Standard,
};

fn structured(fields: DesignFields, provenance: Provenance) -> NormalizedInput {
    NormalizedInput {
        design: CanonicalDesign::new(fields, provenance),
        free_text: None,
    }
}

fn design_block(prompt: &str) -> &str {
    let start = prompt
        .find("Validate the following cable design specification:")
        .expect("design section present");
    &prompt[start..]
}

fn stored_design() -> DesignFields {
    DesignFields {
        standard: Some(Standard::Iec60502_1),
        voltage: Some("0.6/1 kV".to_string()),
        conductor_material: Some(ConductorMaterial::Aluminium),
        conductor_class: Some(ConductorClass::Class1),
        csa: Some(25.0),
        insulation_material: Some(InsulationMaterial::Xlpe),
        insulation_thickness: Some(1.2),
    }
}

#[test]
fn test_prompt_fixes_standards_frame_and_schema() {
    let prompt = build_prompt(&structured(stored_design(), Provenance::Structured));

    assert!(prompt.starts_with(STANDARDS_FRAME));
    assert!(prompt.contains(RESPONSE_SCHEMA));
    assert!(prompt.contains("IEC 60502-1"));
    assert!(prompt.contains("IEC 60228"));
    assert!(prompt.contains("PASS|WARN|FAIL"));
    assert!(prompt.ends_with("Return the JSON response:"));
}

/// Omitted fields never appear as keys in the design block
#[test]
fn test_prompt_does_not_inject_absent_fields() {
    let fields = DesignFields {
        csa: Some(10.0),
        conductor_material: Some(ConductorMaterial::Copper),
        ..Default::default()
    };
    let prompt = build_prompt(&structured(fields.clone(), Provenance::Structured));
    let block = design_block(&prompt);

    for name in FieldName::ALL {
        let key = format!("\"{}\":", name.as_str());
        assert_eq!(
            block.contains(&key),
            fields.is_present(name),
            "key {} presence mismatch",
            key
        );
    }
    assert!(block.contains("Fields not supplied by the caller: standard, voltage, conductor_class, insulation_material, insulation_thickness"));
}

/// Fixed database input always yields byte-identical prompt text
#[test]
fn test_prompt_is_deterministic_for_database_input() {
    let input = structured(stored_design(), Provenance::Database);
    let first = build_prompt(&input);
    let second = build_prompt(&input.clone());

    assert_eq!(first, second);
    assert!(first.contains("## Input Type: Stored Design Record"));
    assert!(first.contains(&render_design_block(&stored_design())));
}

#[test]
fn test_structured_and_database_prompts_differ_only_in_header() {
    let a = build_prompt(&structured(stored_design(), Provenance::Structured));
    let b = build_prompt(&structured(stored_design(), Provenance::Database));

    assert_ne!(a, b);
    assert_eq!(
        a.replace("## Input Type: Structured", ""),
        b.replace("## Input Type: Stored Design Record", "")
    );
}

#[test]
fn test_free_text_prompt_quotes_text_verbatim() {
    let input = NormalizedInput {
        design: CanonicalDesign::new(DesignFields::default(), Provenance::FreeText),
        free_text: Some("10 sqmm copper cable, \"LV\"".to_string()),
    };
    let prompt = build_prompt(&input);

    assert!(prompt.contains("## Input Type: Free-Text"));
    assert!(prompt.contains("<<<DESIGN TEXT\n10 sqmm copper cable, \"LV\"\nDESIGN TEXT>>>"));
    assert!(!prompt.contains("Validate the following cable design specification:"));
}

#[test]
fn test_design_block_numbers_are_json_numbers() {
    let block = render_design_block(&stored_design());
    let parsed: serde_json::Value = serde_json::from_str(&block).unwrap();

    assert_eq!(parsed["csa"], serde_json::json!(25.0));
    assert_eq!(parsed["insulation_thickness"], serde_json::json!(1.2));
    assert_eq!(parsed["conductor_material"], "Al");
    assert_eq!(parsed["conductor_class"], "Class 1");
}
