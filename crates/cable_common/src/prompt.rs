//! Prompt construction for the reasoning engine.
//!
//! Pure data in, string out. The fixed frame pins the engine to IEC 60502-1
//! and IEC 60228 and to one response schema; the design block carries only
//! the fields the caller actually supplied.

use crate::design::{DesignFields, FieldName, Provenance};
use crate::normalizer::NormalizedInput;
use serde_json::Value;

/// Role, standards frame and status semantics.
pub const STANDARDS_FRAME: &str = r#"You are an expert electrical engineer specializing in low-voltage cable design validation according to IEC standards (IEC 60502-1 and IEC 60228).

Your task is to validate a cable design specification and return a structured JSON response.

Use only IEC 60502-1 (power cables 0.6/1 kV to 3.6/6 kV) and IEC 60228 (conductors of insulated cables) as the frame for your judgment.

## Validation Logic:
1. PASS: Value meets or exceeds the IEC requirement
2. WARN: Value is borderline, within tolerance limits, or information is incomplete/missing
3. FAIL: Value clearly violates the IEC requirement"#;

/// Response schema the parser enforces.
pub const RESPONSE_SCHEMA: &str = r#"## Required Response Format (JSON only, no markdown code blocks):
{
    "fields": {
        "standard": "extracted or provided standard or null",
        "voltage": "extracted or provided voltage or null",
        "conductor_material": "extracted or provided material or null",
        "conductor_class": "extracted or provided class or null",
        "csa": extracted_or_provided_csa_as_number_or_null,
        "insulation_material": "extracted or provided insulation or null",
        "insulation_thickness": extracted_or_provided_thickness_as_number_or_null
    },
    "validation": [
        {
            "field": "field_name",
            "provided": "value provided or null",
            "expected": "expected value or range per IEC",
            "status": "PASS|WARN|FAIL",
            "comment": "brief explanation"
        }
    ],
    "confidence": {
        "overall": 0.85,
        "reasoning": "explanation of confidence level"
    },
    "reasoning": "detailed engineering reasoning for the validation decisions"
}"#;

const RULES: &str = r#"## Important Notes:
- Report exactly one validation entry for each of the seven fields: standard, voltage, conductor_material, conductor_class, csa, insulation_material, insulation_thickness
- Use no other field names
- If a field is missing, set status to WARN and explain what is missing
- If the standard is not specified, assume IEC 60502-1 but mark it as WARN
- Every comment must be a non-empty technical explanation
- Be conservative: when in doubt, use WARN rather than PASS
- "overall" confidence must be a number between 0 and 1
- Return ONLY valid JSON, no markdown formatting or code blocks"#;

/// Build the single prompt for one request.
pub fn build_prompt(input: &NormalizedInput) -> String {
    let mut prompt = String::new();
    prompt.push_str(STANDARDS_FRAME);
    prompt.push_str("\n\n");
    prompt.push_str(RESPONSE_SCHEMA);
    prompt.push_str("\n\n");
    prompt.push_str(RULES);
    prompt.push_str("\n\n");

    match (&input.free_text, input.design.provenance) {
        (Some(text), _) => {
            prompt.push_str("## Input Type: Free-Text\n");
            prompt.push_str(
                "Extract the cable design parameters from the text between the markers, then validate them:\n\n",
            );
            prompt.push_str("<<<DESIGN TEXT\n");
            prompt.push_str(text);
            prompt.push_str("\nDESIGN TEXT>>>\n\n");
            prompt.push_str("First extract all identifiable parameters, then validate each against IEC requirements.\n");
        }
        (None, provenance) => {
            let header = match provenance {
                Provenance::Database => "## Input Type: Stored Design Record\n",
                _ => "## Input Type: Structured\n",
            };
            prompt.push_str(header);
            prompt.push_str("Validate the following cable design specification:\n\n");
            prompt.push_str(&render_design_block(&input.design.fields));
            prompt.push_str("\n\n");
            let missing = missing_fields(&input.design.fields);
            if !missing.is_empty() {
                prompt.push_str("Fields not supplied by the caller: ");
                prompt.push_str(&missing.join(", "));
                prompt.push('\n');
            }
            prompt.push_str("Validate each provided parameter against IEC requirements.\n");
        }
    }

    prompt.push_str("Return the JSON response:");
    prompt
}

/// JSON object of the supplied fields only, in canonical order.
pub fn render_design_block(fields: &DesignFields) -> String {
    let present = fields.present_fields();
    if present.is_empty() {
        return "{}".to_string();
    }

    let lines: Vec<String> = present
        .iter()
        .map(|name| format!("  \"{}\": {}", name.as_str(), json_value(fields, *name)))
        .collect();
    format!("{{\n{}\n}}", lines.join(",\n"))
}

fn json_value(fields: &DesignFields, name: FieldName) -> Value {
    match name {
        FieldName::Csa => fields.csa.map(Value::from).unwrap_or(Value::Null),
        FieldName::InsulationThickness => fields
            .insulation_thickness
            .map(Value::from)
            .unwrap_or(Value::Null),
        other => fields
            .display_value(other)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

fn missing_fields(fields: &DesignFields) -> Vec<&'static str> {
    FieldName::ALL
        .iter()
        .filter(|name| !fields.is_present(**name))
        .map(|name| name.as_str())
        .collect()
}
