//! Plain-text rendering for the CLI.

use crate::store::DesignRecord;
use cable_common::{FieldName, ValidationFailure, ValidationOutcome};
use std::fmt::Write;

/// Verdict table plus summary lines
pub fn render_outcome(outcome: &ValidationOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Overall: {}  confidence {:.2} ({:?}, {:?})",
        outcome.overall_status(),
        outcome.overall_confidence(),
        outcome.confidence_level(),
        outcome.confidence_source()
    );
    let _ = writeln!(out, "Input:   {}", outcome.provenance());
    out.push('\n');

    let _ = writeln!(
        out,
        "{:<22} {:<6} {:<16} {:<20} Comment",
        "Field", "Status", "Provided", "Expected"
    );
    for verdict in outcome.field_verdicts() {
        let _ = writeln!(
            out,
            "{:<22} {:<6} {:<16} {:<20} {}",
            verdict.field_name,
            verdict.status,
            verdict.provided_value.as_deref().unwrap_or("-"),
            verdict.expected_value_or_range.as_deref().unwrap_or("-"),
            verdict.comment
        );
    }

    let extracted = outcome.extracted_fields();
    if !extracted.is_empty() {
        out.push_str("\nExtracted fields:\n");
        for name in FieldName::ALL {
            if let Some(value) = extracted.display_value(name) {
                let _ = writeln!(out, "  {:<22} {}", name, value);
            }
        }
    }

    if let Some(reason) = outcome.confidence_reasoning() {
        let _ = writeln!(out, "\nConfidence: {}", reason);
    }
    let _ = writeln!(out, "\nReasoning: {}", outcome.reasoning_text());
    out
}

pub fn render_failure(failure: &ValidationFailure) -> String {
    format!(
        "[{}] {} (stage: {}, action: {:?})",
        failure.code(),
        failure.error,
        failure.stage,
        failure.operator_action()
    )
}

pub fn render_designs(records: &[DesignRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:<40} {:<12} {:>8}  {:>6}", "Id", "Name", "Standard", "CSA", "Ins.");
    for record in records {
        let fields = &record.fields;
        let _ = writeln!(
            out,
            "{:>4}  {:<40} {:<12} {:>8}  {:>6}",
            record.id,
            record.name,
            fields.standard.as_ref().map(|s| s.code()).unwrap_or("-"),
            fields.csa.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
            fields
                .insulation_thickness
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    out
}
