//! Response parsing: the trust boundary between engine text and typed state.
//!
//! The engine's answer is untrusted input. It is decoded and then checked in
//! a fixed order, each check a hard failure:
//!
//! 1. schema shape (`Malformed`)
//! 2. status vocabulary (`InvalidStatus`)
//! 3. field vocabulary and uniqueness (`UnknownField`, `DuplicateField`)
//! 4. reasoning present for every verdict and overall (`MissingReasoning`)
//!
//! Nothing is defaulted, renamed or dropped. No unit conversion and no
//! plausibility checks: engineering judgment belongs to the engine.

use crate::design::{DesignFields, FieldName};
use crate::error::ParseError;
use crate::verdict::{FieldVerdict, ParsedVerdict, Status};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Verdict entry after shape checks, before vocabulary checks.
struct RawVerdict {
    field: String,
    provided: Option<String>,
    expected: Option<String>,
    status: String,
    comment: String,
}

pub fn parse_response(raw: &str) -> Result<ParsedVerdict, ParseError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ParseError::Malformed(format!("not valid JSON: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::Malformed("top level is not a JSON object".to_string()))?;

    // 1. Shape
    let fields_value = required(object, "fields")?;
    let fields_object = fields_value
        .as_object()
        .ok_or_else(|| ParseError::Malformed("\"fields\" is not an object".to_string()))?;
    let validation = required(object, "validation")?
        .as_array()
        .ok_or_else(|| ParseError::Malformed("\"validation\" is not an array".to_string()))?;
    let reasoning = required(object, "reasoning")?
        .as_str()
        .ok_or_else(|| ParseError::Malformed("\"reasoning\" is not a string".to_string()))?;

    let raw_verdicts = validation
        .iter()
        .enumerate()
        .map(|(index, item)| decode_verdict_shape(index, item))
        .collect::<Result<Vec<_>, _>>()?;
    let mut extracted_fields = DesignFields::default();
    let mut unknown_keys = Vec::new();
    for (key, value) in fields_object {
        match key.parse::<FieldName>() {
            Ok(name) => set_extracted(&mut extracted_fields, name, value)?,
            Err(unknown) => unknown_keys.push(unknown),
        }
    }
    let (declared_confidence, confidence_reasoning) = decode_confidence(object.get("confidence"))?;

    // 2. Status vocabulary
    let statuses = raw_verdicts
        .iter()
        .map(|v| {
            v.status.parse::<Status>().map_err(|status| ParseError::InvalidStatus {
                field: v.field.clone(),
                status,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // 3. Field vocabulary
    if let Some(unknown) = unknown_keys.into_iter().next() {
        return Err(ParseError::UnknownField(unknown));
    }
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(raw_verdicts.len());
    for v in &raw_verdicts {
        let name = v.field.parse::<FieldName>().map_err(ParseError::UnknownField)?;
        if !seen.insert(name) {
            return Err(ParseError::DuplicateField(name));
        }
        names.push(name);
    }

    // 4. Reasoning
    for v in &raw_verdicts {
        if v.comment.trim().is_empty() {
            return Err(ParseError::MissingReasoning(v.field.clone()));
        }
    }
    if reasoning.trim().is_empty() {
        return Err(ParseError::MissingReasoning("overall reasoning".to_string()));
    }

    if let Some(confidence) = declared_confidence {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ParseError::ConfidenceOutOfRange(confidence));
        }
    }

    let field_verdicts = raw_verdicts
        .into_iter()
        .zip(names)
        .zip(statuses)
        .map(|((v, field_name), status)| FieldVerdict {
            field_name,
            provided_value: v.provided,
            expected_value_or_range: v.expected,
            status,
            comment: v.comment,
        })
        .collect();

    Ok(ParsedVerdict {
        extracted_fields,
        field_verdicts,
        raw_reasoning_text: reasoning.to_string(),
        declared_confidence,
        confidence_reasoning,
    })
}

/// Remove surrounding whitespace and one markdown code fence, if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn required<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Value, ParseError> {
    match object.get(key) {
        Some(Value::Null) | None => Err(ParseError::Malformed(format!(
            "missing required key \"{}\"",
            key
        ))),
        Some(value) => Ok(value),
    }
}

fn decode_verdict_shape(index: usize, item: &Value) -> Result<RawVerdict, ParseError> {
    let entry = item.as_object().ok_or_else(|| {
        ParseError::Malformed(format!("validation[{}] is not an object", index))
    })?;

    let field = match entry.get("field") {
        Some(Value::String(s)) => s.clone(),
        _ => {
            return Err(ParseError::Malformed(format!(
                "validation[{}].field is missing or not a string",
                index
            )))
        }
    };
    let status = match entry.get("status") {
        Some(Value::String(s)) => s.clone(),
        _ => {
            return Err(ParseError::Malformed(format!(
                "validation[{}].status is missing or not a string",
                index
            )))
        }
    };
    let comment = match entry.get("comment") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(_) => {
            return Err(ParseError::Malformed(format!(
                "validation[{}].comment is not a string",
                index
            )))
        }
    };

    Ok(RawVerdict {
        provided: scalar_text(entry.get("provided"), index, "provided")?,
        expected: scalar_text(entry.get("expected"), index, "expected")?,
        field,
        status,
        comment,
    })
}

/// String form of a scalar JSON value. Numbers keep their JSON text.
fn scalar_text(value: Option<&Value>, index: usize, key: &str) -> Result<Option<String>, ParseError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(ParseError::Malformed(format!(
            "validation[{}].{} is not a scalar",
            index, key
        ))),
    }
}

fn set_extracted(fields: &mut DesignFields, name: FieldName, value: &Value) -> Result<(), ParseError> {
    match name {
        FieldName::Csa => fields.csa = number_or_null(name, value)?,
        FieldName::InsulationThickness => fields.insulation_thickness = number_or_null(name, value)?,
        FieldName::Standard => fields.standard = string_or_null(name, value)?.map(Into::into),
        FieldName::Voltage => fields.voltage = string_or_null(name, value)?,
        FieldName::ConductorMaterial => {
            fields.conductor_material = string_or_null(name, value)?.map(Into::into)
        }
        FieldName::ConductorClass => {
            fields.conductor_class = string_or_null(name, value)?.map(Into::into)
        }
        FieldName::InsulationMaterial => {
            fields.insulation_material = string_or_null(name, value)?.map(Into::into)
        }
    }
    Ok(())
}

fn number_or_null(name: FieldName, value: &Value) -> Result<Option<f64>, ParseError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| ParseError::Malformed(format!("fields.{} is not representable", name))),
        _ => Err(ParseError::Malformed(format!(
            "fields.{} must be a number or null",
            name
        ))),
    }
}

/// Empty strings are reported as absent.
fn string_or_null(name: FieldName, value: &Value) -> Result<Option<String>, ParseError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(ParseError::Malformed(format!(
            "fields.{} must be a string or null",
            name
        ))),
    }
}

/// Accepts `{"overall": x, "reasoning": "..."}`, a bare number, null or absence.
fn decode_confidence(value: Option<&Value>) -> Result<(Option<f64>, Option<String>), ParseError> {
    match value {
        None | Some(Value::Null) => Ok((None, None)),
        Some(Value::Number(n)) => Ok((n.as_f64(), None)),
        Some(Value::Object(obj)) => {
            let overall = match obj.get("overall") {
                None | Some(Value::Null) => None,
                Some(Value::Number(n)) => n.as_f64(),
                Some(_) => {
                    return Err(ParseError::Malformed(
                        "confidence.overall is not a number".to_string(),
                    ))
                }
            };
            let reasoning = match obj.get("reasoning") {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
                None | Some(Value::Null) | Some(Value::String(_)) => None,
                Some(_) => {
                    return Err(ParseError::Malformed(
                        "confidence.reasoning is not a string".to_string(),
                    ))
                }
            };
            Ok((overall, reasoning))
        }
        Some(_) => Err(ParseError::Malformed(
            "confidence is neither an object nor a number".to_string(),
        )),
    }
}
