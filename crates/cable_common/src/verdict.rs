//! Verdict types: per-field judgments, the parsed engine answer and the
//! final outcome handed to callers.

use crate::aggregate::{Aggregate, ConfidenceLevel, ConfidenceSource};
use crate::design::{DesignFields, FieldName, Provenance};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-field and overall judgment. Case-insensitive on input, uppercase on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    /// Higher is more severe.
    pub fn severity(&self) -> u8 {
        match self {
            Status::Pass => 0,
            Status::Warn => 1,
            Status::Fail => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
        }
    }

    /// Most severe status in `statuses`, or `None` when there are none.
    pub fn worst<I>(statuses: I) -> Option<Status>
    where
        I: IntoIterator<Item = Status>,
    {
        statuses.into_iter().max_by_key(|s| s.severity())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PASS" => Ok(Status::Pass),
            "WARN" => Ok(Status::Warn),
            "FAIL" => Ok(Status::Fail),
            _ => Err(s.to_string()),
        }
    }
}

impl TryFrom<String> for Status {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One row of judgment for a canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldVerdict {
    #[serde(rename = "field")]
    pub field_name: FieldName,
    #[serde(rename = "provided")]
    pub provided_value: Option<String>,
    #[serde(rename = "expected")]
    pub expected_value_or_range: Option<String>,
    pub status: Status,
    /// Never empty
    pub comment: String,
}

/// Validated decoding of the reasoning engine's raw answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub extracted_fields: DesignFields,
    /// Unique field names, in the order the engine reported them
    pub field_verdicts: Vec<FieldVerdict>,
    pub raw_reasoning_text: String,
    /// In [0, 1] when present
    pub declared_confidence: Option<f64>,
    pub confidence_reasoning: Option<String>,
}

/// Result of one validation request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    overall_status: Status,
    overall_confidence: f64,
    confidence_level: ConfidenceLevel,
    confidence_source: ConfidenceSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence_reasoning: Option<String>,
    field_verdicts: Vec<FieldVerdict>,
    extracted_fields: DesignFields,
    reasoning_text: String,
    provenance: Provenance,
}

impl ValidationOutcome {
    pub fn new(parsed: ParsedVerdict, aggregate: Aggregate, provenance: Provenance) -> Self {
        Self {
            overall_status: aggregate.overall_status,
            overall_confidence: aggregate.overall_confidence,
            confidence_level: aggregate.level(),
            confidence_source: aggregate.source,
            confidence_reasoning: parsed.confidence_reasoning,
            field_verdicts: parsed.field_verdicts,
            extracted_fields: parsed.extracted_fields,
            reasoning_text: parsed.raw_reasoning_text,
            provenance,
        }
    }

    pub fn overall_status(&self) -> Status {
        self.overall_status
    }

    pub fn overall_confidence(&self) -> f64 {
        self.overall_confidence
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        self.confidence_level
    }

    pub fn confidence_source(&self) -> ConfidenceSource {
        self.confidence_source
    }

    pub fn confidence_reasoning(&self) -> Option<&str> {
        self.confidence_reasoning.as_deref()
    }

    pub fn field_verdicts(&self) -> &[FieldVerdict] {
        &self.field_verdicts
    }

    pub fn verdict_for(&self, field: FieldName) -> Option<&FieldVerdict> {
        self.field_verdicts.iter().find(|v| v.field_name == field)
    }

    pub fn extracted_fields(&self) -> &DesignFields {
        &self.extracted_fields
    }

    pub fn reasoning_text(&self) -> &str {
        &self.reasoning_text
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }
}
