//! Confidence aggregation.
//!
//! Pure function over a parsed verdict. The engine's declared confidence is
//! authoritative; the bands are only a fallback when it is absent.
//! Overall status is the most severe field status, so one FAIL fails the design.

use crate::error::AggregationError;
use crate::verdict::{ParsedVerdict, Status};
use serde::{Deserialize, Serialize};

/// Confidence implied by each status when the engine declares none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBands {
    #[serde(default = "default_pass_band")]
    pub pass: f64,
    #[serde(default = "default_warn_band")]
    pub warn: f64,
    #[serde(default = "default_fail_band")]
    pub fail: f64,
}

fn default_pass_band() -> f64 {
    0.95
}

fn default_warn_band() -> f64 {
    0.65
}

fn default_fail_band() -> f64 {
    0.30
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self {
            pass: default_pass_band(),
            warn: default_warn_band(),
            fail: default_fail_band(),
        }
    }
}

impl ConfidenceBands {
    pub fn for_status(&self, status: Status) -> f64 {
        match status {
            Status::Pass => self.pass,
            Status::Warn => self.warn,
            Status::Fail => self.fail,
        }
    }

    /// All bands must lie in [0, 1].
    pub fn is_valid(&self) -> bool {
        [self.pass, self.warn, self.fail]
            .iter()
            .all(|b| b.is_finite() && (0.0..=1.0).contains(b))
    }
}

/// Where the overall confidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    Declared,
    Derived,
}

/// Display banding of a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.85;
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.65;

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_CONFIDENCE_THRESHOLD {
            ConfidenceLevel::High
        } else if score >= MEDIUM_CONFIDENCE_THRESHOLD {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub overall_status: Status,
    pub overall_confidence: f64,
    pub source: ConfidenceSource,
}

impl Aggregate {
    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.overall_confidence)
    }
}

/// Compute overall status and confidence. An empty verdict set is an error,
/// never an implicit PASS.
pub fn aggregate(
    verdict: &ParsedVerdict,
    bands: &ConfidenceBands,
) -> Result<Aggregate, AggregationError> {
    let overall_status = Status::worst(verdict.field_verdicts.iter().map(|v| v.status))
        .ok_or(AggregationError::EmptyVerdictSet)?;

    let (overall_confidence, source) = match verdict.declared_confidence {
        Some(declared) => (declared, ConfidenceSource::Declared),
        None => {
            let total: f64 = verdict
                .field_verdicts
                .iter()
                .map(|v| bands.for_status(v.status))
                .sum();
            (
                total / verdict.field_verdicts.len() as f64,
                ConfidenceSource::Derived,
            )
        }
    };

    Ok(Aggregate {
        overall_status,
        overall_confidence,
        source,
    })
}
