//! Input normalization.
//!
//! Turns one of the three input modes into a `CanonicalDesign` tagged with
//! its provenance. Free text is passed through untouched: extracting fields
//! from prose is the reasoning engine's job, not ours.

use crate::design::{CanonicalDesign, DesignFields, DesignId, FieldName, Provenance};
use crate::error::InputError;
use crate::input::DesignInput;
use crate::DEFAULT_MAX_FREE_TEXT_CHARS;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Storage collaborator used in reference mode.
pub trait DesignLookup: Send + Sync {
    fn lookup_design(&self, id: DesignId) -> Result<DesignFields, LookupError>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("design {0} not found")]
    NotFound(DesignId),

    #[error("{0}")]
    Backend(String),
}

impl From<LookupError> for InputError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(id) => InputError::NotFound(id),
            LookupError::Backend(msg) => InputError::Storage(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputLimits {
    pub max_free_text_chars: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_free_text_chars: DEFAULT_MAX_FREE_TEXT_CHARS,
        }
    }
}

/// Normalizer output: the design plus, in free-text mode, the raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub design: CanonicalDesign,
    pub free_text: Option<String>,
}

pub fn normalize(
    input: DesignInput,
    store: &dyn DesignLookup,
    limits: &InputLimits,
) -> Result<NormalizedInput, InputError> {
    match input {
        DesignInput::Structured(fields) => {
            check_positive(FieldName::Csa, fields.csa)?;
            check_positive(FieldName::InsulationThickness, fields.insulation_thickness)?;
            debug!(
                "Structured input with {} of 7 fields",
                fields.present_fields().len()
            );
            Ok(NormalizedInput {
                design: CanonicalDesign::new(fields, Provenance::Structured),
                free_text: None,
            })
        }
        DesignInput::FreeText(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(InputError::Empty);
            }
            let len = trimmed.chars().count();
            if len > limits.max_free_text_chars {
                return Err(InputError::TooLong {
                    len,
                    max: limits.max_free_text_chars,
                });
            }
            debug!("Free-text input ({} chars)", len);
            Ok(NormalizedInput {
                design: CanonicalDesign::new(DesignFields::default(), Provenance::FreeText),
                free_text: Some(trimmed.to_string()),
            })
        }
        DesignInput::ByReference(id) => {
            if id < 1 {
                return Err(InputError::InvalidId(id));
            }
            let fields = store.lookup_design(id)?;
            debug!("Loaded design {} from store", id);
            Ok(NormalizedInput {
                design: CanonicalDesign::new(fields, Provenance::Database),
                free_text: None,
            })
        }
    }
}

fn check_positive(field: FieldName, value: Option<f64>) -> Result<(), InputError> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(InputError::InvalidValue {
            field,
            reason: format!("must be a positive number, got {}", v),
        }),
        _ => Ok(()),
    }
}
