//! Caller-facing request and the input-mode union it resolves to.

use crate::design::{DesignFields, DesignId};
use crate::error::InputError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Exactly one input mode.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignInput {
    Structured(DesignFields),
    FreeText(String),
    ByReference(DesignId),
}

/// Request as it arrives on the wire. Callers should set exactly one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<DesignFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_id: Option<DesignId>,
}

impl ValidationRequest {
    pub fn structured(design: DesignFields) -> Self {
        Self {
            design: Some(design),
            ..Default::default()
        }
    }

    pub fn free_text(text: impl Into<String>) -> Self {
        Self {
            free_text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn by_reference(id: DesignId) -> Self {
        Self {
            design_id: Some(id),
            ..Default::default()
        }
    }

    /// Resolve to a single input mode.
    ///
    /// When several modes are supplied only one is honoured, in the order
    /// `design_id`, `free_text`, `design`. An empty string in `free_text`
    /// still counts as the free-text mode and is rejected by the normalizer.
    pub fn into_input(self) -> Result<DesignInput, InputError> {
        let supplied = [
            self.design_id.is_some(),
            self.free_text.is_some(),
            self.design.is_some(),
        ]
        .iter()
        .filter(|s| **s)
        .count();

        if supplied > 1 {
            warn!("Request carries {} input modes, honouring only one", supplied);
        }

        if let Some(id) = self.design_id {
            return Ok(DesignInput::ByReference(id));
        }
        if let Some(text) = self.free_text {
            return Ok(DesignInput::FreeText(text));
        }
        if let Some(design) = self.design {
            return Ok(DesignInput::Structured(design));
        }
        Err(InputError::Empty)
    }
}
