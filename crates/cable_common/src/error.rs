//! Error taxonomy for the validation pipeline.
//!
//! Every stage has its own error enum. `ValidationFailure` wraps whichever
//! one fired together with the stage it fired in, and exposes a stable code
//! so callers can tell input problems, engine outages and contract
//! violations apart without string matching.

use crate::design::{DesignId, FieldName};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("No input provided. Supply a design, free text or a design id.")]
    Empty,

    #[error("Free text is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: FieldName, reason: String },

    #[error("Design ID must be a positive integer, got {0}")]
    InvalidId(DesignId),

    #[error("Cable design with id {0} not found")]
    NotFound(DesignId),

    #[error("Design store error: {0}")]
    Storage(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Reasoning engine unreachable: {0}")]
    Unreachable(String),

    #[error("Reasoning engine timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Reasoning engine quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Reasoning engine transport returned an unusable reply: {0}")]
    MalformedTransport(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Engine output is not the expected schema: {0}")]
    Malformed(String),

    #[error("Verdict for {field} has invalid status {status:?}")]
    InvalidStatus { field: String, status: String },

    #[error("Engine reported unknown field {0:?}")]
    UnknownField(String),

    #[error("Engine reported {0} more than once")]
    DuplicateField(FieldName),

    #[error("Engine gave no reasoning for {0}")]
    MissingReasoning(String),

    #[error("Declared confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("Engine returned an empty verdict set")]
    EmptyVerdictSet,
}

/// Per-request pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalizing,
    Prompting,
    AwaitingEngine,
    Parsing,
    Aggregating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Normalizing => write!(f, "normalizing"),
            Stage::Prompting => write!(f, "prompting"),
            Stage::AwaitingEngine => write!(f, "awaiting_engine"),
            Stage::Parsing => write!(f, "parsing"),
            Stage::Aggregating => write!(f, "aggregating"),
            Stage::Done => write!(f, "done"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

/// What an operator should do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorAction {
    /// The caller sent something unusable
    FixInput,
    /// Transient outage, asking again may succeed
    Retry,
    /// The engine or a collaborator broke its contract
    Alert,
}

/// Typed failure of one validation request.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Validation failed while {stage}: {error}")]
pub struct ValidationFailure {
    pub stage: Stage,
    pub error: StageError,
}

impl ValidationFailure {
    pub fn new(stage: Stage, error: impl Into<StageError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }

    /// Error family: input, engine, parse or aggregation.
    pub fn kind(&self) -> &'static str {
        match &self.error {
            StageError::Input(_) => "input",
            StageError::Engine(_) => "engine",
            StageError::Parse(_) => "parse",
            StageError::Aggregation(_) => "aggregation",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match &self.error {
            StageError::Input(e) => match e {
                InputError::Empty => "INPUT_EMPTY",
                InputError::TooLong { .. } => "INPUT_TOO_LONG",
                InputError::InvalidValue { .. } => "INPUT_INVALID_VALUE",
                InputError::InvalidId(_) => "INPUT_INVALID_ID",
                InputError::NotFound(_) => "INPUT_NOT_FOUND",
                InputError::Storage(_) => "INPUT_STORAGE",
            },
            StageError::Engine(e) => match e {
                EngineError::Unreachable(_) => "ENGINE_UNREACHABLE",
                EngineError::Timeout { .. } => "ENGINE_TIMEOUT",
                EngineError::QuotaExceeded(_) => "ENGINE_QUOTA_EXCEEDED",
                EngineError::MalformedTransport(_) => "ENGINE_MALFORMED_TRANSPORT",
            },
            StageError::Parse(e) => match e {
                ParseError::Malformed(_) => "PARSE_MALFORMED",
                ParseError::InvalidStatus { .. } => "PARSE_INVALID_STATUS",
                ParseError::UnknownField(_) => "PARSE_UNKNOWN_FIELD",
                ParseError::DuplicateField(_) => "PARSE_DUPLICATE_FIELD",
                ParseError::MissingReasoning(_) => "PARSE_MISSING_REASONING",
                ParseError::ConfidenceOutOfRange(_) => "PARSE_CONFIDENCE_OUT_OF_RANGE",
            },
            StageError::Aggregation(AggregationError::EmptyVerdictSet) => {
                "AGGREGATION_EMPTY_VERDICT_SET"
            }
        }
    }

    pub fn operator_action(&self) -> OperatorAction {
        match &self.error {
            StageError::Input(InputError::Storage(_)) => OperatorAction::Alert,
            StageError::Input(_) => OperatorAction::FixInput,
            StageError::Engine(EngineError::MalformedTransport(_)) => OperatorAction::Alert,
            StageError::Engine(_) => OperatorAction::Retry,
            StageError::Parse(_) | StageError::Aggregation(_) => OperatorAction::Alert,
        }
    }
}
