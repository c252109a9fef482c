//! Shared types and pure pipeline stages for cable design validation.
//!
//! Everything in this crate is synchronous and free of I/O. The only stage
//! that suspends (the reasoning engine call) lives in `cabled`.
//!
//! Pipeline: `normalizer` -> `prompt` -> (engine) -> `parser` -> `aggregate`.

pub mod aggregate;
pub mod design;
pub mod error;
pub mod input;
pub mod normalizer;
pub mod parser;
pub mod prompt;
pub mod verdict;

pub use aggregate::{aggregate, Aggregate, ConfidenceBands, ConfidenceLevel, ConfidenceSource};
pub use design::{
    CanonicalDesign, ConductorClass, ConductorMaterial, DesignFields, DesignId, FieldName,
    InsulationMaterial, Provenance, Standard,
};
pub use error::{
    AggregationError, EngineError, InputError, OperatorAction, ParseError, Stage, StageError,
    ValidationFailure,
};
pub use input::{DesignInput, ValidationRequest};
pub use normalizer::{normalize, DesignLookup, InputLimits, LookupError, NormalizedInput};
pub use parser::parse_response;
pub use prompt::build_prompt;
pub use verdict::{FieldVerdict, ParsedVerdict, Status, ValidationOutcome};

/// Standards the reasoning engine is confined to.
pub const TARGET_STANDARDS: [&str; 2] = ["IEC 60502-1", "IEC 60228"];

/// Default cap on free-text input, in characters.
pub const DEFAULT_MAX_FREE_TEXT_CHARS: usize = 2000;
