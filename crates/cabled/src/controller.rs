//! Orchestration controller.
//!
//! Drives one request through normalize -> prompt -> engine -> parse ->
//! aggregate. Holds nothing mutable: the policy is fixed at construction and
//! both collaborators sit behind `Arc`, so a single controller serves any
//! number of concurrent requests.
//!
//! Dropping the future returned by `validate` drops the in-flight engine
//! call with it; a cancelled request never yields an outcome.

use crate::config::CabledConfig;
use crate::engine::ReasoningEngine;
use cable_common::{
    aggregate, build_prompt, normalize, parse_response, ConfidenceBands, DesignLookup,
    EngineError, InputLimits, Stage, ValidationFailure, ValidationOutcome, ValidationRequest,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Immutable per-controller policy
#[derive(Debug, Clone)]
pub struct ControllerPolicy {
    /// Upper bound for a single engine call
    pub engine_timeout: Duration,
    /// Re-query once after a timeout. Never applies to other errors.
    pub retry_on_timeout: bool,
    pub bands: ConfidenceBands,
    pub limits: InputLimits,
}

impl Default for ControllerPolicy {
    fn default() -> Self {
        Self {
            engine_timeout: Duration::from_secs(30),
            retry_on_timeout: false,
            bands: ConfidenceBands::default(),
            limits: InputLimits::default(),
        }
    }
}

impl ControllerPolicy {
    pub fn from_config(config: &CabledConfig) -> Self {
        Self {
            engine_timeout: config.engine.timeout(),
            retry_on_timeout: config.validation.retry_on_timeout,
            bands: config.validation.confidence_bands,
            limits: config.validation.input_limits(),
        }
    }
}

pub struct OrchestrationController {
    engine: Arc<dyn ReasoningEngine>,
    store: Arc<dyn DesignLookup>,
    policy: ControllerPolicy,
}

impl OrchestrationController {
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        store: Arc<dyn DesignLookup>,
        policy: ControllerPolicy,
    ) -> Self {
        Self {
            engine,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &ControllerPolicy {
        &self.policy
    }

    pub fn engine_name(&self) -> String {
        self.engine.name()
    }

    /// Validate one design. Either a complete outcome or a failure tagged
    /// with the stage that produced it; never a partial result.
    pub async fn validate(
        &self,
        request: ValidationRequest,
    ) -> Result<ValidationOutcome, ValidationFailure> {
        let request_id = Uuid::new_v4();
        let span = info_span!("validate", request_id = %request_id);
        let start = Instant::now();

        let result = self.run(request).instrument(span.clone()).await;

        let _enter = span.enter();
        match &result {
            Ok(outcome) => info!(
                "[+]  {} (confidence {:.2}, {} verdicts) in {}ms",
                outcome.overall_status(),
                outcome.overall_confidence(),
                outcome.field_verdicts().len(),
                start.elapsed().as_millis()
            ),
            Err(failure) => warn!(
                code = failure.code(),
                action = ?failure.operator_action(),
                "[-]  {}",
                failure
            ),
        }
        result
    }

    async fn run(&self, request: ValidationRequest) -> Result<ValidationOutcome, ValidationFailure> {
        info!(stage = %Stage::Normalizing, "Normalizing input");
        let normalized = request
            .into_input()
            .and_then(|input| normalize(input, self.store.as_ref(), &self.policy.limits))
            .map_err(|e| ValidationFailure::new(Stage::Normalizing, e))?;
        let provenance = normalized.design.provenance;

        info!(stage = %Stage::Prompting, provenance = %provenance, "Building prompt");
        let prompt = build_prompt(&normalized);
        debug!("Prompt ({} chars)", prompt.len());

        info!(stage = %Stage::AwaitingEngine, engine = %self.engine.name(), "Querying engine");
        let raw = self
            .query_engine(&prompt)
            .await
            .map_err(|e| ValidationFailure::new(Stage::AwaitingEngine, e))?;

        info!(stage = %Stage::Parsing, "Parsing engine output ({} chars)", raw.len());
        let parsed =
            parse_response(&raw).map_err(|e| ValidationFailure::new(Stage::Parsing, e))?;

        info!(stage = %Stage::Aggregating, "Aggregating {} verdicts", parsed.field_verdicts.len());
        let summary = aggregate(&parsed, &self.policy.bands)
            .map_err(|e| ValidationFailure::new(Stage::Aggregating, e))?;

        info!(stage = %Stage::Done, "Validation complete");
        Ok(ValidationOutcome::new(parsed, summary, provenance))
    }

    /// One engine call, plus one more if the first timed out and the policy
    /// allows it.
    async fn query_engine(&self, prompt: &str) -> Result<String, EngineError> {
        let attempts = if self.policy.retry_on_timeout { 2 } else { 1 };
        let mut attempt = 1;
        loop {
            match self.query_once(prompt).await {
                Err(EngineError::Timeout { after_ms }) if attempt < attempts => {
                    warn!("[!]  Engine timed out after {}ms, retrying once", after_ms);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn query_once(&self, prompt: &str) -> Result<String, EngineError> {
        let timeout = self.policy.engine_timeout;
        match tokio::time::timeout(timeout, self.engine.send(prompt, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout {
                after_ms: timeout.as_millis() as u64,
            }),
        }
    }
}
