//! Reasoning engine boundary.
//!
//! The controller only ever sees `ReasoningEngine`: a prompt goes in, raw
//! text comes out. Production uses `HttpReasoningEngine`; tests use
//! `FakeReasoningEngine` with scripted replies and no network.

pub mod fake;
pub mod http;

use async_trait::async_trait;
use cable_common::EngineError;
use std::time::Duration;

pub use fake::{FakeReasoningEngine, FakeReply};
pub use http::HttpReasoningEngine;

/// Stateless, replaceable reasoning backend.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Send one prompt and return the engine's raw text.
    ///
    /// Implementations should give up after `timeout`; the controller also
    /// enforces it independently.
    async fn send(&self, prompt: &str, timeout: Duration) -> Result<String, EngineError>;

    /// Backend and model, for logs.
    fn name(&self) -> String;
}
