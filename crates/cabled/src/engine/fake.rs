//! Scripted reasoning engine for tests and offline runs.

use super::ReasoningEngine;
use async_trait::async_trait;
use cable_common::EngineError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted engine reply
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Return this text immediately
    Text(String),
    /// Fail with this error
    Error(EngineError),
    /// Sleep, then return the text. Ignores the timeout argument so the
    /// controller's own deadline is what gets exercised.
    Delayed(Duration, String),
}

/// Fake engine: replies are consumed in order, the last one repeats.
pub struct FakeReasoningEngine {
    replies: Mutex<Vec<FakeReply>>,
    prompts: Mutex<Vec<String>>,
    cancelled: Arc<AtomicUsize>,
}

/// Counts a delayed reply that was dropped before it finished sleeping
struct CancelGuard {
    counter: Arc<AtomicUsize>,
    armed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl FakeReasoningEngine {
    pub fn new(replies: Vec<FakeReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
            cancelled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![FakeReply::Text(text.into())])
    }

    pub fn always_error(error: EngineError) -> Self {
        Self::new(vec![FakeReply::Error(error)])
    }

    pub fn with_delay(delay: Duration, text: impl Into<String>) -> Self {
        Self::new(vec![FakeReply::Delayed(delay, text.into())])
    }

    /// Number of `send` calls so far
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    /// Every prompt received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Delayed replies abandoned mid-sleep because the caller dropped them
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Option<FakeReply> {
        let mut replies = self.replies.lock().ok()?;
        match replies.len() {
            0 => None,
            1 => Some(replies[0].clone()),
            _ => Some(replies.remove(0)),
        }
    }
}

#[async_trait]
impl ReasoningEngine for FakeReasoningEngine {
    async fn send(&self, prompt: &str, _timeout: Duration) -> Result<String, EngineError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match self.next_reply() {
            Some(FakeReply::Text(text)) => Ok(text),
            Some(FakeReply::Error(err)) => Err(err),
            Some(FakeReply::Delayed(delay, text)) => {
                let mut guard = CancelGuard {
                    counter: self.cancelled.clone(),
                    armed: true,
                };
                tokio::time::sleep(delay).await;
                guard.armed = false;
                Ok(text)
            }
            None => Err(EngineError::MalformedTransport(
                "fake engine has no scripted reply".to_string(),
            )),
        }
    }

    fn name(&self) -> String {
        "fake".to_string()
    }
}
