//! cabled - cable design validation service.
//!
//! Wires the pure pipeline stages from `cable_common` to a reasoning engine
//! over HTTP, a SQLite design store, and an axum API.

pub mod cli;
pub mod config;
pub mod controller;
pub mod engine;
pub mod output;
pub mod routes;
pub mod server;
pub mod store;

pub use config::CabledConfig;
pub use controller::{ControllerPolicy, OrchestrationController};
pub use engine::{FakeReasoningEngine, FakeReply, HttpReasoningEngine, ReasoningEngine};
pub use server::AppState;
pub use store::{DesignRecord, DesignStore};
