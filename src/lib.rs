//! Draftwise - budget-aware social media draft generation
//!
//! A generation decision and learning engine with:
//! - Deterministic draft synthesis and a heuristic quality scorer
//! - Intent cache keyed by the normalized request
//! - Daily/monthly budget governor and an ROI gate for premium models
//! - Creative memory, angle suggestions and bandit variant selection
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use draftwise::{Config, GenerationEngine, SqliteStore, UnavailableProvider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(SqliteStore::open_in_memory()?);
//!     let engine = GenerationEngine::new(store, Arc::new(UnavailableProvider), Arc::new(Config::default()));
//!     let response = engine.generate(request).await?;
//!     println!("{}", response.drafts[0].text);
//!     Ok(())
//! }
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod types;
pub mod signals;
pub mod deterministic;
pub mod config;
pub mod error;
pub mod store;
pub mod llm;
pub mod telemetry;
pub mod learning;
pub mod orchestrator;
pub mod cli;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::GenerationError;
pub use llm::{LlmProvider, OpenRouterProvider, UnavailableProvider};
pub use orchestrator::{GenerationEngine, GenerationRequest, GenerationResponse, PublishRecord};
pub use store::{EngineStore, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - social media draft engine", NAME, VERSION)
}
