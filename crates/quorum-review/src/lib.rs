//! Review orchestration for the Quorum bot.
//!
//! Provides the LLM session client, prompt construction, the per-role
//! reviewer runner, the fan-out/fan-in orchestrator, and report rendering.

pub mod orchestrator;
pub mod prompt;
pub mod report;
pub mod runner;
pub mod session;

pub use report::AggregatedReport;
pub use session::{SessionClient, SystemMessageMode};
