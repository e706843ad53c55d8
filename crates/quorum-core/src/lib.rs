//! Core types, configuration, and error handling for the Quorum bot.
//!
//! This crate provides the shared foundation used by the other Quorum crates:
//! - [`QuorumError`] — unified error type using `thiserror`
//! - [`QuorumConfig`] — configuration loaded from `.quorum.toml` with
//!   environment overrides
//! - Shared types: [`PullRequestSnapshot`], [`FileChange`], [`FileStatus`],
//!   [`ReviewerRole`], [`ReviewOutcome`]

mod config;
mod error;
mod types;

pub use config::{GithubConfig, LimitConfig, LlmConfig, QuorumConfig};
pub use error::QuorumError;
pub use types::{FileChange, FileStatus, PullRequestSnapshot, ReviewOutcome, ReviewerRole};

/// A convenience `Result` type for Quorum operations.
pub type Result<T> = std::result::Result<T, QuorumError>;
