//! GitHub integration for the Quorum bot.
//!
//! Provides the pull-request data fetcher (snapshot + deterministic diff
//! truncation) and the marker-comment publisher (idempotent upsert).

pub mod client;
pub mod fetch;
pub mod publish;

pub use client::GitHubClient;
pub use publish::{CommentAction, COMMENT_HEADER, COMMENT_MARKER};
