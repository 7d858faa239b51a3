//! # Salescribe Common Library
//!
//! Shared code for the Salescribe service crates including:
//! - Domain models (scopes, upload batches, records, articles, agent kinds)
//! - Data summary aggregation
//! - Configuration loading
//! - Human-readable number formatting

pub mod config;
pub mod error;
pub mod human_format;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{AgentKind, Scope};
