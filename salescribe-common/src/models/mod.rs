//! Domain models shared between the ingestion pipeline, storage and generation
//!
//! Every persisted entity carries the [`Scope`] it belongs to. Identifiers are
//! assigned by the storage backend.

mod summary;

pub use summary::{DataSummary, DateRange, ProductTotal};

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder for missing text fields
pub const UNKNOWN: &str = "Unknown";

const SCOPE_MAX_LEN: usize = 128;

/// Tenant/user isolation key attached to every stored entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// Scope used when a request does not name one
    pub const DEFAULT: &'static str = "default";

    /// Validate and wrap a raw scope key (1-128 chars of `[A-Za-z0-9_.-]`)
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("scope must not be empty".to_string()));
        }
        if trimmed.len() > SCOPE_MAX_LEN {
            return Err(Error::InvalidInput(format!(
                "scope exceeds {} characters",
                SCOPE_MAX_LEN
            )));
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(Error::InvalidInput(format!(
                "scope contains invalid character {:?}",
                bad
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One normalized sales row as produced by the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRow {
    pub date: NaiveDate,
    pub product: String,
    pub category: String,
    pub amount: Decimal,
    pub quantity: u32,
    pub region: String,
}

/// Stored record: a [`SalesRow`] owned by an upload batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub scope: Scope,
    pub batch_id: i64,
    #[serde(flatten)]
    pub row: SalesRow,
    pub created_at: DateTime<Utc>,
}

/// Upload batch before it has been assigned an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewUploadBatch {
    pub fingerprint: String,
    pub filename: String,
    pub row_count: u64,
    pub received_at: DateTime<Utc>,
}

/// Record of one successfully ingested upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadBatch {
    pub id: i64,
    pub scope: Scope,
    pub fingerprint: String,
    pub filename: String,
    pub row_count: u64,
    pub received_at: DateTime<Utc>,
}

/// Article before it has been assigned an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub kind: AgentKind,
    pub title: String,
    pub body: String,
    pub generated_date: NaiveDate,
}

/// Generated article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub scope: Scope,
    pub kind: AgentKind,
    pub title: String,
    pub body: String,
    pub generated_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// The five content-generation perspectives, in their fixed fan-in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    MarketAnalyst,
    BusinessReporter,
    SalesStrategist,
    TrendForecaster,
    ExecutiveBriefer,
}

impl AgentKind {
    /// All kinds in result order
    pub const ALL: [AgentKind; 5] = [
        AgentKind::MarketAnalyst,
        AgentKind::BusinessReporter,
        AgentKind::SalesStrategist,
        AgentKind::TrendForecaster,
        AgentKind::ExecutiveBriefer,
    ];

    /// Stable tag used in storage and on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::MarketAnalyst => "market_analyst",
            AgentKind::BusinessReporter => "business_reporter",
            AgentKind::SalesStrategist => "sales_strategist",
            AgentKind::TrendForecaster => "trend_forecaster",
            AgentKind::ExecutiveBriefer => "executive_briefer",
        }
    }

    /// Position in [`AgentKind::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown agent kind: {}", s)))
    }
}
