//! Test Helper Utilities
//!
//! Shared utilities for testing salescribe-server

#![allow(dead_code)]

pub mod backends;
pub mod generators;
pub mod http;
pub mod sales_data;

// Re-export commonly used items
pub use backends::{durable_gateway, ProbeBackend};
pub use generators::{BarrierGenerator, ScriptedGenerator};
pub use http::{json_body, multipart_request, MULTIPART_BOUNDARY};
pub use sales_data::{sales_csv, CANONICAL_HEADER, SAMPLE_ROW_COUNT, SAMPLE_TOTAL};
