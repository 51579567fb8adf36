//! Phonecheck Core Library
//!
//! Validates lists of phone numbers against a remote lookup service and
//! appends one fixed-width record per number to a CSV output store. Runs
//! are resumable: numbers already present in the output are never looked up
//! again, and results are checkpointed every few lookups.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Phone number canonicalization and validation
//! - [`lookup`] - HTTP lookup client, rate limiter, and retry decorator
//! - [`record`] - Output schema and outcome-to-record mapping
//! - [`store`] - Input reading, progress loading, and checkpointing
//! - [`pipeline`] - The batch state machine tying it together
//! - [`config`] - Defaults and the optional TOML config file

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod lookup;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigError, FileConfig, PipelineConfig};
pub use lookup::{HttpLookup, Lookup, Outcome, RateLimited, RateLimiter, RetryPolicy, Retrying};
pub use parser::{Identifier, NormalizeError, canonicalize, normalize};
pub use pipeline::{Pipeline, PipelineError, PipelineState, RunPlan, RunSummary};
pub use record::{LookupRecord, Schema, SchemaField, to_record};
pub use store::{CsvStore, OutputStore, PHONE_NUMBER_COLUMN, StoreError, read_input};
