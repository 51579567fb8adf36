//! Resumable batch pipeline.
//!
//! [`Pipeline`] pulls one input at a time, skips identifiers already in the
//! output store, rejects malformed ones, looks up the rest, and hands each
//! record to a [`BatchAccumulator`] that checkpoints every few lookups.
//!
//! # Example
//!
//! ```no_run
//! use phonecheck_core::config::PipelineConfig;
//! use phonecheck_core::pipeline::Pipeline;
//! use phonecheck_core::store::{CsvStore, PHONE_NUMBER_COLUMN, read_input};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let lookup = config.lookup_client()?;
//! let inputs = read_input("numbers.csv".as_ref(), PHONE_NUMBER_COLUMN)?;
//!
//! let mut pipeline = Pipeline::new(config, lookup, CsvStore::new("results.csv"));
//! let summary = pipeline.run(&inputs).await?;
//! println!("{} rows written", summary.rows_written);
//! # Ok(())
//! # }
//! ```

mod accumulator;
mod driver;
mod error;

pub use accumulator::{BatchAccumulator, DEFAULT_BATCH_SIZE};
pub use driver::{Pipeline, PipelineState, RunPlan, RunSummary};
pub use error::PipelineError;
