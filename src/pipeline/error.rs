//! Fatal pipeline errors.
//!
//! Per-identifier failures (bad format, API errors, network errors) are
//! recorded as data and never show up here.

use thiserror::Error;

use super::driver::PipelineState;
use crate::store::StoreError;

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The output store cannot be resumed from. Raised before any lookup.
    #[error("cannot resume from output store: {0}")]
    Preflight(#[source] StoreError),

    /// A checkpoint could not be saved. Earlier checkpoints remain durable.
    #[error("failed to save checkpoint ({flushed_rows} rows already saved this run): {source}")]
    Persistence {
        /// Rows durably written before the failure.
        flushed_rows: usize,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// `run` was called on a pipeline that already ran.
    #[error("pipeline cannot start from state {state:?}")]
    InvalidState {
        /// State the pipeline was in.
        state: PipelineState,
    },
}

impl PipelineError {
    /// Whether the error happened before any lookup was issued.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::Preflight(_))
    }
}
