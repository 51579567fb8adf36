//! In-memory buffer between lookups and checkpoints.

use tracing::debug;

use crate::record::LookupRecord;
use crate::store::{Checkpointer, OutputStore, StoreError};

/// Default number of completed lookups per checkpoint.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Buffers records until a batch of completed lookups is ready to persist.
///
/// Only records passed to [`accept`](Self::accept) count toward the batch
/// size. Rejected inputs go through [`carry`](Self::carry): they are
/// persisted with the next flush but never trigger one on their own.
#[derive(Debug)]
pub struct BatchAccumulator {
    batch_size: usize,
    pending: Vec<LookupRecord>,
    pending_lookups: usize,
}

impl BatchAccumulator {
    /// Creates an accumulator flushing every `batch_size` lookups (minimum 1).
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            pending: Vec::with_capacity(batch_size),
            pending_lookups: 0,
        }
    }

    /// Buffers the record of a completed lookup.
    pub fn accept(&mut self, record: LookupRecord) {
        self.pending.push(record);
        self.pending_lookups += 1;
    }

    /// Buffers a record that rides along with the next flush.
    pub fn carry(&mut self, record: LookupRecord) {
        self.pending.push(record);
    }

    /// Records waiting to be flushed.
    #[must_use]
    pub fn pending(&self) -> &[LookupRecord] {
        &self.pending
    }

    /// Completed lookups waiting to be flushed.
    #[must_use]
    pub fn pending_lookups(&self) -> usize {
        self.pending_lookups
    }

    /// Configured batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether enough lookups are buffered to flush.
    #[must_use]
    pub fn is_due(&self) -> bool {
        self.pending_lookups >= self.batch_size
    }

    /// Flushes the buffer through `checkpointer` when a batch is due or
    /// `force` is set.
    ///
    /// Returns the number of rows written, or `None` when nothing was
    /// flushed. An empty buffer is never flushed, even when forced. The
    /// buffer is cleared only after the checkpointer reports success, so a
    /// failed flush leaves every pending record in place.
    ///
    /// # Errors
    ///
    /// Propagates the checkpointer's [`StoreError`].
    pub fn maybe_flush<S: OutputStore>(
        &mut self,
        checkpointer: &mut Checkpointer<S>,
        force: bool,
    ) -> Result<Option<usize>, StoreError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        if !force && !self.is_due() {
            return Ok(None);
        }

        debug!(
            rows = self.pending.len(),
            lookups = self.pending_lookups,
            force,
            "flushing batch"
        );
        let written = checkpointer.flush(&self.pending)?;
        self.pending.clear();
        self.pending_lookups = 0;
        Ok(Some(written))
    }
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
