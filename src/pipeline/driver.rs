//! The batch pipeline state machine.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::accumulator::BatchAccumulator;
use super::error::PipelineError;
use crate::config::PipelineConfig;
use crate::lookup::{Lookup, Outcome};
use crate::parser::{Identifier, NormalizeError, canonicalize, normalize};
use crate::record::to_record;
use crate::store::{
    Checkpointer, OutputStore, ProgressSet, ProgressStatus, StoreError, load_progress,
};

/// Lifecycle of a [`Pipeline`].
///
/// `Idle -> Loading -> Running -> Draining -> Done`, with `Failed`
/// reachable from `Loading`, `Running` and `Draining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed, not started.
    Idle,
    /// Reading progress from the output store.
    Loading,
    /// Processing inputs.
    Running,
    /// Flushing the final partial batch.
    Draining,
    /// Finished successfully.
    Done,
    /// Stopped by a fatal error.
    Failed,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Input cells seen.
    pub total: usize,
    /// Blank cells skipped.
    pub skipped_blank: usize,
    /// Identifiers skipped because they were already recorded.
    pub skipped_duplicate: usize,
    /// Identifiers rejected by the normalizer.
    pub rejected: usize,
    /// Lookups that returned a successful response.
    pub succeeded: usize,
    /// Lookups that ended in an API or request failure.
    pub failed: usize,
    /// Checkpoints written.
    pub flushes: usize,
    /// Rows appended to the output store.
    pub rows_written: usize,
}

impl RunSummary {
    /// Remote lookups issued.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// What a run would do, computed without network calls or writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    /// Input cells seen.
    pub total: usize,
    /// Blank cells that would be skipped.
    pub skipped_blank: usize,
    /// Identifiers already recorded.
    pub skipped_duplicate: usize,
    /// Identifiers the normalizer would reject.
    pub rejected: usize,
    /// Identifiers that would be looked up, in order.
    pub lookups: Vec<String>,
}

impl RunPlan {
    /// Lower bound on wall time spent waiting on the rate limiter.
    #[must_use]
    pub fn estimated_wait(&self, interval: Duration) -> Duration {
        let gaps = u32::try_from(self.lookups.len().saturating_sub(1)).unwrap_or(u32::MAX);
        interval.saturating_mul(gaps)
    }
}

/// How one input cell is handled.
#[derive(Debug)]
enum Disposition {
    Blank,
    Duplicate,
    Rejected(NormalizeError),
    Lookup(Identifier),
}

/// Classifies `raw` against `seen`, marking every non-blank identifier as
/// handled so it is processed at most once per run.
fn classify(raw: &str, seen: &mut ProgressSet) -> (String, Disposition) {
    let canonical = canonicalize(raw);
    if canonical.is_empty() {
        return (canonical, Disposition::Blank);
    }
    if !seen.insert(canonical.clone()) {
        return (canonical, Disposition::Duplicate);
    }
    let disposition = match normalize(raw) {
        Ok(identifier) => Disposition::Lookup(identifier),
        Err(error) => Disposition::Rejected(error),
    };
    (canonical, disposition)
}

/// Drives identifiers through lookup, mapping, and checkpointing.
///
/// A pipeline runs once. Lookups are awaited one at a time; the only
/// suspension points are the rate-limit wait and the HTTP call. Killing the
/// process between checkpoints loses at most one batch of lookups, which
/// the next run repeats.
#[derive(Debug)]
pub struct Pipeline<L, S> {
    config: PipelineConfig,
    lookup: L,
    checkpointer: Checkpointer<S>,
    state: PipelineState,
}

impl<L: Lookup, S: OutputStore> Pipeline<L, S> {
    /// Creates an idle pipeline.
    #[must_use]
    pub fn new(config: PipelineConfig, lookup: L, store: S) -> Self {
        let checkpointer = Checkpointer::new(store, &config.schema);
        Self {
            config,
            lookup,
            checkpointer,
            state: PipelineState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The output store.
    #[must_use]
    pub fn store(&self) -> &S {
        self.checkpointer.store()
    }

    /// Consumes the pipeline, returning the output store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.checkpointer.into_store()
    }

    /// Processes `inputs` in order and returns the run's counters.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Preflight`] if the output store exists but cannot
    ///   be resumed from (unreadable, no Query column, header differs from
    ///   the schema). No lookup is issued.
    /// - [`PipelineError::Persistence`] if a checkpoint fails. Rows from
    ///   earlier checkpoints stay in the store.
    /// - [`PipelineError::InvalidState`] if the pipeline already ran.
    #[instrument(skip_all, fields(store = %self.checkpointer.store().location().display()))]
    pub async fn run<I>(&mut self, inputs: I) -> Result<RunSummary, PipelineError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::InvalidState { state: self.state });
        }

        self.state = PipelineState::Loading;
        let mut seen = match self.preflight() {
            Ok(seen) => seen,
            Err(error) => {
                self.state = PipelineState::Failed;
                return Err(error);
            }
        };

        self.state = PipelineState::Running;
        let mut summary = RunSummary::default();
        let mut accumulator = BatchAccumulator::new(self.config.batch_size);

        for raw in inputs {
            let raw = raw.as_ref();
            summary.total += 1;

            let (canonical, disposition) = classify(raw, &mut seen);
            match disposition {
                Disposition::Blank => {
                    debug!(row = summary.total, "skipping blank input");
                    summary.skipped_blank += 1;
                    continue;
                }
                Disposition::Duplicate => {
                    debug!(identifier = %canonical, "already processed; skipping");
                    summary.skipped_duplicate += 1;
                    continue;
                }
                Disposition::Rejected(error) => {
                    warn!(identifier = %canonical, %error, "invalid phone number");
                    summary.rejected += 1;
                    accumulator.carry(to_record(
                        &Outcome::InvalidFormat,
                        &canonical,
                        &self.config.schema,
                    ));
                }
                Disposition::Lookup(identifier) => {
                    let outcome = self.lookup.lookup(&identifier, &self.config.schema).await;
                    if outcome.is_success() {
                        summary.succeeded += 1;
                        info!(identifier = %identifier, "processed");
                    } else {
                        summary.failed += 1;
                        warn!(identifier = %identifier, outcome = %outcome, "lookup failed");
                    }
                    accumulator.accept(to_record(
                        &outcome,
                        identifier.as_str(),
                        &self.config.schema,
                    ));
                }
            }

            self.checkpoint(&mut accumulator, false)?;
        }

        self.state = PipelineState::Draining;
        self.checkpoint(&mut accumulator, true)?;

        self.state = PipelineState::Done;
        summary.flushes = self.checkpointer.flushes();
        summary.rows_written = self.checkpointer.rows_written();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            rejected = summary.rejected,
            skipped_duplicate = summary.skipped_duplicate,
            skipped_blank = summary.skipped_blank,
            rows_written = summary.rows_written,
            "run complete"
        );
        Ok(summary)
    }

    /// Classifies `inputs` exactly as [`run`](Self::run) would, without
    /// issuing lookups or writing to the store.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Preflight`] under the same conditions as
    /// `run`.
    #[instrument(skip_all, fields(store = %self.checkpointer.store().location().display()))]
    pub fn plan<I>(&self, inputs: I) -> Result<RunPlan, PipelineError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut seen = self.preflight()?;
        let mut plan = RunPlan::default();

        for raw in inputs {
            plan.total += 1;
            match classify(raw.as_ref(), &mut seen).1 {
                Disposition::Blank => plan.skipped_blank += 1,
                Disposition::Duplicate => plan.skipped_duplicate += 1,
                Disposition::Rejected(_) => plan.rejected += 1,
                Disposition::Lookup(identifier) => plan.lookups.push(identifier.into_string()),
            }
        }

        debug!(lookups = plan.lookups.len(), "planned run");
        Ok(plan)
    }

    /// Loads progress and checks the store can be appended to.
    fn preflight(&self) -> Result<ProgressSet, PipelineError> {
        let schema = &self.config.schema;
        let store = self.checkpointer.store();
        let load = load_progress(store, schema.query_label(), self.config.resume_policy);

        match load.status {
            ProgressStatus::Absent | ProgressStatus::Empty | ProgressStatus::Loaded => {}
            ProgressStatus::MissingQueryColumn => {
                let found = load.header.unwrap_or_default();
                return Err(PipelineError::Preflight(StoreError::missing_column(
                    store.location(),
                    schema.query_label(),
                    &found,
                )));
            }
            ProgressStatus::Unreadable(error) => return Err(PipelineError::Preflight(error)),
        }

        if let Some(header) = &load.header
            && !schema.matches_header(header)
        {
            return Err(PipelineError::Preflight(StoreError::SchemaMismatch {
                path: store.location().to_path_buf(),
                expected: schema.labels().collect::<Vec<_>>().join(","),
                found: header.join(","),
            }));
        }

        Ok(load.set)
    }

    fn checkpoint(
        &mut self,
        accumulator: &mut BatchAccumulator,
        force: bool,
    ) -> Result<(), PipelineError> {
        if let Err(source) = accumulator.maybe_flush(&mut self.checkpointer, force) {
            self.state = PipelineState::Failed;
            return Err(PipelineError::Persistence {
                flushed_rows: self.checkpointer.rows_written(),
                source,
            });
        }
        Ok(())
    }
}
