//! Loading already-processed identifiers from the output store.

use std::collections::HashSet;

use tracing::{info, instrument, warn};

use super::error::StoreError;
use super::OutputStore;
use crate::lookup::is_remote_failure_tag;
use crate::parser::canonicalize;

/// Which recorded rows count as "done" when resuming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResumePolicy {
    /// Every identifier with a row is skipped, whatever its outcome.
    #[default]
    AnyRecorded,
    /// Rows tagged `API_ERROR` or `REQUEST_FAILED` are looked up again.
    SuccessfulOnly,
}

/// Canonical identifiers that must not be looked up again.
///
/// Seeded from the output store at run start and extended in memory with
/// every identifier handled during the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSet {
    known: HashSet<String>,
}

impl ProgressSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `canonical` has already been handled.
    #[must_use]
    pub fn contains(&self, canonical: &str) -> bool {
        self.known.contains(canonical)
    }

    /// Marks `canonical` as handled. Returns `false` if it already was.
    pub fn insert(&mut self, canonical: impl Into<String>) -> bool {
        self.known.insert(canonical.into())
    }

    /// Number of known identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Whether no identifiers are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ProgressSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            known: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// What [`load_progress`] found.
#[derive(Debug)]
pub enum ProgressStatus {
    /// No output store yet.
    Absent,
    /// The store has a header but no rows.
    Empty,
    /// Query values were loaded.
    Loaded,
    /// The store has rows but no Query column.
    MissingQueryColumn,
    /// The store exists but could not be read.
    Unreadable(StoreError),
}

/// Result of reading progress from the output store.
#[derive(Debug)]
pub struct ProgressLoad {
    /// Identifiers to skip.
    pub set: ProgressSet,
    /// Condition of the store.
    pub status: ProgressStatus,
    /// Header row of the store, when one was read.
    pub header: Option<Vec<String>>,
}

impl ProgressLoad {
    fn empty(status: ProgressStatus, header: Option<Vec<String>>) -> Self {
        Self {
            set: ProgressSet::new(),
            status,
            header,
        }
    }
}

/// Reads the Query column of `store` into a [`ProgressSet`].
///
/// Never fails: an absent, empty, unreadable or Query-less store yields an
/// empty set, with the condition reported in [`ProgressLoad::status`] and
/// logged. Callers decide which conditions are fatal.
///
/// Stored values are canonicalized the same way inputs are, so numbers
/// written with separators by hand still match.
#[instrument(skip(store), fields(store = %store.location().display()))]
pub fn load_progress<S: OutputStore + ?Sized>(
    store: &S,
    query_label: &str,
    policy: ResumePolicy,
) -> ProgressLoad {
    let table = match store.read_table() {
        Ok(Some(table)) => table,
        Ok(None) => {
            info!("output store does not exist yet; starting fresh");
            return ProgressLoad::empty(ProgressStatus::Absent, None);
        }
        Err(error) => {
            warn!(%error, "could not read output store");
            return ProgressLoad::empty(ProgressStatus::Unreadable(error), None);
        }
    };

    let Some(query_index) = table.column_index(query_label) else {
        warn!(
            column = query_label,
            available = %table.headers.join(", "),
            "output store has no query column"
        );
        return ProgressLoad::empty(ProgressStatus::MissingQueryColumn, Some(table.headers));
    };

    if table.rows.is_empty() {
        info!("output store exists but has no rows");
        return ProgressLoad::empty(ProgressStatus::Empty, Some(table.headers));
    }

    let mut unresolved = 0_usize;
    let set: ProgressSet = table
        .rows
        .iter()
        .filter(|row| {
            let failed = policy == ResumePolicy::SuccessfulOnly
                && row.first().is_some_and(|status| is_remote_failure_tag(status));
            if failed {
                unresolved += 1;
            }
            !failed
        })
        .filter_map(|row| row.get(query_index))
        .map(|value| canonicalize(value))
        .filter(|canonical| !canonical.is_empty())
        .collect();

    info!(
        known = set.len(),
        unresolved,
        ?policy,
        "loaded previously processed phone numbers"
    );
    ProgressLoad {
        set,
        status: ProgressStatus::Loaded,
        header: Some(table.headers),
    }
}
