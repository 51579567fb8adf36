use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use phonecheck_core::store::Table;
use phonecheck_core::{Identifier, Lookup, LookupRecord, OutputStore, Outcome, Schema, SchemaField, StoreError};
use tokio::time::Instant;

/// Output store kept in memory. Can be told to fail its n-th append.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub path: PathBuf,
    pub table: Option<Table>,
    pub appends: usize,
    /// 1-based index of the append that fails.
    pub fail_on_append: Option<usize>,
}

impl MemoryStore {
    pub fn failing_on(append: usize) -> Self {
        Self {
            fail_on_append: Some(append),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.table.as_ref().map(|t| t.rows.clone()).unwrap_or_default()
    }

    pub fn queries(&self) -> Vec<String> {
        self.rows()
            .into_iter()
            .filter_map(|row| row.last().cloned())
            .collect()
    }
}

impl OutputStore for MemoryStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<Option<Table>, StoreError> {
        Ok(self.table.clone())
    }

    fn append(&mut self, header: &[String], records: &[LookupRecord]) -> Result<(), StoreError> {
        if self.fail_on_append == Some(self.appends + 1) {
            return Err(StoreError::io(&self.path, std::io::Error::other("disk full")));
        }
        let table = self.table.get_or_insert_with(|| Table {
            headers: header.to_vec(),
            rows: Vec::new(),
        });
        table.rows.extend(records.iter().map(|r| r.fields().to_vec()));
        self.appends += 1;
        Ok(())
    }
}

/// Lookup that answers from a script and records when each call started.
#[derive(Debug)]
pub struct ScriptedLookup {
    responses: HashMap<String, Outcome>,
    fallback: Outcome,
    latency: Duration,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedLookup {
    /// Answers every identifier with `fallback`.
    pub fn answering(fallback: Outcome) -> Self {
        Self {
            responses: HashMap::new(),
            fallback,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers `identifier` with `outcome`.
    pub fn with(mut self, identifier: &str, outcome: Outcome) -> Self {
        self.responses.insert(identifier.to_string(), outcome);
        self
    }

    /// Makes every call take `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl Lookup for ScriptedLookup {
    async fn lookup(&self, identifier: &Identifier, _schema: &Schema) -> Outcome {
        self.calls
            .lock()
            .unwrap()
            .push((identifier.to_string(), Instant::now()));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.responses
            .get(identifier.as_str())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Successful response echoing `identifier` in a three-field schema.
pub fn success(identifier: &str) -> Outcome {
    Outcome::Success(vec!["success".into(), "Acme Mobile".into(), identifier.into()])
}

/// `Status, Carrier, Query`.
pub fn small_schema() -> Schema {
    Schema::new(vec![
        SchemaField::new("status", "Status"),
        SchemaField::new("carrier", "Carrier"),
        SchemaField::new("query", "Query"),
    ])
    .unwrap()
}
