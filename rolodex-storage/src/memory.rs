//! In-memory backend and object store for testing.

use crate::backend::{from_row, Backend, ObjectStore, Operation};
use crate::query::{Filter, Query, Row};
use ::async_trait::async_trait;
use rolodex_core::{Record, StorageError, StorageResult, Table};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

fn injected(table: Table, op: Operation) -> StorageError {
    StorageError::RequestFailed {
        status: 503,
        message: format!("simulated network failure on {} {}", op, table),
    }
}

/// In-memory mock of the relational API.
///
/// Cloning shares the underlying tables.
#[derive(Debug, Clone)]
pub struct MockBackend {
    tables: Arc<RwLock<HashMap<Table, Vec<Row>>>>,
    failures: Arc<Mutex<Vec<(Table, Operation)>>>,
    calls: Arc<AtomicUsize>,
    healthy: Arc<AtomicBool>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            tables: Arc::default(),
            failures: Arc::default(),
            calls: Arc::default(),
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `op` on `table` fail with a 503.
    pub fn fail_next(&self, table: Table, op: Operation) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((table, op));
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Total backend calls made so far (health checks excluded).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of a table.
    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.tables
            .read()
            .map(|t| t.get(&table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.tables
            .read()
            .map(|t| t.get(&table).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Snapshot of a table decoded into records. Rows that fail to decode are skipped.
    pub fn records<T: Record>(&self) -> Vec<T> {
        self.rows(T::TABLE)
            .into_iter()
            .filter_map(|row| from_row(row).ok())
            .collect()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        if let Ok(mut tables) = self.tables.write() {
            tables.clear();
        }
    }

    fn begin(&self, table: Table, op: Operation) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut failures = self.failures.lock().map_err(|_| StorageError::LockPoisoned)?;
        if let Some(pos) = failures.iter().position(|f| *f == (table, op)) {
            failures.remove(pos);
            return Err(injected(table, op));
        }
        Ok(())
    }
}

fn row_id(row: &Row) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

#[async_trait]
impl Backend for MockBackend {
    async fn select(&self, query: &Query) -> StorageResult<Vec<Row>> {
        self.begin(query.table, Operation::Select)?;
        let tables = self.tables.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(tables
            .get(&query.table)
            .map(|rows| query.apply(rows))
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, rows: Vec<Row>) -> StorageResult<Vec<Row>> {
        self.begin(table, Operation::Insert)?;
        let mut tables = self.tables.write().map_err(|_| StorageError::LockPoisoned)?;
        let existing = tables.entry(table).or_default();

        // All-or-nothing, like a single bulk insert statement.
        let mut seen: Vec<Uuid> = existing.iter().filter_map(row_id).collect();
        for row in &rows {
            if let Some(id) = row_id(row) {
                if seen.contains(&id) {
                    return Err(StorageError::DuplicateKey { table, id });
                }
                seen.push(id);
            }
        }

        existing.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Row) -> StorageResult<Vec<Row>> {
        self.begin(table, Operation::Update)?;
        let mut tables = self.tables.write().map_err(|_| StorageError::LockPoisoned)?;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|r| filter.matches(r)) {
            for (key, value) in &patch {
                row.insert(key.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> StorageResult<u64> {
        self.begin(table, Operation::Delete)?;
        let mut tables = self.tables.write().map_err(|_| StorageError::LockPoisoned)?;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok((before - rows.len()) as u64)
    }

    async fn count(&self, table: Table, filter: &Filter) -> StorageResult<u64> {
        self.begin(table, Operation::Count)?;
        let tables = self.tables.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(tables
            .get(&table)
            .map_or(0, |rows| rows.iter().filter(|r| filter.matches(r)).count()) as u64)
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }

    fn with_access_token(&self, _access_token: &str) -> Arc<dyn Backend> {
        Arc::new(self.clone())
    }
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory mock of the object store.
#[derive(Debug, Clone)]
pub struct MockObjectStore {
    base_url: String,
    objects: Arc<RwLock<HashMap<(String, String), StoredObject>>>,
    fail_next_upload: Arc<AtomicBool>,
}

impl MockObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Arc::default(),
            fail_next_upload: Arc::default(),
        }
    }

    pub fn fail_next_upload(&self) {
        self.fail_next_upload.store(true, Ordering::SeqCst);
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .ok()
            .and_then(|o| o.get(&(bucket.to_string(), path.to_string())).cloned())
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new("http://localhost:54321")
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        if self.fail_next_upload.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Upload {
                bucket: bucket.to_string(),
                reason: "simulated network failure".to_string(),
            });
        }
        let mut objects = self.objects.write().map_err(|_| StorageError::LockPoisoned)?;
        let key = (bucket.to_string(), path.to_string());
        if objects.contains_key(&key) {
            return Err(StorageError::Upload {
                bucket: bucket.to_string(),
                reason: format!("object {} already exists", path),
            });
        }
        objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(path.to_string())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        let mut objects = self.objects.write().map_err(|_| StorageError::LockPoisoned)?;
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, path
        )
    }

    fn with_access_token(&self, _access_token: &str) -> Arc<dyn ObjectStore> {
        Arc::new(self.clone())
    }
}
