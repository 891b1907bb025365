//! Backend traits for the hosted relational API and object store.
//!
//! Every service talks to persistence through these traits, so the HTTP
//! clients in `rest` and the in-memory mocks in `memory` are interchangeable.

use crate::query::{Filter, Query, Row};
use ::async_trait::async_trait;
use rolodex_core::{Record, StorageError, StorageResult, Table};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Kind of backend call, used for failure injection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Count,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Count => "count",
        };
        f.write_str(s)
    }
}

/// Relational query API of the BaaS.
///
/// Mutations return the affected rows, mirroring `Prefer: return=representation`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows of `query.table` matching the query.
    async fn select(&self, query: &Query) -> StorageResult<Vec<Row>>;

    /// Insert rows, returning them as stored.
    async fn insert(&self, table: Table, rows: Vec<Row>) -> StorageResult<Vec<Row>>;

    /// Merge `patch` into every matching row, returning the updated rows.
    async fn update(&self, table: Table, filter: &Filter, patch: Row) -> StorageResult<Vec<Row>>;

    /// Delete matching rows, returning how many were removed.
    async fn delete(&self, table: Table, filter: &Filter) -> StorageResult<u64>;

    /// Number of matching rows.
    async fn count(&self, table: Table, filter: &Filter) -> StorageResult<u64>;

    /// Whether the backend is reachable.
    async fn health_check(&self) -> StorageResult<bool>;

    /// A handle that authenticates as the given user instead of the anon key.
    fn with_access_token(&self, access_token: &str) -> Arc<dyn Backend>;
}

/// Bucketed object storage of the BaaS.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `bucket/path`, returning the stored path.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Remove objects from a bucket.
    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()>;

    /// Public URL of an object in a public bucket.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    fn with_access_token(&self, access_token: &str) -> Arc<dyn ObjectStore>;
}

/// Serialize a record or patch into a row.
pub fn to_row<T: Serialize + ?Sized>(table: Table, value: &T) -> StorageResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(StorageError::Decode {
            table,
            reason: format!("expected a JSON object, got {}", other),
        }),
        Err(e) => Err(StorageError::Decode {
            table,
            reason: e.to_string(),
        }),
    }
}

/// Decode a row into a record.
pub fn from_row<T: Record>(row: Row) -> StorageResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StorageError::Decode {
        table: T::TABLE,
        reason: e.to_string(),
    })
}

/// Typed helpers over any `Backend`.
#[async_trait]
pub trait BackendExt: Backend {
    /// Select and decode.
    async fn fetch<T: Record>(&self, filter: Filter) -> StorageResult<Vec<T>> {
        self.fetch_query(&Query::table(T::TABLE).filter(filter)).await
    }

    /// Select with ordering/paging and decode. `query.table` is forced to `T::TABLE`.
    async fn fetch_query<T: Record>(&self, query: &Query) -> StorageResult<Vec<T>> {
        let mut query = query.clone();
        query.table = T::TABLE;
        self.select(&query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// First matching record, if any.
    async fn fetch_one<T: Record>(&self, filter: Filter) -> StorageResult<Option<T>> {
        let query = Query::table(T::TABLE).filter(filter).limit(1);
        Ok(self.fetch_query::<T>(&query).await?.into_iter().next())
    }

    async fn insert_record<T: Record>(&self, record: &T) -> StorageResult<T> {
        let row = to_row(T::TABLE, record)?;
        let mut stored = self.insert(T::TABLE, vec![row]).await?;
        match stored.pop() {
            Some(row) => from_row(row),
            None => Err(StorageError::NotFound {
                table: T::TABLE,
                id: record.id(),
            }),
        }
    }

    async fn insert_records<T: Record>(&self, records: &[T]) -> StorageResult<Vec<T>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let rows = records
            .iter()
            .map(|r| to_row(T::TABLE, r))
            .collect::<StorageResult<Vec<_>>>()?;
        self.insert(T::TABLE, rows)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    async fn update_records<T: Record>(&self, filter: &Filter, patch: Row) -> StorageResult<Vec<T>> {
        self.update(T::TABLE, filter, patch)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }
}

impl<B: Backend + ?Sized> BackendExt for B {}
