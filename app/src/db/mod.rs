// voyage_app/src/db/mod.rs

//! Postgres-backed `DocumentStore`: one `documents` table keyed by
//! `(collection, id)` with a `jsonb` body.
//!
//! Equality filters are pushed down as a `jsonb @>` containment test; the
//! remaining filters, ordering and limit are evaluated by `Query::apply` on
//! the narrowed rows.

pub mod seed;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{debug, instrument};
use voyage::store::{Document, DocumentStore, FilterOp, Query};
use voyage::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
  collection TEXT NOT NULL,
  id TEXT NOT NULL,
  data JSONB NOT NULL,
  PRIMARY KEY (collection, id)
);
CREATE INDEX IF NOT EXISTS documents_data_gin ON documents USING GIN (data jsonb_path_ops);
"#;

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
  pool: PgPool,
}

fn backend(err: sqlx::Error) -> StoreError {
  match err {
    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
      StoreError::Unavailable(err.to_string())
    }
    other => StoreError::from(anyhow::Error::new(other)),
  }
}

/// `{"a": {"b": v}}` for the dotted path `a.b`.
fn nest(path: &str, value: Value) -> Value {
  path.rsplit('.').fold(value, |inner, segment| {
    let mut object = Map::new();
    object.insert(segment.to_string(), inner);
    Value::Object(object)
  })
}

fn merge(target: &mut Value, addition: Value) {
  match (target, addition) {
    (Value::Object(into), Value::Object(from)) => {
      for (key, value) in from {
        match into.get_mut(&key) {
          Some(existing) => merge(existing, value),
          None => {
            into.insert(key, value);
          }
        }
      }
    }
    (slot, value) => *slot = value,
  }
}

/// Containment document for the query's equality filters on strings and booleans.
/// Numbers stay in memory so `2` still matches `2.0`.
pub(crate) fn containment(query: &Query) -> Value {
  let mut doc = Value::Object(Map::new());
  for filter in &query.filters {
    if filter.op == FilterOp::Eq && matches!(filter.value, Value::String(_) | Value::Bool(_)) {
      merge(&mut doc, nest(&filter.field, filter.value.clone()));
    }
  }
  doc
}

impl PgDocumentStore {
  pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;
    Ok(Self { pool })
  }

  pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    debug!("documents table ready");
    Ok(())
  }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
    let row: Option<(Value,)> = sqlx::query_as("SELECT data FROM documents WHERE collection = $1 AND id = $2")
      .bind(collection)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    Ok(row.map(|(data,)| Document {
      id: id.to_string(),
      data,
    }))
  }

  async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3) \
       ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data",
    )
    .bind(collection)
    .bind(id)
    .bind(data)
    .execute(&self.pool)
    .await
    .map_err(backend)?;
    Ok(())
  }

  async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE documents SET data = data || $3 WHERE collection = $1 AND id = $2")
      .bind(collection)
      .bind(id)
      .bind(Value::Object(patch))
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
      .bind(collection)
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "PgDocumentStore::query", skip(self, query), fields(filters = query.filters.len()))]
  async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
    let rows: Vec<(String, Value)> =
      sqlx::query_as("SELECT id, data FROM documents WHERE collection = $1 AND data @> $2")
        .bind(collection)
        .bind(containment(query))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
    Ok(query.apply(rows.into_iter().map(|(id, data)| Document { id, data })))
  }
}
