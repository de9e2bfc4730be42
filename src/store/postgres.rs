//! # Postgres Document Store
//!
//! Collections live in one JSONB table. Equality filters become a
//! containment test (`body @> $filter`) so a GIN index serves them, and the
//! timestamp sort casts the writer's RFC3339 string to `timestamptz` so
//! mixed precisions and offsets order by instant. Values that are not
//! RFC3339 strings sort as NULL, after every timestamped row.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use super::errors::{StoreError, StoreResult};
use super::traits::{bounded, DocumentFilter, DocumentSort, DocumentStore};
use crate::config::StoreConfig;

/// `timestamp` as `timestamptz`, NULL unless it is an RFC3339 string
const SORT_TIMESTAMP: &str = r"CASE WHEN jsonb_typeof(body -> 'timestamp') = 'string' AND body ->> 'timestamp' ~ '^\d{4}-\d{2}-\d{2}[Tt ]\d{2}:\d{2}:\d{2}(\.\d+)?([Zz]|[+-]\d{2}:\d{2})$' THEN (body ->> 'timestamp')::timestamptz END";

const SCHEMA_STATEMENTS: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS platform_documents (
        id BIGSERIAL PRIMARY KEY,
        collection TEXT NOT NULL,
        body JSONB NOT NULL,
        inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS platform_documents_collection_idx ON platform_documents (collection)",
    "CREATE INDEX IF NOT EXISTS platform_documents_body_idx ON platform_documents USING GIN (body jsonb_path_ops)",
];

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgDocumentStore {
    /// Connect a pool using the configured database URL
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| StoreError::configuration("store.database_url is not set"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.query_timeout())
            .connect(url)
            .await
            .map_err(|e| StoreError::connection(format!("Postgres connection failed: {}", e)))?;

        info!(
            max_connections = config.max_connections,
            query_timeout_ms = config.query_timeout_ms,
            "✅ Document store pool connected"
        );
        Ok(Self::from_pool(pool, config.query_timeout()))
    }

    pub fn from_pool(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Create the documents table and indexes if missing
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::schema(e.to_string()))?;
        }
        debug!("Document store schema ensured");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn select_sql(sort: Option<DocumentSort>, single: bool) -> String {
        let order = match sort {
            None => "id ASC".to_string(),
            Some(DocumentSort::TimestampAscending) => {
                format!("{SORT_TIMESTAMP} ASC NULLS LAST, id ASC")
            }
            Some(DocumentSort::TimestampDescending) => {
                format!("{SORT_TIMESTAMP} DESC NULLS LAST, id DESC")
            }
        };
        let limit = if single { " LIMIT 1" } else { "" };
        format!(
            "SELECT body FROM platform_documents WHERE collection = $1 AND body @> $2 ORDER BY {order}{limit}"
        )
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        sort: Option<DocumentSort>,
    ) -> StoreResult<Option<Value>> {
        let sql = Self::select_sql(sort, true);
        bounded("find_one", self.query_timeout, async {
            sqlx::query_scalar::<_, Value>(&sql)
                .bind(collection)
                .bind(filter.to_json())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::query(collection, e.to_string()))
        })
        .await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        sort: Option<DocumentSort>,
    ) -> StoreResult<Vec<Value>> {
        let sql = Self::select_sql(sort, false);
        bounded("find", self.query_timeout, async {
            sqlx::query_scalar::<_, Value>(&sql)
                .bind(collection)
                .bind(filter.to_json())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::query(collection, e.to_string()))
        })
        .await
    }

    async fn insert_one(&self, collection: &str, document: Value) -> StoreResult<()> {
        if !document.is_object() {
            return Err(StoreError::serialization("documents must be JSON objects"));
        }
        bounded("insert_one", self.query_timeout, async {
            sqlx::query("INSERT INTO platform_documents (collection, body) VALUES ($1, $2)")
                .bind(collection)
                .bind(&document)
                .execute(&self.pool)
                .await
                .map(|_| ())
                .map_err(|e| StoreError::query(collection, e.to_string()))
        })
        .await
    }

    async fn health_check(&self) -> StoreResult<bool> {
        bounded("health_check", self.query_timeout, async {
            let one: i32 = sqlx::query_scalar("SELECT 1")
                .fetch_one(&self.pool)
                .await?;
            Ok(one == 1)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
