use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{Direction, DocumentStore, Filter, Query, StoredDocument};
use crate::models::Document;

/// Fields that get an expression index. Must match the paths queries emit.
const INDEXED_FIELDS: [&str; 3] = ["followerId", "followeeId", "authorId"];

/// SQLite-backed document store. Each document is one row holding its JSON
/// body; filters use `json_extract` on top-level fields.
pub struct SqliteStore {
    pool: SqlitePool,
    max_in_values: usize,
}

impl SqliteStore {
    /// Connect to `database_url` (creating the file if needed) and make sure
    /// the schema exists.
    pub async fn connect(database_url: &str, max_in_values: usize) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` opens its own database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::Storage(anyhow::anyhow!(
                    "Failed to connect to SQLite at {}: {}",
                    database_url,
                    e
                ))
            })?;

        let store = Self {
            pool,
            max_in_values: max_in_values.max(1),
        };
        store.initialize().await?;
        Ok(store)
    }

    pub async fn new_in_memory(max_in_values: usize) -> AppResult<Self> {
        Self::connect("sqlite::memory:", max_in_values).await
    }

    /// Create the documents table and its indexes if they are missing.
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                unique_key TEXT,
                body TEXT NOT NULL,
                UNIQUE (collection, id),
                UNIQUE (collection, unique_key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(anyhow::anyhow!("Failed to create documents table: {}", e)))?;

        for field in INDEXED_FIELDS {
            let sql = format!(
                "CREATE INDEX IF NOT EXISTS idx_documents_{field} ON documents(collection, json_extract(body, '$.{field}'))"
            );
            sqlx::query(&sql).execute(&self.pool).await.map_err(|e| {
                AppError::Storage(anyhow::anyhow!("Failed to create index on {}: {}", field, e))
            })?;
        }

        Ok(())
    }

    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn check_batch(&self, len: usize) -> AppResult<()> {
        if len > self.max_in_values {
            return Err(AppError::Storage(anyhow::anyhow!(
                "batch of {} values exceeds the store limit of {}",
                len,
                self.max_in_values
            )));
        }
        Ok(())
    }

    async fn insert_row(
        &self,
        collection: &str,
        unique_key: Option<&str>,
        doc: &Document,
    ) -> AppResult<Option<String>> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(doc)?;

        let result = sqlx::query(
            "INSERT INTO documents (collection, id, unique_key, body) VALUES (?, ?, ?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(collection)
        .bind(&id)
        .bind(unique_key)
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() > 0).then_some(id))
    }
}

/// `'$.field'` literal for a top-level field. Field names are restricted so
/// they can be inlined into SQL and match the expression indexes.
fn json_path(field: &str) -> AppResult<String> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(AppError::Storage(anyhow::anyhow!(
            "unsupported field name in query: {:?}",
            field
        )));
    }
    Ok(format!("json_extract(body, '$.{}')", field))
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Null => {
            qb.push("NULL");
        }
        Value::Bool(b) => {
            qb.push_bind(*b);
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                qb.push_bind(i);
            }
            None => {
                qb.push_bind(n.as_f64().unwrap_or_default());
            }
        },
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        other => {
            qb.push_bind(other.to_string());
        }
    }
}

fn decode_row(row: &sqlx::sqlite::SqliteRow) -> AppResult<StoredDocument> {
    let id: String = row.try_get("id")?;
    let body: String = row.try_get("body")?;
    Ok(StoredDocument {
        id,
        data: serde_json::from_str(&body)?,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(&self, collection: &str, doc: Document) -> AppResult<String> {
        self.insert_row(collection, None, &doc).await?.ok_or_else(|| {
            AppError::Storage(anyhow::anyhow!("id collision inserting into {}", collection))
        })
    }

    async fn insert_unique(
        &self,
        collection: &str,
        unique_key: &str,
        doc: Document,
    ) -> AppResult<Option<String>> {
        self.insert_row(collection, Some(unique_key), &doc).await
    }

    async fn put(&self, collection: &str, id: &str, doc: Document) -> AppResult<()> {
        let body = serde_json::to_string(&doc)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<StoredDocument>> {
        let row = sqlx::query("SELECT id, body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(decode_row).transpose()
    }

    async fn get_many(&self, collection: &str, ids: &[String]) -> AppResult<Vec<StoredDocument>> {
        self.check_batch(ids.len())?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT id, body FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        qb.push(" AND id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(") ORDER BY seq");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn query(&self, query: &Query) -> AppResult<Vec<StoredDocument>> {
        self.check_batch(query.max_in_len())?;
        if query.is_trivially_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT id, body FROM documents WHERE collection = ");
        qb.push_bind(query.collection.clone());

        for filter in &query.filters {
            qb.push(" AND ");
            qb.push(json_path(filter.field())?);
            match filter {
                Filter::Eq(_, Value::Null) => {
                    qb.push(" IS NULL");
                }
                Filter::Eq(_, value) => {
                    qb.push(" = ");
                    push_value(&mut qb, value);
                }
                Filter::In(_, values) => {
                    qb.push(" IN (");
                    for (i, value) in values.iter().enumerate() {
                        if i > 0 {
                            qb.push(", ");
                        }
                        push_value(&mut qb, value);
                    }
                    qb.push(")");
                }
            }
        }

        match &query.order_by {
            Some((field, direction)) => {
                qb.push(" ORDER BY ");
                qb.push(json_path(field)?);
                let tie = if query.ties_by_id { "id" } else { "seq" };
                qb.push(match direction {
                    Direction::Ascending => format!(" ASC, {} ASC", tie),
                    Direction::Descending => format!(" DESC, {} DESC", tie),
                });
            }
            None => {
                qb.push(" ORDER BY seq");
            }
        }

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> AppResult<bool> {
        let patch = serde_json::to_string(&patch)?;
        let result = sqlx::query(
            "UPDATE documents SET body = json_patch(body, ?) WHERE collection = ? AND id = ?",
        )
        .bind(patch)
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn max_in_values(&self) -> usize {
        self.max_in_values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_path_rejects_injection() {
        assert_eq!(
            json_path("authorId").unwrap(),
            "json_extract(body, '$.authorId')"
        );
        assert!(json_path("x') OR 1=1 --").is_err());
        assert!(json_path("").is_err());
    }
}
