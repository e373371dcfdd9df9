use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::models::{Price, ProductRecord, ProductReference};
use crate::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    name            TEXT PRIMARY KEY,
    source_id       TEXT NOT NULL,
    source_url      TEXT NOT NULL,
    price_amount    TEXT NOT NULL,
    price_currency  TEXT NOT NULL,
    needle_size     TEXT,
    composition     TEXT,
    availability    TEXT,
    updated_at      TEXT NOT NULL
)
"#;

const RECORD_COLUMNS: &str = "name, source_id, source_url, price_amount, price_currency, \
                              needle_size, composition, availability";

#[derive(Debug, FromRow)]
struct ProductRow {
    name: String,
    source_id: String,
    source_url: String,
    price_amount: String,
    price_currency: String,
    needle_size: Option<String>,
    composition: Option<String>,
    availability: Option<String>,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        ProductRecord {
            reference: ProductReference {
                id: row.source_id,
                url: row.source_url,
            },
            name: row.name,
            price: Price {
                amount: row.price_amount,
                currency: row.price_currency,
            },
            needle_size: row.needle_size,
            composition: row.composition,
            availability: row.availability,
        }
    }
}

/// Document store for extracted products, keyed by product `name`. Writes are
/// single-statement upserts, so concurrent tasks re-persisting the same
/// product stay safe without any pipeline-level locking.
#[derive(Clone)]
pub struct ProductStore {
    pool: SqlitePool,
}

impl ProductStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert-or-replace keyed by `name`. Failures are logged and swallowed:
    /// a broken store write is not allowed to abort the rest of a scrape run,
    /// at the accepted cost of silent data loss.
    pub async fn upsert(&self, record: &ProductRecord) {
        match self.try_upsert(record).await {
            Ok(()) => tracing::info!(name = %record.name, "upserted product"),
            Err(e) => {
                tracing::error!(name = %record.name, error = %e, "failed to upsert product")
            }
        }
    }

    async fn try_upsert(&self, record: &ProductRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products
                (name, source_id, source_url, price_amount, price_currency,
                 needle_size, composition, availability, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(name) DO UPDATE SET
                source_id = excluded.source_id,
                source_url = excluded.source_url,
                price_amount = excluded.price_amount,
                price_currency = excluded.price_currency,
                needle_size = excluded.needle_size,
                composition = excluded.composition,
                availability = excluded.availability,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.name)
        .bind(&record.reference.id)
        .bind(&record.reference.url)
        .bind(&record.price.amount)
        .bind(&record.price.currency)
        .bind(&record.needle_size)
        .bind(&record.composition)
        .bind(&record.availability)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<ProductRecord>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("SELECT {} FROM products ORDER BY name", RECORD_COLUMNS))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Lookup by the site-assigned id embedded in the stored reference. Ids
    /// are not the storage key, so after a name collision an id can come up
    /// empty even though its extraction succeeded.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<ProductRecord>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE source_id = ?1 LIMIT 1",
            RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Case-insensitive exact-match lookup; substrings do not resolve.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<ProductRecord>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE name = ?1 COLLATE NOCASE LIMIT 1",
            RECORD_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
