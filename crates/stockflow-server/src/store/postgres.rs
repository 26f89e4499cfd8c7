//! Postgres-backed store implementations
//!
//! Rows are mapped by hand rather than derived so the domain types in
//! `stockflow-common` stay free of database dependencies. Bulk statements
//! are assembled with [`sqlx::QueryBuilder`].

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use std::str::FromStr;

use stockflow_common::types::{
    Ingestion, IngestionErrorRow, IngestionStatus, InventoryRow, NewIngestionError,
    NewInventoryRow,
};

use super::{
    collapse_last_wins, IngestionErrorPatch, IngestionErrorStore, IngestionStore, InventoryPatch,
    InventoryStore, StoreError, StoreResult,
};

/// Store backend over a shared Postgres pool.
///
/// Cheap to clone; implements all three store contracts.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_inventory_row(row: &PgRow) -> Result<InventoryRow, sqlx::Error> {
    Ok(InventoryRow {
        id: row.try_get("id")?,
        sku: row.try_get("sku")?,
        description: row.try_get("description")?,
        store: row.try_get("store")?,
        quantity: row.try_get("quantity")?,
        last_upload: row.try_get("last_upload")?,
        ingestion_id: row.try_get("ingestion_id")?,
    })
}

fn map_ingestion(row: &PgRow) -> Result<Ingestion, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Ingestion {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        status: IngestionStatus::from_str(&status).map_err(|e| sqlx::Error::Decode(e.into()))?,
        total_rows: row.try_get("total_rows")?,
        error_count: row.try_get("error_count")?,
    })
}

fn map_error_row(row: &PgRow) -> Result<IngestionErrorRow, sqlx::Error> {
    let raw: serde_json::Value = row.try_get("raw_data")?;
    let raw_data = match raw {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(sqlx::Error::Decode(
                format!("raw_data is not a JSON object: {}", other).into(),
            ))
        },
    };
    Ok(IngestionErrorRow {
        id: row.try_get("id")?,
        ingestion_id: row.try_get("ingestion_id")?,
        row_number: row.try_get("row_number")?,
        error_msg: row.try_get("error_msg")?,
        raw_data,
    })
}

#[async_trait]
impl InventoryStore for PostgresStore {
    async fn find_all(&self) -> StoreResult<Vec<InventoryRow>> {
        let rows = sqlx::query("SELECT * FROM inventory ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| map_inventory_row(r).map_err(StoreError::from))
            .collect()
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<InventoryRow>> {
        let row = sqlx::query("SELECT * FROM inventory WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_inventory_row).transpose().map_err(StoreError::from)
    }

    async fn find_by_sku_and_store(
        &self,
        sku: &str,
        store: &str,
    ) -> StoreResult<Option<InventoryRow>> {
        let row = sqlx::query("SELECT * FROM inventory WHERE sku = $1 AND store = $2")
            .bind(sku)
            .bind(store)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_inventory_row).transpose().map_err(StoreError::from)
    }

    async fn insert(&self, row: &NewInventoryRow) -> StoreResult<InventoryRow> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO inventory (sku, description, store, quantity, last_upload, ingestion_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&row.sku)
        .bind(&row.description)
        .bind(&row.store)
        .bind(row.quantity)
        .bind(row.last_upload)
        .bind(row.ingestion_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return StoreError::duplicate(
                        "Inventory row",
                        &format!("{}/{}", row.sku, row.store),
                    );
                }
            }
            StoreError::Sqlx(e)
        })?;
        map_inventory_row(&inserted).map_err(StoreError::from)
    }

    async fn update(&self, id: i64, patch: &InventoryPatch) -> StoreResult<Option<InventoryRow>> {
        if patch.is_empty() {
            return InventoryStore::find_by_id(self, id).await;
        }

        let mut qb = QueryBuilder::new("UPDATE inventory SET ");
        let mut set = qb.separated(", ");
        if let Some(ref description) = patch.description {
            set.push("description = ");
            set.push_bind_unseparated(description.clone());
        }
        if let Some(quantity) = patch.quantity {
            set.push("quantity = ");
            set.push_bind_unseparated(quantity);
        }
        if let Some(last_upload) = patch.last_upload {
            set.push("last_upload = ");
            set.push_bind_unseparated(last_upload);
        }
        if let Some(ingestion_id) = patch.ingestion_id {
            set.push("ingestion_id = ");
            set.push_bind_unseparated(ingestion_id);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(map_inventory_row).transpose().map_err(StoreError::from)
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn bulk_upsert(&self, rows: &[NewInventoryRow]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let collapsed = collapse_last_wins(rows);

        let mut qb = QueryBuilder::new(
            "INSERT INTO inventory (sku, description, store, quantity, last_upload, ingestion_id) ",
        );
        qb.push_values(collapsed.iter(), |mut b, row| {
            b.push_bind(&row.sku)
                .push_bind(&row.description)
                .push_bind(&row.store)
                .push_bind(row.quantity)
                .push_bind(row.last_upload)
                .push_bind(row.ingestion_id);
        });
        qb.push(
            r#"
            ON CONFLICT (sku, store)
            DO UPDATE SET
                description = EXCLUDED.description,
                quantity = EXCLUDED.quantity,
                last_upload = EXCLUDED.last_upload,
                ingestion_id = EXCLUDED.ingestion_id
            "#,
        );

        qb.build().execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl IngestionStore for PostgresStore {
    async fn create(&self, total_rows: i64) -> StoreResult<Ingestion> {
        let row = sqlx::query(
            r#"
            INSERT INTO ingestion (status, total_rows)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(IngestionStatus::Processing.as_str())
        .bind(total_rows)
        .fetch_one(&self.pool)
        .await?;
        map_ingestion(&row).map_err(StoreError::from)
    }

    async fn find_all(&self) -> StoreResult<Vec<Ingestion>> {
        let rows = sqlx::query("SELECT * FROM ingestion ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| map_ingestion(r).map_err(StoreError::from))
            .collect()
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Ingestion>> {
        let row = sqlx::query("SELECT * FROM ingestion WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_ingestion).transpose().map_err(StoreError::from)
    }

    async fn update_status(
        &self,
        id: i64,
        status: IngestionStatus,
        error_count: Option<i64>,
    ) -> StoreResult<()> {
        match error_count {
            Some(count) => {
                sqlx::query("UPDATE ingestion SET status = $1, error_count = $2 WHERE id = $3")
                    .bind(status.as_str())
                    .bind(count)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
            },
            None => {
                sqlx::query("UPDATE ingestion SET status = $1 WHERE id = $2")
                    .bind(status.as_str())
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
            },
        }
        Ok(())
    }
}

#[async_trait]
impl IngestionErrorStore for PostgresStore {
    async fn find_by_ingestion(&self, ingestion_id: i64) -> StoreResult<Vec<IngestionErrorRow>> {
        let rows = sqlx::query(
            "SELECT * FROM ingestion_error WHERE ingestion_id = $1 ORDER BY row_number ASC",
        )
        .bind(ingestion_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| map_error_row(r).map_err(StoreError::from))
            .collect()
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<IngestionErrorRow>> {
        let row = sqlx::query("SELECT * FROM ingestion_error WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_error_row).transpose().map_err(StoreError::from)
    }

    async fn insert(&self, row: &NewIngestionError) -> StoreResult<IngestionErrorRow> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO ingestion_error (ingestion_id, row_number, error_msg, raw_data)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(row.ingestion_id)
        .bind(row.row_number)
        .bind(&row.error_msg)
        .bind(serde_json::Value::Object(row.raw_data.clone()))
        .fetch_one(&self.pool)
        .await?;
        map_error_row(&inserted).map_err(StoreError::from)
    }

    async fn bulk_insert(&self, rows: &[NewIngestionError]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::new(
            "INSERT INTO ingestion_error (ingestion_id, row_number, error_msg, raw_data) ",
        );
        qb.push_values(rows.iter(), |mut b, row| {
            b.push_bind(row.ingestion_id)
                .push_bind(row.row_number)
                .push_bind(&row.error_msg)
                .push_bind(serde_json::Value::Object(row.raw_data.clone()));
        });

        qb.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn update(
        &self,
        id: i64,
        patch: &IngestionErrorPatch,
    ) -> StoreResult<Option<IngestionErrorRow>> {
        if patch.is_empty() {
            return IngestionErrorStore::find_by_id(self, id).await;
        }

        let mut qb = QueryBuilder::new("UPDATE ingestion_error SET ");
        let mut set = qb.separated(", ");
        if let Some(ingestion_id) = patch.ingestion_id {
            set.push("ingestion_id = ");
            set.push_bind_unseparated(ingestion_id);
        }
        if let Some(row_number) = patch.row_number {
            set.push("row_number = ");
            set.push_bind_unseparated(row_number);
        }
        if let Some(ref error_msg) = patch.error_msg {
            set.push("error_msg = ");
            set.push_bind_unseparated(error_msg.clone());
        }
        if let Some(ref raw_data) = patch.raw_data {
            set.push("raw_data = ");
            set.push_bind_unseparated(serde_json::Value::Object(raw_data.clone()));
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(map_error_row).transpose().map_err(StoreError::from)
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM ingestion_error WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
