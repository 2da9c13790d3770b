use async_trait::async_trait;
use uuid::Uuid;

use crate::data::repo_types::{DataChanges, DataRecord, NewData};
use crate::db::{PgStore, StoreError};

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<DataRecord>, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<DataRecord>, StoreError>;
    async fn insert(&self, new_data: NewData) -> Result<DataRecord, StoreError>;
    /// `None` when the row no longer exists.
    async fn apply_changes(
        &self,
        id: Uuid,
        changes: DataChanges,
    ) -> Result<Option<DataRecord>, StoreError>;
    /// Returns whether a row was removed.
    async fn remove(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
impl DataStore for PgStore {
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<DataRecord>, StoreError> {
        let rows = sqlx::query_as::<_, DataRecord>(
            r#"
            SELECT d.id, d.source, d.sentiment, d.text, d.created_date, d.user_id,
                   u.username AS owner_username
              FROM data d
              JOIN users u ON u.id = d.user_id
             WHERE d.user_id = $1
             ORDER BY d.created_date ASC, d.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> Result<Option<DataRecord>, StoreError> {
        let row = sqlx::query_as::<_, DataRecord>(
            r#"
            SELECT d.id, d.source, d.sentiment, d.text, d.created_date, d.user_id,
                   u.username AS owner_username
              FROM data d
              JOIN users u ON u.id = d.user_id
             WHERE d.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert(&self, new_data: NewData) -> Result<DataRecord, StoreError> {
        let row = sqlx::query_as::<_, DataRecord>(
            r#"
            WITH inserted AS (
                INSERT INTO data (id, source, sentiment, text, user_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, source, sentiment, text, created_date, user_id
            )
            SELECT i.id, i.source, i.sentiment, i.text, i.created_date, i.user_id,
                   u.username AS owner_username
              FROM inserted i
              JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_data.source)
        .bind(&new_data.sentiment)
        .bind(&new_data.text)
        .bind(new_data.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn apply_changes(
        &self,
        id: Uuid,
        changes: DataChanges,
    ) -> Result<Option<DataRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, DataRecord>(
            r#"
            WITH updated AS (
                UPDATE data
                   SET source = COALESCE($2, source),
                       sentiment = COALESCE($3, sentiment),
                       text = COALESCE($4, text)
                 WHERE id = $1
                RETURNING id, source, sentiment, text, created_date, user_id
            )
            SELECT d.id, d.source, d.sentiment, d.text, d.created_date, d.user_id,
                   u.username AS owner_username
              FROM updated d
              JOIN users u ON u.id = d.user_id
            "#,
        )
        .bind(id)
        .bind(changes.source)
        .bind(changes.sentiment)
        .bind(changes.text)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM data WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
