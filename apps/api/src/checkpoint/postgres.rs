use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::checkpoint::{Checkpoint, CheckpointError, CheckpointStore};

/// Postgres-backed store. One row per thread, overwritten on every save.
#[derive(Clone)]
pub struct PgCheckpointStore {
    pool: PgPool,
}

impl PgCheckpointStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointStore for PgCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        sqlx::query(
            r#"
            INSERT INTO workflow_checkpoints (thread_id, status, data, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (thread_id) DO UPDATE
                SET status = EXCLUDED.status,
                    data = EXCLUDED.data,
                    updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&checkpoint.thread_id)
        .bind(checkpoint.status.as_str())
        .bind(Json(checkpoint))
        .bind(checkpoint.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let row: Option<(Json<Checkpoint>,)> =
            sqlx::query_as("SELECT data FROM workflow_checkpoints WHERE thread_id = $1")
                .bind(thread_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(checkpoint),)| checkpoint))
    }
}
