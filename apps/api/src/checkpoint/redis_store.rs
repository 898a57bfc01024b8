use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use crate::checkpoint::{Checkpoint, CheckpointError, CheckpointStore};

const KEY_PREFIX: &str = "tailor:checkpoint:";

/// Redis-backed store. Each checkpoint is a JSON string under its own key.
#[derive(Clone)]
pub struct RedisCheckpointStore {
    conn: MultiplexedConnection,
}

impl RedisCheckpointStore {
    pub async fn connect(redis_url: &str) -> Result<Self, CheckpointError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis checkpoint store connected");
        Ok(Self { conn })
    }
}

fn key(thread_id: &str) -> String {
    format!("{KEY_PREFIX}{thread_id}")
}

#[async_trait]
impl CheckpointStore for RedisCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let payload = serde_json::to_string(checkpoint)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key(&checkpoint.thread_id), payload)
            .await?;
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(key(thread_id)).await?;
        payload
            .map(|p| serde_json::from_str(&p).map_err(CheckpointError::from))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_namespaced() {
        assert_eq!(key("abc"), "tailor:checkpoint:abc");
    }
}
