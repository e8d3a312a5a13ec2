use application::{MessageArchive, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use config::DatabaseConfig;
use domain::{Message, MessageId};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::unavailable(err.to_string())
        }
        other => StorageError::failure(other.to_string()),
    }
}

/// 根据配置创建连接池；未配置 URL 时返回 `None`
pub async fn create_pg_pool(config: &DatabaseConfig) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = config.url.as_deref() else {
        return Ok(None);
    };
    tracing::debug!(max_connections = config.max_connections, "connecting to postgres");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;
    Ok(Some(pool))
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    username: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Message {
            id: MessageId::from(record.id),
            author: record.username,
            body: record.message,
            created_at: record.created_at,
        }
    }
}

/// PostgreSQL 消息归档。
///
/// 存入的是已转义的文本；`seq` 记录插入顺序，用于按接受顺序读取和清理。
#[derive(Clone)]
pub struct PgMessageArchive {
    pool: PgPool,
}

impl PgMessageArchive {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建表（如果不存在）
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                seq BIGSERIAL PRIMARY KEY,
                id UUID NOT NULL UNIQUE,
                username TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        sqlx::query(
            r#"CREATE INDEX IF NOT EXISTS idx_chat_messages_created_at ON chat_messages (created_at)"#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        tracing::info!("chat_messages schema ready");
        Ok(())
    }
}

#[async_trait]
impl MessageArchive for PgMessageArchive {
    async fn add_message(&self, message: &Message) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, username, message, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(&message.author)
        .bind(&message.body)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get_recent_messages(&self, limit: i64) -> Result<Vec<Message>, StorageError> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, username, message, created_at FROM (
                SELECT seq, id, username, message, created_at
                FROM chat_messages
                ORDER BY seq DESC
                LIMIT $1
            ) recent
            ORDER BY seq ASC
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Message::from).collect())
    }

    async fn get_message_count(&self) -> Result<i64, StorageError> {
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM chat_messages"#)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn cleanup_old_messages(&self, keep_count: i64) -> Result<u64, StorageError> {
        let result = sqlx::query(
            r#"
            DELETE FROM chat_messages
            WHERE seq NOT IN (
                SELECT seq FROM chat_messages ORDER BY seq DESC LIMIT $1
            )
            "#,
        )
        .bind(keep_count)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }
}
