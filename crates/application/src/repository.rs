use async_trait::async_trait;
use domain::{Message, MessageDraft, MessageId, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage failure: {message}")]
    Failure { message: String },
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

impl StorageError {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// 有界的消息历史。追加与淘汰必须是一个原子步骤。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// 追加一条消息，超出容量时淘汰最旧的记录。
    ///
    /// 返回的消息时间戳不早于历史中最后一条，保证存储顺序内时间单调不减。
    async fn append(
        &self,
        id: MessageId,
        draft: MessageDraft,
        accepted_at: Timestamp,
    ) -> Result<Message, StorageError>;

    /// 最近的 `limit` 条消息，按接受顺序（旧在前）
    async fn recent(&self, limit: usize) -> Result<Vec<Message>, StorageError>;

    async fn count(&self) -> Result<usize, StorageError>;

    fn capacity(&self) -> usize;

    /// 用已有的消息预热历史（启动时从归档加载），同样遵守容量限制
    async fn preload(&self, messages: Vec<Message>) -> Result<usize, StorageError>;
}

/// 可选的持久化归档。核心只依赖这几个操作，不关心具体表结构。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageArchive: Send + Sync {
    // 保存一条已接受的消息
    async fn add_message(&self, message: &Message) -> Result<(), StorageError>;

    // 最近的消息，旧在前
    async fn get_recent_messages(&self, limit: i64) -> Result<Vec<Message>, StorageError>;

    async fn get_message_count(&self) -> Result<i64, StorageError>;

    // 只保留最新的 keep_count 条，返回删除的行数
    async fn cleanup_old_messages(&self, keep_count: i64) -> Result<u64, StorageError>;

    // 连通性检查
    async fn ping(&self) -> Result<(), StorageError>;
}
