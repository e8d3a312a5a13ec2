//! 内存中的有界消息历史

use std::collections::VecDeque;

use async_trait::async_trait;
use domain::{Message, MessageDraft, MessageId, Timestamp};
use tokio::sync::Mutex;

use crate::repository::{MessageStore, StorageError};

/// 默认保留的历史条数
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// 先进先出淘汰的内存消息存储。
///
/// 所有修改都在同一把锁内完成，锁只覆盖内存操作，不会跨越网络写。
pub struct InMemoryMessageStore {
    messages: Mutex<VecDeque<Message>>,
    capacity: usize,
}

impl InMemoryMessageStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn push_bounded(&self, messages: &mut VecDeque<Message>, message: Message) {
        messages.push_back(message);
        while messages.len() > self.capacity {
            messages.pop_front();
        }
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(
        &self,
        id: MessageId,
        draft: MessageDraft,
        accepted_at: Timestamp,
    ) -> Result<Message, StorageError> {
        let mut messages = self.messages.lock().await;

        // 时钟回拨时沿用上一条的时间戳
        let created_at = match messages.back() {
            Some(last) if last.created_at > accepted_at => last.created_at,
            _ => accepted_at,
        };

        let message = Message::new(id, draft, created_at);
        self.push_bounded(&mut messages, message.clone());
        Ok(message)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Message>, StorageError> {
        let messages = self.messages.lock().await;
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.iter().skip(skip).cloned().collect())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.messages.lock().await.len())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn preload(&self, preloaded: Vec<Message>) -> Result<usize, StorageError> {
        let mut messages = self.messages.lock().await;
        for message in preloaded {
            self.push_bounded(&mut messages, message);
        }
        Ok(messages.len())
    }
}
