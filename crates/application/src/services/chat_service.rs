use std::sync::Arc;

use domain::{Message, MessageDraft, MessageId, MessageRules};
use serde::Serialize;
use serde_json::Value;

use crate::{
    broadcaster::{BroadcastReport, Broadcaster},
    clock::Clock,
    error::ApplicationError,
    repository::{MessageArchive, MessageStore},
};

/// 待发布消息的原始字段，尚未校验
#[derive(Debug, Clone, Default)]
pub struct PostMessageRequest {
    pub username: Option<Value>,
    pub message: Option<Value>,
}

impl PostMessageRequest {
    /// 从原始请求体解析。无法解析或不是 JSON 对象时返回 `Malformed`。
    pub fn from_slice(body: &[u8]) -> Result<Self, ApplicationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| ApplicationError::malformed(err.to_string()))?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> Result<Self, ApplicationError> {
        match value {
            Value::Object(mut fields) => Ok(Self {
                username: fields.remove("username"),
                message: fields.remove("message"),
            }),
            _ => Err(ApplicationError::malformed(
                "Request body must be a JSON object",
            )),
        }
    }
}

/// 发布成功的结果；投递统计只用于日志和监控，不影响调用方
#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub message: Message,
    pub delivery: BroadcastReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStats {
    pub messages: usize,
    pub connections: usize,
    pub capacity: usize,
    pub archived_messages: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveStatus {
    Disabled,
    Connected,
    Disconnected,
}

pub struct ChatServiceDependencies {
    pub store: Arc<dyn MessageStore>,
    pub archive: Option<Arc<dyn MessageArchive>>,
    pub broadcaster: Arc<Broadcaster>,
    pub clock: Arc<dyn Clock>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 接收一条消息：校验 → 转义 → 存储 → 广播 → 归档。
    ///
    /// 广播失败（部分或全部）只记录日志，不回滚存储，也不让调用失败。
    pub async fn post_message(
        &self,
        request: PostMessageRequest,
    ) -> Result<PostedMessage, ApplicationError> {
        MessageRules::ensure_valid(request.username.as_ref(), request.message.as_ref()).map_err(
            |err| {
                tracing::debug!(error = %err, "message rejected by validation");
                ApplicationError::from(err)
            },
        )?;

        let (Some(Value::String(username)), Some(Value::String(body))) =
            (request.username.as_ref(), request.message.as_ref())
        else {
            return Err(ApplicationError::infrastructure(
                "validated fields are not strings",
            ));
        };

        let draft = MessageDraft::prepare(username, body);
        let message = self
            .deps
            .store
            .append(MessageId::generate(), draft, self.deps.clock.now())
            .await?;

        tracing::info!(
            message_id = %message.id,
            username = %message.author,
            "message accepted"
        );

        let delivery = match self.deps.broadcaster.broadcast(&message) {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(message_id = %message.id, error = %err, "消息已保存，但广播失败");
                BroadcastReport {
                    success_count: 0,
                    failure_count: self.deps.broadcaster.registry().len(),
                }
            }
        };

        // 归档在广播之后进行，数据库延迟不会推迟实时投递
        if let Some(archive) = &self.deps.archive {
            if let Err(err) = archive.add_message(&message).await {
                tracing::error!(message_id = %message.id, error = %err, "failed to archive message");
            }
        }

        Ok(PostedMessage { message, delivery })
    }

    /// 最近的历史消息，旧在前
    pub async fn recent_messages(&self, limit: usize) -> Result<Vec<Message>, ApplicationError> {
        let limit = limit.min(self.deps.store.capacity());
        Ok(self.deps.store.recent(limit).await?)
    }

    pub async fn stats(&self) -> Result<ChatStats, ApplicationError> {
        let archived_messages = match &self.deps.archive {
            Some(archive) => match archive.get_message_count().await {
                Ok(count) => Some(count),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to count archived messages");
                    None
                }
            },
            None => None,
        };

        Ok(ChatStats {
            messages: self.deps.store.count().await?,
            connections: self.deps.broadcaster.registry().len(),
            capacity: self.deps.store.capacity(),
            archived_messages,
        })
    }

    pub async fn archive_status(&self) -> ArchiveStatus {
        match &self.deps.archive {
            None => ArchiveStatus::Disabled,
            Some(archive) => match archive.ping().await {
                Ok(()) => ArchiveStatus::Connected,
                Err(err) => {
                    tracing::warn!(error = %err, "archive ping failed");
                    ArchiveStatus::Disconnected
                }
            },
        }
    }

    pub fn connection_count(&self) -> usize {
        self.deps.broadcaster.registry().len()
    }

    /// 启动时用归档中的最近消息填充内存历史
    pub async fn warm_from_archive(&self) -> Result<usize, ApplicationError> {
        let Some(archive) = &self.deps.archive else {
            return Ok(0);
        };
        let capacity = self.deps.store.capacity();
        let limit = i64::try_from(capacity).unwrap_or(i64::MAX);
        let messages = archive.get_recent_messages(limit).await?;
        let loaded = self.deps.store.preload(messages).await?;
        tracing::info!(loaded, "history warmed from archive");
        Ok(loaded)
    }

    /// 清理归档，只保留最新的 `keep_count` 条
    pub async fn cleanup_archive(&self, keep_count: usize) -> Result<u64, ApplicationError> {
        let Some(archive) = &self.deps.archive else {
            return Ok(0);
        };
        let keep = i64::try_from(keep_count).unwrap_or(i64::MAX);
        let removed = archive.cleanup_old_messages(keep).await?;
        if removed > 0 {
            tracing::info!(removed, keep_count, "old archived messages cleaned up");
        }
        Ok(removed)
    }
}
