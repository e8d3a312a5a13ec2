use serde::{Deserialize, Serialize};

use crate::sanitizer::sanitize;
use crate::value_objects::{iso_millis, ConnectionId, MessageId, Timestamp};

/// 已接受的聊天消息。创建后不再修改，只会因历史容量淘汰而消失。
///
/// 对外字段名沿用客户端约定：`username` / `message` / `timestamp`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "username")]
    pub author: String,
    #[serde(rename = "message")]
    pub body: String,
    #[serde(rename = "timestamp", with = "iso_millis")]
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(id: MessageId, draft: MessageDraft, created_at: Timestamp) -> Self {
        Self {
            id,
            author: draft.author,
            body: draft.body,
            created_at,
        }
    }
}

/// 通过校验、已去空白并转义的消息内容，尚未分配时间戳。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub author: String,
    pub body: String,
}

impl MessageDraft {
    /// 去除首尾空白后转义。调用方需保证输入已通过 [`crate::MessageRules`] 校验。
    pub fn prepare(author: &str, body: &str) -> Self {
        Self {
            author: sanitize(author.trim()),
            body: sanitize(body.trim()),
        }
    }
}

/// 事件流上的一帧数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFrame {
    /// 连接确认，先于任何聊天消息发送
    Connected {
        #[serde(rename = "clientId")]
        client_id: ConnectionId,
    },
    /// 聊天消息投递
    Message { data: Message },
}
