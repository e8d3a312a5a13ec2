use std::sync::Arc;

use domain::{ConnectionId, Message, StreamFrame};
use serde::Serialize;
use thiserror::Error;

use crate::connection::StreamTarget;
use crate::registry::ConnectionRegistry;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to encode stream frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 一次广播的投递结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    pub success_count: usize,
    pub failure_count: usize,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count
    }
}

/// 把帧编码成 JSON 文本，每次广播只编码一次
pub fn encode_frame(frame: &StreamFrame) -> Result<Arc<str>, BroadcastError> {
    let json = serde_json::to_string(frame)?;
    Ok(Arc::from(json))
}

/// 向连接表中的每个目标推送消息。
///
/// 每个目标只尝试写一次，不重试。单个目标失败不影响其他目标；
/// 失败的目标在整轮写入结束后才从连接表移除。
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// 广播一条聊天消息给当前所有已注册的目标
    pub fn broadcast(&self, message: &Message) -> Result<BroadcastReport, BroadcastError> {
        let frame = encode_frame(&StreamFrame::Message {
            data: message.clone(),
        })?;

        // 快照之后不再持有连接表的任何锁
        let targets = self.registry.snapshot();
        let (report, failed) = Self::deliver(&frame, &targets);

        for id in &failed {
            self.registry.remove(id);
        }

        if report.failure_count > 0 {
            tracing::warn!(
                message_id = %message.id,
                attempted = report.attempted(),
                success = report.success_count,
                failed = report.failure_count,
                "broadcast completed with failures"
            );
        } else {
            tracing::debug!(
                message_id = %message.id,
                success = report.success_count,
                "broadcast completed"
            );
        }

        Ok(report)
    }

    /// 对给定目标逐个写入，返回统计和需要移除的目标 ID
    pub fn deliver(
        frame: &Arc<str>,
        targets: &[Arc<dyn StreamTarget>],
    ) -> (BroadcastReport, Vec<ConnectionId>) {
        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();

        for target in targets {
            let result = if target.is_live() {
                target.try_write(frame)
            } else {
                Err(crate::connection::DeliveryError::Closed(target.id()))
            };

            match result {
                Ok(()) => report.success_count += 1,
                Err(err) => {
                    tracing::debug!(client_id = %target.id(), error = %err, "stream write failed");
                    report.failure_count += 1;
                    failed.push(target.id());
                }
            }
        }

        (report, failed)
    }
}
