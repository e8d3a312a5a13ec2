//! 事件流连接的生命周期管理

use std::sync::Arc;

use domain::{ConnectionId, StreamFrame};
use tokio::sync::mpsc;

use crate::{
    broadcaster::encode_frame,
    connection::{ChannelTarget, ConnectionState, StreamTarget},
    error::ApplicationError,
    registry::ConnectionRegistry,
};

/// 默认的单连接缓冲帧数
pub const DEFAULT_STREAM_BUFFER: usize = 64;

pub struct StreamService {
    registry: Arc<ConnectionRegistry>,
    buffer: usize,
}

impl StreamService {
    pub fn new(registry: Arc<ConnectionRegistry>, buffer: usize) -> Self {
        Self {
            registry,
            // 至少要放得下连接确认帧
            buffer: buffer.max(1),
        }
    }

    /// 打开一个新的流连接：生成 ID，写入 `connected` 确认帧，然后注册到连接表。
    ///
    /// 确认帧在注册之前写入缓冲区，因此一定是客户端收到的第一帧。
    pub fn open(&self) -> Result<StreamSession, ApplicationError> {
        let id = ConnectionId::generate();
        let (sender, receiver) = mpsc::channel(self.buffer);
        let target = Arc::new(ChannelTarget::new(id, sender));

        // 握手失败时会话直接从 Opening 进入 Closed，不会出现在连接表里
        let mut session = StreamSession {
            id,
            receiver,
            state: ConnectionState::Opening,
            registry: Arc::clone(&self.registry),
        };

        let ack = encode_frame(&StreamFrame::Connected { client_id: id })?;
        target.try_write(&ack)?;

        self.registry.register(target);
        session.state = ConnectionState::Open;
        Ok(session)
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}

/// 一个已打开的流连接，由 HTTP 响应流持有。
///
/// 连接表只持有发送端；会话被丢弃（客户端断开）时自动从连接表移除。
/// 被广播移除后发送端随之释放，`next_frame` 取完缓冲后返回 `None`。
pub struct StreamSession {
    id: ConnectionId,
    receiver: mpsc::Receiver<Arc<str>>,
    state: ConnectionState,
    registry: Arc<ConnectionRegistry>,
}

impl StreamSession {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// 等待下一帧；连接关闭后返回 `None`
    pub async fn next_frame(&mut self) -> Option<Arc<str>> {
        if self.state == ConnectionState::Closed {
            return None;
        }
        match self.receiver.recv().await {
            Some(frame) => Some(frame),
            None => {
                self.close();
                None
            }
        }
    }

    fn close(&mut self) {
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::Closed;
            self.receiver.close();
            self.registry.remove(&self.id);
            tracing::debug!(client_id = %self.id, "stream session closed");
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}
