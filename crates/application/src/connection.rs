//! 事件流订阅目标
//!
//! 每个已连接的客户端对应一个 [`StreamTarget`]。广播只通过这个接口写入，
//! 不关心底层传输的具体实现。

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use domain::ConnectionId;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// 单个连接的写入失败
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
    #[error("connection {0} buffer is full")]
    BufferFull(ConnectionId),
    #[error("connection {id} transport error: {message}")]
    Transport { id: ConnectionId, message: String },
}

/// 连接生命周期：`Opening -> Open -> Closed`，`Closed` 是终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Opening,
    Open,
    Closed,
}

/// 可写的事件流目标
pub trait StreamTarget: Send + Sync {
    fn id(&self) -> ConnectionId;

    /// 传输层是否仍然可写。返回 `false` 的目标在广播时直接计为失败。
    fn is_live(&self) -> bool;

    /// 写入一帧已编码的数据。不得阻塞：要么立即成功，要么立即失败。
    fn try_write(&self, frame: &Arc<str>) -> Result<(), DeliveryError>;

    /// 标记为不可写，之后的写入都会失败
    fn close(&self);
}

/// 基于有界 mpsc 通道的目标。
///
/// 通道另一端由 HTTP 响应流持有；缓冲区满说明客户端读得太慢，
/// 视为写入失败而不是等待。
pub struct ChannelTarget {
    id: ConnectionId,
    sender: mpsc::Sender<Arc<str>>,
    closed: AtomicBool,
}

impl ChannelTarget {
    pub fn new(id: ConnectionId, sender: mpsc::Sender<Arc<str>>) -> Self {
        Self {
            id,
            sender,
            closed: AtomicBool::new(false),
        }
    }
}

impl StreamTarget for ChannelTarget {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_live(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && !self.sender.is_closed()
    }

    fn try_write(&self, frame: &Arc<str>) -> Result<(), DeliveryError> {
        if !self.is_live() {
            return Err(DeliveryError::Closed(self.id));
        }
        self.sender
            .try_send(Arc::clone(frame))
            .map_err(|err| match err {
                TrySendError::Full(_) => DeliveryError::BufferFull(self.id),
                TrySendError::Closed(_) => DeliveryError::Closed(self.id),
            })
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
