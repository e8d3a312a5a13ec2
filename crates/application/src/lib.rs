//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务：消息接收（校验、转义、存储、广播）、
//! 事件流连接管理，以及对外部适配器（持久化归档）的抽象。

pub mod broadcaster;
pub mod clock;
pub mod connection;
pub mod error;
pub mod message_store;
pub mod registry;
pub mod repository;
pub mod services;

pub use broadcaster::{encode_frame, BroadcastError, BroadcastReport, Broadcaster};
pub use clock::{Clock, SystemClock};
pub use connection::{ChannelTarget, ConnectionState, DeliveryError, StreamTarget};
pub use error::ApplicationError;
pub use message_store::{InMemoryMessageStore, DEFAULT_HISTORY_CAPACITY};
pub use registry::ConnectionRegistry;
pub use repository::{MessageArchive, MessageStore, StorageError};
pub use services::{
    ArchiveStatus, ChatService, ChatServiceDependencies, ChatStats, PostMessageRequest,
    PostedMessage, StreamService, StreamSession, DEFAULT_STREAM_BUFFER,
};
