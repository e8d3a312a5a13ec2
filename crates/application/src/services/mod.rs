mod chat_service;
mod stream_service;

pub use chat_service::{
    ArchiveStatus, ChatService, ChatServiceDependencies, ChatStats, PostMessageRequest,
    PostedMessage,
};
pub use stream_service::{StreamService, StreamSession, DEFAULT_STREAM_BUFFER};
