use std::sync::Arc;

use application::{ChatService, StreamService};
use config::AppConfig;

/// HTTP 层自身的设置
#[derive(Debug, Clone)]
pub struct WebSettings {
    pub history_limit: usize,
    pub max_body_bytes: usize,
    pub cors_origins: Vec<String>,
}

impl From<&AppConfig> for WebSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            history_limit: config.chat.history_limit,
            max_body_bytes: config.chat.max_body_bytes,
            cors_origins: config.server.cors_origins.clone(),
        }
    }
}

impl Default for WebSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub stream_service: Arc<StreamService>,
    pub settings: Arc<WebSettings>,
}

impl AppState {
    pub fn new(
        chat_service: Arc<ChatService>,
        stream_service: Arc<StreamService>,
        settings: WebSettings,
    ) -> Self {
        Self {
            chat_service,
            stream_service,
            settings: Arc::new(settings),
        }
    }
}
