//! 主应用程序入口
//!
//! 加载配置，装配存储、连接表和广播器，启动 Axum 服务。

use std::{sync::Arc, time::Duration};

use application::{
    Broadcaster, ChatService, ChatServiceDependencies, ConnectionRegistry, InMemoryMessageStore,
    MessageArchive, StreamService, SystemClock,
};
use config::AppConfig;
use infrastructure::{create_pg_pool, PgMessageArchive};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, WebSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    tracing::info!(config = %config.sanitized(), "configuration loaded");

    let archive = connect_archive(&config).await;

    let registry = Arc::new(ConnectionRegistry::new());
    let broadcaster = Arc::new(Broadcaster::new(registry.clone()));
    let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
        store: Arc::new(InMemoryMessageStore::new(config.chat.history_capacity)),
        archive: archive.clone(),
        broadcaster,
        clock: Arc::new(SystemClock),
    }));
    let stream_service = Arc::new(StreamService::new(
        registry.clone(),
        config.chat.stream_buffer,
    ));

    if let Err(err) = chat_service.warm_from_archive().await {
        tracing::warn!(error = %err, "could not load history from archive, starting empty");
    }

    if archive.is_some() {
        spawn_archive_cleanup(chat_service.clone(), &config);
    }

    let state = AppState::new(chat_service, stream_service, WebSettings::from(&config));
    let app = router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("聊天服务器启动在 http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// 未配置数据库或连接失败时返回 `None`，服务只使用内存历史
async fn connect_archive(config: &AppConfig) -> Option<Arc<dyn MessageArchive>> {
    let pool = match create_pg_pool(&config.database).await {
        Ok(Some(pool)) => pool,
        Ok(None) => {
            tracing::info!("no database configured, archive disabled");
            return None;
        }
        Err(err) => {
            tracing::warn!(error = %err, "database unavailable, archive disabled");
            return None;
        }
    };

    let archive = PgMessageArchive::new(pool);
    if let Err(err) = archive.ensure_schema().await {
        tracing::warn!(error = %err, "failed to prepare archive schema, archive disabled");
        return None;
    }

    tracing::info!("message archive connected");
    let archive: Arc<dyn MessageArchive> = Arc::new(archive);
    Some(archive)
}

fn spawn_archive_cleanup(chat_service: Arc<ChatService>, config: &AppConfig) {
    let keep = config.archive.retain_count;
    let period = Duration::from_secs(config.archive.cleanup_interval_secs);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // 第一次 tick 立即返回，跳过
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(err) = chat_service.cleanup_archive(keep).await {
                tracing::error!(error = %err, "archive cleanup failed");
            }
        }
    });
}

async fn shutdown_signal(registry: Arc<ConnectionRegistry>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    // 事件流不会自行结束，必须先关闭才能完成优雅停机
    let closed = registry.close_all();
    tracing::info!(closed, "shutdown signal received, event streams closed");
}
