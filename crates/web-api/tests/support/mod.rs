#![allow(dead_code)]

use std::{net::SocketAddr, pin::Pin, sync::Arc, time::Duration};

use application::{
    Broadcaster, ChatService, ChatServiceDependencies, ConnectionRegistry, InMemoryMessageStore,
    StreamService, SystemClock, DEFAULT_STREAM_BUFFER,
};
use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot, time::timeout};
use web_api::{router, AppState, WebSettings};

// 内存存储、无归档的完整服务，监听随机端口
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<ConnectionRegistry>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(WebSettings::default()).await
    }

    pub async fn spawn_with(settings: WebSettings) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(registry.clone()));
        let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
            store: Arc::new(InMemoryMessageStore::default()),
            archive: None,
            broadcaster,
            clock: Arc::new(SystemClock),
        }));
        let stream_service = Arc::new(StreamService::new(registry.clone(), DEFAULT_STREAM_BUFFER));
        let app = router(AppState::new(chat_service, stream_service, settings));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            registry,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// 轮询直到连接表达到期望大小
    pub async fn wait_for_connections(&self, expected: usize) {
        let reached = timeout(Duration::from_secs(5), async {
            while self.registry.len() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(
            reached.is_ok(),
            "expected {expected} connections, have {}",
            self.registry.len()
        );
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// 按 `data: <json>\n\n` 切分事件流
pub struct SseReader {
    stream: ByteStream,
    buffer: Vec<u8>,
}

impl SseReader {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            stream: Box::pin(response.bytes_stream()),
            buffer: Vec::new(),
        }
    }

    /// 返回下一帧的原始文本（包含结尾空行）
    pub async fn next_raw(&mut self) -> String {
        timeout(Duration::from_secs(5), async {
            loop {
                if let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
                    let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
                    return String::from_utf8(frame).expect("utf-8 frame");
                }
                let chunk = self
                    .stream
                    .next()
                    .await
                    .expect("stream ended before a full frame")
                    .expect("stream chunk");
                self.buffer.extend_from_slice(&chunk);
            }
        })
        .await
        .expect("timed out waiting for frame")
    }

    pub async fn next_json(&mut self) -> Value {
        let raw = self.next_raw().await;
        let payload = raw
            .strip_prefix("data: ")
            .and_then(|rest| rest.strip_suffix("\n\n"))
            .unwrap_or_else(|| panic!("unexpected frame layout: {raw:?}"));
        serde_json::from_str(payload).expect("frame json")
    }
}

pub async fn open_stream(client: &reqwest::Client, server: &TestServer) -> SseReader {
    let response = client
        .get(server.url("/api/events"))
        .send()
        .await
        .expect("open stream");
    assert_eq!(response.status(), 200);
    SseReader::new(response)
}
