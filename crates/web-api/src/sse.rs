use std::convert::Infallible;

use async_stream::stream;
use axum::{
    extract::State,
    http::header,
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
};
use futures_util::Stream;

use crate::{error::ApiError, state::AppState};

/// 建立长连接事件流。
///
/// 第一帧是携带连接 ID 的 `connected` 确认，之后是广播的聊天消息。
/// 不发送心跳帧；客户端断开时响应流被丢弃，会话随之从连接表移除。
pub(crate) async fn stream_events(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.stream_service.open()?;
    tracing::info!(client_id = %session.id(), "event stream opened");

    Ok((
        [(header::CONNECTION, "keep-alive")],
        Sse::new(frames(session)),
    ))
}

fn frames(
    mut session: application::StreamSession,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        while let Some(frame) = session.next_frame().await {
            yield Ok(Event::default().data(&*frame));
        }
        tracing::info!(client_id = %session.id(), "event stream ended");
    }
}
