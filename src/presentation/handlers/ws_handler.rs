// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, Path,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::session_manager::SessionManager;
use crate::domain::models::event::{SessionEvent, SessionEventKind};
use crate::domain::models::session::CrawlSession;
use crate::presentation::errors::AppError;

/// 会话实时通道
///
/// 连接建立后先推送一次当前快照，之后转发每一次状态与计数器变化，
/// 会话进入终态后关闭连接。
pub async fn session_events(
    Extension(manager): Extension<Arc<SessionManager>>,
    Path(session_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let (snapshot, receiver) = manager.subscribe(session_id).await?;

    Ok(ws.on_upgrade(move |socket| async move {
        let mut socket: WebSocket = socket;
        forward_events(&mut socket, snapshot, receiver).await;
        let _ = socket.send(Message::Close(None)).await;
    }))
}

/// 把会话事件写入消息通道
///
/// # 参数
///
/// * `sink` - 客户端连接
/// * `snapshot` - 订阅时刻的会话快照
/// * `receiver` - 会话事件订阅
pub async fn forward_events<S>(
    sink: &mut S,
    snapshot: CrawlSession,
    mut receiver: broadcast::Receiver<SessionEvent>,
) where
    S: Sink<Message> + Unpin,
{
    let session_id = snapshot.id;
    let initial = SessionEvent::from_session(SessionEventKind::StatusChanged, &snapshot);
    if send_event(sink, &initial).await.is_err() || initial.status.is_terminal() {
        return;
    }

    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                // Events are full snapshots, so the next one brings the client up to date
                warn!(%session_id, skipped, "Live channel lagged behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if send_event(sink, &event).await.is_err() {
            debug!(%session_id, "Live channel client disconnected");
            break;
        }
        if event.status.is_terminal() {
            break;
        }
    }
}

async fn send_event<S>(sink: &mut S, event: &SessionEvent) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let payload = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(payload.into()))
        .await
        .map_err(|_| ())
}
