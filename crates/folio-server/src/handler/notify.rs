use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_sdk::{ConnectionId, Folio, ProjectId, RoomEvent, RoomMember};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::error::ServerResult;
use crate::router::AppState;

/// Long poll: answers with the next update of the project, or
/// `204 No Content` once the hub's timeout elapses.
pub async fn poll_handler(State(state): State<AppState>, Path(project): Path<ProjectId>) -> ServerResult<Response> {
    let project = state.projects.project(&project).await?;
    Ok(match state.folio.wait_for_update(project.id).await {
        Some(update) => Json(update).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Join the project's socket room.
///
/// Text frames from the client are relayed to the other members; project
/// updates arrive as `{"updatedBy": ...}` frames.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(project): Path<ProjectId>,
) -> ServerResult<Response> {
    let project = state.projects.project(&project).await?;
    let folio = Arc::clone(&state.folio);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, folio, project.id)))
}

async fn handle_socket(socket: WebSocket, folio: Arc<Folio>, project: ProjectId) {
    let member = folio.open_project_socket(project);
    let connection = member.id();
    info!(%project, %connection, "socket connected");

    let (sender, receiver) = socket.split();
    let mut send_task = tokio::spawn(send_events(sender, member));
    let mut recv_task = tokio::spawn(receive_messages(receiver, Arc::clone(&folio), project, connection));

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    folio.close_project_socket(&project, connection);
    info!(%project, %connection, "socket closed");
}

async fn send_events(mut sender: SplitSink<WebSocket, Message>, mut member: RoomMember) {
    while let Some(event) = member.recv().await {
        let text = match event {
            RoomEvent::Update(update) => match serde_json::to_string(&update) {
                Ok(json) => json,
                Err(e) => {
                    warn!(connection = %member.id(), error = %e, "failed to encode update");
                    continue;
                }
            },
            RoomEvent::Relay(text) => text,
        };
        if let Err(e) = sender.send(Message::Text(text)).await {
            debug!(connection = %member.id(), error = %e, "socket write failed");
            break;
        }
    }
}

async fn receive_messages(
    mut receiver: SplitStream<WebSocket>,
    folio: Arc<Folio>,
    project: ProjectId,
    connection: ConnectionId,
) {
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                folio.hub().relay(&project, connection, text);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(%connection, error = %e, "socket read failed");
                break;
            }
        }
    }
}
