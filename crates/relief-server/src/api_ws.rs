//! WebSocket observer channel.
//!
//! Observers connect anonymously to `/ws` and select topics with
//! `subscribe` / `unsubscribe` frames. Every committed change on a selected
//! topic is forwarded as an `event` frame carrying the hub sequence number.

use crate::hub::Subscription;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket, WebSocketUpgrade},
        Extension,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use relief_types::{Envelope, Topic};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Frames sent by the observer.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingMessage {
    Subscribe { topic: String },
    Unsubscribe { topic: String },
}

/// Frames sent to the observer.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    Subscribed { topic: Topic },
    Unsubscribed { topic: Topic },
    /// A committed change: `topic`, `seq` and `payload` inlined.
    Event(Envelope),
    Error { message: String },
}

/// Outgoing frames buffered per observer. Beyond this the observer is too
/// slow and frames are dropped.
const OUTBOUND_BUFFER: usize = 256;

/// Handler for `GET /ws`.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let subscription = state.hub.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, subscription, state))
}

async fn handle_socket(socket: WebSocket, mut subscription: Subscription, state: Arc<AppState>) {
    tracing::info!(observers = state.hub.observer_count(), "observer connected");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(AxumMessage::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(AxumMessage::Text(text))) => {
                    handle_incoming(text.as_str(), &mut subscription, &tx);
                }
                Some(Ok(AxumMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            event = subscription.recv() => match event {
                Some(envelope) => send_frame(&tx, &OutgoingMessage::Event(envelope)),
                None => break,
            },
        }

        if send_task.is_finished() {
            break;
        }
    }

    drop(tx);
    send_task.abort();
    tracing::info!("observer disconnected");
}

fn handle_incoming(text: &str, subscription: &mut Subscription, tx: &mpsc::Sender<String>) {
    let incoming = match serde_json::from_str::<IncomingMessage>(text) {
        Ok(incoming) => incoming,
        Err(e) => {
            send_ws_error(tx, format!("invalid frame: {e}"));
            return;
        }
    };

    match incoming {
        IncomingMessage::Subscribe { topic } => match topic.parse::<Topic>() {
            Ok(topic) => {
                subscription.subscribe(topic);
                tracing::debug!(topic = %topic, "observer subscribed");
                send_frame(tx, &OutgoingMessage::Subscribed { topic });
            }
            Err(e) => send_ws_error(tx, e.to_string()),
        },
        IncomingMessage::Unsubscribe { topic } => match topic.parse::<Topic>() {
            Ok(topic) => {
                subscription.unsubscribe(topic);
                tracing::debug!(topic = %topic, "observer unsubscribed");
                send_frame(tx, &OutgoingMessage::Unsubscribed { topic });
            }
            Err(e) => send_ws_error(tx, e.to_string()),
        },
    }
}

fn send_frame(tx: &mpsc::Sender<String>, frame: &OutgoingMessage) {
    match serde_json::to_string(frame) {
        Ok(json) => {
            if let Err(e) = tx.try_send(json) {
                tracing::warn!("dropping frame for slow observer: {}", e);
            }
        }
        Err(e) => {
            tracing::error!("failed to serialize WebSocket frame: {}", e);
        }
    }
}

fn send_ws_error(tx: &mpsc::Sender<String>, message: String) {
    send_frame(tx, &OutgoingMessage::Error { message });
}
