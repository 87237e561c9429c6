//! WebSocket sinks
//!
//! `WsSink` is the transport: a shared handle on the socket's sender.
//! `WsReplySink` is scoped to one request and lets exactly one terminal
//! envelope (`result` or `error`) through.

use crate::server::protocol::{ErrorData, ResponseEnvelope};
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle on the WebSocket sender
#[derive(Clone)]
pub struct WsSink {
    inner: Arc<Mutex<SplitSink<WebSocket, Message>>>,
}

impl WsSink {
    pub fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sender)),
        }
    }

    /// Send a raw websocket message (pong/close/etc)
    pub async fn send_message_raw(&self, msg: Message) -> Result<(), WsSinkError> {
        let mut sender = self.inner.lock().await;
        sender
            .send(msg)
            .await
            .map_err(|e| WsSinkError::Send(e.to_string()))
    }

    /// Send a response envelope as a JSON text message
    pub async fn send_envelope(&self, envelope: ResponseEnvelope) -> Result<(), WsSinkError> {
        let json = serde_json::to_string(&envelope)
            .map_err(|e| WsSinkError::Serialization(e.to_string()))?;
        self.send_message_raw(Message::Text(json)).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsSinkError {
    Serialization(String),
    Send(String),
    /// A result or error was already sent for this request
    ReplyAlreadySent,
}

impl std::fmt::Display for WsSinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsSinkError::Serialization(e) => write!(f, "Serialization error: {}", e),
            WsSinkError::Send(e) => write!(f, "Send error: {}", e),
            WsSinkError::ReplyAlreadySent => write!(f, "reply already sent"),
        }
    }
}

impl std::error::Error for WsSinkError {}

/// Request-scoped sink allowing a single reply
#[derive(Clone)]
pub struct WsReplySink {
    sink: WsSink,
    id: String,
    replied: Arc<AtomicBool>,
}

impl WsReplySink {
    pub fn new(sink: WsSink, id: String) -> Self {
        Self {
            sink,
            id,
            replied: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request correlation id
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn has_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }

    pub async fn send_result<T: Serialize>(&self, data: T) -> Result<(), WsSinkError> {
        self.claim()?;
        self.sink
            .send_envelope(ResponseEnvelope::result(self.id.clone(), data))
            .await
    }

    pub async fn send_error(&self, error: ErrorData) -> Result<(), WsSinkError> {
        self.claim()?;
        self.sink
            .send_envelope(ResponseEnvelope::error(self.id.clone(), error))
            .await
    }

    fn claim(&self) -> Result<(), WsSinkError> {
        if self.replied.swap(true, Ordering::SeqCst) {
            Err(WsSinkError::ReplyAlreadySent)
        } else {
            Ok(())
        }
    }
}
