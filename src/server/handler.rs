//! Handler trait and per-connection context for WebSocket methods
//!
//! Each connection gets its own [`WsContext`] holding a fresh [`Session`], so
//! login state and pending notices never leak between clients. Console
//! commands block on SQLite or the model, so they run on the blocking pool.

use crate::console::{Command, Console, Reply, Session};
use crate::error::ConsoleError;
use crate::server::protocol::{ErrorCode, ErrorData, RequestEnvelope};
use crate::server::sink::WsReplySink;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

// =============================================================================
// Context
// =============================================================================

#[derive(Clone)]
pub struct WsContext {
    console: Console,
    session: Arc<Mutex<Session>>,
    /// Registered method names, for `system.methods`
    methods: Arc<Vec<&'static str>>,
    admin_enabled: bool,
}

impl WsContext {
    /// Context for a new connection, starting from a fresh session
    pub fn new(console: Console, methods: Arc<Vec<&'static str>>, admin_enabled: bool) -> Self {
        Self {
            console,
            session: Arc::new(Mutex::new(Session::new())),
            methods,
            admin_enabled,
        }
    }

    pub fn methods(&self) -> &[&'static str] {
        &self.methods
    }

    pub fn admin_enabled(&self) -> bool {
        self.admin_enabled
    }

    /// Dispatch a console command for this connection's session
    pub async fn run(&self, command: Command) -> WsResult<Reply> {
        let console = self.console.clone();
        let session = self.session.clone();
        let name = command.name();
        tokio::task::spawn_blocking(move || {
            let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
            console.dispatch(&mut session, command)
        })
        .await
        .map_err(|e| WsError::internal(format!("{} task failed: {}", name, e)))?
        .map_err(WsError::from)
    }
}

// =============================================================================
// Request
// =============================================================================

/// Processed WebSocket request with guaranteed ID
#[derive(Debug, Clone)]
pub struct WsRequest {
    /// Request correlation ID (client-provided or server-generated)
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl WsRequest {
    /// Build from an envelope, generating an ID if the client sent none
    pub fn from_envelope(envelope: RequestEnvelope) -> Self {
        let id = envelope
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            id,
            method: envelope.method,
            params: envelope.params,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

pub type WsResult<T> = Result<T, WsError>;

#[derive(Debug, Clone)]
pub struct WsError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

impl WsError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn to_error_data(&self) -> ErrorData {
        match &self.details {
            Some(details) => {
                ErrorData::with_details(self.code, self.message.clone(), details.clone())
            }
            None => ErrorData::new(self.code, self.message.clone()),
        }
    }
}

impl std::fmt::Display for WsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for WsError {}

impl From<ConsoleError> for WsError {
    fn from(err: ConsoleError) -> Self {
        let code = ErrorCode::from(&err);
        let details = match &err {
            ConsoleError::Validation { field, .. } => {
                Some(serde_json::json!({ "field": field, "level": err.level() }))
            }
            _ => Some(serde_json::json!({ "level": err.level() })),
        };
        Self {
            code,
            message: err.to_string(),
            details,
        }
    }
}

impl From<serde_json::Error> for WsError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_params(err.to_string())
    }
}

// =============================================================================
// Handler Trait
// =============================================================================

/// A WebSocket method
#[async_trait]
pub trait WsMethod: Send + Sync + 'static {
    /// Fully qualified method name, e.g. "schema.create"
    const METHOD: &'static str;

    type Params: DeserializeOwned + Send;

    /// Extra checks after deserialization
    fn validate(_params: &Self::Params) -> WsResult<()> {
        Ok(())
    }

    /// Execute the method and send its result through `sink`
    async fn handle(
        ctx: Arc<WsContext>,
        req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()>;
}

/// Run a console command and send its reply as the request's result
pub async fn reply_with(ctx: &WsContext, sink: &WsReplySink, command: Command) -> WsResult<()> {
    let reply = ctx.run(command).await?;
    sink.send_result(reply)
        .await
        .map_err(|e| WsError::internal(e.to_string()))
}

/// Type-erased handler function
pub type DynHandler = Box<
    dyn Fn(Arc<WsContext>, WsRequest, WsReplySink) -> futures::future::BoxFuture<'static, WsResult<()>>
        + Send
        + Sync,
>;

/// An omitted `params` means no parameters
fn params_value(params: &Value) -> Value {
    match params {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    }
}

pub fn make_handler<M: WsMethod>() -> DynHandler {
    Box::new(move |ctx, req, sink| {
        Box::pin(async move {
            let params: M::Params = serde_json::from_value(params_value(&req.params))?;
            M::validate(&params)?;
            M::handle(ctx, req, params, sink).await
        })
    })
}
