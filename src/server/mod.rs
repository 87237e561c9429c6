//! WebSocket server
//!
//! Exposes the console over a JSON request/response protocol on `/ws`, plus a
//! `/health` probe.
//!
//! # Architecture
//!
//! - `protocol` - request/response envelopes and error codes
//! - `handler` - `WsMethod` trait and the per-connection `WsContext`
//! - `sink` - transport sink and the single-reply guard
//! - `router` - method registry and dispatcher
//! - `handlers` - one module per method namespace
//!
//! # Connection lifecycle
//!
//! Each connection gets a fresh [`Session`](crate::console::Session). The
//! connection loop enforces:
//! - max message size (`ServerConfig.max_message_size`)
//! - periodic ping keepalive (`ServerConfig.ping_interval_secs`)
//! - idle timeout (`ServerConfig.connection_timeout_secs`)
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlscribe::server::{create_router, start_server, ServerConfig};
//!
//! let config = ServerConfig::from_config(&sqlscribe_config);
//! start_server(create_router(), console, config).await?;
//! ```

pub mod handler;
pub mod handlers;
pub mod protocol;
pub mod router;
pub mod sink;

pub use handler::{WsContext, WsError, WsMethod, WsRequest, WsResult};
pub use protocol::{ErrorCode, ErrorData, RequestEnvelope, ResponseEnvelope, ResponseType, SystemInfo};
pub use router::{Dispatcher, Router};
pub use sink::{WsReplySink, WsSink, WsSinkError};

use crate::config::SqlscribeConfig;
use crate::console::Console;
use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router as AxumRouter,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,

    /// Maximum message size in bytes
    pub max_message_size: usize,

    pub connection_timeout_secs: u64,

    pub ping_interval_secs: u64,

    /// Whether an administrator password hash is configured
    pub admin_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
            max_message_size: 1024 * 1024, // 1MB
            connection_timeout_secs: 300,  // 5 minutes
            ping_interval_secs: 30,
            admin_enabled: false,
        }
    }
}

impl ServerConfig {
    pub fn from_config(config: &SqlscribeConfig) -> Self {
        Self {
            address: config.server_address.clone(),
            port: config.server_port,
            admin_enabled: config.admin_enabled(),
            ..Self::default()
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

// =============================================================================
// Router Creation
// =============================================================================

/// Create a router with every method registered
pub fn create_router() -> Router {
    use handlers::*;

    let mut router = Router::new();

    router.register::<SystemInfoHandler>();
    router.register::<SystemMethodsHandler>();

    router.register::<SessionNavigateHandler>();

    router.register::<SqlGenerateHandler>();

    router.register::<SchemaTablesHandler>();
    router.register::<SchemaDescribeHandler>();
    router.register::<SchemaReadHandler>();
    router.register::<SchemaCreateHandler>();
    router.register::<SchemaInsertHandler>();

    router.register::<QueryRunHandler>();

    router.register::<AdminLoginHandler>();
    router.register::<AdminDropHandler>();
    router.register::<AdminLogoutHandler>();

    router
}

// =============================================================================
// Server State
// =============================================================================

#[derive(Clone)]
pub struct ServerState {
    pub dispatcher: Arc<Dispatcher>,
    pub console: Console,
    pub methods: Arc<Vec<&'static str>>,
    pub config: Arc<ServerConfig>,
}

impl ServerState {
    pub fn new(router: Router, console: Console, config: ServerConfig) -> Self {
        let methods = Arc::new(router.method_names());
        Self {
            dispatcher: Arc::new(Dispatcher::new(router)),
            console,
            methods,
            config: Arc::new(config),
        }
    }

    /// Context for a newly accepted connection
    pub fn connection_context(&self) -> WsContext {
        WsContext::new(
            self.console.clone(),
            self.methods.clone(),
            self.config.admin_enabled,
        )
    }
}

// =============================================================================
// Axum Router Creation
// =============================================================================

pub fn create_axum_router(state: ServerState) -> AxumRouter {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    AxumRouter::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (sender, mut receiver) = socket.split();
    let sink = WsSink::new(sender);
    let ctx = Arc::new(state.connection_context());

    tracing::info!("WebSocket connection established");

    let max_message_size = state.config.max_message_size;
    let ping_interval = Duration::from_secs(state.config.ping_interval_secs.max(1));
    let idle_timeout = Duration::from_secs(state.config.connection_timeout_secs.max(1));

    let mut last_activity = Instant::now();
    let mut next_ping = Instant::now() + ping_interval;

    loop {
        tokio::select! {
            maybe_msg = receiver.next() => {
                let Some(msg) = maybe_msg else {
                    break;
                };

                match msg {
                    Ok(Message::Text(text)) => {
                        if text.len() > max_message_size {
                            tracing::warn!(
                                "Closing connection: text message too large ({} > {} bytes)",
                                text.len(),
                                max_message_size
                            );
                            let _ = sink.send_message_raw(Message::Close(None)).await;
                            break;
                        }
                        last_activity = Instant::now();
                        state.dispatcher.dispatch(ctx.clone(), &text, sink.clone()).await;
                    }
                    Ok(Message::Binary(data)) => {
                        if data.len() > max_message_size {
                            tracing::warn!(
                                "Closing connection: binary message too large ({} > {} bytes)",
                                data.len(),
                                max_message_size
                            );
                            let _ = sink.send_message_raw(Message::Close(None)).await;
                            break;
                        }
                        last_activity = Instant::now();

                        match String::from_utf8(data) {
                            Ok(text) => {
                                state.dispatcher.dispatch(ctx.clone(), &text, sink.clone()).await;
                            }
                            Err(_) => {
                                tracing::warn!("Received non-UTF8 binary message, ignoring");
                            }
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        last_activity = Instant::now();
                        if let Err(e) = sink.send_message_raw(Message::Pong(data)).await {
                            tracing::warn!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Ok(Message::Pong(_)) => {
                        last_activity = Instant::now();
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("WebSocket connection closed by client");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            _ = tokio::time::sleep_until(next_ping) => {
                if last_activity.elapsed() > idle_timeout {
                    tracing::info!(
                        "Closing connection due to idle timeout (>{}s)",
                        idle_timeout.as_secs()
                    );
                    let _ = sink.send_message_raw(Message::Close(None)).await;
                    break;
                }

                if let Err(e) = sink.send_message_raw(Message::Ping(Vec::new())).await {
                    tracing::warn!("Failed to send ping: {}", e);
                    break;
                }

                next_ping = Instant::now() + ping_interval;
            }
        }
    }

    tracing::info!("WebSocket connection closed");
}

// =============================================================================
// Server Startup
// =============================================================================

/// Start the WebSocket server and serve until the process ends
pub async fn start_server(
    router: Router,
    console: Console,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let bind_address = config.bind_address();
    let state = ServerState::new(router, console, config);
    let app = create_axum_router(state);

    tracing::info!("Starting WebSocket server on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(!config.admin_enabled);
    }

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::default().with_address("0.0.0.0").with_port(9000);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_server_config_from_config() {
        let mut cfg = SqlscribeConfig::default();
        cfg.server_port = 9999;
        cfg.admin_password_hash = Some("$2b$04$abc".into());
        let config = ServerConfig::from_config(&cfg);
        assert_eq!(config.port, 9999);
        assert!(config.admin_enabled);
    }

    #[test]
    fn test_create_router() {
        let router = create_router();
        for method in [
            "system.info",
            "system.methods",
            "session.navigate",
            "sql.generate",
            "schema.tables",
            "schema.describe",
            "schema.read",
            "schema.create",
            "schema.insert",
            "query.run",
            "admin.login",
            "admin.drop",
            "admin.logout",
        ] {
            assert!(router.has_method(method), "{} not registered", method);
        }
        assert_eq!(router.method_names().len(), 13);
        assert!(!router.has_method("unknown.method"));
    }

    #[tokio::test]
    async fn test_connections_get_separate_sessions() {
        use crate::console::{Command, Reply};

        let state = ServerState::new(
            create_router(),
            handler::tests::test_console(),
            ServerConfig::default(),
        );
        let a = state.connection_context();
        let b = state.connection_context();
        assert_eq!(a.methods().len(), 13);
        assert!(!a.admin_enabled());

        let reply = a
            .run(Command::Login {
                username: "admin".into(),
                password: "admin123".into(),
            })
            .await
            .unwrap();
        assert_eq!(reply, Reply::LoggedIn);

        let err = b
            .run(Command::DropTable {
                table: "t".into(),
                confirmed: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthFailed);
    }
}
