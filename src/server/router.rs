//! Registry-based method routing
//!
//! Every request receives exactly one terminal response: a handler's result,
//! or an error envelope if parsing, routing or the handler fails.

use crate::server::handler::{make_handler, DynHandler, WsContext, WsMethod, WsRequest};
use crate::server::protocol::{ErrorData, RequestEnvelope};
use crate::server::sink::{WsReplySink, WsSink};
use std::collections::HashMap;
use std::sync::Arc;

/// Method name to handler registry
pub struct Router {
    handlers: HashMap<&'static str, DynHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<M: WsMethod>(&mut self) -> &mut Self {
        self.handlers.insert(M::METHOD, make_handler::<M>());
        self
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted
    pub fn method_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn get_handler(&self, method: &str) -> Option<&DynHandler> {
        self.handlers.get(method)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes raw messages to handlers
pub struct Dispatcher {
    router: Arc<Router>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Handle one text message from a connection
    pub async fn dispatch(&self, ctx: Arc<WsContext>, message: &str, sink: WsSink) {
        let envelope: RequestEnvelope = match serde_json::from_str(message) {
            Ok(env) => env,
            Err(e) => {
                let id = uuid::Uuid::new_v4().to_string();
                let reply = WsReplySink::new(sink, id);
                let _ = reply
                    .send_error(ErrorData::invalid_request(format!(
                        "Failed to parse request: {}",
                        e
                    )))
                    .await;
                return;
            }
        };

        let request = WsRequest::from_envelope(envelope);
        let reply = WsReplySink::new(sink, request.id.clone());

        let Some(handler) = self.router.get_handler(&request.method) else {
            let _ = reply
                .send_error(ErrorData::unknown_method(&request.method))
                .await;
            return;
        };

        let method = request.method.clone();
        if let Err(e) = handler(ctx, request, reply.clone()).await {
            tracing::debug!("{} failed: {}", method, e);
            if !reply.has_replied() {
                let _ = reply.send_error(e.to_error_data()).await;
            }
        } else if !reply.has_replied() {
            tracing::warn!("{} finished without a reply", method);
            let _ = reply
                .send_error(ErrorData::internal("handler produced no response"))
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.method_names().is_empty());
        assert!(!router.has_method("schema.tables"));
    }
}
