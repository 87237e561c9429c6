//! System handlers for introspection methods
//!
//! `system.info` and `system.methods` let clients discover server
//! capabilities.

use crate::server::handler::{WsContext, WsError, WsMethod, WsRequest, WsResult};
use crate::server::protocol::SystemInfo;
use crate::server::sink::WsReplySink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// system.info
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SystemInfoParams {}

pub struct SystemInfoHandler;

#[async_trait]
impl WsMethod for SystemInfoHandler {
    const METHOD: &'static str = "system.info";

    type Params = SystemInfoParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        _params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        sink.send_result(SystemInfo::new(ctx.admin_enabled()))
            .await
            .map_err(|e| WsError::internal(e.to_string()))
    }
}

// =============================================================================
// system.methods
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SystemMethodsParams {}

#[derive(Debug, Clone, Serialize)]
pub struct SystemMethodsResponse {
    pub methods: Vec<&'static str>,
}

pub struct SystemMethodsHandler;

#[async_trait]
impl WsMethod for SystemMethodsHandler {
    const METHOD: &'static str = "system.methods";

    type Params = SystemMethodsParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        _params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        let response = SystemMethodsResponse {
            methods: ctx.methods().to_vec(),
        };
        sink.send_result(response)
            .await
            .map_err(|e| WsError::internal(e.to_string()))
    }
}
