//! Admin handlers
//!
//! Login state belongs to the connection's session: `admin.login` on one
//! socket grants nothing to another.

use crate::console::Command;
use crate::server::handler::{reply_with, WsContext, WsMethod, WsRequest, WsResult};
use crate::server::sink::WsReplySink;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

// =============================================================================
// admin.login
// =============================================================================

#[derive(Clone, Deserialize)]
pub struct AdminLoginParams {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminLoginParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminLoginParams")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct AdminLoginHandler;

#[async_trait]
impl WsMethod for AdminLoginHandler {
    const METHOD: &'static str = "admin.login";

    type Params = AdminLoginParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(
            &ctx,
            &sink,
            Command::Login {
                username: params.username,
                password: params.password,
            },
        )
        .await
    }
}

// =============================================================================
// admin.drop
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AdminDropParams {
    pub table: String,
    /// Without `true` the drop is a no-op
    #[serde(default)]
    pub confirmed: bool,
}

pub struct AdminDropHandler;

#[async_trait]
impl WsMethod for AdminDropHandler {
    const METHOD: &'static str = "admin.drop";

    type Params = AdminDropParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(
            &ctx,
            &sink,
            Command::DropTable {
                table: params.table,
                confirmed: params.confirmed,
            },
        )
        .await
    }
}

// =============================================================================
// admin.logout
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminLogoutParams {}

pub struct AdminLogoutHandler;

#[async_trait]
impl WsMethod for AdminLogoutHandler {
    const METHOD: &'static str = "admin.logout";

    type Params = AdminLogoutParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        _params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(&ctx, &sink, Command::Logout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_params_debug_hides_password() {
        let params: AdminLoginParams = serde_json::from_value(serde_json::json!({
            "username": "admin",
            "password": "admin123"
        }))
        .unwrap();
        let out = format!("{:?}", params);
        assert!(out.contains("admin"));
        assert!(!out.contains("admin123"));
    }

    #[test]
    fn test_drop_defaults_to_unconfirmed() {
        let params: AdminDropParams =
            serde_json::from_value(serde_json::json!({"table": "t"})).unwrap();
        assert!(!params.confirmed);
    }
}
