//! Session handlers (session.navigate)

use crate::console::{Command, Page};
use crate::server::handler::{reply_with, WsContext, WsMethod, WsRequest, WsResult};
use crate::server::sink::WsReplySink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters for session.navigate
///
/// With no page given, the current page is re-rendered.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NavigateParams {
    #[serde(default)]
    pub page: Option<Page>,
}

pub struct SessionNavigateHandler;

#[async_trait]
impl WsMethod for SessionNavigateHandler {
    const METHOD: &'static str = "session.navigate";

    type Params = NavigateParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        let command = match params.page {
            Some(page) => Command::Navigate { page },
            None => Command::Refresh,
        };
        reply_with(&ctx, &sink, command).await
    }
}
