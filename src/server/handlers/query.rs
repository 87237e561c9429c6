//! Read-only query handler (query.run)

use crate::console::Command;
use crate::server::handler::{reply_with, WsContext, WsMethod, WsRequest, WsResult};
use crate::server::sink::WsReplySink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryRunParams {
    /// A single SELECT statement, passed through verbatim
    pub sql: String,
}

pub struct QueryRunHandler;

#[async_trait]
impl WsMethod for QueryRunHandler {
    const METHOD: &'static str = "query.run";

    type Params = QueryRunParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(&ctx, &sink, Command::RunQuery { sql: params.sql }).await
    }
}
