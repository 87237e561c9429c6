//! Translation handler (sql.generate)

use crate::console::Command;
use crate::server::handler::{reply_with, WsContext, WsMethod, WsRequest, WsResult};
use crate::server::sink::WsReplySink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqlGenerateParams {
    /// Natural-language request; blank prompts are rejected by the console
    pub prompt: String,
}

pub struct SqlGenerateHandler;

#[async_trait]
impl WsMethod for SqlGenerateHandler {
    const METHOD: &'static str = "sql.generate";

    type Params = SqlGenerateParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(
            &ctx,
            &sink,
            Command::GenerateSql {
                prompt: params.prompt,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_required() {
        assert!(serde_json::from_value::<SqlGenerateParams>(serde_json::json!({})).is_err());
        let params: SqlGenerateParams =
            serde_json::from_value(serde_json::json!({"prompt": "all users"})).unwrap();
        assert_eq!(params.prompt, "all users");
    }
}
