//! Schema handlers
//!
//! - `schema.tables`: list user tables
//! - `schema.describe`: column names and declared types of one table
//! - `schema.read`: every row of one table
//! - `schema.create`: validated `CREATE TABLE`
//! - `schema.insert`: one row, values in column order

use crate::console::Command;
use crate::lens::table_builder::{ColumnSpec, MAX_COLUMNS};
use crate::server::handler::{reply_with, WsContext, WsError, WsMethod, WsRequest, WsResult};
use crate::server::sink::WsReplySink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// schema.tables
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaTablesParams {}

pub struct SchemaTablesHandler;

#[async_trait]
impl WsMethod for SchemaTablesHandler {
    const METHOD: &'static str = "schema.tables";

    type Params = SchemaTablesParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        _params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(&ctx, &sink, Command::ListTables).await
    }
}

// =============================================================================
// schema.describe / schema.read
// =============================================================================

/// Parameters naming a single table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableParams {
    pub table: String,
}

pub struct SchemaDescribeHandler;

#[async_trait]
impl WsMethod for SchemaDescribeHandler {
    const METHOD: &'static str = "schema.describe";

    type Params = TableParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(
            &ctx,
            &sink,
            Command::DescribeTable {
                table: params.table,
            },
        )
        .await
    }
}

pub struct SchemaReadHandler;

#[async_trait]
impl WsMethod for SchemaReadHandler {
    const METHOD: &'static str = "schema.read";

    type Params = TableParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(
            &ctx,
            &sink,
            Command::ReadTable {
                table: params.table,
            },
        )
        .await
    }
}

// =============================================================================
// schema.create
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaCreateParams {
    pub table: String,
    pub columns: Vec<ColumnSpec>,
}

pub struct SchemaCreateHandler;

#[async_trait]
impl WsMethod for SchemaCreateHandler {
    const METHOD: &'static str = "schema.create";

    type Params = SchemaCreateParams;

    fn validate(params: &Self::Params) -> WsResult<()> {
        // oversized payloads are refused before they reach the blocking pool
        if params.columns.len() > MAX_COLUMNS * 4 {
            return Err(WsError::invalid_params(format!(
                "too many columns ({})",
                params.columns.len()
            )));
        }
        Ok(())
    }

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(
            &ctx,
            &sink,
            Command::CreateTable {
                table: params.table,
                columns: params.columns,
            },
        )
        .await
    }
}

// =============================================================================
// schema.insert
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaInsertParams {
    pub table: String,
    pub values: Vec<String>,
}

pub struct SchemaInsertHandler;

#[async_trait]
impl WsMethod for SchemaInsertHandler {
    const METHOD: &'static str = "schema.insert";

    type Params = SchemaInsertParams;

    async fn handle(
        ctx: Arc<WsContext>,
        _req: WsRequest,
        params: Self::Params,
        sink: WsReplySink,
    ) -> WsResult<()> {
        reply_with(
            &ctx,
            &sink,
            Command::InsertRow {
                table: params.table,
                values: params.values,
            },
        )
        .await
    }
}
