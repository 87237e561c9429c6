//! WebSocket method handlers
//!
//! Handlers are organized by namespace:
//!
//! - `system` - introspection (system.info, system.methods)
//! - `session` - page navigation (session.navigate)
//! - `sql` - translation (sql.generate)
//! - `schema` - tables and rows (schema.tables, schema.describe, schema.read,
//!   schema.create, schema.insert)
//! - `query` - read-only queries (query.run)
//! - `admin` - privileged actions (admin.login, admin.drop, admin.logout)

pub mod admin;
pub mod query;
pub mod schema;
pub mod session;
pub mod sql;
pub mod system;

pub use admin::{AdminDropHandler, AdminLoginHandler, AdminLogoutHandler};
pub use query::QueryRunHandler;
pub use schema::{
    SchemaCreateHandler, SchemaDescribeHandler, SchemaInsertHandler, SchemaReadHandler,
    SchemaTablesHandler,
};
pub use session::SessionNavigateHandler;
pub use sql::SqlGenerateHandler;
pub use system::{SystemInfoHandler, SystemMethodsHandler};
