//! Per-tenant isolated SQL databases, reachable only through a gatekept,
//! never-synchronously-throwing surface.

mod bridge;
pub mod classify;
pub mod dbid;
mod value;

pub use bridge::{ExecResult, ExecSummary, FirstResult, PreparedStatement, QueryResult, SqlBridge};
pub use value::SqlValue;
