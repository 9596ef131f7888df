//! Domain Layer
//!
//! 请求、响应与数据库结构等被动数据形状

pub mod database;
pub mod query;

pub use database::{ColumnInfo, DatabaseInfo, TableSummary, ToolInfo};
pub use query::{QueryRequest, QueryResponse};
