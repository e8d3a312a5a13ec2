//! 基础设施层实现。
//!
//! 提供 PostgreSQL 消息归档，实现应用层定义的 `MessageArchive` 接口。

pub mod repository;

pub use repository::{create_pg_pool, PgMessageArchive};
