//! Web API 层。
//!
//! 提供 Axum 路由，把 HTTP / SSE 请求委托给应用层的用例服务。

mod error;
mod routes;
mod sse;
mod state;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::{AppState, WebSettings};
