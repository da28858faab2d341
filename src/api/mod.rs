//! API 模块
//!
//! 负责接收客户端（题集前端）的评分请求

pub mod handler;

pub use handler::router;
