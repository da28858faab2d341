//! # Grading Gateway
//!
//! 评分编排网关：接收题集前端提交的作答块（Block），
//! 经过算法流水线变换、补全正确答案后，分发给对应的评分函数并返回结果。
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 对外调用能力
//! - `RemoteClient` - 一次远程调用，所有失败统一转换为 `ErrorResult`
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 每个服务只负责一件事
//! - `PipelineRunner` - 依次执行算法阶段，每步整体替换 Block
//! - `AnswerResolver` - 检查 Bearer 凭证，从题库查询正确答案
//! - `GradeDispatcher` - 把作答和答案发给评分函数
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/` - `GradingGateway` 串联：流水线 → 答案 → 评分
//!
//! ### ④ 入口（API）
//! - `api/` - HTTP 路由，解析 `command` / `block`
//! - `app` - 应用生命周期
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use clients::RemoteClient;
pub use config::Config;
pub use error::{ConfigError, Diagnostics, ErrorResult, GatewayError};
pub use models::{Block, Stage};
pub use orchestrator::GradingGateway;
