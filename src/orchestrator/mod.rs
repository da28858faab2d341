//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! api (HTTP 入口，解析 command / block)
//!     ↓
//! orchestrator::GradingGateway (一次评分请求：流水线 → 答案 → 评分)
//!     ↓
//! services (能力层：PipelineRunner / AnswerResolver / GradeDispatcher)
//!     ↓
//! clients::RemoteClient (一次远程调用，失败统一转成 ErrorResult)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → services → clients
//! 2. **无共享状态**：每个请求独立，组件都是无状态的
//! 3. **错误即数据**：每层都返回 `Result<_, ErrorResult>`，第一个错误终止后续步骤

pub mod grading_gateway;

pub use grading_gateway::{GradingGateway, GATEWAY_LEVEL};
