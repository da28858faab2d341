//! 评分网关 - 编排层
//!
//! ## 职责
//!
//! 单个评分请求的完整流程，严格线性、不回退：
//!
//! 1. **校验**：必须有 Block
//! 2. **流水线**：有 `algorithmPipeline` 时执行
//! 3. **答案**：仍缺 `answer` 时从题库查询并写回 Block
//! 4. **评分**：发给评分函数
//!
//! 任一步出错立即返回该 `ErrorResult`。评分这一步的任何错误，`level` 都改写为
//! `Grading Function: <gradeFunction>`（没有 `gradeFunction` 时为 `None`）。

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

use crate::clients::RemoteClient;
use crate::config::Config;
use crate::error::{ErrorResult, GatewayError};
use crate::models::Block;
use crate::services::{AnswerResolver, GradeDispatcher, PipelineRunner};

/// 入口校验的错误位置
pub const GATEWAY_LEVEL: &str = "Gateway";

/// 评分网关
///
/// 不保存任何请求状态，可以在多个请求间共享（`Arc<GradingGateway>`）。
pub struct GradingGateway {
    pipeline: PipelineRunner,
    answers: AnswerResolver,
    grader: GradeDispatcher,
}

impl GradingGateway {
    /// 按配置创建网关
    pub fn new(config: Config) -> Result<Self> {
        let client = RemoteClient::new(&config).context("无法创建 HTTP 客户端")?;
        Ok(Self::with_client(config, client))
    }

    /// 使用已有的客户端创建网关
    pub fn with_client(config: Config, client: RemoteClient) -> Self {
        let config = Arc::new(config);
        let client = Arc::new(client);

        Self {
            pipeline: PipelineRunner::new(client.clone(), config.clone()),
            answers: AnswerResolver::new(client.clone(), config.clone()),
            grader: GradeDispatcher::new(client, config),
        }
    }

    /// 处理一次评分请求
    ///
    /// # 参数
    /// - `block`: 待评分的 Block（入口没有 Block 时为 `None`）
    /// - `headers`: 入站请求头，查询答案时转发其中的 `Authorization`
    ///
    /// # 返回
    /// 评分函数的结果，或第一个遇到的 `ErrorResult`
    pub async fn handle(
        &self,
        block: Option<Block>,
        headers: &HeaderMap,
    ) -> Result<Value, ErrorResult> {
        let grade_function = block
            .as_ref()
            .and_then(Block::grade_function)
            .unwrap_or_else(|| "-".to_string());
        let span = info_span!("grade", grade_function = %grade_function);

        async {
            let result = self.run(block, headers).await;
            match &result {
                Ok(_) => info!("✅ 评分完成"),
                Err(err) => warn!("❌ 评分失败: {}", err),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, block: Option<Block>, headers: &HeaderMap) -> Result<Value, ErrorResult> {
        // ========== 1. 校验 ==========
        let mut block = block.ok_or_else(|| GatewayError::MissingBlock.at(GATEWAY_LEVEL))?;

        // ========== 2. 算法流水线 ==========
        if block.has_pipeline() {
            block = self.pipeline.run_pipeline(block).await?;
        }

        // ========== 3. 补全答案 ==========
        // 算法函数可能已经给出答案（动态题目）
        if !block.has_answer() {
            let answer = self.answers.resolve_answer(&block, headers).await?;
            block.set_answer(answer);
        }

        // ========== 4. 评分 ==========
        self.grader.dispatch_grade(&block).await.map_err(|err| {
            let name = block.grade_function().unwrap_or_else(|| "None".to_string());
            err.relabel(format!("Grading Function: {}", name))
        })
    }
}
