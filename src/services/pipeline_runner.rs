//! 算法流水线 - 业务能力层
//!
//! 按声明顺序把 Block 依次交给每个算法函数，每一步返回的 `block`
//! 整体替换上一步的 Block（不做合并）。任何一步失败立即中止，
//! 不返回部分结果，也不回滚。

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::RemoteClient;
use crate::config::Config;
use crate::error::{ErrorResult, GatewayError};
use crate::models::{Block, Stage};

/// 流水线本身无法解析时的错误位置
pub const PIPELINE_LEVEL: &str = "Grading Gateway: Algorithm Pipeline";

/// 算法流水线执行器
pub struct PipelineRunner {
    client: Arc<RemoteClient>,
    config: Arc<Config>,
}

impl PipelineRunner {
    pub fn new(client: Arc<RemoteClient>, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// 执行 Block 的整条流水线
    ///
    /// 没有流水线或流水线为空时原样返回 Block。
    pub async fn run_pipeline(&self, block: Block) -> Result<Block, ErrorResult> {
        // 阶段列表取自初始 Block，中途返回的 Block 不会改变要执行的阶段
        let stages = block.stages().map_err(|err| {
            warn!("算法流水线无法解析: {}", err);
            GatewayError::InvalidPipeline(err.to_string()).at(PIPELINE_LEVEL)
        })?;
        if stages.is_empty() {
            return Ok(block);
        }

        info!("🔧 执行算法流水线，共 {} 个阶段", stages.len());

        let mut block = block;
        for (index, stage) in stages.iter().enumerate() {
            debug!(
                "阶段 {}/{}: {}",
                index + 1,
                stages.len(),
                stage.algorithm_function
            );
            block = self.run_stage(stage, block).await?;
        }

        info!("✓ 算法流水线完成");
        Ok(block)
    }

    /// 执行单个阶段，返回新的 Block
    async fn run_stage(&self, stage: &Stage, block: Block) -> Result<Block, ErrorResult> {
        let level = stage_level(&stage.algorithm_function);
        let endpoint = self.config.algorithm_endpoint(&stage.algorithm_function);

        let payload = json!({
            "command": "execute",
            "block": block,
            "params": stage.params,
        });

        let mut response = self
            .client
            .call(&level, &endpoint, Some(&payload), None)
            .await?;

        let returned = response.get_mut("block").map(Value::take);
        let returned = match returned {
            Some(returned) if !returned.is_null() => returned,
            _ => {
                warn!("[{}] 算法函数没有返回 block", level);
                return Err(GatewayError::StageReturnedNoBlock
                    .at(level)
                    .with_detail("raw_response", self.client.diagnostics().echo(Some(&response))));
            }
        };

        Block::from_value(returned.clone()).map_err(|err| {
            warn!("[{}] 算法函数返回的 block 不是对象: {}", level, err);
            GatewayError::StageReturnedInvalidBlock(err.to_string())
                .at(level.clone())
                .with_detail("raw_response", self.client.diagnostics().echo(Some(&returned)))
        })
    }
}

/// 算法阶段的错误位置
pub fn stage_level(algorithm_function: &str) -> String {
    format!("Grading Gateway: Algorithm Function: {}", algorithm_function)
}
