//! 评分分发 - 业务能力层
//!
//! 把 `{response, answer, params}` 发给 Block 指定的评分函数，
//! 评分结果原样返回。

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::RemoteClient;
use crate::config::Config;
use crate::error::{ErrorResult, GatewayError};
use crate::models::Block;

/// 评分前置检查的错误位置
pub const GET_GRADE_LEVEL: &str = "Grading Gateway: Get Grade";

/// 评分分发服务
pub struct GradeDispatcher {
    client: Arc<RemoteClient>,
    config: Arc<Config>,
}

impl GradeDispatcher {
    pub fn new(client: Arc<RemoteClient>, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// 把 Block 发给评分函数
    pub async fn dispatch_grade(&self, block: &Block) -> Result<Value, ErrorResult> {
        let grade_function = block.grade_function().ok_or_else(|| {
            warn!("Block 缺少 gradeFunction");
            GatewayError::MissingGradeFunction.at(GET_GRADE_LEVEL)
        })?;

        let level = format!("Grading Gateway: Grading Function: {}", grade_function);
        let endpoint = self.config.grading_endpoint(&grade_function);

        // 缺失的字段以 null 发送
        let field = |value: Option<&Value>| value.cloned().unwrap_or(Value::Null);
        let payload = json!({
            "response": field(block.response()),
            "answer": field(block.answer()),
            "params": field(block.grade_params()),
        });

        let mut headers = HeaderMap::new();
        headers.insert("command", HeaderValue::from_static("grade"));

        info!("📝 发送评分请求: {}", grade_function);
        self.client
            .call(&level, &endpoint, Some(&payload), Some(&headers))
            .await
    }
}
