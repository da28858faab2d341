//! 答案查询 - 业务能力层
//!
//! Block 经过流水线后仍没有 `answer` 时，凭 `response_id` 从题库查询正确答案。
//! 题库需要鉴权，入站请求的 `Authorization` 头只做格式检查后原样转发，
//! 不校验 token 内容。

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clients::RemoteClient;
use crate::config::Config;
use crate::error::{ErrorResult, GatewayError};
use crate::models::Block;

/// 答案查询的错误位置
pub const ANSWER_LEVEL: &str = "Grading Gateway: Get Correct Answer";

/// 答案查询服务
pub struct AnswerResolver {
    client: Arc<RemoteClient>,
    config: Arc<Config>,
}

impl AnswerResolver {
    pub fn new(client: Arc<RemoteClient>, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// 查询 Block 的正确答案
    ///
    /// # 参数
    /// - `block`: 缺少 `answer` 的 Block
    /// - `headers`: 入站请求头（需要 `Authorization: Bearer <token>`）
    ///
    /// # 返回
    /// 题库接口的响应，原样返回
    pub async fn resolve_answer(
        &self,
        block: &Block,
        headers: &HeaderMap,
    ) -> Result<Value, ErrorResult> {
        let authorization = bearer_authorization(headers).map_err(|err| {
            warn!("Authorization 头不合法: {}", err);
            err.at(ANSWER_LEVEL)
        })?;

        let response_id = block.response_id().ok_or_else(|| {
            warn!("Block 缺少 response_id，无法查询答案");
            GatewayError::MissingResponseId.at(ANSWER_LEVEL)
        })?;

        debug!("📚 查询答案 response_id={}", response_id);

        let mut forwarded = HeaderMap::new();
        forwarded.insert(AUTHORIZATION, authorization.clone());

        self.client
            .call(
                ANSWER_LEVEL,
                &self.config.answer_endpoint,
                Some(&json!({ "response_id": response_id })),
                Some(&forwarded),
            )
            .await
    }
}

/// 检查 `Authorization` 头的格式，返回原始头值
///
/// 格式必须是 `Bearer <token>`，scheme 不区分大小写。
pub fn bearer_authorization(headers: &HeaderMap) -> Result<&HeaderValue, GatewayError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(GatewayError::MissingAuthorization)?;
    let text = value
        .to_str()
        .map_err(|_| GatewayError::MalformedAuthorization)?;

    let mut parts = text.split_whitespace();
    let scheme = parts.next().ok_or(GatewayError::MissingAuthorization)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(GatewayError::NotBearer);
    }

    match (parts.next(), parts.next()) {
        (None, _) => Err(GatewayError::MissingToken),
        (Some(_), Some(_)) => Err(GatewayError::MalformedAuthorization),
        (Some(_), None) => Ok(value),
    }
}
