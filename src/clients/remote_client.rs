//! 远程调用客户端
//!
//! 封装一次对外 HTTP 调用，把所有失败（连接、超时、非 2xx、未知、响应体解析）
//! 统一转换成 [`ErrorResult`]。不重试，不缓存。

use reqwest::header::HeaderMap;
use serde_json::Value;
use std::error::Error as StdError;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Diagnostics, ErrorResult, GatewayError};
use crate::utils::logging::preview_json;

/// 远程调用客户端
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    diagnostics: Diagnostics,
}

impl RemoteClient {
    /// 创建新的客户端，超时取自配置
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            diagnostics: Diagnostics::new(config.debug),
        })
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// 发起一次调用
    ///
    /// # 参数
    /// - `level`: 出错时写入 `ErrorResult` 的位置
    /// - `endpoint`: 完整地址
    /// - `payload`: JSON 请求体（可选）
    /// - `headers`: 额外请求头（可选）
    ///
    /// # 返回
    /// 成功时返回响应 JSON；响应体本身是 `{"error": ...}` 时原样作为错误返回
    pub async fn call(
        &self,
        level: &str,
        endpoint: &str,
        payload: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> Result<Value, ErrorResult> {
        debug!("远程调用 [{}] -> {}", level, endpoint);
        if let Some(preview) = self.payload_preview(payload) {
            debug!("请求体: {}", preview);
        }

        let mut request = self.http.get(endpoint);
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        if let Some(headers) = headers {
            request = request.headers(headers.clone());
        }

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| self.failure(level, classify(&err), payload))?;

        let body = response
            .bytes()
            .await
            .map_err(|err| self.failure(level, classify(&err), payload))?;

        let data: Value = serde_json::from_slice(&body)
            .map_err(|err| self.failure(level, GatewayError::Decode(err.to_string()), payload))?;

        match data.get("error") {
            Some(error) if !error.is_null() => Err(downstream_error(level, data.clone())),
            _ => {
                debug!("远程调用成功 [{}]", level);
                Ok(data)
            }
        }
    }

    /// 请求体预览，只在调试模式下输出学生提交的内容
    fn payload_preview(&self, payload: Option<&Value>) -> Option<String> {
        payload
            .filter(|_| self.diagnostics.is_debug())
            .map(|payload| preview_json(payload, 200))
    }

    /// 把调用失败转换为 `ErrorResult`
    ///
    /// 传输层失败的 `level` 加 ` get` 后缀并附带 `req_json`；
    /// 响应体解析失败只保留原 `level`。
    fn failure(&self, level: &str, err: GatewayError, payload: Option<&Value>) -> ErrorResult {
        let result = if err.is_transport() {
            err.at(format!("{} get", level))
                .with_detail("req_json", self.diagnostics.echo(payload))
        } else {
            err.at(level)
        };
        warn!("{}", result);
        result
    }
}

/// 按失败类别分类传输错误
fn classify(err: &reqwest::Error) -> GatewayError {
    let cause = describe(err);

    if err.is_timeout() {
        GatewayError::Timeout(cause)
    } else if err.is_status() {
        GatewayError::HttpStatus(cause)
    } else if err.is_connect() {
        GatewayError::Connect(cause)
    } else {
        GatewayError::Unknown(cause)
    }
}

/// 错误及其 source 链
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

/// 下游服务自己返回的错误，只解包一次，不再包装
fn downstream_error(level: &str, data: Value) -> ErrorResult {
    match serde_json::from_value::<ErrorResult>(data.clone()) {
        Ok(result) => {
            warn!("下游服务返回错误: {}", result);
            result
        }
        Err(_) => {
            let result = ErrorResult::new(level, "Remote service returned an error")
                .with_detail("raw_error", data.get("error").cloned().unwrap_or(Value::Null));
            warn!("下游服务返回无法识别的错误: {}", result);
            result
        }
    }
}
