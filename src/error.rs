//! 错误类型
//!
//! 网关对客户端只有一种失败形态：[`ErrorResult`]，即
//! `{"error": {"level": ..., "description": ..., ...诊断字段}}`。
//!
//! 内部用 [`GatewayError`] 区分失败类别（凭证、传输、解析、契约……），
//! 在发现错误的组件处通过 [`GatewayError::at`] 挂上 `level` 变成 `ErrorResult`，
//! 之后只作为数据向上传递，不会再被包装第二次。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// 非调试模式下替代原始请求/响应的占位内容
pub const REDACTED: &str = "ENV_MODE != dev";

/// 统一的错误结果（对外的线上格式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{}: {}", .error.level, .error.description)]
pub struct ErrorResult {
    pub error: ErrorBody,
}

/// 错误详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// 出错位置，例如 `Grading Gateway: Algorithm Function: normalize`
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub description: String,
    /// 诊断字段（`req_json`、`raw_response`，或下游服务自带的字段）
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ErrorResult {
    pub fn new(level: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                level: level.into(),
                description: description.into(),
                details: Map::new(),
            },
        }
    }

    /// 附加一个诊断字段
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.error.details.insert(key.into(), value);
        self
    }

    pub fn level(&self) -> &str {
        &self.error.level
    }

    pub fn description(&self) -> &str {
        &self.error.description
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.error.details.get(key)
    }

    /// 覆盖 `level`，其余字段保持不变
    pub fn relabel(mut self, level: impl Into<String>) -> Self {
        self.error.level = level.into();
        self
    }
}

/// 网关内部的错误分类
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    // ========== 入口 ==========
    #[error("Grading gateway needs a block to grade")]
    MissingBlock,

    #[error("Block could not be parsed: {0}")]
    InvalidBlock(String),

    #[error("Request body could not be parsed: {0}")]
    InvalidBody(String),

    #[error("Command either not given or invalid. (request body needs a 'command' field)")]
    InvalidCommand,

    // ========== 传输 ==========
    #[error("A Http Error occurred: {0}")]
    HttpStatus(String),

    #[error("An Error Connecting to the API occurred: {0}")]
    Connect(String),

    #[error("A Timeout Error occurred: {0}")]
    Timeout(String),

    #[error("An Unknown Error occurred: {0}")]
    Unknown(String),

    #[error("An Error occured when parsing JSON from response: {0}")]
    Decode(String),

    // ========== 凭证 ==========
    #[error("The Authorization header was not supplied")]
    MissingAuthorization,

    #[error("Authorization header must start with Bearer")]
    NotBearer,

    #[error("Token not found in Authorization header")]
    MissingToken,

    #[error("Authorization header must be: Bearer token")]
    MalformedAuthorization,

    // ========== 契约 ==========
    #[error("Block needs a `response_id` when answer isn't supplied by algorithm functions or init block")]
    MissingResponseId,

    #[error("`gradeFunction` is a required field, it was either lost in the pipeline or never supplied")]
    MissingGradeFunction,

    #[error("Algorithm function did not return block")]
    StageReturnedNoBlock,

    #[error("Algorithm function returned a block that is not an object: {0}")]
    StageReturnedInvalidBlock(String),

    #[error("`algorithmPipeline` must be a list of stages with an `algorithmFunction`: {0}")]
    InvalidPipeline(String),
}

impl GatewayError {
    /// 传输层失败（连接、超时、非 2xx、未知），`level` 需要加 ` get` 后缀
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GatewayError::HttpStatus(_)
                | GatewayError::Connect(_)
                | GatewayError::Timeout(_)
                | GatewayError::Unknown(_)
        )
    }

    /// 在指定位置转换为 `ErrorResult`
    pub fn at(self, level: impl Into<String>) -> ErrorResult {
        ErrorResult::new(level, self.to_string())
    }
}

/// 诊断信息开关
///
/// 调试模式下把原始请求/响应写进错误结果，否则用 [`REDACTED`] 代替，
/// 避免生产环境泄露学生提交的内容。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    debug: bool,
}

impl Diagnostics {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn echo(&self, value: Option<&Value>) -> Value {
        if self.debug {
            value.cloned().unwrap_or(Value::Null)
        } else {
            Value::String(REDACTED.to_string())
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 必填配置缺失
    #[error("缺少必填配置 {field} (环境变量 {var_name})")]
    MissingField {
        field: &'static str,
        var_name: &'static str,
    },

    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
