//! 网关配置
//!
//! 所有组件的行为只取决于显式传入的 [`Config`]，组件内部不再读取环境变量。
//! 加载顺序：默认值 → TOML 配置文件（`GATEWAY_CONFIG`）→ 环境变量。

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// 程序配置
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 算法函数的基础地址，阶段请求发往 `<base>/<algorithmFunction>`
    pub algorithm_function_base_url: String,
    /// 评分函数的基础地址，评分请求发往 `<base>/<gradeFunction>`
    pub grading_function_base_url: String,
    /// 题库答案查询接口
    pub answer_endpoint: String,
    /// 调试模式：错误结果中回显原始请求/响应
    pub debug: bool,
    /// 单次远程调用的超时时间（秒）
    pub request_timeout_secs: u64,
    /// HTTP 监听地址
    pub bind_address: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm_function_base_url: String::new(),
            grading_function_base_url: String::new(),
            answer_endpoint: String::new(),
            debug: false,
            request_timeout_secs: 30,
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Config {
    /// 用三个必填地址创建配置，其余取默认值
    pub fn new(
        algorithm_function_base_url: impl Into<String>,
        grading_function_base_url: impl Into<String>,
        answer_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            algorithm_function_base_url: algorithm_function_base_url.into(),
            grading_function_base_url: grading_function_base_url.into(),
            answer_endpoint: answer_endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// 从进程环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源加载（测试时可传入 HashMap）
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("GATEWAY_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(v) = lookup("ALGORITHM_FUNCTION_BASE_URL") {
            config.algorithm_function_base_url = v;
        }
        if let Some(v) = lookup("GRADING_FUNCTION_BASE_URL") {
            config.grading_function_base_url = v;
        }
        if let Some(v) = lookup("SETS_DB_API_ANSWER_ENDPOINT") {
            config.answer_endpoint = v;
        }
        if let Some(v) = lookup("ENV_MODE") {
            config.debug = v == "dev";
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs =
                v.parse().map_err(|_| ConfigError::EnvVarParseFailed {
                    var_name: "REQUEST_TIMEOUT_SECS".to_string(),
                    value: v.clone(),
                    expected_type: "u64".to_string(),
                })?;
        }
        if let Some(v) = lookup("BIND_ADDRESS") {
            config.bind_address = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载（不做必填校验，由调用方在合并环境变量后校验）
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;

        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 检查必填地址
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (
                "algorithm_function_base_url",
                "ALGORITHM_FUNCTION_BASE_URL",
                &self.algorithm_function_base_url,
            ),
            (
                "grading_function_base_url",
                "GRADING_FUNCTION_BASE_URL",
                &self.grading_function_base_url,
            ),
            (
                "answer_endpoint",
                "SETS_DB_API_ANSWER_ENDPOINT",
                &self.answer_endpoint,
            ),
        ];

        for (field, var_name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField { field, var_name });
            }
        }
        Ok(())
    }

    /// 算法函数地址
    pub fn algorithm_endpoint(&self, algorithm_function: &str) -> String {
        join_url(&self.algorithm_function_base_url, algorithm_function)
    }

    /// 评分函数地址
    pub fn grading_endpoint(&self, grade_function: &str) -> String {
        join_url(&self.grading_function_base_url, grade_function)
    }
}

fn join_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name.trim_start_matches('/'))
}
