//! 网关请求
//!
//! 请求体形如 `{"command": "grade", "block": {...}}`。

use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use crate::error::GatewayError;
use crate::models::block::{is_truthy, Block};

/// 网关请求体
///
/// 两个字段都先按任意 JSON 接收，类型不对时由 [`GatewayRequest::command`]
/// 和 [`GatewayRequest::block`] 报错，而不是整个请求体解析失败。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayRequest {
    #[serde(default)]
    pub command: Option<Value>,
    #[serde(default)]
    pub block: Option<Value>,
}

/// 支持的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 评分
    Grade,
    /// 随机结果，用于冒烟测试
    Random,
}

impl FromStr for Command {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grade" => Ok(Command::Grade),
            "random" => Ok(Command::Random),
            _ => Err(GatewayError::InvalidCommand),
        }
    }
}

impl GatewayRequest {
    pub fn command(&self) -> Result<Command, GatewayError> {
        self.command
            .as_ref()
            .and_then(Value::as_str)
            .ok_or(GatewayError::InvalidCommand)?
            .parse()
    }

    /// 解析请求中的 block
    ///
    /// 缺失或"没有内容"的值（`null`、`false`、`0`、`""`、`{}`、`[]`）
    /// 都视为没有 block，交给编排器报错；其余非对象的值无法解析。
    pub fn block(&self) -> Result<Option<Block>, GatewayError> {
        match &self.block {
            None => Ok(None),
            Some(value) if !is_truthy(value) => Ok(None),
            Some(value) => Block::from_value(value.clone())
                .map(Some)
                .map_err(|e| GatewayError::InvalidBlock(e.to_string())),
        }
    }
}
