//! 评分块（Block）与算法阶段（Stage）
//!
//! Block 在一次请求中依次经过算法阶段、答案补全、评分。
//! Block 内部保存原始 JSON 对象，算法函数返回什么就原样传给下一跳
//! （包括显式的 `null`），网关只在需要时读取下面几个字段：
//!
//! - `algorithmPipeline`：算法阶段列表
//! - `answer` / `response` / `gradeParams`：对网关不透明
//! - `response_id`：答案查询用的作答区 ID
//! - `gradeFunction`：评分函数名称

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ALGORITHM_PIPELINE: &str = "algorithmPipeline";
const ANSWER: &str = "answer";
const RESPONSE: &str = "response";
const RESPONSE_ID: &str = "response_id";
const GRADE_FUNCTION: &str = "gradeFunction";
const GRADE_PARAMS: &str = "gradeParams";

/// 一个待评分的题目块
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(Map<String, Value>);

/// 流水线中的一个算法阶段
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stage {
    #[serde(rename = "algorithmFunction")]
    pub algorithm_function: String,

    #[serde(default)]
    pub params: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    /// 从 JSON 值解析，只要求是对象
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// 是否带有 `algorithmPipeline` 字段
    pub fn has_pipeline(&self) -> bool {
        self.0.contains_key(ALGORITHM_PIPELINE)
    }

    /// 解析流水线阶段（没有流水线或为 `null` 时为空）
    pub fn stages(&self) -> serde_json::Result<Vec<Stage>> {
        match self.0.get(ALGORITHM_PIPELINE) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(stages) => serde_json::from_value(stages.clone()),
        }
    }

    /// 带有 `answer` 字段即视为已有答案（值可以是 `null`）
    pub fn has_answer(&self) -> bool {
        self.0.contains_key(ANSWER)
    }

    pub fn set_answer(&mut self, answer: Value) {
        self.0.insert(ANSWER.to_string(), answer);
    }

    pub fn answer(&self) -> Option<&Value> {
        self.0.get(ANSWER)
    }

    pub fn response(&self) -> Option<&Value> {
        self.0.get(RESPONSE)
    }

    pub fn grade_params(&self) -> Option<&Value> {
        self.0.get(GRADE_PARAMS)
    }

    /// 非空的 `response_id`，原值转发给题库
    pub fn response_id(&self) -> Option<&Value> {
        self.0.get(RESPONSE_ID).filter(|id| is_truthy(id))
    }

    /// 非空的 `gradeFunction`（数字会转成字符串）
    pub fn grade_function(&self) -> Option<String> {
        match self.0.get(GRADE_FUNCTION)? {
            Value::String(name) if !name.is_empty() => Some(name.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for Block {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// JSON 值是否"有内容"：`null`、`false`、`0`、空字符串/数组/对象都视为没有
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
