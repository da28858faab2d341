//! 评分结果
//!
//! 评分函数返回的结果对网关不透明，原样返回给客户端；
//! 这里只定义 `random` 命令自己生成的结果。

use serde::{Deserialize, Serialize};

/// 单个作答区的评分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

/// `{"grades": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeSheet {
    pub grades: Vec<Grade>,
}

impl GradeSheet {
    /// 随机生成一个对/错结果
    pub fn random() -> Self {
        Self {
            grades: vec![Grade {
                is_correct: rand::random(),
            }],
        }
    }
}
