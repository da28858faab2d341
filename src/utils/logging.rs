//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use serde_json::Value;
use tracing::info;

use crate::config::Config;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 生效的配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 评分网关启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📡 监听地址: {}", config.bind_address);
    info!("🧮 算法函数: {}", config.algorithm_function_base_url);
    info!("📝 评分函数: {}", config.grading_function_base_url);
    info!("📚 答案接口: {}", config.answer_endpoint);
    info!("⏱️ 调用超时: {} 秒", config.request_timeout_secs);
    if config.debug {
        info!("🐛 调试模式已开启，错误结果将回显原始请求/响应");
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 序列化 JSON 并截断，用于调试日志
pub fn preview_json(value: &Value, max_len: usize) -> String {
    truncate_text(&value.to_string(), max_len)
}
