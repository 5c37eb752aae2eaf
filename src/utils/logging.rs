/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use regex::Regex;
use tracing::info;

use crate::config::Config;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 程序配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 考试会话模式");
    info!("📋 会话ID: {}", config.attempt_id);
    info!("🌐 服务端: {}", config.api_base_url);
    info!("{}", "=".repeat(60));
}

/// 记录考试结束信息
///
/// # 参数
/// - `answered`: 已作答题数
/// - `total`: 题目总数
/// - `violations`: 累计违规次数
pub fn log_attempt_finished(answered: usize, total: usize, violations: u32) {
    info!("\n{}", "=".repeat(60));
    info!("📊 考试结束统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 已作答: {}/{}", answered, total);
    info!("⚠️ 违规次数: {}", violations);
    info!("{}", "=".repeat(60));
}

/// 题干预览：去掉 HTML 标签并截断
///
/// # 参数
/// - `text`: 原始题干（可能带富文本标签）
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回适合放进一行日志的预览文本
pub fn preview(text: &str, max_len: usize) -> String {
    let stripped = match Regex::new(r"<[^>]+>") {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    };

    truncate_text(stripped.trim(), max_len)
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
