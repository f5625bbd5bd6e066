//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;

use crate::config::Config;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n文档评分日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 追加内容到日志文件
pub fn append_log(log_file_path: &str, content: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(log_file_path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("⚖️ 程序启动 - 文档评分模式");
    info!("🌐 评分服务: {}", config.base_api_url);
    info!("📂 文件来源: {}", config.document_source);
    info!("⏱️ 请求超时: {} 秒", config.request_timeout_secs);
    info!("{}", "=".repeat(60));
}

/// 记录文档选择信息
///
/// # 参数
/// - `total`: 选中的文档数
/// - `source_label`: 文件来源名称
pub fn log_documents_selected(total: usize, source_label: &str) {
    info!("✓ 从 {} 选中 {} 个待评分的文档", source_label, total);
    info!("📋 将逐个处理，每个文档完成后再开始下一个\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `log_file_path`: 日志文件路径
/// - `html_file_path`: 计分板文件路径
pub fn print_final_stats(
    success: usize,
    failed: usize,
    total: usize,
    log_file_path: &str,
    html_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n计分板已保存至: {}", html_file_path);
    info!("日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
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
