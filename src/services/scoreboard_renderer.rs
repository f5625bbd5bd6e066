//! 计分板渲染服务 - 业务能力层
//!
//! 只负责"把排好序的计分板变成 HTML / 文本"，不负责排序

use std::fmt::Write as _;
use std::fs;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{detail_lines, ScoreboardEntry};

const JUDGED_TITLE: &str = "You have been judged!";
const PENDING_TITLE: &str = "You will be judged!";

const LEADERBOARD_CSS: &str = r#"
.leaderboard-container { font-family: 'Arial', sans-serif; margin: 20px 0; }
.leaderboard-table { width: 100%; border-collapse: collapse; margin: 20px 0; font-size: 18px; text-align: left; }
.leaderboard-table th, .leaderboard-table td { border: 1px solid #ddd; padding: 12px 15px; }
.leaderboard-table th { background-color: #f4f4f4; color: #333; text-transform: uppercase; }
.leaderboard-table td { background-color: #fff; color: #333; }
.leaderboard-link { color: #0070f3; text-decoration: none; }
.leaderboard-link:hover { text-decoration: underline; }
.leaderboard-rank { font-weight: bold; color: #0070f3; width: 10%; }
.leaderboard-file-name { width: 60%; }
.leaderboard-score { width: 30%; }
.leaderboard-table tr:hover { background-color: #f1f1f1; }
.file-title { color: #00ffff; }
.score-title { color: #ff00ff; }
"#;

/// HTML 转义
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 渲染计分板 HTML
///
/// # 参数
/// - `entries`: 已排序的计分板记录，排名按顺序从 1 开始
/// - `judged`: 选中的文档是否全部处理完
pub fn render_html(entries: &[ScoreboardEntry], judged: bool) -> String {
    let title = if judged { JUDGED_TITLE } else { PENDING_TITLE };

    // write! 到 String 不会失败
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{LEADERBOARD_CSS}</style>\n</head>\n<body>\n<h1>{title}</h1>\n"
    );

    html.push_str("<div class=\"leaderboard-container\">\n<table class=\"leaderboard-table\">\n");
    html.push_str("<thead>\n<tr>\n");
    html.push_str("<th class='leaderboard-rank'>Rank</th>\n");
    html.push_str("<th class='leaderboard-file-name'>File Name</th>\n");
    html.push_str("<th class='leaderboard-score'>Score</th>\n");
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for (index, entry) in entries.iter().enumerate() {
        let name = escape_html(&entry.file_name);
        let _ = write!(
            html,
            "<tr>\n<td class='leaderboard-rank'>{}</td>\n<td class='leaderboard-file-name'><a href='#{name}' class='leaderboard-link'>{name}</a></td>\n<td class='leaderboard-score'><strong>{}</strong></td>\n</tr>\n",
            index + 1,
            escape_html(&entry.final_score.to_string()),
        );
    }

    html.push_str("</tbody>\n</table>\n</div>\n");

    for entry in entries {
        let name = escape_html(&entry.file_name);
        let _ = write!(
            html,
            "<section>\n<h2 id='{name}' class='file-title'>File: {name}</h2>\n<h3 class='score-title'>Final Score: {}</h3>\n<h3 class='score-title'>Score Detail</h3>\n<ul>\n",
            escape_html(&entry.final_score.to_string()),
        );
        for (label, explanation) in detail_lines(&entry.score_detail) {
            let _ = writeln!(
                html,
                "<li><strong>{}</strong>: {}</li>",
                escape_html(&label),
                escape_html(&explanation)
            );
        }
        html.push_str("</ul>\n</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// 渲染日志用的文本表格
pub fn render_text(entries: &[ScoreboardEntry]) -> String {
    let name_width = entries
        .iter()
        .map(|e| e.file_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("File Name".len());

    let mut table = String::new();
    let _ = writeln!(table, "{:<4}  {:<name_width$}  Score", "Rank", "File Name");
    let _ = writeln!(table, "{}", "-".repeat(4 + 2 + name_width + 2 + 5));
    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            table,
            "{:<4}  {:<name_width$}  {}",
            index + 1,
            entry.file_name,
            entry.final_score
        );
    }
    table
}

/// 写入计分板文件
pub fn write_html(path: &str, html: &str) -> AppResult<()> {
    fs::write(path, html).map_err(|e| AppError::file_write_failed(path, e))?;
    debug!("计分板已写入 {} ({} 字节)", path, html.len());
    Ok(())
}
