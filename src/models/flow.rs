//! 评分流程的请求 / 响应模型
//!
//! 响应结构：
//!
//! ```text
//! { outputs: [ { outputs: [ { component_display_name, results: { message: { text } } }, ... ] } ] }
//! ```
//!
//! 只检查第一个顶层 output 下的组件列表。

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::scoreboard::FinalScore;

/// 承载评分结果的组件名
pub const JUDGE_OUTPUT_NAME: &str = "Judge Output";

/// 缺省值
pub const NOT_AVAILABLE: &str = "N/A";

/// 发送给评分流程的请求体
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FlowRequest<'a> {
    pub input_value: &'a str,
    pub output_type: &'static str,
    pub input_type: &'static str,
}

impl<'a> FlowRequest<'a> {
    /// 以 chat 方式提交文本（空字符串原样提交）
    pub fn chat(text: &'a str) -> Self {
        Self {
            input_value: text,
            output_type: "chat",
            input_type: "chat",
        }
    }
}

/// "Judge Output" 组件
///
/// 保留组件的原始 JSON，调用方拿到的就是响应里的那一项
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOutput(Value);

impl JudgeOutput {
    /// 找不到组件或响应无法解析时使用的哨兵值
    pub fn sentinel() -> Self {
        Self(json!({
            "component_display_name": NOT_AVAILABLE,
            "results": {
                "message": {
                    "text": NOT_AVAILABLE
                }
            }
        }))
    }

    /// 从流程响应中提取第一个名为 "Judge Output" 的组件
    pub fn from_response(response: &Value) -> Self {
        response
            .get("outputs")
            .and_then(Value::as_array)
            .and_then(|outputs| outputs.first())
            .and_then(|first| first.get("outputs"))
            .and_then(Value::as_array)
            .and_then(|components| {
                components.iter().find(|component| {
                    component
                        .get("component_display_name")
                        .and_then(Value::as_str)
                        == Some(JUDGE_OUTPUT_NAME)
                })
            })
            .map(|component| Self(component.clone()))
            .unwrap_or_else(Self::sentinel)
    }

    pub fn component_display_name(&self) -> &str {
        self.0
            .get("component_display_name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// `results.message.text`，路径上任一键缺失时为 "N/A"
    pub fn message_text(&self) -> &str {
        self.0
            .pointer("/results/message/text")
            .and_then(Value::as_str)
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for JudgeOutput {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// 从 Judge Output 文本中解析出的分数
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeScores {
    pub final_score: FinalScore,
    /// 评分项 → 说明，保持原始顺序
    pub score_detail: Map<String, Value>,
}

impl Default for JudgeScores {
    fn default() -> Self {
        Self {
            final_score: FinalScore::not_available(),
            score_detail: Map::new(),
        }
    }
}

impl JudgeScores {
    /// 解析 Judge Output 的 JSON 文本，任何失败都回落到 ("N/A", {})
    pub fn parse(text: &str) -> Self {
        let Ok(Value::Object(parsed)) = serde_json::from_str::<Value>(text) else {
            return Self::default();
        };

        let final_score = parsed
            .get("Final Score")
            .map(FinalScore::from_json)
            .unwrap_or_else(FinalScore::not_available);

        let score_detail = match parsed.get("Score Detail") {
            Some(Value::Object(detail)) => detail.clone(),
            _ => Map::new(),
        };

        Self {
            final_score,
            score_detail,
        }
    }

    /// 评分项说明转成可显示的文本
    pub fn detail_lines(&self) -> Vec<(String, String)> {
        detail_lines(&self.score_detail)
    }
}

/// 把评分详情转成 (标签, 说明) 列表，字符串值不带引号
pub fn detail_lines(detail: &Map<String, Value>) -> Vec<(String, String)> {
    detail
        .iter()
        .map(|(label, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (label.clone(), text)
        })
        .collect()
}
