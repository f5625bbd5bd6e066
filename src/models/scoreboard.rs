//! 计分板模型

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::flow::NOT_AVAILABLE;

/// 最终分数：整数或文本（通常形如 "85/100"）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FinalScore {
    Int(i64),
    Text(String),
}

impl FinalScore {
    pub fn not_available() -> Self {
        FinalScore::Text(NOT_AVAILABLE.to_string())
    }

    /// 从 JSON 值转换，非整数、非字符串的值按文本保存
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => FinalScore::Int(i),
                None => FinalScore::Text(n.to_string()),
            },
            Value::String(s) => FinalScore::Text(s.clone()),
            Value::Null => Self::not_available(),
            other => FinalScore::Text(other.to_string()),
        }
    }

    /// 排序用的数值
    ///
    /// 整数原样返回；文本取第一个 `/` 之前的部分解析为整数；解析失败返回 0
    pub fn numeric(&self) -> i64 {
        match self {
            FinalScore::Int(n) => *n,
            FinalScore::Text(s) => s
                .split('/')
                .next()
                .and_then(|head| head.trim().parse::<i64>().ok())
                .unwrap_or(0),
        }
    }
}

impl fmt::Display for FinalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalScore::Int(n) => write!(f, "{}", n),
            FinalScore::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FinalScore {
    fn from(n: i64) -> Self {
        FinalScore::Int(n)
    }
}

impl From<&str> for FinalScore {
    fn from(s: &str) -> Self {
        FinalScore::Text(s.to_string())
    }
}

/// 计分板上的一条记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardEntry {
    pub file_name: String,
    pub final_score: FinalScore,
    /// 评分详情，渲染详情区时使用
    pub score_detail: Map<String, Value>,
}

impl ScoreboardEntry {
    pub fn new(file_name: impl Into<String>, final_score: impl Into<FinalScore>) -> Self {
        Self {
            file_name: file_name.into(),
            final_score: final_score.into(),
            score_detail: Map::new(),
        }
    }

    pub fn with_detail(mut self, score_detail: Map<String, Value>) -> Self {
        self.score_detail = score_detail;
        self
    }
}

/// 计分板
///
/// 处理过程中只追加，全部处理完后按分数降序排一次
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    entries: Vec<ScoreboardEntry>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ScoreboardEntry) {
        self.entries.push(entry);
    }

    /// 按分数降序排列，同分保持加入顺序（`sort_by` 是稳定排序）
    pub fn sort_descending(&mut self) {
        self.entries
            .sort_by(|a, b| b.final_score.numeric().cmp(&a.final_score.numeric()));
    }

    pub fn entries(&self) -> &[ScoreboardEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ScoreboardEntry> for Scoreboard {
    fn from_iter<I: IntoIterator<Item = ScoreboardEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
