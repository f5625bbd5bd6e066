//! 文档处理上下文
//!
//! 封装"我正在处理第几个文档"这一信息

use std::fmt::Display;

/// 文档处理上下文
#[derive(Debug, Clone)]
pub struct DocumentCtx {
    /// 文档序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本次处理的文档总数
    pub total: usize,

    /// 文件名
    pub file_name: String,
}

impl DocumentCtx {
    pub fn new(index: usize, total: usize, file_name: impl Into<String>) -> Self {
        Self {
            index,
            total,
            file_name: file_name.into(),
        }
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 {}/{} {}]", self.index, self.total, self.file_name)
    }
}
