//! 文档类型与来源文件

use std::fmt;
use std::str::FromStr;

use crate::error::ExtractError;

/// 支持评分的文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Docx,
    Pdf,
    Txt,
    Md,
}

impl DocumentKind {
    /// 根据文件名的最后一个扩展名判断类型（不区分大小写）
    pub fn from_file_name(name: &str) -> Result<Self, ExtractError> {
        let ext = name.rsplit('.').next().unwrap_or(name);
        ext.parse()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Docx => "docx",
            DocumentKind::Pdf => "pdf",
            DocumentKind::Txt => "txt",
            DocumentKind::Md => "md",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docx" => Ok(DocumentKind::Docx),
            "pdf" => Ok(DocumentKind::Pdf),
            "txt" => Ok(DocumentKind::Txt),
            "md" => Ok(DocumentKind::Md),
            _ => Err(ExtractError::UnsupportedFileType {
                file_type: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 来源中的一个文件：显示名 + 来源内部的句柄（本地路径或 Dropbox 路径）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub handle: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: handle.into(),
        }
    }
}
