//! 文件来源服务 - 业务能力层
//!
//! 只负责"列出文件"和"读出文件字节"，不关心文件内容
//!
//! - `LocalSource`：本地目录（不递归）
//! - `DropboxSource`：Dropbox 文件夹（递归）
//! - `DocumentSource`：运行时选择其中之一

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{info, warn};

use crate::clients::DropboxClient;
use crate::error::{AppResult, ConfigError, SourceError};
use crate::models::SourceFile;

/// 文件来源
///
/// `list` 返回 文件名 → 读取句柄；句柄原样交给 `read`
#[allow(async_fn_in_trait)]
pub trait FileSource {
    fn label(&self) -> &str;

    async fn list(&self) -> AppResult<BTreeMap<String, String>>;

    async fn read(&self, handle: &str) -> AppResult<Vec<u8>>;
}

/// 来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Local,
    Dropbox,
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(SourceKind::Local),
            "dropbox" => Ok(SourceKind::Dropbox),
            _ => Err(ConfigError::InvalidValue {
                var_name: "DOCUMENT_SOURCE".to_string(),
                value: s.to_string(),
                expected: "local 或 dropbox".to_string(),
            }),
        }
    }
}

/// 本地目录
#[derive(Debug, Clone)]
pub struct LocalSource {
    folder: PathBuf,
    label: String,
}

impl LocalSource {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        let folder = folder.into();
        let label = format!("本地目录 {}", folder.display());
        Self { folder, label }
    }
}

impl FileSource for LocalSource {
    fn label(&self) -> &str {
        &self.label
    }

    /// 列出目录下的普通文件，跳过隐藏文件和子目录
    async fn list(&self) -> AppResult<BTreeMap<String, String>> {
        let folder = self.folder.display().to_string();

        let mut dir = match tokio::fs::read_dir(&self.folder).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::DirectoryNotFound { path: folder }.into());
            }
            Err(source) => return Err(SourceError::ReadFailed { path: folder, source }.into()),
        };

        let mut files = BTreeMap::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(SourceError::ReadFailed {
                        path: folder.clone(),
                        source,
                    }
                    .into())
                }
            };

            let file_type = entry.file_type().await.map_err(|source| SourceError::ReadFailed {
                path: entry.path().display().to_string(),
                source,
            })?;
            if !file_type.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            files.insert(name, entry.path().display().to_string());
        }

        info!("📁 {} 下找到 {} 个文件", folder, files.len());
        Ok(files)
    }

    async fn read(&self, handle: &str) -> AppResult<Vec<u8>> {
        tokio::fs::read(handle).await.map_err(|source| {
            SourceError::ReadFailed {
                path: handle.to_string(),
                source,
            }
            .into()
        })
    }
}

/// Dropbox 文件夹
#[derive(Clone)]
pub struct DropboxSource {
    client: DropboxClient,
    folder_path: String,
    label: String,
}

impl DropboxSource {
    pub fn new(client: DropboxClient, folder_path: impl Into<String>) -> Self {
        let folder_path = folder_path.into();
        let label = format!("Dropbox {}", if folder_path.is_empty() { "/" } else { folder_path.as_str() });
        Self {
            client,
            folder_path,
            label,
        }
    }
}

impl FileSource for DropboxSource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn list(&self) -> AppResult<BTreeMap<String, String>> {
        let listing = self.client.list_files_recursive(&self.folder_path).await?;
        info!(
            "📁 Dropbox 下找到 {} 个文件 ({} 个子文件夹)",
            listing.files.len(),
            listing.folders.len()
        );
        Ok(listing.files)
    }

    async fn read(&self, handle: &str) -> AppResult<Vec<u8>> {
        self.client.download(handle).await
    }
}

/// 运行时选定的文件来源
pub enum DocumentSource {
    Local(LocalSource),
    Dropbox(DropboxSource),
}

impl FileSource for DocumentSource {
    fn label(&self) -> &str {
        match self {
            DocumentSource::Local(s) => s.label(),
            DocumentSource::Dropbox(s) => s.label(),
        }
    }

    async fn list(&self) -> AppResult<BTreeMap<String, String>> {
        match self {
            DocumentSource::Local(s) => s.list().await,
            DocumentSource::Dropbox(s) => s.list().await,
        }
    }

    async fn read(&self, handle: &str) -> AppResult<Vec<u8>> {
        match self {
            DocumentSource::Local(s) => s.read(handle).await,
            DocumentSource::Dropbox(s) => s.read(handle).await,
        }
    }
}

/// 按名称挑选文件
///
/// `wanted` 为空时返回全部文件（按文件名排序）；
/// 否则按 `wanted` 的顺序返回，找不到的名称记录警告后跳过
pub fn select_files(listing: &BTreeMap<String, String>, wanted: &[String]) -> Vec<SourceFile> {
    if wanted.is_empty() {
        return listing
            .iter()
            .map(|(name, handle)| SourceFile::new(name.as_str(), handle.as_str()))
            .collect();
    }

    wanted
        .iter()
        .filter_map(|name| match listing.get(name) {
            Some(handle) => Some(SourceFile::new(name.as_str(), handle.as_str())),
            None => {
                warn!("⚠️ 未找到选中的文件: {}", name);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn listing(names: &[&str]) -> BTreeMap<String, String> {
        names
            .iter()
            .map(|n| (n.to_string(), format!("/docs/{}", n)))
            .collect()
    }

    #[test]
    fn test_source_kind_from_str() {
        assert_eq!("local".parse::<SourceKind>().unwrap(), SourceKind::Local);
        assert_eq!(" Dropbox ".parse::<SourceKind>().unwrap(), SourceKind::Dropbox);
        assert!("s3".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_select_all_when_empty() {
        let files = select_files(&listing(&["b.md", "a.txt"]), &[]);
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.md"]);
    }

    #[test]
    fn test_select_skips_missing_names() {
        let wanted = vec![
            "b.md".to_string(),
            "ghost.pdf".to_string(),
            "a.txt".to_string(),
        ];
        let files = select_files(&listing(&["a.txt", "b.md", "c.docx"]), &wanted);

        assert_eq!(
            files,
            vec![
                SourceFile::new("b.md", "/docs/b.md"),
                SourceFile::new("a.txt", "/docs/a.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn test_local_list_and_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.md"), "# hi").unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("deep.txt"), "deep").unwrap();

        let source = LocalSource::new(dir.path());
        let files = source.list().await.unwrap();

        let names: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["notes.md", "report.pdf"]);

        let bytes = source.read(&files["notes.md"]).await.unwrap();
        assert_eq!(bytes, b"# hi");
    }

    #[tokio::test]
    async fn test_local_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalSource::new(dir.path().join("missing"));

        let err = source.list().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Source(SourceError::DirectoryNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_local_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = DocumentSource::Local(LocalSource::new(dir.path()));
        let missing = dir.path().join("gone.txt").display().to_string();

        let err = source.read(&missing).await.unwrap_err();
        assert!(matches!(err, AppError::Source(SourceError::ReadFailed { .. })));
    }
}
