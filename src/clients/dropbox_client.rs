//! Dropbox API 客户端
//!
//! 显式创建并传递，认证状态通过 `is_authenticated()` 查询

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::error::{ApiError, AppError, AppResult, SourceError};
use crate::utils::truncate_text;

const DROPBOX_TIMEOUT_SECS: u64 = 60;

/// list_folder 返回的条目
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = ".tag", rename_all = "lowercase")]
pub enum DropboxEntry {
    File {
        name: String,
        path_lower: Option<String>,
    },
    Folder {
        name: String,
        path_lower: Option<String>,
    },
    Deleted {
        name: String,
    },
}

#[derive(Debug, Deserialize)]
struct ListFolderPage {
    entries: Vec<DropboxEntry>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct AccountName {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct Account {
    name: AccountName,
}

/// 递归列出的结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FolderListing {
    /// 文件名 → 完整路径（同名文件后出现的覆盖先出现的）
    pub files: BTreeMap<String, String>,
    /// 遍历到的所有子文件夹路径
    pub folders: Vec<String>,
}

/// Dropbox 客户端
#[derive(Clone)]
pub struct DropboxClient {
    http: reqwest::Client,
    token: String,
    api_url: String,
    content_url: String,
    account_name: Option<String>,
}

impl DropboxClient {
    /// 创建客户端并校验 token
    ///
    /// 认证失败不会返回错误，只会让 `is_authenticated()` 为 false；
    /// 只有 HTTP 客户端创建失败才返回错误
    pub async fn connect(
        token: impl Into<String>,
        api_url: impl Into<String>,
        content_url: impl Into<String>,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DROPBOX_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::ClientBuildFailed {
                source: Box::new(e),
            })?;

        let mut client = Self {
            http,
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            content_url: content_url.into().trim_end_matches('/').to_string(),
            account_name: None,
        };

        match client.current_account().await {
            Ok(name) => {
                info!("🔐 已通过 Dropbox 认证，账户: {}", name);
                client.account_name = Some(name);
            }
            Err(e) => {
                error!("❌ {}", e);
                if let AppError::Source(SourceError::AuthFailed { expired: true, .. }) = e {
                    error!("access token 已过期，请刷新 token");
                }
            }
        }

        Ok(client)
    }

    pub fn is_authenticated(&self) -> bool {
        self.account_name.is_some()
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account_name.as_deref()
    }

    /// 获取当前账户显示名
    async fn current_account(&self) -> AppResult<String> {
        let url = format!("{}/2/users/get_current_account", self.api_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(&url, e))?;

        if !status.is_success() {
            return Err(auth_error(&body).into());
        }

        let account: Account = serde_json::from_str(&body).map_err(|e| SourceError::AuthFailed {
            reason: format!("无法解析账户信息: {}", e),
            expired: false,
        })?;

        Ok(account.name.display_name)
    }

    /// 列出单个文件夹的全部条目（自动跟随分页 cursor）
    pub async fn list_folder(&self, path: &str) -> AppResult<Vec<DropboxEntry>> {
        self.ensure_authenticated()?;

        let mut page: ListFolderPage = self
            .rpc(path, "files/list_folder", json!({ "path": path }))
            .await?;
        let mut entries = std::mem::take(&mut page.entries);

        while page.has_more {
            debug!("继续分页列出 {} (cursor: {})", path, truncate_text(&page.cursor, 16));
            page = self
                .rpc(
                    path,
                    "files/list_folder/continue",
                    json!({ "cursor": page.cursor }),
                )
                .await?;
            entries.append(&mut page.entries);
        }

        Ok(entries)
    }

    /// 递归列出文件夹下的所有文件
    ///
    /// 先列当前文件夹的文件，再按顺序深入每个子文件夹；
    /// 文件以路径最后一段为名，重名时后出现的覆盖先出现的
    pub async fn list_files_recursive(&self, folder_path: &str) -> AppResult<FolderListing> {
        let root = normalize_folder_path(folder_path);

        let mut files = Vec::new();
        let mut folders = Vec::new();
        let mut pending = vec![root];

        while let Some(folder) = pending.pop() {
            let entries = self.list_folder(&folder).await?;

            let mut sub_folders = Vec::new();
            for entry in entries {
                match entry {
                    DropboxEntry::File { name, path_lower } => {
                        files.push(path_lower.unwrap_or_else(|| format!("{}/{}", folder, name)));
                    }
                    DropboxEntry::Folder { name, path_lower } => {
                        sub_folders
                            .push(path_lower.unwrap_or_else(|| format!("{}/{}", folder, name)));
                    }
                    DropboxEntry::Deleted { .. } => {}
                }
            }

            debug!("{} 下的子文件夹: {:?}", folder, sub_folders);
            folders.extend(sub_folders.iter().cloned());
            pending.extend(sub_folders.into_iter().rev());
        }

        let files = files
            .into_iter()
            .map(|path| (base_name(&path).to_string(), path))
            .collect();

        Ok(FolderListing { files, folders })
    }

    /// 下载文件内容
    pub async fn download(&self, path: &str) -> AppResult<Vec<u8>> {
        self.ensure_authenticated()?;

        let url = format!("{}/2/files/download", self.content_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", dropbox_api_arg(path))
            .send()
            .await
            .map_err(|e| download_failed(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(download_failed(
                path,
                ApiError::BadStatus {
                    endpoint: url,
                    status: status.as_u16(),
                    body: truncate_text(&body, 200),
                },
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_failed(path, e))?;

        debug!("已下载 {} ({} 字节)", path, bytes.len());

        Ok(bytes.to_vec())
    }

    fn ensure_authenticated(&self) -> AppResult<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(SourceError::NotAuthenticated.into())
        }
    }

    /// 调用 RPC 风格的接口
    async fn rpc<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        route: &str,
        body: Value,
    ) -> AppResult<T> {
        let url = format!("{}/2/{}", self.api_url, route);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| list_failed(path, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| list_failed(path, e))?;

        if !status.is_success() {
            error!("列出文件失败 ({}): status={}", path, status);
            return Err(list_failed(
                path,
                ApiError::BadStatus {
                    endpoint: url,
                    status: status.as_u16(),
                    body: truncate_text(&text, 200),
                },
            ));
        }

        serde_json::from_str(&text).map_err(|e| list_failed(path, e))
    }
}

// ========== 辅助函数 ==========

/// 非根目录补全开头的 `/`
pub fn normalize_folder_path(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// 构造 Dropbox-API-Arg 头，非 ASCII 字符转成 \uXXXX
fn dropbox_api_arg(path: &str) -> String {
    let raw = json!({ "path": path }).to_string();
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    escaped
}

/// 从 401/400 响应中提取认证失败原因
fn auth_error(body: &str) -> SourceError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let summary = parsed
        .as_ref()
        .and_then(|v| v.get("error_summary"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| truncate_text(body, 200));
    let expired = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/.tag"))
        .and_then(Value::as_str)
        == Some("expired_access_token")
        || summary.starts_with("expired_access_token");

    SourceError::AuthFailed {
        reason: summary,
        expired,
    }
}

fn list_failed(path: &str, source: impl std::error::Error + Send + Sync + 'static) -> AppError {
    SourceError::ListFailed {
        path: path.to_string(),
        source: Box::new(source),
    }
    .into()
}

fn download_failed(path: &str, source: impl std::error::Error + Send + Sync + 'static) -> AppError {
    SourceError::DownloadFailed {
        path: path.to_string(),
        source: Box::new(source),
    }
    .into()
}
