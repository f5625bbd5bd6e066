use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 评分流程 API 调用错误
    Api(ApiError),
    /// 文档内容提取错误
    Extract(ExtractError),
    /// 文件来源（本地 / Dropbox）错误
    Source(SourceError),
    /// 文件写入错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::Extract(e) => write!(f, "内容提取错误: {}", e),
            AppError::Source(e) => write!(f, "文件来源错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Api(e) => Some(e),
            AppError::Extract(e) => Some(e),
            AppError::Source(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// API 调用错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 网络请求失败（连接错误等）
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// 请求超时
    #[error("API请求超时 ({endpoint}): {source}")]
    Timeout {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// 非 2xx 响应
    #[error("API返回错误状态 ({endpoint}): status={status}, body={body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 构建 HTTP 客户端失败
    #[error("无法创建HTTP客户端: {source}")]
    ClientBuildFailed {
        #[source]
        source: BoxError,
    },
}

impl ApiError {
    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }
}

/// 文档内容提取错误
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// 不支持的文件类型
    #[error("不支持的文件类型: {file_type}")]
    UnsupportedFileType { file_type: String },
    /// 文本不是合法的 UTF-8
    #[error("{kind} 文件不是合法的 UTF-8: {source}")]
    InvalidUtf8 {
        kind: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
    /// DOCX 解析失败
    #[error("DOCX 解析失败: {source}")]
    Docx {
        #[source]
        source: BoxError,
    },
    /// PDF 解析失败
    #[error("PDF 解析失败: {message}")]
    Pdf { message: String },
}

impl ExtractError {
    pub(crate) fn docx(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ExtractError::Docx {
            source: Box::new(source),
        }
    }
}

/// 文件来源错误
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Dropbox 认证失败
    #[error("Dropbox 认证失败{}: {reason}", expiry_note(.expired))]
    AuthFailed { reason: String, expired: bool },
    /// Dropbox 未认证
    #[error("Dropbox 未认证，无法访问远程文件")]
    NotAuthenticated,
    /// 列出文件失败
    #[error("列出文件失败 ({path}): {source}")]
    ListFailed {
        path: String,
        #[source]
        source: BoxError,
    },
    /// 下载文件失败
    #[error("下载文件失败 ({path}): {source}")]
    DownloadFailed {
        path: String,
        #[source]
        source: BoxError,
    },
    /// 读取本地文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

fn expiry_note(expired: &bool) -> &'static str {
    if *expired {
        " (access token 已过期)"
    } else {
        ""
    }
}

/// 文件写入错误
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 环境变量取值无效
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected}")]
    InvalidValue {
        var_name: String,
        value: String,
        expected: String,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Api(err)
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::Extract(err)
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        AppError::Source(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 根据 reqwest 错误创建 API 错误（区分超时与其他网络错误）
    pub fn api_request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if source.is_timeout() {
            AppError::Api(ApiError::Timeout {
                endpoint,
                source: Box::new(source),
            })
        } else {
            AppError::Api(ApiError::RequestFailed {
                endpoint,
                source: Box::new(source),
            })
        }
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为评分请求超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Api(e) if e.is_timeout())
    }

    /// 是否为不支持的文件类型
    pub fn is_unsupported_file_type(&self) -> bool {
        matches!(
            self,
            AppError::Extract(ExtractError::UnsupportedFileType { .. })
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
