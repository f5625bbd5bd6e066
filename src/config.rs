/// 程序配置
///
/// 所有字段都来自环境变量（启动时会先尝试加载 `.env` 文件）
#[derive(Clone, Debug)]
pub struct Config {
    // --- 评分流程 API 配置 ---
    /// 评分流程服务地址（scheme + host）
    pub base_api_url: String,
    /// 租户 ID，存在时 URL 形如 `/lf/{id}/api/v1/run/...`
    pub langflow_id: Option<String>,
    /// 默认流程 ID
    pub flow_id: String,
    /// 命名端点，优先级高于 `flow_id`
    pub endpoint: Option<String>,
    /// Bearer Token，为空时不发送 Authorization 头
    pub application_token: Option<String>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- Dropbox 配置 ---
    pub dropbox_access_token: Option<String>,
    pub dropbox_folder_path: String,
    pub dropbox_api_url: String,
    pub dropbox_content_url: String,
    // --- 文件来源 ---
    /// 文件来源：`local` 或 `dropbox`
    pub document_source: String,
    /// 本地文件夹
    pub local_folder: String,
    /// 选中的文件名（为空表示全部）
    pub selected_files: Vec<String>,
    /// txt 文件是否额外去除图片链接
    pub strip_txt_image_links: bool,
    // --- 输出 ---
    /// 计分板 HTML 输出路径
    pub output_html_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_api_url: "http://127.0.0.1:7860".to_string(),
            langflow_id: None,
            flow_id: String::new(),
            endpoint: None,
            application_token: None,
            request_timeout_secs: 90,
            dropbox_access_token: None,
            dropbox_folder_path: String::new(),
            dropbox_api_url: "https://api.dropboxapi.com".to_string(),
            dropbox_content_url: "https://content.dropboxapi.com".to_string(),
            document_source: "local".to_string(),
            local_folder: "documents".to_string(),
            selected_files: Vec::new(),
            strip_txt_image_links: false,
            output_html_file: "scoreboard.html".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        // .env 不存在时忽略
        let _ = dotenvy::dotenv();

        let default = Self::default();
        Self {
            base_api_url: std::env::var("BASE_API_URL").unwrap_or(default.base_api_url),
            langflow_id: optional_var("LANGFLOW_ID"),
            flow_id: std::env::var("FLOW_ID").unwrap_or(default.flow_id),
            endpoint: optional_var("ENDPOINT"),
            application_token: optional_var("APPLICATION_TOKEN"),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            dropbox_access_token: optional_var("DROPBOX_ACCESS_TOKEN"),
            dropbox_folder_path: std::env::var("DROPBOX_FOLDER_PATH").unwrap_or(default.dropbox_folder_path),
            dropbox_api_url: std::env::var("DROPBOX_API_URL").unwrap_or(default.dropbox_api_url),
            dropbox_content_url: std::env::var("DROPBOX_CONTENT_URL").unwrap_or(default.dropbox_content_url),
            document_source: std::env::var("DOCUMENT_SOURCE").unwrap_or(default.document_source),
            local_folder: std::env::var("LOCAL_FOLDER").unwrap_or(default.local_folder),
            selected_files: std::env::var("SELECTED_FILES").map(|v| split_list(&v)).unwrap_or(default.selected_files),
            strip_txt_image_links: std::env::var("STRIP_TXT_IMAGE_LINKS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.strip_txt_image_links),
            output_html_file: std::env::var("OUTPUT_HTML_FILE").unwrap_or(default.output_html_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}

/// 读取可选环境变量，空字符串视为未设置
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// 解析逗号分隔的列表
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
