//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量文档的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、创建评分流程、连接 Dropbox
//! 2. **选择来源**：本地目录或 Dropbox（未认证时回落到本地）
//! 3. **逐个处理**：按选择顺序一个一个评分，单个失败不影响其他文档
//! 4. **计分板**：排序后写出 HTML，并把文本表格追加到日志
//! 5. **全局统计**：汇总所有文档的处理结果

use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clients::DropboxClient;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{Scoreboard, SourceFile};
use crate::services::scoreboard_renderer::{render_html, render_text, write_html};
use crate::services::{
    select_files, DocumentSource, DropboxSource, FileSource, LocalSource, SourceKind,
};
use crate::utils::logging::{
    append_log, init_log_file, log_documents_selected, log_startup, print_final_stats,
};
use crate::workflow::{DocumentCtx, ScoreFlow};

/// 应用主结构
pub struct App {
    config: Config,
    source_kind: SourceKind,
    flow: ScoreFlow,
    dropbox: Option<DropboxClient>,
}

/// 一次运行的结果
#[derive(Debug)]
pub struct RunReport {
    /// 已排序的计分板（不含失败的文档）
    pub scoreboard: Scoreboard,
    pub stats: ProcessingStats,
    /// 选中的文档是否全部处理完
    pub judged: bool,
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法写入日志文件 {}", config.output_log_file))?;

        log_startup(&config);

        let source_kind = SourceKind::from_str(&config.document_source)?;

        let flow = ScoreFlow::new(&config).context("创建评分流程失败")?;

        // 只有配置了 token 才连接 Dropbox
        let dropbox = match &config.dropbox_access_token {
            Some(token) => Some(
                DropboxClient::connect(
                    token.as_str(),
                    config.dropbox_api_url.as_str(),
                    config.dropbox_content_url.as_str(),
                )
                .await
                .context("创建 Dropbox 客户端失败")?,
            ),
            None => None,
        };

        Ok(Self {
            config,
            source_kind,
            flow,
            dropbox,
        })
    }

    /// Dropbox 是否可用
    pub fn dropbox_available(&self) -> bool {
        self.dropbox
            .as_ref()
            .is_some_and(DropboxClient::is_authenticated)
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunReport> {
        let source = self.select_source();

        info!("\n📁 正在扫描 {} ...", source.label());
        let listing = source
            .list()
            .await
            .with_context(|| format!("无法列出 {} 中的文件", source.label()))?;

        let files = select_files(&listing, &self.config.selected_files);
        if files.is_empty() {
            warn!("⚠️ 没有找到待评分的文档");
        } else {
            log_documents_selected(files.len(), source.label());
        }

        let (mut scoreboard, stats) = self.process_all_documents(&source, &files).await;
        let judged = !files.is_empty();

        scoreboard.sort_descending();

        let table = render_text(scoreboard.entries());
        info!("\n🏆 计分板\n{}", table);
        if let Err(e) = append_log(&self.config.output_log_file, &table) {
            warn!("⚠️ 无法追加日志文件 {}: {}", self.config.output_log_file, e);
        }

        let html = render_html(scoreboard.entries(), judged);
        write_html(&self.config.output_html_file, &html)?;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
            &self.config.output_html_file,
        );

        Ok(RunReport {
            scoreboard,
            stats,
            judged,
        })
    }

    /// 选择文件来源，Dropbox 不可用时回落到本地目录
    fn select_source(&self) -> DocumentSource {
        if self.source_kind == SourceKind::Dropbox {
            match &self.dropbox {
                Some(client) if client.is_authenticated() => {
                    return DocumentSource::Dropbox(DropboxSource::new(
                        client.clone(),
                        self.config.dropbox_folder_path.as_str(),
                    ));
                }
                Some(_) => warn!("⚠️ Dropbox 未通过认证，改用本地目录"),
                None => warn!("⚠️ 未配置 DROPBOX_ACCESS_TOKEN，改用本地目录"),
            }
        }

        DocumentSource::Local(LocalSource::new(self.config.local_folder.as_str()))
    }

    /// 逐个处理文档，失败的文档记录后跳过
    async fn process_all_documents(
        &self,
        source: &DocumentSource,
        files: &[SourceFile],
    ) -> (Scoreboard, ProcessingStats) {
        let total = files.len();
        let mut scoreboard = Scoreboard::new();
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        for (index, file) in files.iter().enumerate() {
            let ctx = DocumentCtx::new(index + 1, total, file.name.as_str());
            info!("\n{}", "─".repeat(60));
            info!("{} 开始处理", ctx);

            match self.flow.run(source, file, &ctx).await {
                Ok(entry) => {
                    scoreboard.push(entry);
                    stats.success += 1;
                }
                Err(e) => {
                    error!("{} ❌ {}: {}", ctx, failure_reason(&e), e);
                    stats.failed += 1;
                }
            }

            info!("📈 进度: {}/{}", index + 1, total);
        }

        (scoreboard, stats)
    }
}

/// 单个文档失败的原因摘要
fn failure_reason(err: &AppError) -> &'static str {
    if err.is_unsupported_file_type() {
        "不支持的文件类型，已跳过"
    } else if err.is_timeout() {
        "评分请求超时"
    } else {
        "处理失败"
    }
}
