//! 文档评分流程 - 流程层
//!
//! 核心职责：定义"一个文档"的完整处理流程
//!
//! 流程顺序：
//! 1. 从文件来源读取字节
//! 2. 提取纯文本
//! 3. 调用评分流程
//! 4. 解析分数，生成计分板记录

use tracing::{debug, info};

use crate::clients::{FlowClient, FlowTransport};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{ScoreboardEntry, SourceFile};
use crate::services::{ContentExtractor, FileSource, ScoreRunner};
use crate::utils::truncate_text;
use crate::workflow::document_ctx::DocumentCtx;

/// 文档评分流程
///
/// - 编排单个文档的处理顺序
/// - 不持有文件来源，由调用方传入
/// - 只依赖业务能力（services）
pub struct ScoreFlow<T = FlowClient> {
    extractor: ContentExtractor,
    runner: ScoreRunner<T>,
    verbose_logging: bool,
}

impl ScoreFlow<FlowClient> {
    /// 创建新的文档评分流程
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            extractor: ContentExtractor::new(config.strip_txt_image_links),
            runner: ScoreRunner::new(config)?,
            verbose_logging: config.verbose_logging,
        })
    }
}

impl<T: FlowTransport> ScoreFlow<T> {
    pub fn with_parts(extractor: ContentExtractor, runner: ScoreRunner<T>) -> Self {
        Self {
            extractor,
            runner,
            verbose_logging: false,
        }
    }

    pub fn runner(&self) -> &ScoreRunner<T> {
        &self.runner
    }

    pub async fn run<S: FileSource>(
        &self,
        source: &S,
        file: &SourceFile,
        ctx: &DocumentCtx,
    ) -> AppResult<ScoreboardEntry> {
        info!("{} 📖 正在读取...", ctx);
        let bytes = source.read(&file.handle).await?;

        let text = self.extractor.extract_named(&file.name, &bytes)?;
        info!("{} ✓ 已提取 {} 个字符", ctx, text.chars().count());
        if self.verbose_logging {
            debug!("{} 内容预览: {}", ctx, truncate_text(&text, 200));
        }

        info!("{} ⚖️ 正在评分...", ctx);
        let judge_output = self.runner.run_flow(&text).await?;
        let scores = ScoreRunner::<T>::extract_scores(&judge_output);

        info!("{} 🏁 最终分数: {}", ctx, scores.final_score);
        for (label, explanation) in scores.detail_lines() {
            info!("{}   • {}: {}", ctx, label, explanation);
        }

        Ok(ScoreboardEntry::new(file.name.as_str(), scores.final_score)
            .with_detail(scores.score_detail))
    }
}
