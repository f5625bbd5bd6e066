//! # Doc Judge
//!
//! 批量给文档打分并生成计分板的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 只负责 HTTP 调用
//! - `FlowClient` - 评分流程 run 接口
//! - `DropboxClient` - Dropbox 认证、列目录、下载
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文档
//! - `FileSource` - 本地 / Dropbox 文件来源
//! - `ContentExtractor` - docx / pdf / txt / md 文本提取
//! - `ScoreRunner` - 调用评分流程并解析分数
//! - `scoreboard_renderer` - 计分板 HTML / 文本渲染
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文档"的完整处理流程
//! - `DocumentCtx` - 上下文封装（序号 + 文件名）
//! - `ScoreFlow` - 流程编排（read → extract → run_flow → extract_scores）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 选择来源，逐个处理，输出计分板
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{FinalScore, JudgeOutput, JudgeScores, Scoreboard, ScoreboardEntry};
pub use orchestrator::{App, RunReport};
pub use services::{ContentExtractor, ScoreRunner};
pub use workflow::{DocumentCtx, ScoreFlow};
