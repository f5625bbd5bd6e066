//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量文档处理器
//! - 管理应用生命周期（初始化、运行）
//! - 选择文件来源，列出并挑选文档
//! - 逐个调用 ScoreFlow，汇总计分板
//! - 输出计分板和全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<SourceFile>)
//!     ↓
//! workflow::ScoreFlow (处理单个文档)
//!     ↓
//! services (能力层：file_source / extractor / score_runner / renderer)
//!     ↓
//! clients (HTTP：评分流程 / Dropbox)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → workflow → services → clients
//! 2. **无业务逻辑**：只做调度和统计，不做具体的解析和评分

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, ProcessingStats, RunReport};
