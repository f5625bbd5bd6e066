pub mod document_ctx;
pub mod score_flow;

pub use document_ctx::DocumentCtx;
pub use score_flow::ScoreFlow;
