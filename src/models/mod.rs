pub mod document;
pub mod flow;
pub mod scoreboard;

pub use document::{DocumentKind, SourceFile};
pub use flow::{
    detail_lines, FlowRequest, JudgeOutput, JudgeScores, JUDGE_OUTPUT_NAME, NOT_AVAILABLE,
};
pub use scoreboard::{FinalScore, Scoreboard, ScoreboardEntry};
