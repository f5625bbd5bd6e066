pub mod extractor;
pub mod file_source;
pub mod score_runner;
pub mod scoreboard_renderer;

pub use extractor::ContentExtractor;
pub use file_source::{
    select_files, DocumentSource, DropboxSource, FileSource, LocalSource, SourceKind,
};
pub use score_runner::{FlowEndpoint, RetryPolicy, ScoreRunner};
