//! Headless core: search, file watching, single-file viewer state.

pub mod history;
pub mod search;
pub mod services;
pub mod viewer;

pub use history::SearchHistory;
pub use search::SearchState;
pub use viewer::{FileInfo, FileViewer, HighlightRule, HighlightedLine, LoadedFile, Segment};
