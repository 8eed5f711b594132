//! Service ports: traits + data contracts.

pub mod file;
pub mod search;
pub mod settings;
pub mod watch;

pub use file::{FileError, FileProvider, Result as FileResult};
pub use search::{
    ExtensionFilter, FileSearchResult, GlobalSearchMessage, LineMatch, PatternError,
    SearchError, SearchParameters, SearchResultSet,
};
pub use settings::{SearchSettings, Settings, ViewerSettings, WatchSettings};
pub use watch::{WatchError, WatchEvent, WatchHandle, WatchTiming};
