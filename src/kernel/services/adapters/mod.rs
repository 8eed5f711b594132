//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod file;
pub mod file_watcher;
pub mod search;
pub mod settings;

pub use file::{FileService, LocalFileProvider};
pub use file_watcher::WatchRegistry;
pub use search::{
    search_content, DirectoryWalker, GlobalSearchService, GlobalSearchTask, Matcher, WalkOptions,
};
pub use settings::{
    ensure_log_dir, ensure_settings_file, get_log_dir, get_settings_path, load_explicit_settings,
    load_settings, load_settings_from, write_default_settings,
};
