use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STABILITY_THRESHOLD: Duration = Duration::from_millis(2000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Cannot watch {}: {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to watch {}: {source}", .path.display())]
    Backend {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("Failed to start watch worker for {}: {source}", .path.display())]
    Worker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Watch registry has been shut down")]
    ShutDown,
}

/// 文件变更通知，只在文件停止写入一段时间（quiescence window）之后发出
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Changed(path) | WatchEvent::Removed(path) => path,
        }
    }
}

/// A path key naming one registry entry. The registry owns the OS resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchHandle {
    path: PathBuf,
}

impl WatchHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTiming {
    pub stability_threshold: Duration,
    pub poll_interval: Duration,
}

impl Default for WatchTiming {
    fn default() -> Self {
        Self {
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WatchTiming {
    pub fn from_millis(stability_threshold_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            stability_threshold: Duration::from_millis(stability_threshold_ms),
            poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
        }
    }
}
