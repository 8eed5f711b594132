use serde::{Deserialize, Serialize};

use super::watch::WatchTiming;
use crate::kernel::viewer::HighlightRule;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub watch: WatchSettings,
    #[serde(default)]
    pub viewer: ViewerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// 是否搜索以 `.` 开头的文件和目录
    pub include_hidden: bool,
    pub respect_gitignore: bool,
    pub follow_links: bool,
    /// 超过该大小的文件视为读取失败；None 表示不限制
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    /// 搜索词 / 路径历史各自保留的条数；0 表示不记录
    pub history_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            include_hidden: false,
            respect_gitignore: false,
            follow_links: false,
            max_file_size: None,
            history_limit: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub stability_threshold_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            stability_threshold_ms: 2000,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub highlight_case_sensitive: bool,
    pub highlight_rules: Vec<HighlightRule>,
}

impl WatchSettings {
    pub fn timing(&self) -> WatchTiming {
        WatchTiming::from_millis(self.stability_threshold_ms, self.poll_interval_ms)
    }
}
