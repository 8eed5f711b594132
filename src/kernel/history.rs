//! 搜索历史：搜索词和搜索目录各一份，只存在内存中。
//!
//! 最新的在最前；重复记录会移到最前而不是新增一条；超出上限时丢弃最旧的。

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHistory {
    limit: usize,
    patterns: VecDeque<String>,
    paths: VecDeque<PathBuf>,
}

impl SearchHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            patterns: VecDeque::new(),
            paths: VecDeque::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 一次成功发起的搜索：同时记录搜索词和目录
    pub fn record(&mut self, pattern: &str, path: &Path) {
        self.record_pattern(pattern);
        self.record_path(path);
    }

    pub fn record_pattern(&mut self, pattern: &str) {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return;
        }
        push_front_unique(&mut self.patterns, pattern.to_string(), self.limit);
    }

    pub fn record_path(&mut self, path: &Path) {
        if path.as_os_str().is_empty() {
            return;
        }
        push_front_unique(&mut self.paths, path.to_path_buf(), self.limit);
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
        self.paths.clear();
    }
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

fn push_front_unique<T: PartialEq>(entries: &mut VecDeque<T>, value: T, limit: usize) {
    if limit == 0 {
        return;
    }
    if let Some(index) = entries.iter().position(|entry| *entry == value) {
        entries.remove(index);
    }
    entries.push_front(value);
    entries.truncate(limit);
}
