//! 目录遍历
//!
//! 基于 ignore crate 的顺序遍历：同一目录内按文件名排序，结果顺序确定。
//! 只产出普通文件（指向文件的符号链接也算）；目录符号链接默认不跟随，
//! 开启 follow_links 时由 ignore 检测环路并跳过。

use crate::kernel::services::ports::settings::SearchSettings;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    pub include_hidden: bool,
    pub respect_gitignore: bool,
    pub follow_links: bool,
}

impl From<&SearchSettings> for WalkOptions {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            include_hidden: settings.include_hidden,
            respect_gitignore: settings.respect_gitignore,
            follow_links: settings.follow_links,
        }
    }
}

pub struct DirectoryWalker {
    root: PathBuf,
    options: WalkOptions,
}

impl DirectoryWalker {
    pub fn new(root: &Path, options: WalkOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
        }
    }

    /// 惰性产出文件路径；无法读取的子目录被跳过
    pub fn files(&self) -> impl Iterator<Item = PathBuf> {
        let respect = self.options.respect_gitignore;
        WalkBuilder::new(&self.root)
            .standard_filters(false)
            .hidden(!self.options.include_hidden)
            .ignore(respect)
            .parents(respect)
            .git_ignore(respect)
            .git_global(respect)
            .git_exclude(respect)
            .follow_links(self.options.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(error = %err, "walk: skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.path().is_file())
            .map(ignore::DirEntry::into_path)
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/walker.rs"]
mod tests;
