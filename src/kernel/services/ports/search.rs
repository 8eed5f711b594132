use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
    #[error("Cannot read search root {}: {source}", .path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Search root is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),
    #[error("Search cancelled")]
    Cancelled,
    #[error("Please open a folder first")]
    NoFolderOpen,
    #[error("Please enter a search pattern")]
    EmptyPattern,
}

/// 扩展名过滤集合：小写、带前导 `.`；空集合表示不过滤
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        Self { extensions }
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn allows(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        match extension_key(path) {
            Some(key) => self.extensions.contains(&key),
            None => false,
        }
    }
}

impl From<Vec<String>> for ExtensionFilter {
    fn from(value: Vec<String>) -> Self {
        Self::new(value)
    }
}

impl From<ExtensionFilter> for Vec<String> {
    fn from(value: ExtensionFilter) -> Self {
        value.extensions.into_iter().collect()
    }
}

fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// `a/b.TXT` -> `.txt`；没有扩展名时返回 None
pub fn extension_key(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// 搜索结果的行划分：按 `\n` 切分，保留每行原始文本（包括 `\r`），末尾换行不产生空行
#[inline]
pub fn split_lines(content: &str) -> std::str::SplitTerminator<'_, char> {
    content.split_terminator('\n')
}

#[inline]
pub fn line_number(index: usize) -> usize {
    index + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters {
    pub root: PathBuf,
    pub pattern: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default)]
    pub file_types: ExtensionFilter,
}

impl SearchParameters {
    pub fn new(root: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            pattern: pattern.into(),
            case_sensitive: false,
            use_regex: false,
            file_types: ExtensionFilter::default(),
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn use_regex(mut self, use_regex: bool) -> Self {
        self.use_regex = use_regex;
        self
    }

    pub fn file_types<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.file_types = ExtensionFilter::new(extensions);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMatch {
    /// 1-based
    pub line_number: usize,
    pub line_text: String,
    pub match_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchResult {
    pub path: PathBuf,
    /// Whole-file count; computed independently of `line_matches`.
    pub total_matches: usize,
    pub line_matches: Vec<LineMatch>,
}

pub type SearchResultSet = Vec<FileSearchResult>;

#[derive(Debug, Clone)]
pub enum GlobalSearchMessage {
    FileResult {
        search_id: u64,
        result: FileSearchResult,
    },
    Progress {
        search_id: u64,
        files_searched: usize,
        files_with_matches: usize,
    },
    Complete {
        search_id: u64,
        total_files: usize,
        total_matches: usize,
    },
    Cancelled {
        search_id: u64,
    },
    Error {
        search_id: u64,
        message: String,
    },
}

impl GlobalSearchMessage {
    pub fn search_id(&self) -> u64 {
        match self {
            GlobalSearchMessage::FileResult { search_id, .. }
            | GlobalSearchMessage::Progress { search_id, .. }
            | GlobalSearchMessage::Complete { search_id, .. }
            | GlobalSearchMessage::Cancelled { search_id }
            | GlobalSearchMessage::Error { search_id, .. } => *search_id,
        }
    }
}
