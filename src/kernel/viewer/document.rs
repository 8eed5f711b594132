use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    path: PathBuf,
    content: String,
    line_ranges: Vec<Range<usize>>,
}

impl LoadedFile {
    pub fn new(path: PathBuf, content: String) -> Self {
        let line_ranges = line_ranges(&content);
        Self {
            path,
            content,
            line_ranges,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn line_count(&self) -> usize {
        self.line_ranges.len()
    }

    /// 1-based
    pub fn line(&self, line_number: usize) -> Option<&str> {
        let range = self.line_ranges.get(line_number.checked_sub(1)?)?;
        Some(&self.content[range.clone()])
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.line_ranges
            .iter()
            .map(|range| &self.content[range.clone()])
    }

    pub fn info(&self) -> FileInfo {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string());
        FileInfo {
            name,
            path: self.path.clone(),
            size_bytes: self.content.len() as u64,
            line_count: self.line_count(),
        }
    }
}

/// 查看器按 `\n` 完整切分：末尾换行之后还有一个空行，空文件也有一行。
/// 搜索侧的 `split_lines` 则丢弃末尾空行。
fn line_ranges(content: &str) -> Vec<Range<usize>> {
    let base = content.as_ptr() as usize;
    content
        .split('\n')
        .map(|line| {
            let start = line.as_ptr() as usize - base;
            start..start + line.len()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub line_count: usize,
}

impl FileInfo {
    pub fn size_display(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// 1536 -> "1.5 KB"；保留两位小数并去掉末尾的 0
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}
