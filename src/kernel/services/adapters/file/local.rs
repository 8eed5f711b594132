//! 本地文件系统 Provider
//!
//! 实现 FileProvider trait，读取本地文件内容

use crate::kernel::services::ports::file::{FileError, FileProvider, Result};
use memchr::memchr;
use std::fs;
use std::path::Path;

const BINARY_SNIFF_LEN: usize = 8192;

pub struct LocalFileProvider {
    max_file_size: Option<u64>,
}

impl LocalFileProvider {
    pub fn new() -> Self {
        Self {
            max_file_size: None,
        }
    }

    pub fn with_max_file_size(max_file_size: Option<u64>) -> Self {
        Self { max_file_size }
    }
}

impl Default for LocalFileProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// 前 8KB 出现 NUL 字节即视为二进制
pub fn is_likely_binary(content: &[u8]) -> bool {
    let len = content.len().min(BINARY_SNIFF_LEN);
    memchr(0, &content[..len]).is_some()
}

impl FileProvider for LocalFileProvider {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        let metadata = fs::metadata(path).map_err(|e| FileError::io(path, e))?;
        if !metadata.is_file() {
            return Err(FileError::NotAFile(path.to_path_buf()));
        }
        if let Some(limit) = self.max_file_size {
            if metadata.len() > limit {
                return Err(FileError::TooLarge {
                    path: path.to_path_buf(),
                    size: metadata.len(),
                });
            }
        }

        let bytes = fs::read(path).map_err(|e| FileError::io(path, e))?;
        if is_likely_binary(&bytes) {
            return Err(FileError::Binary(path.to_path_buf()));
        }
        String::from_utf8(bytes).map_err(|_| FileError::NotUtf8(path.to_path_buf()))
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/local.rs"]
mod tests;
