use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, FileError>;

/// 单个文件读取失败（搜索时被吞掉，打开文件时返回给调用方）
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("Binary file: {}", .0.display())]
    Binary(PathBuf),
    #[error("File is not valid UTF-8: {}", .0.display())]
    NotUtf8(PathBuf),
    #[error("File too large ({size} bytes): {}", .path.display())]
    TooLarge { path: PathBuf, size: u64 },
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            _ => FileError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileError::NotFound(path)
            | FileError::NotAFile(path)
            | FileError::Binary(path)
            | FileError::NotUtf8(path)
            | FileError::TooLarge { path, .. }
            | FileError::Io { path, .. } => path,
        }
    }
}

/// 文件内容读取抽象。搜索引擎与 host 都只通过它访问文件内容。
pub trait FileProvider: Send + Sync {
    fn scheme(&self) -> &'static str;

    /// 读取整个文件为 UTF-8 文本；二进制或无法解码时失败
    fn read_file(&self, path: &Path) -> Result<String>;
}
