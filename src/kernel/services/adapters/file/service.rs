//! 文件服务：打开文件并生成 LoadedFile

use super::local::LocalFileProvider;
use crate::kernel::services::ports::file::{FileProvider, Result};
use crate::kernel::viewer::LoadedFile;
use std::path::Path;
use std::sync::Arc;

pub struct FileService {
    provider: Arc<dyn FileProvider>,
}

impl FileService {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(LocalFileProvider::new()))
    }

    pub fn with_provider(provider: Arc<dyn FileProvider>) -> Self {
        Self { provider }
    }

    pub fn read_file(&self, path: &Path) -> Result<String> {
        self.provider.read_file(path)
    }

    pub fn open(&self, path: &Path) -> Result<LoadedFile> {
        let content = self.provider.read_file(path)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "file loaded");
        Ok(LoadedFile::new(path.to_path_buf(), content))
    }
}

impl Default for FileService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/service.rs"]
mod tests;
