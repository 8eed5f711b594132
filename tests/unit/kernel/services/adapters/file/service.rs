use super::*;
use crate::kernel::services::ports::file::FileError;
use std::path::PathBuf;
use tempfile::tempdir;

struct FailingProvider;

impl FileProvider for FailingProvider {
    fn scheme(&self) -> &'static str {
        "failing"
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        Err(FileError::NotUtf8(path.to_path_buf()))
    }
}

#[test]
fn test_open_builds_loaded_file() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, "one\ntwo\nthree").unwrap();

    let service = FileService::new();
    let loaded = service.open(&file_path).unwrap();

    assert_eq!(loaded.path(), file_path.as_path());
    assert_eq!(loaded.content(), "one\ntwo\nthree");
    assert_eq!(loaded.line_count(), 3);
}

#[test]
fn test_open_propagates_provider_error() {
    let service = FileService::with_provider(Arc::new(FailingProvider));
    let err = service.open(&PathBuf::from("/tmp/whatever.txt")).unwrap_err();
    assert!(matches!(err, FileError::NotUtf8(_)));
}

#[test]
fn test_read_file_returns_raw_content() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("crlf.txt");
    std::fs::write(&file_path, "a\r\nb\r\n").unwrap();

    let service = FileService::new();
    assert_eq!(service.read_file(&file_path).unwrap(), "a\r\nb\r\n");
}
