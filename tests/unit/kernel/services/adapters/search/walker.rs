use super::*;
use std::fs;
use tempfile::tempdir;

fn relative(root: &Path, files: Vec<PathBuf>) -> Vec<String> {
    files
        .into_iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_walk_yields_only_files_recursively() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
    fs::write(dir.path().join("b.txt"), "b").unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    fs::write(dir.path().join("sub/c.txt"), "c").unwrap();
    fs::write(dir.path().join("sub/deeper/d.txt"), "d").unwrap();

    let walker = DirectoryWalker::new(dir.path(), WalkOptions::default());
    let files = relative(dir.path(), walker.files().collect());

    assert_eq!(files, vec!["a.txt", "b.txt", "sub/c.txt", "sub/deeper/d.txt"]);
}

#[test]
fn test_walk_order_is_deterministic() {
    let dir = tempdir().unwrap();
    for name in ["zeta.txt", "alpha.txt", "mid.txt"] {
        fs::write(dir.path().join(name), name).unwrap();
    }

    let walker = DirectoryWalker::new(dir.path(), WalkOptions::default());
    let first: Vec<_> = walker.files().collect();
    let second: Vec<_> = walker.files().collect();
    assert_eq!(first, second);
    assert_eq!(
        relative(dir.path(), first),
        vec!["alpha.txt", "mid.txt", "zeta.txt"]
    );
}

#[test]
fn test_hidden_entries_skipped_by_default() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    fs::write(dir.path().join(".git/config"), "x").unwrap();
    fs::write(dir.path().join(".env"), "x").unwrap();
    fs::write(dir.path().join("visible.txt"), "x").unwrap();

    let walker = DirectoryWalker::new(dir.path(), WalkOptions::default());
    assert_eq!(relative(dir.path(), walker.files().collect()), vec!["visible.txt"]);

    let walker = DirectoryWalker::new(
        dir.path(),
        WalkOptions {
            include_hidden: true,
            ..WalkOptions::default()
        },
    );
    assert_eq!(walker.files().count(), 3);
}

#[test]
fn test_gitignore_ignored_unless_enabled() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".ignore"), "skipped.txt\n").unwrap();
    fs::write(dir.path().join("skipped.txt"), "x").unwrap();
    fs::write(dir.path().join("kept.txt"), "x").unwrap();

    let walker = DirectoryWalker::new(dir.path(), WalkOptions::default());
    assert_eq!(
        relative(dir.path(), walker.files().collect()),
        vec!["kept.txt", "skipped.txt"]
    );

    let walker = DirectoryWalker::new(
        dir.path(),
        WalkOptions {
            respect_gitignore: true,
            ..WalkOptions::default()
        },
    );
    assert_eq!(relative(dir.path(), walker.files().collect()), vec!["kept.txt"]);
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_does_not_loop() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/file.txt"), "x").unwrap();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

    for follow_links in [false, true] {
        let walker = DirectoryWalker::new(
            dir.path(),
            WalkOptions {
                follow_links,
                ..WalkOptions::default()
            },
        );
        let files = relative(dir.path(), walker.files().collect());
        assert_eq!(files, vec!["sub/file.txt"], "follow_links={follow_links}");
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() {
    use crate::kernel::services::adapters::search::GlobalSearchService;
    use crate::kernel::services::ports::search::SearchParameters;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("locked")).unwrap();
    fs::write(dir.path().join("locked/hidden.txt"), "needle").unwrap();
    fs::write(dir.path().join("a.txt"), "needle").unwrap();
    fs::write(dir.path().join("z.txt"), "needle").unwrap();

    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    // root 无视目录权限，此时无法构造不可读目录
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let walker = DirectoryWalker::new(dir.path(), WalkOptions::default());
    let files = relative(dir.path(), walker.files().collect());

    let results = GlobalSearchService::new().search(&SearchParameters::new(dir.path(), "needle"));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(files, vec!["a.txt", "z.txt"]);
    let results = results.unwrap();
    let names: Vec<_> = results
        .iter()
        .map(|r| r.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.txt", "z.txt"]);
}
