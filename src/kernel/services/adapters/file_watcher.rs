//! 单文件监听注册表
//!
//! 每个被监听的文件占用一个 notify watcher（挂在父目录上，原子保存的 rename 也能收到）
//! 和一个 debounce 线程。debounce 线程在文件指纹（长度 + mtime）连续
//! `stability_threshold` 不变之后才向订阅者发出一次通知。

use crate::kernel::services::ports::watch::{WatchError, WatchEvent, WatchHandle, WatchTiming};
use notify::event::{AccessKind, AccessMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Instant, SystemTime};

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileFingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

struct ActiveWatch {
    watched_dir: PathBuf,
    watcher: Option<RecommendedWatcher>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct RegistryState {
    watches: FxHashMap<PathBuf, ActiveWatch>,
    shut_down: bool,
}

pub struct WatchRegistry {
    timing: WatchTiming,
    subscriber: mpsc::Sender<WatchEvent>,
    state: Mutex<RegistryState>,
}

impl WatchRegistry {
    pub fn new(timing: WatchTiming, subscriber: mpsc::Sender<WatchEvent>) -> Self {
        Self {
            timing,
            subscriber,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn timing(&self) -> WatchTiming {
        self.timing
    }

    /// 开始监听 `path`。同一路径重复注册时，先释放旧的监听再建立新的。
    pub fn watch(&self, path: &Path) -> Result<WatchHandle, WatchError> {
        let target = resolve_target(path)?;
        let watched_dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| target.clone());

        let mut state = self.lock_state();
        if state.shut_down {
            return Err(WatchError::ShutDown);
        }
        if let Some(previous) = state.watches.remove(&target) {
            release_watch(&target, previous);
        }

        let (raw_tx, raw_rx) = mpsc::channel();
        let keys = path_identity_keys(path, &target);
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                if event.paths.iter().any(|p| keys.iter().any(|k| k == p)) {
                    let _ = raw_tx.send(event);
                }
            },
            Config::default().with_poll_interval(self.timing.poll_interval),
        )
        .map_err(|source| WatchError::Backend {
            path: target.clone(),
            source,
        })?;
        watcher
            .watch(&watched_dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Backend {
                path: target.clone(),
                source,
            })?;

        let active = self.spawn_worker(&target, watched_dir, Some(watcher), raw_rx)?;
        state.watches.insert(target.clone(), active);
        tracing::info!(path = %target.display(), "watch started");
        Ok(WatchHandle::new(target))
    }

    /// 未被监听的路径直接返回
    pub fn unwatch(&self, path: &Path) {
        let mut state = self.lock_state();
        let removed = lookup_keys(path)
            .into_iter()
            .find_map(|key| state.watches.remove_entry(&key));
        if let Some((target, active)) = removed {
            release_watch(&target, active);
            tracing::info!(path = %target.display(), "watch stopped");
        }
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        let state = self.lock_state();
        lookup_keys(path)
            .iter()
            .any(|key| state.watches.contains_key(key))
    }

    pub fn active_count(&self) -> usize {
        self.lock_state().watches.len()
    }

    /// 释放全部监听；之后的 `watch` 一律返回 `WatchError::ShutDown`
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        if state.shut_down {
            return;
        }
        state.shut_down = true;
        let released = state.watches.len();
        for (target, active) in state.watches.drain() {
            release_watch(&target, active);
        }
        tracing::info!(released, "watch registry shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock_state().shut_down
    }

    fn spawn_worker(
        &self,
        target: &Path,
        watched_dir: PathBuf,
        watcher: Option<RecommendedWatcher>,
        raw_rx: mpsc::Receiver<notify::Event>,
    ) -> Result<ActiveWatch, WatchError> {
        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let worker_target = target.to_path_buf();
            let baseline = file_fingerprint(target);
            let stop = Arc::clone(&stop);
            let subscriber = self.subscriber.clone();
            let timing = self.timing;
            std::thread::Builder::new()
                .name("zview-watch".to_string())
                .spawn(move || {
                    run_debounce_loop(worker_target, baseline, raw_rx, timing, stop, subscriber)
                })
                .map_err(|source| WatchError::Worker {
                    path: target.to_path_buf(),
                    source,
                })?
        };
        Ok(ActiveWatch {
            watched_dir,
            watcher,
            stop,
            worker: Some(worker),
        })
    }

    // 锁中毒时继续使用内部数据：表里只有句柄，不存在半更新的不变量
    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn watch_with_raw_channel(
        &self,
        path: &Path,
    ) -> Result<(WatchHandle, mpsc::Sender<notify::Event>), WatchError> {
        let target = resolve_target(path)?;
        let mut state = self.lock_state();
        if state.shut_down {
            return Err(WatchError::ShutDown);
        }
        if let Some(previous) = state.watches.remove(&target) {
            release_watch(&target, previous);
        }
        let (raw_tx, raw_rx) = mpsc::channel();
        let watched_dir = target.parent().map(Path::to_path_buf).unwrap_or_default();
        let active = self.spawn_worker(&target, watched_dir, None, raw_rx)?;
        state.watches.insert(target.clone(), active);
        Ok((WatchHandle::new(target), raw_tx))
    }
}

impl Drop for WatchRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn resolve_target(path: &Path) -> Result<PathBuf, WatchError> {
    path.canonicalize()
        .map_err(|source| WatchError::InvalidPath {
            path: path.to_path_buf(),
            source,
        })
}

/// 文件被删除后 canonicalize 会失败，此时退回原始路径
fn lookup_keys(path: &Path) -> Vec<PathBuf> {
    let mut keys = vec![path.to_path_buf()];
    if let Ok(canonical) = path.canonicalize() {
        if canonical != path {
            keys.push(canonical);
        }
    }
    keys
}

fn path_identity_keys(raw: &Path, target: &Path) -> Vec<PathBuf> {
    let mut keys = vec![target.to_path_buf()];
    if raw.is_absolute() && raw != target {
        keys.push(raw.to_path_buf());
    }
    keys
}

fn release_watch(target: &Path, mut active: ActiveWatch) {
    active.stop.store(true, Ordering::Release);
    if let Some(mut watcher) = active.watcher.take() {
        if let Err(err) = watcher.unwatch(&active.watched_dir) {
            tracing::warn!(
                path = %target.display(),
                error = %err,
                "failed to release file watch"
            );
        }
    }
    if let Some(worker) = active.worker.take() {
        if worker.join().is_err() {
            tracing::warn!(path = %target.display(), "watch worker panicked");
        }
    }
}

fn file_fingerprint(path: &Path) -> Option<FileFingerprint> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }

    Some(FileFingerprint {
        len: metadata.len(),
        modified: metadata.modified().ok(),
    })
}

fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(_)
            | EventKind::Remove(_)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

struct PendingChange {
    fingerprint: Option<FileFingerprint>,
    since: Instant,
}

/// `baseline` 在注册时取得，注册之后的任何写入都会与它比较
fn run_debounce_loop(
    target: PathBuf,
    mut baseline: Option<FileFingerprint>,
    raw_rx: mpsc::Receiver<notify::Event>,
    timing: WatchTiming,
    stop: Arc<AtomicBool>,
    subscriber: mpsc::Sender<WatchEvent>,
) {
    let mut pending: Option<PendingChange> = None;

    while !stop.load(Ordering::Acquire) {
        match raw_rx.recv_timeout(timing.poll_interval) {
            Ok(event) => {
                if pending.is_none() && is_content_event(&event.kind) {
                    pending = Some(PendingChange {
                        fingerprint: file_fingerprint(&target),
                        since: Instant::now(),
                    });
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let Some(change) = pending.as_mut() else {
            continue;
        };
        let current = file_fingerprint(&target);
        if current != change.fingerprint {
            change.fingerprint = current;
            change.since = Instant::now();
            continue;
        }
        if change.since.elapsed() < timing.stability_threshold {
            continue;
        }

        let settled = pending.take().and_then(|change| change.fingerprint);
        if settled == baseline {
            continue;
        }
        let event = if settled.is_some() {
            WatchEvent::Changed(target.clone())
        } else {
            WatchEvent::Removed(target.clone())
        };
        baseline = settled;
        tracing::debug!(path = %target.display(), ?event, "file settled");
        if subscriber.send(event).is_err() {
            break;
        }
    }
}
