//! 边界 host：UI / CLI 通过它打开文件、搜索目录、监听文件变化。
//!
//! host 是显式持有的上下文对象：服务、查看器状态、当前目录都挂在它上面，没有进程级全局状态。

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::kernel::history::SearchHistory;
use crate::kernel::search::SearchState;
use crate::kernel::services::adapters::file::{FileService, LocalFileProvider};
use crate::kernel::services::adapters::file_watcher::WatchRegistry;
use crate::kernel::services::adapters::search::{GlobalSearchService, GlobalSearchTask, WalkOptions};
use crate::kernel::services::ports::file::{FileError, FileProvider};
use crate::kernel::services::ports::search::{
    ExtensionFilter, GlobalSearchMessage, SearchError, SearchParameters, SearchResultSet,
};
use crate::kernel::services::ports::settings::Settings;
use crate::kernel::services::ports::watch::{WatchError, WatchEvent, WatchHandle, WatchTiming};
use crate::kernel::viewer::{FileInfo, FileViewer, LoadedFile};

const SEARCH_CHANNEL_CAPACITY: usize = 256;

/// 针对当前目录的一次搜索请求（根目录由 host 提供）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub pattern: String,
    pub case_sensitive: bool,
    pub use_regex: bool,
    pub file_types: ExtensionFilter,
}

impl SearchQuery {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
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

#[derive(Debug, Clone)]
pub struct SearchSummary {
    pub results: SearchResultSet,
    pub elapsed: Duration,
}

impl SearchSummary {
    pub fn total_matches(&self) -> usize {
        self.results.iter().map(|r| r.total_matches).sum()
    }

    pub fn file_count(&self) -> usize {
        self.results.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// 当前打开的文件已按新内容重新加载
    FileRefreshed { path: PathBuf, info: FileInfo },
    /// 被监听但未打开的文件发生了变化
    FileChanged(PathBuf),
    FileRemoved(PathBuf),
    RefreshFailed { path: PathBuf, error: String },
}

struct ActiveSearch {
    task: GlobalSearchTask,
    rx: Receiver<GlobalSearchMessage>,
}

pub struct ViewerHost {
    files: FileService,
    search: GlobalSearchService,
    watches: WatchRegistry,
    watch_rx: Receiver<WatchEvent>,
    viewer: FileViewer,
    current_folder: Option<PathBuf>,
    search_state: SearchState,
    active_search: Option<ActiveSearch>,
    history: SearchHistory,
}

impl ViewerHost {
    pub fn new(settings: &Settings) -> Self {
        let provider: Arc<dyn FileProvider> = Arc::new(LocalFileProvider::with_max_file_size(
            settings.search.max_file_size,
        ));
        let mut host = Self::with_provider(
            provider,
            WalkOptions::from(&settings.search),
            settings.watch.timing(),
        );
        host.history = SearchHistory::new(settings.search.history_limit);

        let viewer = &settings.viewer;
        if !viewer.highlight_rules.is_empty() {
            if let Err(err) = host
                .viewer
                .set_highlight_rules(&viewer.highlight_rules, viewer.highlight_case_sensitive)
            {
                tracing::warn!(error = %err, "ignoring configured highlight rules");
            }
        }
        host
    }

    pub fn with_provider(
        provider: Arc<dyn FileProvider>,
        walk: WalkOptions,
        timing: WatchTiming,
    ) -> Self {
        let (watch_tx, watch_rx) = mpsc::channel();
        Self {
            files: FileService::with_provider(Arc::clone(&provider)),
            search: GlobalSearchService::with_provider(provider, walk),
            watches: WatchRegistry::new(timing, watch_tx),
            watch_rx,
            viewer: FileViewer::new(),
            current_folder: None,
            search_state: SearchState::default(),
            active_search: None,
            history: SearchHistory::default(),
        }
    }

    pub fn viewer(&self) -> &FileViewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut FileViewer {
        &mut self.viewer
    }

    pub fn watches(&self) -> &WatchRegistry {
        &self.watches
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search_state
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// 读取失败时保留之前加载的文件
    pub fn open_file(&mut self, path: &Path) -> Result<&LoadedFile, FileError> {
        let file = self.files.open(path)?;
        tracing::info!(path = %path.display(), lines = file.line_count(), "file opened");
        Ok(self.viewer.load(file))
    }

    pub fn close_file(&mut self) {
        if let Some(path) = self.viewer.file().map(|f| f.path().to_path_buf()) {
            self.watches.unwatch(&path);
        }
        self.viewer.reset();
    }

    pub fn open_folder(&mut self, path: &Path) -> Result<&Path, SearchError> {
        let metadata = std::fs::metadata(path).map_err(|source| SearchError::RootUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(SearchError::RootNotDirectory(path.to_path_buf()));
        }
        let folder = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        tracing::info!(path = %folder.display(), "folder opened");
        Ok(self.current_folder.insert(folder).as_path())
    }

    pub fn current_folder(&self) -> Option<&Path> {
        self.current_folder.as_deref()
    }

    pub fn search_files(&self, params: &SearchParameters) -> Result<SearchResultSet, SearchError> {
        self.search.search(params)
    }

    /// 请求被接受（已打开目录且搜索词非空）即写入历史，与搜索结果无关
    pub fn search_current_folder(
        &mut self,
        query: SearchQuery,
    ) -> Result<SearchSummary, SearchError> {
        let params = self.folder_parameters(query)?;
        self.history.record(&params.pattern, &params.root);
        let started = Instant::now();
        let results = self.search.search(&params)?;
        Ok(SearchSummary {
            results,
            elapsed: started.elapsed(),
        })
    }

    /// 在当前目录上启动流式搜索，旧的搜索会被取消。结果通过 `poll_search` 汇入 `search_state`。
    pub fn start_folder_search(
        &mut self,
        runtime: &tokio::runtime::Handle,
        query: SearchQuery,
    ) -> Result<u64, SearchError> {
        let params = self.folder_parameters(query)?;
        self.history.record(&params.pattern, &params.root);
        self.cancel_search();

        self.search_state.case_sensitive = params.case_sensitive;
        self.search_state.use_regex = params.use_regex;
        self.search_state.begin_search(&params.pattern);

        let (tx, rx) = mpsc::sync_channel(SEARCH_CHANNEL_CAPACITY);
        let task = self.search.search_in_dir(runtime, params, tx);
        let search_id = task.id();
        self.search_state.set_active_search_id(search_id);
        self.active_search = Some(ActiveSearch { task, rx });
        Ok(search_id)
    }

    /// 把已到达的流式消息合并进 `search_state`，返回状态是否变化
    pub fn poll_search(&mut self) -> bool {
        let Some(active) = self.active_search.as_ref() else {
            return false;
        };

        let mut changed = false;
        let mut finished = false;
        loop {
            match active.rx.try_recv() {
                Ok(msg) => changed |= self.search_state.apply_message(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }
        if finished || !self.search_state.searching {
            self.active_search = None;
        }
        changed
    }

    pub fn cancel_search(&mut self) {
        if let Some(active) = self.active_search.as_ref() {
            active.task.cancel();
        }
    }

    pub fn is_searching(&self) -> bool {
        self.active_search.is_some() && self.search_state.searching
    }

    pub fn watch_file(&self, path: &Path) -> Result<WatchHandle, WatchError> {
        self.watches.watch(path)
    }

    pub fn unwatch_file(&self, path: &Path) {
        self.watches.unwatch(path);
    }

    /// 没有打开文件时返回 `Ok(None)`
    pub fn watch_current_file(&self) -> Result<Option<WatchHandle>, WatchError> {
        match self.viewer.file() {
            Some(file) => self.watches.watch(file.path()).map(Some),
            None => Ok(None),
        }
    }

    pub fn unwatch_current_file(&self) {
        if let Some(file) = self.viewer.file() {
            self.watches.unwatch(file.path());
        }
    }

    pub fn is_watching_current_file(&self) -> bool {
        self.viewer
            .file()
            .is_some_and(|file| self.watches.is_watching(file.path()))
    }

    /// 处理所有已到达的监听通知。当前打开的文件变化时重新读取并刷新查看器。
    pub fn process_watch_events(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.watch_rx.try_recv() {
            match event {
                WatchEvent::Changed(path) => {
                    if self.is_current_file(&path) {
                        events.push(self.refresh_current_file(path));
                    } else {
                        events.push(HostEvent::FileChanged(path));
                    }
                }
                WatchEvent::Removed(path) => {
                    tracing::info!(path = %path.display(), "watched file removed");
                    events.push(HostEvent::FileRemoved(path));
                }
            }
        }
        events
    }

    /// 取消进行中的搜索并释放所有监听
    pub fn shutdown(&mut self) {
        self.cancel_search();
        self.active_search = None;
        self.watches.shutdown();
    }

    fn folder_parameters(&self, query: SearchQuery) -> Result<SearchParameters, SearchError> {
        let root = self.current_folder.clone().ok_or(SearchError::NoFolderOpen)?;
        let pattern = query.pattern.trim();
        if pattern.is_empty() {
            return Err(SearchError::EmptyPattern);
        }
        Ok(SearchParameters {
            root,
            pattern: pattern.to_string(),
            case_sensitive: query.case_sensitive,
            use_regex: query.use_regex,
            file_types: query.file_types,
        })
    }

    fn is_current_file(&self, path: &Path) -> bool {
        let Some(file) = self.viewer.file() else {
            return false;
        };
        if file.path() == path {
            return true;
        }
        file.path()
            .canonicalize()
            .is_ok_and(|canonical| canonical == path)
    }

    fn refresh_current_file(&mut self, changed: PathBuf) -> HostEvent {
        let Some(path) = self.viewer.file().map(|f| f.path().to_path_buf()) else {
            return HostEvent::FileChanged(changed);
        };
        match self.files.read_file(&path) {
            Ok(content) => {
                self.viewer.refresh(content);
                tracing::info!(path = %path.display(), "file refreshed");
                let Some(info) = self.viewer.file_info() else {
                    return HostEvent::FileChanged(changed);
                };
                HostEvent::FileRefreshed { path, info }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "refresh failed");
                HostEvent::RefreshFailed {
                    path,
                    error: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/services/host.rs"]
mod tests;
