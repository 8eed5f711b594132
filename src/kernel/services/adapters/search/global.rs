//! 全局搜索服务
//!
//! - 同步：`search` / `search_with_cancel`，遍历完成后一次性返回结果集
//! - 流式：`search_in_dir`，在 tokio 运行时的阻塞线程上遍历，逐文件发送结果
//! - 结果顺序 = 遍历顺序（同目录按文件名排序）

use super::matcher::Matcher;
use super::walker::{DirectoryWalker, WalkOptions};
use crate::kernel::services::adapters::file::LocalFileProvider;
use crate::kernel::services::ports::file::FileProvider;
use crate::kernel::services::ports::search::{
    line_number, split_lines, FileSearchResult, GlobalSearchMessage, LineMatch, Result,
    SearchError, SearchParameters, SearchResultSet,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;

static GLOBAL_SEARCH_ID: AtomicU64 = AtomicU64::new(0);

const PROGRESS_EVERY: usize = 100;

fn next_global_search_id() -> u64 {
    GLOBAL_SEARCH_ID.fetch_add(1, Ordering::Relaxed)
}

pub struct GlobalSearchTask {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl GlobalSearchTask {
    pub fn new() -> Self {
        Self {
            id: next_global_search_id(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancelled_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }
}

impl Default for GlobalSearchTask {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    files_searched: usize,
    files_with_matches: usize,
    total_matches: usize,
}

#[derive(Clone)]
pub struct GlobalSearchService {
    provider: Arc<dyn FileProvider>,
    walk: WalkOptions,
}

impl GlobalSearchService {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(LocalFileProvider::new()), WalkOptions::default())
    }

    pub fn with_provider(provider: Arc<dyn FileProvider>, walk: WalkOptions) -> Self {
        Self { provider, walk }
    }

    pub fn search(&self, params: &SearchParameters) -> Result<SearchResultSet> {
        let never = AtomicBool::new(false);
        self.search_with_cancel(params, &never)
    }

    /// `cancelled` 在每个文件之间检查一次
    pub fn search_with_cancel(
        &self,
        params: &SearchParameters,
        cancelled: &AtomicBool,
    ) -> Result<SearchResultSet> {
        let mut results = Vec::new();
        let counters = self.run(params, cancelled, |result| results.push(result))?;
        tracing::info!(
            root = %params.root.display(),
            files_searched = counters.files_searched,
            files_with_matches = counters.files_with_matches,
            total_matches = counters.total_matches,
            "search complete"
        );
        Ok(results)
    }

    /// 流式搜索：结果通过 `tx` 按遍历顺序逐文件发送
    pub fn search_in_dir(
        &self,
        runtime: &tokio::runtime::Handle,
        params: SearchParameters,
        tx: SyncSender<GlobalSearchMessage>,
    ) -> GlobalSearchTask {
        let task = GlobalSearchTask::new();
        let search_id = task.id();
        let cancelled = task.cancelled_flag();
        let service = self.clone();

        runtime.spawn(async move {
            let cancelled_for_blocking = cancelled.clone();
            let tx_for_blocking = tx.clone();
            let result = tokio::task::spawn_blocking(move || {
                let outcome = service.run_with_progress(
                    &params,
                    &cancelled_for_blocking,
                    |result| {
                        let _ = tx_for_blocking.send(GlobalSearchMessage::FileResult {
                            search_id,
                            result,
                        });
                    },
                    |files_searched, files_with_matches| {
                        let _ = tx_for_blocking.send(GlobalSearchMessage::Progress {
                            search_id,
                            files_searched,
                            files_with_matches,
                        });
                    },
                );
                let message = match outcome {
                    Ok(counters) => GlobalSearchMessage::Complete {
                        search_id,
                        total_files: counters.files_searched,
                        total_matches: counters.total_matches,
                    },
                    Err(SearchError::Cancelled) => GlobalSearchMessage::Cancelled { search_id },
                    Err(e) => GlobalSearchMessage::Error {
                        search_id,
                        message: e.to_string(),
                    },
                };
                let _ = tx_for_blocking.send(message);
            })
            .await;

            if let Err(e) = result {
                let message = if cancelled.load(Ordering::Relaxed) {
                    GlobalSearchMessage::Cancelled { search_id }
                } else {
                    GlobalSearchMessage::Error {
                        search_id,
                        message: format!("Global search task failed: {}", e),
                    }
                };
                let _ = tx.send(message);
            }
        });

        task
    }

    fn run(
        &self,
        params: &SearchParameters,
        cancelled: &AtomicBool,
        on_result: impl FnMut(FileSearchResult),
    ) -> Result<Counters> {
        self.run_with_progress(params, cancelled, on_result, |_, _| {})
    }

    fn run_with_progress(
        &self,
        params: &SearchParameters,
        cancelled: &AtomicBool,
        mut on_result: impl FnMut(FileSearchResult),
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<Counters> {
        let matcher = Matcher::compile(&params.pattern, params.case_sensitive, params.use_regex)?;
        check_root(&params.root)?;

        let mut counters = Counters::default();
        if params.pattern.is_empty() {
            return Ok(counters);
        }

        let walker = DirectoryWalker::new(&params.root, self.walk);
        for path in walker.files() {
            if cancelled.load(Ordering::Relaxed) {
                return Err(SearchError::Cancelled);
            }
            if !params.file_types.allows(&path) {
                continue;
            }

            let content = match self.provider.read_file(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::debug!(error = %e, "search: skipping unreadable file");
                    continue;
                }
            };

            counters.files_searched += 1;
            if let Some(result) = search_content(&path, &content, &matcher) {
                counters.files_with_matches += 1;
                counters.total_matches += result.total_matches;
                on_result(result);
            }

            if counters.files_searched % PROGRESS_EVERY == 0 {
                on_progress(counters.files_searched, counters.files_with_matches);
            }
        }

        Ok(counters)
    }
}

impl Default for GlobalSearchService {
    fn default() -> Self {
        Self::new()
    }
}

fn check_root(root: &Path) -> Result<()> {
    let metadata = std::fs::metadata(root).map_err(|source| SearchError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(SearchError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(())
}

/// 整文件计数与逐行计数分别独立计算；整文件为 0 时不产出结果
pub fn search_content(path: &Path, content: &str, matcher: &Matcher) -> Option<FileSearchResult> {
    let total_matches = matcher.count(content);
    if total_matches == 0 {
        return None;
    }

    let line_matches = split_lines(content)
        .enumerate()
        .filter_map(|(index, line)| {
            let match_count = matcher.count(line);
            (match_count > 0).then(|| LineMatch {
                line_number: line_number(index),
                line_text: line.to_string(),
                match_count,
            })
        })
        .collect();

    Some(FileSearchResult {
        path: path.to_path_buf(),
        total_matches,
        line_matches,
    })
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/global.rs"]
mod tests;
