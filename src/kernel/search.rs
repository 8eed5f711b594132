use crate::kernel::services::ports::{FileSearchResult, GlobalSearchMessage, SearchResultSet};

/// 流式搜索结果的聚合状态。只接受 `active_search_id` 对应的消息，旧搜索的迟到消息直接丢弃。
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub pattern: String,
    pub case_sensitive: bool,
    pub use_regex: bool,
    pub searching: bool,
    pub active_search_id: Option<u64>,
    pub files_searched: usize,
    pub files_with_matches: usize,
    pub total_matches: usize,
    pub files: Vec<FileSearchResult>,
    pub last_error: Option<String>,
}

impl SearchState {
    pub fn begin_search(&mut self, pattern: &str) -> bool {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return false;
        }

        self.pattern = pattern.to_string();
        self.searching = true;
        self.active_search_id = None;
        self.files_searched = 0;
        self.files_with_matches = 0;
        self.total_matches = 0;
        self.files.clear();
        self.last_error = None;

        true
    }

    pub fn set_active_search_id(&mut self, search_id: u64) -> bool {
        if self.active_search_id == Some(search_id) {
            return false;
        }
        self.active_search_id = Some(search_id);
        true
    }

    pub fn apply_message(&mut self, msg: GlobalSearchMessage) -> bool {
        if self.active_search_id != Some(msg.search_id()) {
            return false;
        }

        match msg {
            GlobalSearchMessage::FileResult { result, .. } => {
                self.total_matches += result.total_matches;
                self.files_with_matches += 1;
                self.files.push(result);
                true
            }
            GlobalSearchMessage::Progress {
                files_searched,
                files_with_matches,
                ..
            } => {
                let changed = self.files_searched != files_searched
                    || self.files_with_matches != files_with_matches;
                self.files_searched = files_searched;
                self.files_with_matches = files_with_matches;
                changed
            }
            GlobalSearchMessage::Complete {
                total_files,
                total_matches,
                ..
            } => {
                let changed = self.searching
                    || self.files_searched != total_files
                    || self.total_matches != total_matches;
                self.searching = false;
                self.files_searched = total_files;
                self.total_matches = total_matches;
                changed
            }
            GlobalSearchMessage::Cancelled { .. } => {
                let changed = self.searching;
                self.searching = false;
                changed
            }
            GlobalSearchMessage::Error { message, .. } => {
                let changed =
                    self.searching || self.last_error.as_deref() != Some(message.as_str());
                self.searching = false;
                self.last_error = Some(message);
                changed
            }
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn results(&self) -> &[FileSearchResult] {
        &self.files
    }

    pub fn into_results(self) -> SearchResultSet {
        self.files
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/search.rs"]
mod tests;
