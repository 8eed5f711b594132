use super::document::{FileInfo, LoadedFile};
use super::highlight::{HighlightRule, HighlightedLine, Mark};
use crate::kernel::services::adapters::search::Matcher;
use crate::kernel::services::ports::search::PatternError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindSummary {
    pub term: String,
    pub case_sensitive: bool,
    pub use_regex: bool,
    pub match_count: usize,
}

#[derive(Debug, Clone)]
struct ActiveRule {
    /// 在配置列表中的下标（禁用的规则也占位）
    index: usize,
    matcher: Matcher,
}

/// 单文档查看器：同一时间只持有一个 LoadedFile
///
/// 渲染分两层：查找命中优先，额外规则只填补查找没有覆盖的文本。
/// 规则跨文件保留，查找结果在换文件 / 刷新时清除。
#[derive(Debug, Default)]
pub struct FileViewer {
    file: Option<LoadedFile>,
    lines: Vec<HighlightedLine>,
    last_find: Option<FindSummary>,
    find_matcher: Option<Matcher>,
    rules: Vec<ActiveRule>,
    current_line: Option<usize>,
}

impl FileViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, file: LoadedFile) -> &LoadedFile {
        self.last_find = None;
        self.find_matcher = None;
        self.current_line = None;
        let file = self.file.insert(file);
        self.lines = render_lines(file, None, &self.rules);
        file
    }

    /// 用重新读取的内容替换当前文档（路径不变）。查找高亮被清除，当前行按新行数收敛。
    pub fn refresh(&mut self, content: String) -> bool {
        let Some(path) = self.file.as_ref().map(|f| f.path().to_path_buf()) else {
            return false;
        };
        let current_line = self.current_line;
        self.load(LoadedFile::new(path, content));
        let line_count = self.line_count();
        self.current_line = current_line
            .map(|line| line.min(line_count))
            .filter(|line| *line > 0);
        true
    }

    pub fn reset(&mut self) {
        self.file = None;
        self.lines.clear();
        self.last_find = None;
        self.find_matcher = None;
        self.current_line = None;
    }

    pub fn file(&self) -> Option<&LoadedFile> {
        self.file.as_ref()
    }

    pub fn file_info(&self) -> Option<FileInfo> {
        self.file.as_ref().map(LoadedFile::info)
    }

    pub fn line_count(&self) -> usize {
        self.file.as_ref().map_or(0, LoadedFile::line_count)
    }

    pub fn lines(&self) -> &[HighlightedLine] {
        &self.lines
    }

    pub fn last_find(&self) -> Option<&FindSummary> {
        self.last_find.as_ref()
    }

    pub fn current_line(&self) -> Option<usize> {
        self.current_line
    }

    /// 在当前文档中查找并高亮，返回匹配总数（零宽匹配也计入，但不产生高亮片段）。
    ///
    /// 查找词会先去掉首尾空白；为空时什么都不做。正则无效时返回错误，
    /// 现有渲染保持不变。每次查找前都会先清除上一次的高亮。
    pub fn find(
        &mut self,
        term: &str,
        case_sensitive: bool,
        use_regex: bool,
    ) -> Result<usize, PatternError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(0);
        }
        let matcher = Matcher::compile(term, case_sensitive, use_regex)?;

        self.clear_highlights();
        let Some(file) = self.file.as_ref() else {
            return Ok(0);
        };

        let match_count: usize = file.lines().map(|line| matcher.count(line)).sum();
        self.lines = render_lines(file, Some(&matcher), &self.rules);
        self.find_matcher = Some(matcher);

        tracing::debug!(term, match_count, "find in file");
        self.last_find = Some(FindSummary {
            term: term.to_string(),
            case_sensitive,
            use_regex,
            match_count,
        });
        Ok(match_count)
    }

    /// 去掉查找高亮。没有配置规则时每行恢复为一个与原文相同的普通片段。
    pub fn clear_highlights(&mut self) {
        self.last_find = None;
        if self.find_matcher.take().is_none() {
            return;
        }
        if let Some(file) = self.file.as_ref() {
            self.lines = render_lines(file, None, &self.rules);
        }
    }

    /// 替换额外高亮规则，返回规则命中的片段数。
    ///
    /// 所有启用的规则先全部编译，任一失败则返回错误且原有规则不变。
    /// 空模式和禁用的规则被跳过，但下标仍按 `rules` 中的位置计算。
    pub fn set_highlight_rules(
        &mut self,
        rules: &[HighlightRule],
        case_sensitive: bool,
    ) -> Result<usize, PatternError> {
        let mut compiled = Vec::new();
        for (index, rule) in rules.iter().enumerate() {
            let pattern = rule.pattern.trim();
            if !rule.enabled || pattern.is_empty() {
                continue;
            }
            let matcher = Matcher::compile(pattern, case_sensitive, rule.use_regex)?;
            compiled.push(ActiveRule { index, matcher });
        }

        self.rules = compiled;
        self.rerender();
        let rule_matches: usize = self.lines.iter().map(HighlightedLine::rule_match_count).sum();
        tracing::debug!(rules = self.rules.len(), rule_matches, "highlight rules applied");
        Ok(rule_matches)
    }

    pub fn clear_highlight_rules(&mut self) {
        if self.rules.is_empty() {
            return;
        }
        self.rules.clear();
        self.rerender();
    }

    pub fn active_rule_count(&self) -> usize {
        self.rules.len()
    }

    /// 只接受 `1..=line_count`，其他值（包括 0 和负数）不做任何事
    pub fn go_to_line(&mut self, line: i64) -> bool {
        let Ok(line) = usize::try_from(line) else {
            return false;
        };
        if line == 0 || line > self.line_count() {
            return false;
        }
        self.current_line = Some(line);
        true
    }

    fn rerender(&mut self) {
        if let Some(file) = self.file.as_ref() {
            self.lines = render_lines(file, self.find_matcher.as_ref(), &self.rules);
        }
    }
}

fn render_lines(
    file: &LoadedFile,
    find: Option<&Matcher>,
    rules: &[ActiveRule],
) -> Vec<HighlightedLine> {
    file.lines()
        .map(|text| {
            let marks = line_marks(text, find, rules);
            HighlightedLine::from_marks(text, &marks)
        })
        .collect()
}

/// 查找命中先占位；每条规则按顺序只接受与已占位区间不重叠的命中
fn line_marks(text: &str, find: Option<&Matcher>, rules: &[ActiveRule]) -> Vec<Mark> {
    let mut marks: Vec<Mark> = find
        .map(|matcher| {
            matcher
                .spans(text)
                .into_iter()
                .map(|range| Mark { range, rule: None })
                .collect()
        })
        .unwrap_or_default();

    for rule in rules {
        for range in rule.matcher.spans(text) {
            let overlaps = marks
                .iter()
                .any(|m| range.start < m.range.end && m.range.start < range.end);
            if !overlaps {
                marks.push(Mark {
                    range,
                    rule: Some(rule.index),
                });
            }
        }
    }

    marks.sort_by_key(|m| m.range.start);
    marks
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/viewer.rs"]
mod tests;
