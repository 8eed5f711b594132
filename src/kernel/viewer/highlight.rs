use serde::{Deserialize, Serialize};
use std::ops::Range;

const HIGHLIGHT_OPEN: &str = "<span class=\"highlight\">";
const HIGHLIGHT_CLOSE: &str = "</span>";

/// 额外高亮规则：与查找词无关，打开任何文件时都会生效
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRule {
    pub pattern: String,
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl HighlightRule {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            use_regex: false,
            enabled: true,
        }
    }

    pub fn use_regex(mut self, use_regex: bool) -> Self {
        self.use_regex = use_regex;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// 一段高亮区间。`rule` 为 None 表示查找命中，否则是规则在配置列表中的下标。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub range: Range<usize>,
    pub rule: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub highlighted: bool,
    pub rule: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightedLine {
    segments: Vec<Segment>,
}

impl HighlightedLine {
    pub fn plain(text: &str) -> Self {
        Self {
            segments: vec![Segment::plain(text)],
        }
    }

    /// `marks` 必须有序、互不重叠、非空，且落在字符边界上（Matcher::spans 保证这一点）
    pub fn from_marks(text: &str, marks: &[Mark]) -> Self {
        if marks.is_empty() {
            return Self::plain(text);
        }

        let mut segments = Vec::with_capacity(marks.len() * 2 + 1);
        let mut cursor = 0usize;
        for mark in marks {
            if mark.range.start > cursor {
                segments.push(Segment::plain(&text[cursor..mark.range.start]));
            }
            segments.push(Segment {
                text: text[mark.range.clone()].to_string(),
                highlighted: true,
                rule: mark.rule,
            });
            cursor = mark.range.end;
        }
        if cursor < text.len() {
            segments.push(Segment::plain(&text[cursor..]));
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// 只统计查找命中，规则高亮不算
    pub fn match_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.highlighted && s.rule.is_none())
            .count()
    }

    pub fn rule_match_count(&self) -> usize {
        self.segments.iter().filter(|s| s.rule.is_some()).count()
    }

    pub fn is_highlighted(&self) -> bool {
        self.segments.iter().any(|s| s.highlighted)
    }

    pub fn render_with(&self, open: &str, close: &str, escape: impl Fn(&str) -> String) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if segment.highlighted {
                out.push_str(open);
                out.push_str(&escape(&segment.text));
                out.push_str(close);
            } else {
                out.push_str(&escape(&segment.text));
            }
        }
        out
    }

    /// 查找命中用 `highlight`，规则命中额外带 `rule-<下标>`，便于前端按规则着色
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            let text = escape_html(&segment.text);
            match (segment.highlighted, segment.rule) {
                (false, _) => out.push_str(&text),
                (true, None) => {
                    out.push_str(HIGHLIGHT_OPEN);
                    out.push_str(&text);
                    out.push_str(HIGHLIGHT_CLOSE);
                }
                (true, Some(rule)) => {
                    out.push_str(&format!("<span class=\"highlight rule-{rule}\">"));
                    out.push_str(&text);
                    out.push_str(HIGHLIGHT_CLOSE);
                }
            }
        }
        out
    }
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: false,
            rule: None,
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
