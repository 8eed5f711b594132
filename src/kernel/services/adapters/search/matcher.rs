//! 模式编译
//!
//! - 区分大小写的字面量：memchr::memmem 快速路径
//! - 其他情况：字面量先 escape，再交给 regex（大小写由引擎标志控制，不改写文本）

use crate::kernel::services::ports::search::PatternError;
use memchr::memmem::Finder;
use std::ops::Range;

/// 编译后的匹配器。不携带任何匹配位置状态，可在整文件与逐行两次扫描间复用。
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal {
        needle: Vec<u8>,
        finder: Finder<'static>,
    },
    Regex {
        regex: regex::Regex,
    },
}

impl Matcher {
    pub fn compile(
        pattern: &str,
        case_sensitive: bool,
        use_regex: bool,
    ) -> Result<Self, PatternError> {
        if !use_regex && case_sensitive {
            return Ok(Self::literal(pattern));
        }

        let source = if use_regex {
            pattern.to_string()
        } else {
            regex::escape(pattern)
        };
        let regex = regex::RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()?;
        Ok(Self::Regex { regex })
    }

    fn literal(pattern: &str) -> Self {
        let needle = pattern.as_bytes().to_vec();
        let finder = Finder::new(&needle).into_owned();
        Self::Literal { needle, finder }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex { .. })
    }

    /// 非重叠匹配的数量。零宽匹配（`^`、`\b`、`a*` 的空位置）同样计数
    pub fn count(&self, text: &str) -> usize {
        match self {
            Self::Literal { needle, finder } => {
                if needle.is_empty() {
                    return 0;
                }
                finder.find_iter(text.as_bytes()).count()
            }
            Self::Regex { regex } => regex.find_iter(text).count(),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Literal { needle, finder } => {
                !needle.is_empty() && finder.find(text.as_bytes()).is_some()
            }
            Self::Regex { regex } => regex.is_match(text),
        }
    }

    /// 可高亮的字节区间，按出现顺序。零宽匹配没有可显示的文本，这里不产出
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        match self {
            Self::Literal { needle, finder } => {
                if needle.is_empty() {
                    return Vec::new();
                }
                let len = needle.len();
                finder
                    .find_iter(text.as_bytes())
                    .map(|start| start..start + len)
                    .collect()
            }
            Self::Regex { regex } => regex
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/matcher.rs"]
mod tests;
