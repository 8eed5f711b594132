//! 单文件查看器
//!
//! - LoadedFile: 当前打开的唯一文档（刷新时整体替换）
//! - FileViewer: 查找 / 高亮 / 跳转行，只操作内存中的内容
//! - HighlightedLine: 每行的渲染模型（普通片段 + 查找高亮 + 规则高亮）

mod document;
mod highlight;
mod state;

pub use document::{format_file_size, FileInfo, LoadedFile};
pub use highlight::{escape_html, HighlightRule, HighlightedLine, Mark, Segment};
pub use state::{FileViewer, FindSummary};
