//! 搜索服务模块
//!
//! - Matcher: 模式编译（字面量 / 正则，大小写标志）
//! - DirectoryWalker: 递归遍历目录
//! - GlobalSearchService: 多文件搜索（同步 + 流式）

mod global;
mod matcher;
mod walker;

pub use global::{search_content, GlobalSearchService, GlobalSearchTask};
pub use matcher::Matcher;
pub use walker::{DirectoryWalker, WalkOptions};
