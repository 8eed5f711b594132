//! zview - 文件查看 / 搜索工具库
//!
//! 模块结构：
//! - kernel::services: ports（契约与类型）+ adapters（文件读取、目录搜索、文件监听、配置）+ host（边界）
//! - kernel::viewer: 单文件查找 / 高亮 / 跳转
//! - kernel::search: 流式搜索结果的聚合状态

pub mod kernel;
