//! 文件服务模块
//!
//! 提供文件读取抽象（本地文件系统实现 + 打开文件的服务封装）

pub mod local;
pub mod service;

pub use local::LocalFileProvider;
pub use service::FileService;
