// File Station Rust Library
// 浏览器端文件管理服务核心库

// 配置管理模块
pub mod config;

// 日志模块
pub mod logging;

// Web服务器模块
pub mod server;

// 文件存储模块
pub mod storage;

// 导出常用类型
pub use config::AppConfig;
pub use server::AppState;
pub use storage::{
    build_folder_archive, sanitize_filename, DirEntryInfo, FileStoreGateway, FolderArchive,
    ListResult, PathResolver, StoreError, StoreErrorCode,
};
