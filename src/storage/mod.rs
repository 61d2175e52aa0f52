// 文件存储模块
//
// 路径解析 -> 目录列表 / 上传 / 下载 / 打包，
// 所有操作共用同一个路径解析器

pub mod archive;
pub mod gateway;
pub mod resolver;
pub mod types;

pub use archive::{build_folder_archive, FolderArchive};
pub use gateway::{sanitize_filename, FileStoreGateway};
pub use resolver::PathResolver;
pub use types::{DirEntryInfo, ListResult, StoreError, StoreErrorCode};
