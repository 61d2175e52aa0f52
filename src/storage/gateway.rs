// 文件存储网关
//
// 提供目录列表、文件上传、文件下载定位等核心功能，
// 所有路径先经 PathResolver 校验

use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use super::resolver::PathResolver;
use super::types::*;

/// 文件存储网关
pub struct FileStoreGateway {
    resolver: PathResolver,
}

impl FileStoreGateway {
    /// 创建新的存储网关
    ///
    /// 根目录不存在时自动创建
    pub fn new(root: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            resolver: PathResolver::new(root)?,
        })
    }

    /// 路径解析器
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// 根目录
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// 列出目录内容（仅直接子项，不递归）
    ///
    /// 排序固定：目录在前，同类按名称升序
    pub fn list_directory(&self, subpath: &str) -> Result<ListResult, StoreError> {
        let path = self.resolver.resolve(subpath)?;

        if !path.exists() {
            return Err(StoreError::new(StoreErrorCode::NotFound).with_path(subpath));
        }
        if !path.is_dir() {
            return Err(StoreError::new(StoreErrorCode::NotADirectory).with_path(subpath));
        }

        let read_dir = fs::read_dir(&path).map_err(|e| {
            tracing::error!("读取目录失败: {:?}, 错误: {}", path, e);
            StoreError::new(StoreErrorCode::ReadFailed)
                .with_path(subpath)
                .with_message(format!("读取目录失败: {}", e))
        })?;

        let mut entries: Vec<DirEntryInfo> = read_dir
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| self.to_entry_info(&entry).ok())
            .collect();

        // 目录在前，同类按名称升序
        entries.sort_by(|a, b| match (a.is_directory, b.is_directory) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.cmp(&b.name),
        });

        let current_path = self.resolver.to_relative(&path);
        let parent_path = if current_path.is_empty() {
            None
        } else {
            Some(match current_path.rfind('/') {
                Some(idx) => current_path[..idx].to_string(),
                None => String::new(),
            })
        };

        Ok(ListResult {
            entries,
            current_path,
            parent_path,
        })
    }

    /// 保存上传文件
    ///
    /// 目标目录（含缺失的祖先目录）不存在时自动创建，
    /// 同名文件直接覆盖。文件名清洗后为空时返回 None，
    /// 按无操作处理。
    pub fn save_upload(
        &self,
        target_dir: &str,
        original_name: &str,
        data: &[u8],
    ) -> Result<Option<PathBuf>, StoreError> {
        let filename = match sanitize_filename(original_name) {
            Some(name) => name,
            None => {
                tracing::warn!("文件名清洗后为空，忽略上传: {:?}", original_name);
                return Ok(None);
            }
        };

        let dir = self.resolver.resolve(target_dir)?;
        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::new(StoreErrorCode::WriteFailed)
                .with_path(target_dir)
                .with_message(format!("创建目标目录失败: {}", e))
        })?;

        let dest = dir.join(&filename);
        fs::write(&dest, data).map_err(|e| {
            StoreError::new(StoreErrorCode::WriteFailed)
                .with_path(self.resolver.to_relative(&dest))
                .with_message(format!("写入文件失败: {}", e))
        })?;

        tracing::info!(
            "文件已保存: {} ({} 字节)",
            self.resolver.to_relative(&dest),
            data.len()
        );
        Ok(Some(dest))
    }

    /// 定位待下载的文件
    ///
    /// 拆分为所在目录和文件名，目录经解析器校验。
    /// 返回 (绝对路径, 文件名)
    pub fn resolve_file(&self, filepath: &str) -> Result<(PathBuf, String), StoreError> {
        let (dir_part, name_part) = match filepath.rfind('/') {
            Some(idx) => (&filepath[..idx], &filepath[idx + 1..]),
            None => ("", filepath),
        };

        if name_part.is_empty() {
            return Err(StoreError::new(StoreErrorCode::NotFound).with_path(filepath));
        }
        if name_part.contains("..") {
            return Err(StoreError::new(StoreErrorCode::TraversalDetected).with_path(filepath));
        }

        let dir = self.resolver.resolve(dir_part)?;
        let path = dir.join(name_part);

        if !path.is_file() {
            return Err(StoreError::new(StoreErrorCode::NotFound).with_path(filepath));
        }

        // 按真实路径复核，防止经符号链接文件逃出根目录
        let canonical = dunce::canonicalize(&path).map_err(|e| {
            StoreError::new(StoreErrorCode::ReadFailed)
                .with_path(filepath)
                .with_message(format!("规范化路径失败: {}", e))
        })?;
        if !canonical.starts_with(self.resolver.root()) {
            return Err(StoreError::new(StoreErrorCode::Forbidden).with_path(filepath));
        }

        Ok((canonical, name_part.to_string()))
    }

    /// 将 DirEntry 转换为 DirEntryInfo
    fn to_entry_info(&self, entry: &DirEntry) -> Result<DirEntryInfo, StoreError> {
        let path = entry.path();
        let metadata = entry.metadata().map_err(|_| {
            StoreError::new(StoreErrorCode::ReadFailed)
                .with_path(path.to_string_lossy().to_string())
        })?;

        let modified_at = metadata
            .modified()
            .ok()
            .map(system_time_to_iso8601)
            .unwrap_or_default();

        Ok(DirEntryInfo {
            name: entry.file_name().to_string_lossy().to_string(),
            relative_path: self.resolver.to_relative(&path),
            is_directory: metadata.is_dir(),
            modified_at,
        })
    }
}

/// 清洗上传文件名
///
/// 只保留最后一个路径分段，剔除目录分隔符和不安全字符，
/// 去掉会逃出目标目录的前导点。清洗后为空或命中
/// Windows 保留名时返回 None。
pub fn sanitize_filename(name: &str) -> Option<String> {
    // 只取最后一个路径分段，丢弃调用方传入的目录部分
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '(' | ')' | '[' | ']') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // 先去前导点/下划线再去尾部下划线，避免去掉下划线后又露出前导点
    let cleaned = cleaned.trim_start_matches(['.', '_']).trim_end_matches('_');
    if cleaned.is_empty() {
        return None;
    }

    // Windows 保留名
    let stem = cleaned.split('.').next().unwrap_or(cleaned).to_uppercase();
    let reserved = matches!(
        stem.as_str(),
        "CON" | "PRN" | "AUX" | "NUL"
            | "COM1" | "COM2" | "COM3" | "COM4" | "COM5" | "COM6" | "COM7" | "COM8" | "COM9"
            | "LPT1" | "LPT2" | "LPT3" | "LPT4" | "LPT5" | "LPT6" | "LPT7" | "LPT8" | "LPT9"
    );
    if reserved {
        return None;
    }

    Some(cleaned.to_string())
}

/// 将 SystemTime 转换为 ISO8601 字符串
fn system_time_to_iso8601(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
