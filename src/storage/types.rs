// 存储模块数据类型定义

use serde::Serialize;

/// 存储错误码
/// 错误码范围：40301 - 50099
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// 路径越出根目录
    Forbidden = 40301,
    /// 路径穿越攻击
    TraversalDetected = 40302,
    /// 路径不存在
    NotFound = 40401,
    /// 不是目录
    NotADirectory = 40402,
    /// 读取失败
    ReadFailed = 50001,
    /// 写入失败
    WriteFailed = 50002,
    /// 压缩失败
    ArchiveFailed = 50003,
}

impl StoreErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Forbidden => "路径不在允许访问的范围内",
            Self::TraversalDetected => "检测到路径穿越攻击",
            Self::NotFound => "路径不存在",
            Self::NotADirectory => "指定路径不是目录",
            Self::ReadFailed => "读取失败",
            Self::WriteFailed => "写入失败",
            Self::ArchiveFailed => "压缩失败",
        }
    }
}

/// 存储错误
#[derive(Debug)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
    pub path: Option<String>,
}

impl StoreError {
    pub fn new(code: StoreErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {}", self.message, path)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for StoreError {}

/// 目录条目
///
/// 每次列目录请求临时生成，不做持久化
#[derive(Debug, Clone, Serialize)]
pub struct DirEntryInfo {
    /// 文件名
    pub name: String,
    /// 相对根目录的路径（正斜杠分隔）
    #[serde(rename = "relativePath")]
    pub relative_path: String,
    /// 是否为目录
    #[serde(rename = "isDirectory")]
    pub is_directory: bool,
    /// 修改时间 (ISO8601)
    #[serde(rename = "modifiedAt")]
    pub modified_at: String,
}

/// 列目录结果
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// 目录条目列表（目录在前，同类按名称升序）
    pub entries: Vec<DirEntryInfo>,
    /// 当前相对路径（根目录为空字符串）
    #[serde(rename = "currentPath")]
    pub current_path: String,
    /// 父目录相对路径（根目录为 None）
    #[serde(rename = "parentPath")]
    pub parent_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_code() {
        assert_eq!(StoreErrorCode::Forbidden.code(), 40301);
        assert_eq!(StoreErrorCode::NotFound.code(), 40401);
        assert_eq!(StoreErrorCode::ArchiveFailed.code(), 50003);
    }

    #[test]
    fn test_store_error() {
        let err = StoreError::new(StoreErrorCode::Forbidden).with_path("../etc/passwd");
        assert_eq!(err.code, StoreErrorCode::Forbidden);
        assert!(err.path.is_some());
        assert!(err.to_string().contains("../etc/passwd"));
    }
}
