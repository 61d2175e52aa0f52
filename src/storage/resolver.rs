// 路径解析器
//
// 把相对路径解析为根目录内的绝对路径，防止路径穿越攻击。
// 这是整个服务唯一的安全契约：所有来自调用方的路径
// 在触碰文件系统之前都必须经过这里。

use std::path::{Component, Path, PathBuf};

use super::types::{StoreError, StoreErrorCode};

/// 路径解析器
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// 规范化后的根目录（服务生命周期内不变）
    root: PathBuf,
}

impl PathResolver {
    /// 创建新的路径解析器
    ///
    /// 根目录不存在时自动创建
    pub fn new(root: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root).map_err(|e| {
            StoreError::new(StoreErrorCode::WriteFailed)
                .with_path(root.to_string_lossy().to_string())
                .with_message(format!("创建根目录失败: {}", e))
        })?;

        let root = dunce::canonicalize(root).map_err(|e| {
            StoreError::new(StoreErrorCode::ReadFailed)
                .with_path(root.to_string_lossy().to_string())
                .with_message(format!("规范化根目录失败: {}", e))
        })?;

        Ok(Self { root })
    }

    /// 规范化后的根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 将相对路径解析为根目录内的绝对路径
    ///
    /// 目标可以尚不存在（上传目标目录会在之后创建）。
    /// 已存在的路径按真实路径复核，防止经符号链接逃出根目录。
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StoreError> {
        if contains_traversal(relative) {
            return Err(StoreError::new(StoreErrorCode::TraversalDetected).with_path(relative));
        }

        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                // 绝对路径注入：不做静默纠正，直接拒绝
                Component::RootDir | Component::Prefix(_) => {
                    return Err(StoreError::new(StoreErrorCode::Forbidden).with_path(relative));
                }
                Component::ParentDir => {
                    return Err(
                        StoreError::new(StoreErrorCode::TraversalDetected).with_path(relative)
                    );
                }
            }
        }

        if resolved.exists() {
            let canonical = dunce::canonicalize(&resolved).map_err(|e| {
                StoreError::new(StoreErrorCode::ReadFailed)
                    .with_path(relative)
                    .with_message(format!("规范化路径失败: {}", e))
            })?;
            if !canonical.starts_with(&self.root) {
                return Err(StoreError::new(StoreErrorCode::Forbidden).with_path(relative));
            }
            return Ok(canonical);
        }

        Ok(resolved)
    }

    /// 将根目录内的绝对路径转回相对路径（正斜杠分隔）
    ///
    /// 根目录自身返回空字符串
    pub fn to_relative(&self, absolute: &Path) -> String {
        let stripped = match absolute.strip_prefix(&self.root) {
            Ok(p) => p,
            Err(_) => return absolute.to_string_lossy().to_string(),
        };

        stripped
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// 检查路径是否包含穿越序列
fn contains_traversal(path: &str) -> bool {
    let patterns = [
        "..",
        "%2e%2e",     // URL 编码
        "%252e%252e", // 双重 URL 编码
    ];

    let path_lower = path.to_lowercase();
    patterns.iter().any(|p| path_lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_resolver() -> (TempDir, PathResolver) {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        (dir, resolver)
    }

    #[test]
    fn test_traversal_detection() {
        assert!(contains_traversal("../etc/passwd"));
        assert!(contains_traversal("a/../../b"));
        assert!(contains_traversal("%2e%2e/etc"));
        assert!(contains_traversal("%252E%252E/etc"));
        assert!(!contains_traversal("docs/reports"));
    }

    #[test]
    fn test_resolve_normal_path() {
        let (_dir, resolver) = make_resolver();
        let resolved = resolver.resolve("docs/a.txt").unwrap();
        assert!(resolved.starts_with(resolver.root()));
        assert!(resolved.ends_with("docs/a.txt"));
    }

    #[test]
    fn test_resolve_empty_is_root() {
        let (_dir, resolver) = make_resolver();
        let resolved = resolver.resolve("").unwrap();
        assert_eq!(resolved, resolver.root());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_dir, resolver) = make_resolver();
        let err = resolver.resolve("../outside").unwrap_err();
        assert_eq!(err.code, StoreErrorCode::TraversalDetected);
    }

    #[test]
    fn test_resolve_rejects_absolute_injection() {
        let (_dir, resolver) = make_resolver();
        let err = resolver.resolve("/etc/passwd").unwrap_err();
        assert_eq!(err.code, StoreErrorCode::Forbidden);
    }

    #[test]
    fn test_to_relative_roundtrip() {
        let (_dir, resolver) = make_resolver();
        let resolved = resolver.resolve("a/b/c.txt").unwrap();
        assert_eq!(resolver.to_relative(&resolved), "a/b/c.txt");
        assert_eq!(resolver.to_relative(resolver.root()), "");
    }

    #[test]
    fn test_resolve_rejects_symlink_escape() {
        #[cfg(unix)]
        {
            let outside = TempDir::new().unwrap();
            let (_dir, resolver) = make_resolver();
            let link = resolver.root().join("escape");
            std::os::unix::fs::symlink(outside.path(), &link).unwrap();

            let err = resolver.resolve("escape").unwrap_err();
            assert_eq!(err.code, StoreErrorCode::Forbidden);
        }
    }
}
