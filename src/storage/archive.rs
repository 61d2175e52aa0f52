// 文件夹打包
//
// 把整个子树打成临时 ZIP。临时文件由 TempPath 持有，
// 离开作用域即删除，下载失败也不会在磁盘上留垃圾

use std::fs::File;
use std::io;
use std::path::Path;

use tempfile::{NamedTempFile, TempPath};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::gateway::FileStoreGateway;
use super::types::{StoreError, StoreErrorCode};

/// 临时文件夹压缩包
///
/// 持有期间临时文件存在，Drop 时删除
#[derive(Debug)]
pub struct FolderArchive {
    temp: TempPath,
    /// 下载文件名：<文件夹名>.zip
    pub download_name: String,
}

impl FolderArchive {
    /// 临时压缩包所在路径
    pub fn path(&self) -> &Path {
        &self.temp
    }
}

/// 将根目录内的文件夹打成临时 ZIP（deflate 压缩）
///
/// 子树内每个普通文件都会加入压缩包，条目名为
/// 该文件相对被打包文件夹的路径（正斜杠分隔），
/// 保留子目录结构
pub fn build_folder_archive(
    gateway: &FileStoreGateway,
    folderpath: &str,
) -> Result<FolderArchive, StoreError> {
    let folder = gateway.resolver().resolve(folderpath)?;

    if !folder.exists() || !folder.is_dir() {
        return Err(StoreError::new(StoreErrorCode::NotFound).with_path(folderpath));
    }

    let folder_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());

    // 每个请求各自的唯一临时文件，并发打包互不冲突
    let temp = NamedTempFile::new().map_err(|e| {
        StoreError::new(StoreErrorCode::ArchiveFailed)
            .with_path(folderpath)
            .with_message(format!("创建临时文件失败: {}", e))
    })?;

    write_zip(&folder, temp.as_file()).map_err(|e| {
        StoreError::new(StoreErrorCode::ArchiveFailed)
            .with_path(folderpath)
            .with_message(format!("打包失败: {}", e))
    })?;

    tracing::info!("文件夹已打包: {} -> {:?}", folderpath, temp.path());

    Ok(FolderArchive {
        temp: temp.into_temp_path(),
        download_name: format!("{}.zip", folder_name),
    })
}

/// 递归写入 ZIP 条目
fn write_zip(folder: &Path, dest: &File) -> anyhow::Result<()> {
    let mut writer = ZipWriter::new(dest);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(folder) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let entry_name = entry
            .path()
            .strip_prefix(folder)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        writer.start_file(entry_name, options)?;
        let mut src = File::open(entry.path())?;
        io::copy(&mut src, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn make_gateway() -> (TempDir, FileStoreGateway) {
        let dir = TempDir::new().unwrap();
        let gateway = FileStoreGateway::new(dir.path()).unwrap();
        (dir, gateway)
    }

    #[test]
    fn test_archive_preserves_subtree() {
        let (_dir, gateway) = make_gateway();
        std::fs::create_dir_all(gateway.root().join("photos/sub")).unwrap();
        std::fs::write(gateway.root().join("photos/top.txt"), b"top").unwrap();
        std::fs::write(gateway.root().join("photos/sub/inner.txt"), b"inner content").unwrap();

        let archive = build_folder_archive(&gateway, "photos").unwrap();
        assert_eq!(archive.download_name, "photos.zip");

        let file = File::open(archive.path()).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();

        let mut content = String::new();
        zip.by_name("sub/inner.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "inner content");

        content.clear();
        zip.by_name("top.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "top");
    }

    #[test]
    fn test_archive_uses_deflate() {
        let (_dir, gateway) = make_gateway();
        std::fs::create_dir(gateway.root().join("f")).unwrap();
        std::fs::write(gateway.root().join("f/a.txt"), vec![b'x'; 4096]).unwrap();

        let archive = build_folder_archive(&gateway, "f").unwrap();
        let file = File::open(archive.path()).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let entry = zip.by_name("a.txt").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        assert!(entry.compressed_size() < entry.size());
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let (_dir, gateway) = make_gateway();
        std::fs::create_dir(gateway.root().join("f")).unwrap();
        std::fs::write(gateway.root().join("f/a.txt"), b"data").unwrap();

        let temp_path: PathBuf;
        {
            let archive = build_folder_archive(&gateway, "f").unwrap();
            temp_path = archive.path().to_path_buf();
            assert!(temp_path.exists());
        }
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_archive_missing_folder_is_not_found() {
        let (_dir, gateway) = make_gateway();
        let err = build_folder_archive(&gateway, "nope").unwrap_err();
        assert_eq!(err.code, StoreErrorCode::NotFound);
    }

    #[test]
    fn test_archive_file_is_not_found() {
        let (_dir, gateway) = make_gateway();
        std::fs::write(gateway.root().join("a.txt"), b"x").unwrap();
        let err = build_folder_archive(&gateway, "a.txt").unwrap_err();
        assert_eq!(err.code, StoreErrorCode::NotFound);
    }
}
