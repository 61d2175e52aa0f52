// 文件夹打包下载API处理器

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use futures::Stream;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use crate::server::AppState;
use crate::storage::{build_folder_archive, FolderArchive, StoreError, StoreErrorCode};

use super::download::attachment_disposition;

/// 压缩包响应体
///
/// 持有 FolderArchive，响应体被释放时（发送成功或失败）
/// 临时文件随之删除。字段顺序即析构顺序：先关文件句柄，
/// 再删临时文件
struct ArchiveStream {
    inner: ReaderStream<tokio::fs::File>,
    _archive: FolderArchive,
}

impl Stream for ArchiveStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// GET /download_folder/*folderpath
/// 把整个文件夹打成 ZIP 流式返回，附件名为 <文件夹名>.zip
///
/// 打包产物是每个请求独有的临时文件
pub async fn download_folder(
    State(state): State<AppState>,
    Path(folderpath): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    let gateway = state.gateway.clone();
    let path = folderpath.clone();

    // 打包是同步文件 I/O，放到阻塞线程池执行
    let archive = tokio::task::spawn_blocking(move || build_folder_archive(&gateway, &path))
        .await
        .map_err(|e| {
            error!("打包任务执行失败: {}", e);
            StoreError::new(StoreErrorCode::ArchiveFailed).with_path(folderpath.clone())
        })??;

    let file = tokio::fs::File::open(archive.path()).await.map_err(|e| {
        StoreError::new(StoreErrorCode::ArchiveFailed)
            .with_path(folderpath.clone())
            .with_message(format!("打开临时压缩包失败: {}", e))
    })?;

    info!("打包下载: {} -> {}", folderpath, archive.download_name);

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            attachment_disposition(&archive.download_name),
        ),
    ];

    let stream = ArchiveStream {
        inner: ReaderStream::new(file),
        _archive: archive,
    };

    Ok((headers, Body::from_stream(stream)))
}
