// 文件下载API处理器

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::server::AppState;
use crate::storage::{StoreError, StoreErrorCode};

/// GET /download/*filepath
/// 以附件形式流式返回单个文件
pub async fn download_file(
    State(state): State<AppState>,
    Path(filepath): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    let (path, filename) = state.gateway.resolve_file(&filepath)?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        StoreError::new(StoreErrorCode::ReadFailed)
            .with_path(filepath.clone())
            .with_message(format!("打开文件失败: {}", e))
    })?;

    info!("下载文件: {}", filepath);

    let stream = ReaderStream::new(file);
    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (header::CONTENT_DISPOSITION, attachment_disposition(&filename)),
    ];

    Ok((headers, Body::from_stream(stream)))
}

/// 构造附件下载的 Content-Disposition
///
/// 非 ASCII 文件名按 RFC 5987 以 filename* 编码
pub(crate) fn attachment_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_disposition_ascii() {
        assert_eq!(
            attachment_disposition("a.txt"),
            "attachment; filename=\"a.txt\"; filename*=UTF-8''a.txt"
        );
    }

    #[test]
    fn test_attachment_disposition_unicode() {
        let value = attachment_disposition("报告.pdf");
        assert!(value.starts_with("attachment; filename=\"__.pdf\""));
        assert!(value.contains("filename*=UTF-8''%E6%8A%A5%E5%91%8A.pdf"));
    }
}
