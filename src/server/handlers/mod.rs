// API处理器模块

pub mod browse;
pub mod download;
pub mod folder_download;
pub mod upload;

pub use browse::{browse_root, browse_subpath};
pub use download::download_file;
pub use folder_download::download_folder;
pub use upload::upload_file;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::storage::{StoreError, StoreErrorCode};

/// 错误响应
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl IntoResponse for StoreError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            StoreErrorCode::Forbidden => StatusCode::FORBIDDEN,
            StoreErrorCode::TraversalDetected => StatusCode::FORBIDDEN,
            StoreErrorCode::NotFound => StatusCode::NOT_FOUND,
            StoreErrorCode::NotADirectory => StatusCode::BAD_REQUEST,
            StoreErrorCode::ReadFailed => StatusCode::INTERNAL_SERVER_ERROR,
            StoreErrorCode::WriteFailed => StatusCode::INTERNAL_SERVER_ERROR,
            StoreErrorCode::ArchiveFailed => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            code: self.code.code(),
            message: self.message,
            path: self.path,
        });

        (status, body).into_response()
    }
}

/// 把相对路径编码进 URL（分段编码，保留正斜杠）
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_keeps_slashes() {
        assert_eq!(encode_path("a/b c/d.txt"), "a/b%20c/d.txt");
        assert_eq!(encode_path(""), "");
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (StoreErrorCode::Forbidden, StatusCode::FORBIDDEN),
            (StoreErrorCode::TraversalDetected, StatusCode::FORBIDDEN),
            (StoreErrorCode::NotFound, StatusCode::NOT_FOUND),
            (StoreErrorCode::NotADirectory, StatusCode::BAD_REQUEST),
            (StoreErrorCode::ReadFailed, StatusCode::INTERNAL_SERVER_ERROR),
            (StoreErrorCode::ArchiveFailed, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = StoreError::new(code).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
