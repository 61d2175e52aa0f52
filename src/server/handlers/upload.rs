// 上传API处理器

use axum::{
    extract::{Multipart, State},
    response::Redirect,
};
use tracing::{info, warn};

use crate::server::AppState;
use crate::storage::{StoreError, StoreErrorCode};

use super::encode_path;

/// POST /upload
/// multipart 表单：file 字段 + current_path 字段
///
/// 保存成功后重定向回 current_path 的列表页。
/// 未携带文件或文件名为空时不报错，直接重定向（无操作）
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, StoreError> {
    let mut current_path = String::new();
    let mut file: Option<(String, Vec<u8>)> = None;

    // 字段顺序由浏览器决定，先收齐再落盘
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string());
        match field_name.as_deref() {
            Some("current_path") => {
                current_path = field.text().await.map_err(multipart_error)?;
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                if !name.is_empty() {
                    file = Some((name, data.to_vec()));
                }
            }
            other => {
                warn!("忽略未知表单字段: {:?}", other);
            }
        }
    }

    match file {
        Some((name, data)) => {
            info!("上传: {:?} -> {:?} ({} 字节)", name, current_path, data.len());
            state.gateway.save_upload(&current_path, &name, &data)?;
        }
        None => {
            // 与既有前端行为保持一致：无文件视为无操作
            info!("上传请求未携带文件，按无操作处理");
        }
    }

    Ok(redirect_to_listing(&current_path))
}

/// 重定向回指定目录的列表页
fn redirect_to_listing(current_path: &str) -> Redirect {
    if current_path.is_empty() {
        Redirect::to("/")
    } else {
        Redirect::to(&format!("/browse/{}", encode_path(current_path)))
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> StoreError {
    StoreError::new(StoreErrorCode::WriteFailed).with_message(format!("解析上传表单失败: {}", e))
}
