// 目录浏览处理器
//
// 渲染简单的服务端 HTML 列表页：上传表单、面包屑、条目列表

use axum::{
    extract::{Path, State},
    response::Html,
};
use tracing::debug;

use crate::server::AppState;
use crate::storage::{ListResult, StoreError};

use super::encode_path;

/// GET /
/// 根目录列表
pub async fn browse_root(State(state): State<AppState>) -> Result<Html<String>, StoreError> {
    render_listing(&state, "")
}

/// GET /browse/*subpath
/// 子目录列表
pub async fn browse_subpath(
    State(state): State<AppState>,
    Path(subpath): Path<String>,
) -> Result<Html<String>, StoreError> {
    render_listing(&state, &subpath)
}

fn render_listing(state: &AppState, subpath: &str) -> Result<Html<String>, StoreError> {
    let listing = state.gateway.list_directory(subpath)?;
    debug!("目录列表: {:?} ({} 项)", listing.current_path, listing.entries.len());
    Ok(Html(render_page(&listing)))
}

/// 渲染列表页 HTML
fn render_page(listing: &ListResult) -> String {
    let title = if listing.current_path.is_empty() {
        "文件站".to_string()
    } else {
        format!("文件站 - /{}", escape_html(&listing.current_path))
    };

    let mut rows = String::new();

    if let Some(ref parent) = listing.parent_path {
        let href = if parent.is_empty() {
            "/".to_string()
        } else {
            format!("/browse/{}", encode_path(parent))
        };
        rows.push_str(&format!(
            "<tr><td>📁 <a href=\"{}\">..</a></td><td></td><td></td></tr>\n",
            href
        ));
    }

    for entry in &listing.entries {
        let name = escape_html(&entry.name);
        let encoded = encode_path(&entry.relative_path);
        if entry.is_directory {
            rows.push_str(&format!(
                "<tr><td>📁 <a href=\"/browse/{encoded}\">{name}</a></td>\
                 <td>{modified}</td>\
                 <td><a href=\"/download_folder/{encoded}\">打包下载</a></td></tr>\n",
                modified = entry.modified_at,
            ));
        } else {
            rows.push_str(&format!(
                "<tr><td>📄 {name}</td>\
                 <td>{modified}</td>\
                 <td><a href=\"/download/{encoded}\">下载</a></td></tr>\n",
                modified = entry.modified_at,
            ));
        }
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"zh-CN\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>body{{font-family:sans-serif;margin:2em}}table{{border-collapse:collapse;width:100%}}\
         td,th{{padding:.4em .8em;border-bottom:1px solid #ddd;text-align:left}}</style>\n\
         </head>\n<body>\n<h1>{title}</h1>\n\
         <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\">\n\
         <input type=\"hidden\" name=\"current_path\" value=\"{current}\">\n\
         <button type=\"submit\">上传</button>\n</form>\n\
         <table>\n<tr><th>名称</th><th>修改时间</th><th>操作</th></tr>\n{rows}</table>\n\
         </body>\n</html>\n",
        current = escape_html(&listing.current_path),
    )
}

/// HTML 转义
fn escape_html(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}
