use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use file_station_rust::{config::AppConfig, logging, server::handlers, AppState};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 先加载配置，失败时使用默认配置
    let config = AppConfig::load_or_default("config/app.toml").await;

    // 初始化日志系统（必须保持 _log_guard 存活）
    let _log_guard = logging::init_logging(&config.log);

    info!("File Station Rust v0.3.2 启动中...");

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // 创建应用状态（根存储目录不存在时自动创建）
    let app_state = AppState::new(config)?;
    info!("应用状态初始化完成");

    // 配置中间件层
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http()) // HTTP 请求日志
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 健康检查响应结构
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
        service: String,
    }

    // 健康检查处理器
    async fn health_check() -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "ok".to_string(),
            service: "file-station-rust".to_string(),
        })
    }

    // 构建完整应用
    let app = Router::new()
        .route("/", get(handlers::browse_root))
        .route("/browse/*subpath", get(handlers::browse_subpath))
        // 上传走内存缓冲，放宽默认 2MB 的请求体上限
        .route(
            "/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(512 * 1024 * 1024)),
        )
        .route("/download/*filepath", get(handlers::download_file))
        .route("/download_folder/*folderpath", get(handlers::download_folder))
        .route("/health", get(health_check))
        .with_state(app_state)
        .layer(middleware);

    // 启动服务器
    info!("服务器启动在: http://{}", addr);
    info!("健康检查: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server = axum::serve(listener, app);

    // 监听关闭信号，支持优雅关闭
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("服务器错误: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("收到 Ctrl+C，开始优雅关闭...");
        }
    }

    info!("应用已安全退出");

    Ok(())
}
