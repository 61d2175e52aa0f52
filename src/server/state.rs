// 应用状态

use crate::config::AppConfig;
use crate::storage::FileStoreGateway;
use std::sync::Arc;

/// 应用全局状态
///
/// 请求处理无跨请求共享可变状态，文件系统本身除外
#[derive(Clone)]
pub struct AppState {
    /// 文件存储网关
    pub gateway: Arc<FileStoreGateway>,
    /// 应用配置
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// 创建新的应用状态
    ///
    /// 根存储目录不存在时在这里创建
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let gateway = FileStoreGateway::new(&config.storage.root_dir)
            .map_err(|e| anyhow::anyhow!("初始化存储网关失败: {}", e))?;
        tracing::info!("根存储目录: {:?}", gateway.root());

        Ok(Self {
            gateway: Arc::new(gateway),
            config: Arc::new(config),
        })
    }
}
