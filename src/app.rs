//! 应用生命周期：初始化网关、绑定端口、提供服务

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::api;
use crate::config::Config;
use crate::orchestrator::GradingGateway;
use crate::utils::logging::log_startup;

/// 应用主结构
pub struct App {
    listener: TcpListener,
    gateway: Arc<GradingGateway>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let listener = TcpListener::bind(&config.bind_address)
            .await
            .with_context(|| format!("无法监听 {}", config.bind_address))?;

        let gateway = Arc::new(GradingGateway::new(config)?);

        Ok(Self { listener, gateway })
    }

    /// 实际监听的地址（绑定 `:0` 时可用来取得端口）
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// 运行 HTTP 服务，直到进程退出
    pub async fn run(self) -> Result<()> {
        info!("✓ 评分网关已就绪: {}", self.local_addr()?);
        axum::serve(self.listener, api::router(self.gateway))
            .await
            .context("HTTP 服务异常退出")?;
        Ok(())
    }
}
