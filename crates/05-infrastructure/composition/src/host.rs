//! 组件注册表宿主
//!
//! 管理注册表的启动（预先创建单例）和停止（清空注册表）。

use crate::builder::{HostSettings, RegistryBuilder};
use di_abstractions::{ComponentRegistry, RegistryStats};
use di_impl::ComponentRegistryImpl;
use infrastructure_common::{InfrastructureError, InfrastructureResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// 组件注册表宿主
pub struct RegistryHost {
    /// 组件注册表
    registry: Arc<ComponentRegistryImpl>,
    /// 加载后的配置
    settings: HostSettings,
    /// 运行状态
    status: Arc<RwLock<HostStatus>>,
    /// 统计信息
    metrics: Arc<RwLock<HostMetrics>>,
}

impl RegistryHost {
    /// 创建注册表构建器
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn new(registry: Arc<ComponentRegistryImpl>, settings: HostSettings) -> Self {
        Self {
            registry,
            settings,
            status: Arc::new(RwLock::new(HostStatus::Initialized)),
            metrics: Arc::new(RwLock::new(HostMetrics::default())),
        }
    }

    /// 启动宿主
    ///
    /// 配置要求时在阻塞线程池中预先创建所有非延迟单例。
    pub async fn start(&self) -> InfrastructureResult<()> {
        info!("启动组件注册表");

        {
            let mut status = self.status.write().await;
            if *status == HostStatus::Running {
                warn!("组件注册表已在运行");
                return Ok(());
            }
            *status = HostStatus::Starting;
        }

        {
            let mut metrics = self.metrics.write().await;
            metrics.start_time = Some(chrono::Utc::now());
            metrics.stop_time = None;
        }

        if self.settings.registry.preinstantiate_singletons {
            let registry = Arc::clone(&self.registry);
            let outcome = tokio::task::spawn_blocking(move || registry.preinstantiate_singletons()).await;

            let created = match outcome {
                Ok(Ok(created)) => created,
                Ok(Err(e)) => {
                    error!("预先创建单例组件失败: {}", e);
                    *self.status.write().await = HostStatus::Failed;
                    return Err(e.into());
                }
                Err(e) => {
                    error!("预先创建单例组件的任务异常退出: {}", e);
                    *self.status.write().await = HostStatus::Failed;
                    return Err(InfrastructureError::BootstrapFailed {
                        message: format!("预先创建单例组件的任务异常退出: {}", e),
                    });
                }
            };
            self.metrics.write().await.preinstantiated = created;
        }

        *self.status.write().await = HostStatus::Running;
        info!("组件注册表启动完成");
        Ok(())
    }

    /// 停止宿主并清空注册表
    pub async fn stop(&self) -> InfrastructureResult<()> {
        info!("停止组件注册表");
        *self.status.write().await = HostStatus::Stopping;

        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || registry.reset())
            .await
            .map_err(|e| InfrastructureError::ShutdownFailed {
                message: format!("清空组件注册表失败: {}", e),
            })?;

        {
            *self.status.write().await = HostStatus::Stopped;
            let mut metrics = self.metrics.write().await;
            metrics.stop_time = Some(chrono::Utc::now());
        }

        info!("组件注册表停止完成");
        Ok(())
    }

    /// 组件注册表
    pub fn registry(&self) -> &Arc<ComponentRegistryImpl> {
        &self.registry
    }

    /// 加载后的配置
    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    /// 运行状态
    pub async fn status(&self) -> HostStatus {
        *self.status.read().await
    }

    /// 统计信息，包含注册表当前的统计
    pub async fn metrics(&self) -> HostMetrics {
        let mut metrics = self.metrics.read().await.clone();
        metrics.registry = self.registry.stats();
        metrics
    }
}

/// 宿主运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostStatus {
    /// 已初始化
    Initialized,
    /// 启动中
    Starting,
    /// 运行中
    Running,
    /// 停止中
    Stopping,
    /// 已停止
    Stopped,
    /// 失败
    Failed,
}

/// 宿主统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostMetrics {
    /// 启动时间
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    /// 停止时间
    pub stop_time: Option<chrono::DateTime<chrono::Utc>>,
    /// 启动时预先创建的单例数量
    pub preinstantiated: usize,
    /// 注册表统计
    pub registry: RegistryStats,
}

impl HostMetrics {
    /// 计算运行时间
    pub fn uptime(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.stop_time) {
            (Some(start), Some(stop)) => Some(stop - start),
            (Some(start), None) => Some(chrono::Utc::now() - start),
            _ => None,
        }
    }
}
