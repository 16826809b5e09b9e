//! # 基础设施组合层
//!
//! 这个 crate 负责把组件注册表引擎与配置、日志组合成一个可运行的宿主。
//!
//! ## 主要功能
//!
//! - **注册表构建器**: 从配置文件和环境变量加载配置，登记组件定义与实例
//! - **日志初始化**: 根据配置安装 `tracing` 订阅器
//! - **生命周期管理**: 启动时预先创建单例，停止时清空注册表
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_abstractions::ComponentRegistryExt;
//! use di_impl::DescriptorBuilder;
//! use infrastructure_composition::{LoggingConfig, RegistryBuilder};
//!
//! struct Clock;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = RegistryBuilder::new()
//!         .with_config_file("config/registry.toml")?
//!         .with_env_prefix("REGISTRY")
//!         .with_logging(LoggingConfig::development())
//!         .register(DescriptorBuilder::new(|| Clock).id("clock").build()?)
//!         .build()?;
//!
//!     host.start().await?;
//!     let _clock = host.registry().get_as::<Clock>("clock")?;
//!     host.stop().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod host;

#[cfg(test)]
mod tests;

// 重新导出主要类型
pub use builder::{HostSettings, LoggingConfig, RegistryBuilder};
pub use host::{HostMetrics, HostStatus, RegistryHost};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
