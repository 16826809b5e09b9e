//! 组件注册表构建器
//!
//! 负责加载配置、初始化日志并登记组件定义与实例。

use crate::host::RegistryHost;
use di_abstractions::{ComponentRegistry, RegistryConfig};
use di_impl::ComponentRegistryImpl;
use infrastructure_common::{
    ComponentDescriptor, ConfigError, InfrastructureError, InfrastructureResult, InstanceRecord,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 宿主配置
///
/// ```toml
/// [registry]
/// preinstantiate_singletons = true
/// max_resolution_depth = 64
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// 注册表配置
    pub registry: RegistryConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 组件注册表构建器
pub struct RegistryBuilder {
    config_file: Option<PathBuf>,
    env_prefix: Option<String>,
    registry_config: Option<RegistryConfig>,
    logging_enabled: bool,
    logging_config: Option<LoggingConfig>,
    definitions: Vec<ComponentDescriptor>,
    instances: Vec<InstanceRecord>,
}

impl RegistryBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config_file: None,
            env_prefix: None,
            registry_config: None,
            logging_enabled: false, // 默认不初始化日志，避免测试中重复初始化
            logging_config: None,
            definitions: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// 添加配置文件（TOML 或 JSON，按扩展名识别）
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> InfrastructureResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        info!("添加配置文件: {}", path.display());
        self.config_file = Some(path.to_path_buf());
        Ok(self)
    }

    /// 添加环境变量配置源
    ///
    /// 变量名形如 `<PREFIX>_REGISTRY__MAX_RESOLUTION_DEPTH`。
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.env_prefix = Some(prefix);
        self
    }

    /// 直接指定注册表配置，覆盖配置文件和环境变量中的值
    pub fn with_registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = Some(config);
        self
    }

    /// 使用指定配置初始化日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self.logging_enabled = true;
        self
    }

    /// 使用配置源中的 `logging` 段初始化日志
    pub fn with_configured_logging(mut self) -> Self {
        self.logging_enabled = true;
        self
    }

    /// 登记组件定义
    pub fn register(mut self, descriptor: ComponentDescriptor) -> Self {
        self.definitions.push(descriptor);
        self
    }

    /// 登记组件实例
    pub fn register_instance(mut self, record: InstanceRecord) -> Self {
        self.instances.push(record);
        self
    }

    /// 只加载配置，不构建注册表
    pub fn load_settings(&self) -> InfrastructureResult<HostSettings> {
        let mut builder = config::Config::builder();
        if let Some(path) = &self.config_file {
            builder = builder.add_source(config::File::from(path.as_path()));
        }
        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let mut settings: HostSettings = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(ConfigError::parse_error)?;

        if let Some(registry_config) = &self.registry_config {
            settings.registry = registry_config.clone();
        }
        if let Some(logging_config) = &self.logging_config {
            settings.logging = logging_config.clone();
        }
        if settings.registry.max_resolution_depth == 0 {
            return Err(ConfigError::validation_error("max_resolution_depth 必须大于 0").into());
        }

        debug!(?settings, "配置加载完成");
        Ok(settings)
    }

    /// 构建注册表宿主
    pub fn build(self) -> InfrastructureResult<RegistryHost> {
        info!("开始构建组件注册表");
        let settings = self.load_settings()?;

        // 只有在明确要求时才初始化日志
        if self.logging_enabled {
            settings.logging.initialize()?;
        }

        let registry = Arc::new(ComponentRegistryImpl::with_config(settings.registry.clone()));
        for descriptor in self.definitions {
            registry.register_definition(descriptor, false)?;
        }
        for record in self.instances {
            registry.register_instance(record, false)?;
        }

        info!(
            definitions = registry.stats().definitions,
            instances = registry.stats().published_singletons,
            "组件注册表构建完成"
        );
        Ok(RegistryHost::new(registry, settings))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令，如 `info` 或 `di_impl=debug,info`
    pub level: String,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 安装全局日志订阅器
    pub fn initialize(&self) -> InfrastructureResult<()> {
        let filter = EnvFilter::try_new(&self.level).map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志级别无效: {}", e),
        })?;

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        let installed = if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };
        installed.map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
