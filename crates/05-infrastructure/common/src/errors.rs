//! 错误类型定义

use thiserror::Error;

/// 构建失败时携带的底层错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

impl ConfigError {
    /// 创建配置解析错误
    pub fn parse_error(source: impl Into<BoxError>) -> Self {
        Self::ParseError {
            source: source.into(),
        }
    }

    /// 创建配置验证错误
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

/// 依赖注入错误类型
///
/// 调用方需要能够区分"未注册"、"多个匹配"、"循环依赖"和其他构建失败，
/// 因此这些情况都有各自独立的变体。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件定义已存在: {key}")]
    DefinitionExists { key: String },

    #[error("组件实例已存在: {key}")]
    InstanceExists { key: String },

    #[error("组件未注册: {key}")]
    NotFound { key: String },

    #[error("找到多个匹配的组件: {type_name}, 候选: {}", .candidates.join(", "))]
    AmbiguousComponent {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("循环依赖检测到: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ConstructionFailure { type_name: String, source: BoxError },

    #[error("组件注册表正在重置")]
    RegistryResetting,

    #[error("组件描述符无效: {type_name}, 原因: {message}")]
    InvalidDescriptor { type_name: String, message: String },

    #[error("组件类型不匹配: 期望 {expected}, 位置: {context}")]
    TypeMismatch { expected: String, context: String },

    #[error("依赖解析深度超过限制 {max_depth}: {}", .chain.join(" -> "))]
    ResolutionDepthExceeded { max_depth: usize, chain: Vec<String> },
}

impl DependencyError {
    /// 创建组件未注册错误
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// 创建组件构建失败错误
    pub fn construction_failure(type_name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ConstructionFailure {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 创建描述符无效错误
    pub fn invalid_descriptor(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// 是否为"未注册"错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// 是否为循环依赖错误
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }

    /// 该错误在调用方重试或调整注册后是否可能消失
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::RegistryResetting)
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("基础设施关闭失败: {message}")]
    ShutdownFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
