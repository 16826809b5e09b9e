//! 注册表配置与统计信息

use crate::resolver::ResolveOptions;
use serde::{Deserialize, Serialize};

/// 注册表配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 启动时是否预先创建非延迟单例
    pub preinstantiate_singletons: bool,
    /// 是否允许覆盖已存在的定义
    pub allow_definition_overriding: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            preinstantiate_singletons: true,
            allow_definition_overriding: false,
            max_resolution_depth: 100,
        }
    }
}

impl RegistryConfig {
    /// 每次顶层解析使用的选项
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            max_depth: self.max_resolution_depth,
        }
    }
}

/// 注册表统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// 已登记的定义数量
    pub definitions: usize,
    /// 已发布的实例数量
    pub published_singletons: usize,
    /// 半初始化条目数量
    pub half_initialized: usize,
    /// 成功创建的实例总数
    pub creations: u64,
    /// 构建失败次数
    pub failures: u64,
}
