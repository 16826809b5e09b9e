//! 组件生命周期管理

use std::fmt;

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// 单例模式 - 注册表生命周期内只创建一个实例
    #[default]
    Singleton,
    /// 原型模式 - 每次请求都创建新实例，且不缓存
    Prototype,
}

impl Lifetime {
    /// 是否为单例
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

/// 组件条目状态
///
/// 单例条目的状态流转：
///
/// ```text
/// Unregistered -> Defined -> UnderConstruction -> Published
///                    ^               |
///                    +--- Failed <---+
/// ```
///
/// 构建失败的条目会回到可再次构建的状态，`Failed` 只记录最近一次构建的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// 未注册任何定义或实例
    Unregistered,
    /// 已注册定义，尚未创建实例
    Defined,
    /// 正在构建（半初始化实例已登记）
    UnderConstruction,
    /// 已发布的完整实例
    Published,
    /// 最近一次构建失败
    Failed,
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unregistered => "未注册",
            Self::Defined => "已定义",
            Self::UnderConstruction => "构建中",
            Self::Published => "已发布",
            Self::Failed => "构建失败",
        };
        f.write_str(label)
    }
}
