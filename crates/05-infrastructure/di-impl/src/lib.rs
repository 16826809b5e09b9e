//! # 依赖注入具体实现
//!
//! 提供组件注册表引擎：定义存储、实例缓存、类型匹配和组件创建流程。
//!
//! ## 核心组件
//!
//! - [`ComponentRegistryImpl`] - 组件注册表，负责创建、注入和缓存组件实例
//! - [`DefinitionStoreImpl`] - 按标识和类型名称索引的定义存储
//! - [`InstanceCache`] - 完整实例与半初始化实例缓存
//! - [`TypeMatcherImpl`] - 支持泛型参数的类型匹配
//! - [`DescriptorBuilder`] / [`SlotBuilder`] - 描述符构建器
//! - [`ConstructorFactory`] / [`ProxyFactory`] / [`Intercepted`] - 实例工厂与代理
//!
//! 单例在构建期间只对构建它的解析链可见；其他线程的顶层请求会等待
//! 构建完成后再返回，因此不会看到尚未注入依赖的实例。

pub mod cache;
pub mod descriptor;
pub mod factory;
pub mod matcher;
pub mod proxy;
pub mod registry;
pub mod store;

pub use cache::{HalfEntryGuard, InstanceCache};
pub use descriptor::{DescriptorBuilder, SlotBuilder};
pub use factory::{ConstructorFactory, InterceptorDecorator, ProxyFactory};
pub use matcher::{Candidate, TypeMatcherImpl};
pub use proxy::Intercepted;
pub use registry::ComponentRegistryImpl;
pub use store::DefinitionStoreImpl;
