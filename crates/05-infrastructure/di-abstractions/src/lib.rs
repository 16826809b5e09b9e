//! # Dependency Injection Abstractions
//! 
//! 依赖注入抽象层，定义组件注册和依赖解析的核心接口。
//! 
//! ## 核心接口
//! 
//! - [`ComponentRegistry`] - 组件注册表接口
//! - [`DefinitionStore`] - 组件定义存储接口
//! - [`TypeMatcher`] - 按类型解析时的兼容性判断
//! - [`ResolveContext`] - 单次解析调用的依赖链
//! - [`ComponentDecorator`] / [`MethodInterceptor`] - 代理组件的装饰与拦截

pub mod registry;
pub mod resolver;
pub mod factory;
pub mod container;

pub use registry::*;
pub use resolver::*;
pub use factory::*;
pub use container::*;
