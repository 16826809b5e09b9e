//! # Infrastructure Common
//!
//! 这个 crate 提供了组件注册表的公共数据模型、类型元数据和错误类型。
//!
//! ## 核心组件
//!
//! - [`ComponentDescriptor`] - 组件描述符（不可变）
//! - [`InjectableSlot`] - 组件的依赖注入点
//! - [`InstanceRecord`] - 组件实例记录
//! - [`TypeInfo`] / [`GenericArg`] - 类型与泛型元数据
//! - [`DependencyError`] - 依赖注入错误分类
//! - [`EntryState`] - 组件条目的生命周期状态
//!
//! ## 设计原则
//!
//! - 引擎只依赖描述符数据模型，不依赖任何元数据注解机制
//! - 描述符在注册后不可变
//! - 错误类型区分"未注册"、"多个匹配"、"循环依赖"和"其他构建失败"

pub mod component;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
