//! 组件注册表抽象接口

use crate::container::RegistryStats;
use infrastructure_common::{
    downcast_instance, ComponentDescriptor, ComponentInstance, DependencyError, DependencyResult,
    EntryState, GenericArg, InstanceRecord,
};
use std::any::Any;
use std::sync::Arc;

/// 描述符在定义存储中的登记方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipKind {
    /// 已按组件标识登记
    ById,
    /// 已按类型名称登记
    ByTypeName,
    /// 未登记
    None,
}

impl MembershipKind {
    pub fn is_member(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// 组件定义存储 trait
///
/// 按组件标识和类型名称两个维度索引描述符。查询永远不会失败，
/// 只有注册冲突会返回错误。
pub trait DefinitionStore: Send + Sync {
    /// 注册描述符
    ///
    /// 有标识时按标识判断冲突，没有标识时按类型名称判断冲突；
    /// `overwrite` 为真时替换已有定义。
    fn register(&self, descriptor: Arc<ComponentDescriptor>, overwrite: bool) -> DependencyResult<()>;

    /// 按组件标识查找
    fn lookup_by_id(&self, id: &str) -> Option<Arc<ComponentDescriptor>>;

    /// 按类型名称查找
    fn lookup_by_type_name(&self, type_name: &str) -> Option<Arc<ComponentDescriptor>>;

    /// 判断描述符的登记方式
    fn membership_kind(&self, descriptor: &ComponentDescriptor) -> MembershipKind;

    /// 描述符是否已登记
    fn contains(&self, descriptor: &ComponentDescriptor) -> bool {
        self.membership_kind(descriptor).is_member()
    }

    /// 所有类型可赋值给请求类型的非抽象描述符
    fn candidates_for(&self, type_name: &str) -> Vec<Arc<ComponentDescriptor>>;

    /// 所有已登记的描述符
    fn descriptors(&self) -> Vec<Arc<ComponentDescriptor>>;

    /// 已登记的描述符数量
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空所有定义
    fn clear(&self);
}

/// 组件注册表 trait
///
/// 提供组件注册和解析的核心接口。所有方法都是同步的，
/// 可以在任意线程上并发调用。
pub trait ComponentRegistry: Send + Sync {
    /// 注册组件定义
    fn register_definition(
        &self,
        descriptor: ComponentDescriptor,
        overwrite: bool,
    ) -> DependencyResult<Arc<ComponentDescriptor>>;

    /// 判断描述符的登记方式
    fn membership_kind(&self, descriptor: &ComponentDescriptor) -> MembershipKind;

    /// 描述符是否已登记
    fn has_definition(&self, descriptor: &ComponentDescriptor) -> bool {
        self.membership_kind(descriptor).is_member()
    }

    /// 直接注册组件实例
    ///
    /// 记录带标识时按标识登记，否则按类型登记；已存在且 `overwrite`
    /// 为假时返回 [`DependencyError::InstanceExists`]。
    fn register_instance(&self, record: InstanceRecord, overwrite: bool) -> DependencyResult<()>;

    /// 按组件标识获取实例
    fn get_by_id(&self, id: &str) -> DependencyResult<ComponentInstance>;

    /// 按类型（及泛型参数）获取实例
    fn get_by_type(
        &self,
        type_name: &str,
        generic_args: &[GenericArg],
    ) -> DependencyResult<ComponentInstance>;

    /// 按类型名称获取实例
    fn get_by_type_name(&self, type_name: &str) -> DependencyResult<ComponentInstance> {
        self.get_by_type(type_name, &[])
    }

    /// 按类型探测实例，没有匹配时返回 `None`
    ///
    /// 多个匹配和构建失败仍然返回错误。
    fn find_by_type(
        &self,
        type_name: &str,
        generic_args: &[GenericArg],
    ) -> DependencyResult<Option<ComponentInstance>>;

    /// 是否存在指定标识的组件（已发布实例或非抽象定义）
    fn has_component(&self, id: &str) -> bool;

    /// 是否存在指定类型的组件
    fn has_component_of_type(&self, type_name: &str) -> bool;

    /// 按组件标识获取描述符
    fn descriptor_by_id(&self, id: &str) -> Option<Arc<ComponentDescriptor>>;

    /// 按类型名称获取描述符
    fn descriptor_by_type_name(&self, type_name: &str) -> Option<Arc<ComponentDescriptor>>;

    /// 指定标识的组件是否为单例
    fn is_singleton(&self, id: &str) -> DependencyResult<bool> {
        self.descriptor_by_id(id)
            .map(|descriptor| descriptor.is_singleton())
            .ok_or_else(|| DependencyError::not_found(id))
    }

    /// 指定标识的组件是否延迟创建
    fn is_lazy(&self, id: &str) -> DependencyResult<bool> {
        self.descriptor_by_id(id)
            .map(|descriptor| descriptor.is_lazy())
            .ok_or_else(|| DependencyError::not_found(id))
    }

    /// 指定标识的组件是否为代理组件
    fn is_proxy(&self, id: &str) -> DependencyResult<bool> {
        self.descriptor_by_id(id)
            .map(|descriptor| descriptor.is_proxy())
            .ok_or_else(|| DependencyError::not_found(id))
    }

    /// 指定类型的组件是否为单例
    fn is_singleton_type(&self, type_name: &str) -> DependencyResult<bool> {
        self.descriptor_by_type_name(type_name)
            .map(|descriptor| descriptor.is_singleton())
            .ok_or_else(|| DependencyError::not_found(type_name))
    }

    /// 指定类型的组件是否延迟创建
    fn is_lazy_type(&self, type_name: &str) -> DependencyResult<bool> {
        self.descriptor_by_type_name(type_name)
            .map(|descriptor| descriptor.is_lazy())
            .ok_or_else(|| DependencyError::not_found(type_name))
    }

    /// 指定类型的组件是否为代理组件
    fn is_proxy_type(&self, type_name: &str) -> DependencyResult<bool> {
        self.descriptor_by_type_name(type_name)
            .map(|descriptor| descriptor.is_proxy())
            .ok_or_else(|| DependencyError::not_found(type_name))
    }

    /// 预先创建所有非延迟的单例组件，返回新创建的数量
    fn preinstantiate_singletons(&self) -> DependencyResult<usize>;

    /// 指定标识的条目状态
    fn entry_state(&self, id: &str) -> EntryState;

    /// 注册表统计信息
    fn stats(&self) -> RegistryStats;

    /// 清空所有定义和实例
    fn reset(&self);
}

/// 带类型转换的便捷方法
pub trait ComponentRegistryExt: ComponentRegistry {
    /// 按组件标识获取并转换为具体类型
    fn get_as<T: Any + Send + Sync>(&self, id: &str) -> DependencyResult<Arc<T>> {
        downcast_instance(self.get_by_id(id)?, id)
    }

    /// 按具体类型获取实例
    fn get_typed<T: Any + Send + Sync>(&self) -> DependencyResult<Arc<T>> {
        self.get_typed_with::<T>(&[])
    }

    /// 按具体类型和泛型参数获取实例
    fn get_typed_with<T: Any + Send + Sync>(
        &self,
        generic_args: &[GenericArg],
    ) -> DependencyResult<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        downcast_instance(self.get_by_type(type_name, generic_args)?, type_name)
    }
}

impl<R: ComponentRegistry + ?Sized> ComponentRegistryExt for R {}
