//! 组件数据模型
//!
//! 描述符、注入点与实例记录。注册表引擎只通过这些数据工作，
//! 不关心描述符是如何产生的。

use crate::errors::{DependencyError, DependencyResult};
use crate::lifecycle::Lifetime;
use crate::metadata::{GenericArg, TypeInfo, TypeKind};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 组件实例
///
/// 所有实例都以共享指针保存，两个记录指向同一分配即视为同一个逻辑条目。
pub type ComponentInstance = Arc<dyn Any + Send + Sync>;

/// 实例工厂 trait
///
/// 负责产生尚未注入依赖的裸实例。
pub trait InstanceFactory: Send + Sync {
    /// 创建裸实例
    fn create(&self) -> DependencyResult<ComponentInstance>;

    /// 工厂产出的实例类型
    fn target_type(&self) -> &TypeInfo;
}

type SetterFn = dyn Fn(&ComponentInstance, ComponentInstance) -> DependencyResult<()> + Send + Sync;

/// 注入点的赋值函数
///
/// 组件实例以共享指针发布，因此赋值函数通过内部可变性写入依赖。
#[derive(Clone)]
pub struct SlotSetter(Arc<SetterFn>);

impl SlotSetter {
    /// 创建赋值函数
    pub fn new<F>(setter: F) -> Self
    where
        F: Fn(&ComponentInstance, ComponentInstance) -> DependencyResult<()> + Send + Sync + 'static,
    {
        Self(Arc::new(setter))
    }

    /// 将依赖写入宿主实例
    pub fn invoke(&self, owner: &ComponentInstance, value: ComponentInstance) -> DependencyResult<()> {
        (self.0)(owner, value)
    }
}

impl fmt::Debug for SlotSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SlotSetter(..)")
    }
}

/// 注入点的显式引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotReference {
    /// 按组件标识引用
    ById(String),
    /// 按类型名称引用
    ByTypeName(String),
}

/// 可注入的依赖点
#[derive(Debug, Clone)]
pub struct InjectableSlot {
    name: String,
    declared_type: TypeInfo,
    generic_args: Vec<GenericArg>,
    setter: Option<SlotSetter>,
    required: bool,
    reference: Option<SlotReference>,
}

impl InjectableSlot {
    /// 创建注入点，默认为必需依赖
    pub fn new(name: impl Into<String>, declared_type: TypeInfo) -> Self {
        Self {
            name: name.into(),
            declared_type,
            generic_args: Vec::new(),
            setter: None,
            required: true,
            reference: None,
        }
    }

    /// 设置赋值函数
    pub fn with_setter(mut self, setter: SlotSetter) -> Self {
        self.setter = Some(setter);
        self
    }

    /// 追加声明类型的泛型参数
    pub fn with_generic_arg(mut self, arg: GenericArg) -> Self {
        self.generic_args.push(arg);
        self
    }

    /// 设置是否为必需依赖
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// 设置显式引用
    pub fn with_reference(mut self, reference: SlotReference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &TypeInfo {
        &self.declared_type
    }

    pub fn generic_args(&self) -> &[GenericArg] {
        &self.generic_args
    }

    pub fn setter(&self) -> Option<&SlotSetter> {
        self.setter.as_ref()
    }

    pub fn reference(&self) -> Option<&SlotReference> {
        self.reference.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    pub fn is_array(&self) -> bool {
        self.declared_type.kind == TypeKind::Array
    }

    /// 是否参与依赖注入：有赋值函数、不是数组、不是基础或常规类型
    pub fn is_injectable(&self) -> bool {
        self.has_setter() && !self.is_array() && self.declared_type.is_injectable()
    }
}

/// 组件描述符
///
/// 注册后不可变，以 `Arc<ComponentDescriptor>` 在定义存储和实例记录之间共享。
pub struct ComponentDescriptor {
    id: Option<String>,
    type_info: TypeInfo,
    description: Option<String>,
    lifetime: Lifetime,
    lazy: bool,
    proxy: bool,
    is_abstract: bool,
    generic_args: Vec<GenericArg>,
    slots: Vec<InjectableSlot>,
    factory: Arc<dyn InstanceFactory>,
}

impl ComponentDescriptor {
    /// 以工厂的产出类型创建描述符
    pub fn new(factory: Arc<dyn InstanceFactory>) -> Self {
        Self {
            id: None,
            type_info: factory.target_type().clone(),
            description: None,
            lifetime: Lifetime::default(),
            lazy: false,
            proxy: false,
            is_abstract: false,
            generic_args: Vec::new(),
            slots: Vec::new(),
            factory,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 覆盖组件类型（例如补充可赋值的父类型）
    pub fn with_type_info(mut self, type_info: TypeInfo) -> Self {
        self.type_info = type_info;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn with_proxy(mut self, proxy: bool) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_generic_arg(mut self, arg: GenericArg) -> Self {
        self.generic_args.push(arg);
        self
    }

    pub fn with_slot(mut self, slot: InjectableSlot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    pub fn type_name(&self) -> &str {
        &self.type_info.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn is_singleton(&self) -> bool {
        self.lifetime.is_singleton()
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn is_proxy(&self) -> bool {
        self.proxy
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn generic_args(&self) -> &[GenericArg] {
        &self.generic_args
    }

    pub fn slots(&self) -> &[InjectableSlot] {
        &self.slots
    }

    pub fn factory(&self) -> &Arc<dyn InstanceFactory> {
        &self.factory
    }

    /// 用于日志和错误信息的键：有标识时用标识，否则用类型名称
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.type_info.name)
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("id", &self.id)
            .field("type_info", &self.type_info)
            .field("lifetime", &self.lifetime)
            .field("lazy", &self.lazy)
            .field("proxy", &self.proxy)
            .field("is_abstract", &self.is_abstract)
            .field("generic_args", &self.generic_args)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

/// 组件实例记录
#[derive(Clone)]
pub struct InstanceRecord {
    /// 实例本身
    pub instance: ComponentInstance,
    /// 产生该实例的描述符，直接注册的实例没有描述符
    pub descriptor: Option<Arc<ComponentDescriptor>>,
    /// 组件标识
    pub id: Option<String>,
    /// 实例类型
    pub type_info: TypeInfo,
    /// 实例类型的泛型参数
    pub generic_args: Vec<GenericArg>,
}

impl InstanceRecord {
    /// 根据描述符创建实例记录
    pub fn from_descriptor(instance: ComponentInstance, descriptor: &Arc<ComponentDescriptor>) -> Self {
        Self {
            instance,
            id: descriptor.id().map(str::to_string),
            type_info: descriptor.type_info().clone(),
            generic_args: descriptor.generic_args().to_vec(),
            descriptor: Some(Arc::clone(descriptor)),
        }
    }

    /// 直接注册的实例
    pub fn raw(instance: ComponentInstance, type_info: TypeInfo) -> Self {
        Self {
            instance,
            descriptor: None,
            id: None,
            type_info,
            generic_args: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_generic_args(mut self, generic_args: Vec<GenericArg>) -> Self {
        self.generic_args = generic_args;
        self
    }

    /// 两个记录是否为同一个逻辑条目
    pub fn same_entry(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }

    /// 该记录是否由指定描述符产生
    pub fn produced_by(&self, descriptor: &Arc<ComponentDescriptor>) -> bool {
        self.descriptor
            .as_ref()
            .is_some_and(|own| Arc::ptr_eq(own, descriptor))
    }

    /// 用于日志和错误信息的键
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.type_info.name)
    }
}

impl fmt::Debug for InstanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRecord")
            .field("id", &self.id)
            .field("type_info", &self.type_info)
            .field("generic_args", &self.generic_args)
            .field("has_descriptor", &self.descriptor.is_some())
            .finish_non_exhaustive()
    }
}

/// 将组件实例向下转换为具体类型
pub fn downcast_instance<T: Any + Send + Sync>(
    instance: ComponentInstance,
    context: &str,
) -> DependencyResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            context: context.to_string(),
        })
}
