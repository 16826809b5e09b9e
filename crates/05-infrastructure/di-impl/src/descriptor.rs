//! 描述符构建器
//!
//! 通过显式的注册调用产生 [`ComponentDescriptor`]，替代从注解中提取元数据。
//!
//! ```ignore
//! let car = DescriptorBuilder::new(Car::default)
//!     .id("car")
//!     .slot(SlotBuilder::inject("engine", |car: &Car, engine: Arc<Engine>| {
//!         car.engine.set(engine).ok();
//!     }))
//!     .build()?;
//! registry.register_definition(car, false)?;
//! ```

use crate::factory::{ConstructorFactory, InterceptorDecorator, ProxyFactory};
use crate::proxy::Intercepted;
use di_abstractions::{ComponentDecorator, InstanceFactory, MethodInterceptor};
use infrastructure_common::{
    downcast_instance, BoxError, ComponentDescriptor, ComponentInstance, DependencyError,
    DependencyResult, GenericArg, InjectableSlot, Lifetime, SlotReference, SlotSetter, TypeInfo,
};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// 组件描述符构建器
pub struct DescriptorBuilder<T> {
    factory: ConstructorFactory<T>,
    type_info: TypeInfo,
    id: Option<String>,
    description: Option<String>,
    lifetime: Lifetime,
    lazy: bool,
    is_abstract: bool,
    generic_args: Vec<GenericArg>,
    slots: Vec<InjectableSlot>,
    decorator: Option<Arc<dyn ComponentDecorator>>,
}

impl<T: Any + Send + Sync> DescriptorBuilder<T> {
    /// 使用不会失败的构造函数
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_factory(ConstructorFactory::new(constructor))
    }

    /// 使用可能失败的构造函数
    pub fn try_new<F, E>(constructor: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::with_factory(ConstructorFactory::fallible(constructor))
    }

    fn with_factory(factory: ConstructorFactory<T>) -> Self {
        Self {
            type_info: factory.target_type().clone(),
            factory,
            id: None,
            description: None,
            lifetime: Lifetime::Singleton,
            lazy: false,
            is_abstract: false,
            generic_args: Vec::new(),
            slots: Vec::new(),
            decorator: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn singleton(mut self) -> Self {
        self.lifetime = Lifetime::Singleton;
        self
    }

    pub fn prototype(mut self) -> Self {
        self.lifetime = Lifetime::Prototype;
        self
    }

    /// 不参与预先创建，首次请求时才创建
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// 标记为抽象类型，只能以代理方式实例化
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// 声明组件可以满足对 `I` 的请求
    pub fn implements<I: ?Sized + 'static>(mut self) -> Self {
        self.type_info = self.type_info.assignable_to::<I>();
        self
    }

    /// 声明组件可以满足对指定名称类型的请求
    pub fn assignable_to_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_info = self.type_info.with_ancestor(type_name);
        self
    }

    /// 组件类型的泛型参数
    pub fn generic_arg(mut self, arg: GenericArg) -> Self {
        self.generic_args.push(arg);
        self
    }

    pub fn slot(mut self, slot: SlotBuilder<T>) -> Self {
        self.slots.push(slot.build());
        self
    }

    /// 以 [`Intercepted<T>`] 代理组件，实例由拦截器包装
    ///
    /// 发布的实例类型是 `Intercepted<T>` 而不是 `T`：按类型取用时请求
    /// `Intercepted<T>`（如 `get_typed::<Intercepted<T>>()`），注入时使用
    /// [`SlotBuilder::inject_intercepted`]。直接请求 `T` 会在转换实例时返回
    /// [`DependencyError::TypeMismatch`]。
    pub fn intercepted_by(mut self, interceptor: Arc<dyn MethodInterceptor>) -> Self {
        self.type_info = self.type_info.assignable_to::<Intercepted<T>>();
        self.proxied_with(Arc::new(InterceptorDecorator::<T>::new(interceptor)))
    }

    /// 以自定义装饰器代理组件
    pub fn proxied_with(mut self, decorator: Arc<dyn ComponentDecorator>) -> Self {
        self.decorator = Some(decorator);
        self
    }

    /// 构建描述符
    ///
    /// 抽象类型没有代理时返回 [`DependencyError::InvalidDescriptor`]。
    pub fn build(self) -> DependencyResult<ComponentDescriptor> {
        if self.is_abstract && self.decorator.is_none() {
            return Err(DependencyError::invalid_descriptor(
                self.type_info.name,
                "抽象类型必须以代理方式创建",
            ));
        }

        let constructor: Arc<dyn InstanceFactory> =
            Arc::new(self.factory.with_type_info(self.type_info.clone()));
        let proxy = self.decorator.is_some();
        let factory: Arc<dyn InstanceFactory> = match self.decorator {
            Some(decorator) => Arc::new(ProxyFactory::new(constructor, decorator)),
            None => constructor,
        };

        let mut descriptor = ComponentDescriptor::new(factory)
            .with_type_info(self.type_info)
            .with_lifetime(self.lifetime)
            .with_lazy(self.lazy)
            .with_proxy(proxy)
            .with_abstract(self.is_abstract);
        if let Some(id) = self.id {
            descriptor = descriptor.with_id(id);
        }
        if let Some(description) = self.description {
            descriptor = descriptor.with_description(description);
        }
        for arg in self.generic_args {
            descriptor = descriptor.with_generic_arg(arg);
        }
        for slot in self.slots {
            descriptor = descriptor.with_slot(slot);
        }
        Ok(descriptor)
    }
}

/// 注入点构建器
pub struct SlotBuilder<T> {
    slot: InjectableSlot,
    _owner: PhantomData<fn(&T)>,
}

impl<T: Any + Send + Sync> SlotBuilder<T> {
    /// 注入具体类型 `D` 的依赖
    pub fn inject<D, F>(name: impl Into<String>, setter: F) -> Self
    where
        D: Any + Send + Sync,
        F: Fn(&T, Arc<D>) + Send + Sync + 'static,
    {
        let name = name.into();
        let slot_name = name.clone();
        Self::with_setter(name, TypeInfo::of::<D>(), move |owner, value| {
            let dependency = downcast_instance::<D>(value, &slot_name)?;
            setter(owner, dependency);
            Ok(())
        })
    }

    /// 注入被代理的依赖 `D`，依赖以 `D` 的类型查找，实例为 `Intercepted<D>`
    pub fn inject_intercepted<D, F>(name: impl Into<String>, setter: F) -> Self
    where
        D: Any + Send + Sync,
        F: Fn(&T, Arc<Intercepted<D>>) + Send + Sync + 'static,
    {
        let name = name.into();
        let slot_name = name.clone();
        Self::with_setter(name, TypeInfo::of::<D>(), move |owner, value| {
            let dependency = downcast_instance::<Intercepted<D>>(value, &slot_name)?;
            setter(owner, dependency);
            Ok(())
        })
    }

    /// 按声明类型注入依赖，由赋值函数自行转换实例
    ///
    /// 用于声明类型为 trait 的注入点：实例的具体类型只有赋值函数知道。
    pub fn inject_with<F>(name: impl Into<String>, declared_type: TypeInfo, setter: F) -> Self
    where
        F: Fn(&T, ComponentInstance) -> DependencyResult<()> + Send + Sync + 'static,
    {
        Self::with_setter(name.into(), declared_type, setter)
    }

    /// 只声明不注入的依赖点（没有赋值函数）
    pub fn declared(name: impl Into<String>, declared_type: TypeInfo) -> Self {
        Self {
            slot: InjectableSlot::new(name, declared_type),
            _owner: PhantomData,
        }
    }

    fn with_setter<F>(name: String, declared_type: TypeInfo, setter: F) -> Self
    where
        F: Fn(&T, ComponentInstance) -> DependencyResult<()> + Send + Sync + 'static,
    {
        let slot_name = name.clone();
        let slot_setter = SlotSetter::new(move |owner, value| {
            let owner = owner_ref::<T>(owner, &slot_name)?;
            setter(owner, value)
        });
        Self {
            slot: InjectableSlot::new(name, declared_type).with_setter(slot_setter),
            _owner: PhantomData,
        }
    }

    /// 声明类型的泛型参数
    pub fn generic_arg(mut self, arg: GenericArg) -> Self {
        self.slot = self.slot.with_generic_arg(arg);
        self
    }

    /// 标记为可选依赖：未找到时保持未赋值
    pub fn optional(mut self) -> Self {
        self.slot = self.slot.with_required(false);
        self
    }

    /// 按组件标识引用依赖
    pub fn ref_id(mut self, id: impl Into<String>) -> Self {
        self.slot = self.slot.with_reference(SlotReference::ById(id.into()));
        self
    }

    /// 按类型名称引用依赖
    pub fn ref_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.slot = self
            .slot
            .with_reference(SlotReference::ByTypeName(type_name.into()));
        self
    }

    pub fn build(self) -> InjectableSlot {
        self.slot
    }
}

/// 取得宿主实例，代理组件会被解包为目标实例
fn owner_ref<'a, T: Any + Send + Sync>(
    owner: &'a ComponentInstance,
    slot_name: &str,
) -> DependencyResult<&'a T> {
    if let Some(owner) = (**owner).downcast_ref::<T>() {
        return Ok(owner);
    }
    if let Some(proxy) = (**owner).downcast_ref::<Intercepted<T>>() {
        return Ok(proxy.target().as_ref());
    }
    Err(DependencyError::TypeMismatch {
        expected: std::any::type_name::<T>().to_string(),
        context: format!("注入点 {slot_name} 的宿主"),
    })
}
