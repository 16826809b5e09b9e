//! 实例工厂实现

use crate::proxy::Intercepted;
use di_abstractions::{ComponentDecorator, InstanceFactory, MethodInterceptor};
use infrastructure_common::{
    downcast_instance, BoxError, ComponentInstance, DependencyError, DependencyResult, TypeInfo,
};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

type Constructor<T> = dyn Fn() -> Result<T, BoxError> + Send + Sync;

/// 基于无参构造函数的工厂
pub struct ConstructorFactory<T> {
    type_info: TypeInfo,
    constructor: Box<Constructor<T>>,
}

impl<T: Any + Send + Sync> ConstructorFactory<T> {
    /// 使用不会失败的构造函数
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<T>(),
            constructor: Box::new(move || Ok(constructor())),
        }
    }

    /// 使用可能失败的构造函数
    pub fn fallible<F, E>(constructor: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            type_info: TypeInfo::of::<T>(),
            constructor: Box::new(move || constructor().map_err(Into::into)),
        }
    }

    /// 覆盖产出类型信息（例如补充可赋值的父类型）
    pub fn with_type_info(mut self, type_info: TypeInfo) -> Self {
        self.type_info = type_info;
        self
    }
}

impl<T: Any + Send + Sync> InstanceFactory for ConstructorFactory<T> {
    fn create(&self) -> DependencyResult<ComponentInstance> {
        match (self.constructor)() {
            Ok(value) => Ok(Arc::new(value)),
            // 已经属于依赖注入错误分类的错误原样传播
            Err(error) => match error.downcast::<DependencyError>() {
                Ok(dependency_error) => Err(*dependency_error),
                Err(error) => Err(DependencyError::construction_failure(
                    self.type_info.name.clone(),
                    error,
                )),
            },
        }
    }

    fn target_type(&self) -> &TypeInfo {
        &self.type_info
    }
}

/// 代理工厂：先由内部工厂创建目标实例，再交给装饰器包装
pub struct ProxyFactory {
    inner: Arc<dyn InstanceFactory>,
    decorator: Arc<dyn ComponentDecorator>,
}

impl ProxyFactory {
    pub fn new(inner: Arc<dyn InstanceFactory>, decorator: Arc<dyn ComponentDecorator>) -> Self {
        Self { inner, decorator }
    }
}

impl InstanceFactory for ProxyFactory {
    fn create(&self) -> DependencyResult<ComponentInstance> {
        let target = self.inner.create()?;
        self.decorator.decorate(target)
    }

    fn target_type(&self) -> &TypeInfo {
        self.inner.target_type()
    }
}

/// 用 [`Intercepted<T>`] 包装目标实例的装饰器
pub struct InterceptorDecorator<T> {
    interceptor: Arc<dyn MethodInterceptor>,
    _target: PhantomData<fn() -> T>,
}

impl<T> InterceptorDecorator<T> {
    pub fn new(interceptor: Arc<dyn MethodInterceptor>) -> Self {
        Self {
            interceptor,
            _target: PhantomData,
        }
    }
}

impl<T: Any + Send + Sync> ComponentDecorator for InterceptorDecorator<T> {
    fn decorate(&self, target: ComponentInstance) -> DependencyResult<ComponentInstance> {
        let target = downcast_instance::<T>(target, "代理目标")?;
        Ok(Arc::new(Intercepted::new(target, Arc::clone(&self.interceptor))))
    }

    fn name(&self) -> &str {
        "interceptor"
    }
}
