//! 方法拦截代理
//!
//! 代理组件不依赖运行时生成子类，而是由 [`Intercepted<T>`] 包装目标实例，
//! 调用方通过 [`Intercepted::call`] 执行需要拦截的方法。

use di_abstractions::MethodInterceptor;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// 被拦截的组件实例
///
/// 通过 `Deref` 直接访问目标实例时不会触发拦截。
pub struct Intercepted<T> {
    target: Arc<T>,
    interceptor: Arc<dyn MethodInterceptor>,
}

impl<T> Intercepted<T> {
    pub fn new(target: Arc<T>, interceptor: Arc<dyn MethodInterceptor>) -> Self {
        Self { target, interceptor }
    }

    /// 目标实例
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    /// 在拦截器钩子之间执行可能失败的方法
    pub fn call<R, E>(&self, method: &str, invoke: impl FnOnce(&T) -> Result<R, E>) -> Result<R, E>
    where
        E: std::error::Error,
    {
        if !self.interceptor.intercepts(method) {
            return invoke(&self.target);
        }

        self.interceptor.before_execute(method);
        match invoke(&self.target) {
            Ok(value) => {
                self.interceptor.after_execute(method);
                Ok(value)
            }
            Err(error) => {
                self.interceptor.on_error(method, &error);
                Err(error)
            }
        }
    }

    /// 在拦截器钩子之间执行不会失败的方法
    pub fn invoke<R>(&self, method: &str, invoke: impl FnOnce(&T) -> R) -> R {
        if !self.interceptor.intercepts(method) {
            return invoke(&self.target);
        }

        self.interceptor.before_execute(method);
        let value = invoke(&self.target);
        self.interceptor.after_execute(method);
        value
    }
}

impl<T> Deref for Intercepted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.target
    }
}

impl<T> fmt::Debug for Intercepted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intercepted")
            .field("target", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
