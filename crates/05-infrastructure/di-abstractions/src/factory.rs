//! 组件工厂抽象接口
//!
//! 裸实例由 [`InstanceFactory`] 产生；代理组件在此基础上用
//! [`ComponentDecorator`] 包装，方法拦截由 [`MethodInterceptor`] 完成。

use infrastructure_common::{ComponentInstance, DependencyResult};

pub use infrastructure_common::InstanceFactory;

/// 组件装饰器 trait
///
/// 用包装对象替换运行时生成子类的代理方式。
pub trait ComponentDecorator: Send + Sync {
    /// 包装目标实例
    fn decorate(&self, target: ComponentInstance) -> DependencyResult<ComponentInstance>;

    /// 装饰器名称
    fn name(&self) -> &str {
        "decorator"
    }
}

/// 方法拦截器 trait
pub trait MethodInterceptor: Send + Sync {
    /// 是否拦截指定方法
    fn intercepts(&self, _method: &str) -> bool {
        true
    }

    /// 方法执行前
    fn before_execute(&self, _method: &str) {}

    /// 方法成功返回后
    fn after_execute(&self, _method: &str) {}

    /// 方法返回错误时
    fn on_error(&self, _method: &str, _error: &dyn std::error::Error) {}
}
