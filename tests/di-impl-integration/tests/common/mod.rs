//! 集成测试共用的组件与工具

#![allow(dead_code)]

use di_impl::{ComponentRegistryImpl, DefinitionStoreImpl, DescriptorBuilder, SlotBuilder};
use di_abstractions::{ComponentRegistry, DefinitionStore, MembershipKind, RegistryConfig};
use infrastructure_common::{ComponentDescriptor, DependencyResult};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
pub fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok(); // 忽略初始化失败的错误
    });
}

/// 燃料，构建较慢
#[derive(Debug)]
pub struct Fuel;

/// 发动机
#[derive(Debug, Default)]
pub struct Engine {
    pub fuel: OnceCell<Arc<Fuel>>,
}

/// 汽车
#[derive(Default)]
pub struct Car {
    pub engine: OnceCell<Arc<Engine>>,
}

pub fn engine_descriptor() -> ComponentDescriptor {
    DescriptorBuilder::new(Engine::default)
        .id("engine")
        .build()
        .unwrap()
}

pub fn car_descriptor() -> ComponentDescriptor {
    DescriptorBuilder::new(Car::default)
        .id("car")
        .slot(SlotBuilder::inject("engine", |car: &Car, engine: Arc<Engine>| {
            let _ = car.engine.set(engine);
        }))
        .build()
        .unwrap()
}

/// 发动机依赖构建缓慢的燃料，用于观察构建期间的可见性
pub fn fueled_engine_descriptor() -> ComponentDescriptor {
    DescriptorBuilder::new(Engine::default)
        .id("engine")
        .slot(SlotBuilder::inject("fuel", |engine: &Engine, fuel: Arc<Fuel>| {
            let _ = engine.fuel.set(fuel);
        }))
        .build()
        .unwrap()
}

pub fn slow_fuel_descriptor(delay: Duration) -> ComponentDescriptor {
    DescriptorBuilder::new(move || {
        thread::sleep(delay);
        Fuel
    })
    .build()
    .unwrap()
}

/// 记录构造次数的慢速发动机定义
pub fn counted_engine_descriptor(counter: Arc<AtomicUsize>, delay: Duration) -> ComponentDescriptor {
    DescriptorBuilder::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(delay);
        Engine::default()
    })
    .id("engine")
    .build()
    .unwrap()
}

pub fn registry_with(descriptors: Vec<ComponentDescriptor>) -> Arc<ComponentRegistryImpl> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    for descriptor in descriptors {
        registry.register_definition(descriptor, false).unwrap();
    }
    registry
}

/// 清空定义时人为变慢的存储，用于观察重置期间的行为
pub struct SlowClearStore {
    inner: DefinitionStoreImpl,
    delay: Duration,
}

impl SlowClearStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: DefinitionStoreImpl::new(),
            delay,
        }
    }
}

impl DefinitionStore for SlowClearStore {
    fn register(&self, descriptor: Arc<ComponentDescriptor>, overwrite: bool) -> DependencyResult<()> {
        self.inner.register(descriptor, overwrite)
    }

    fn lookup_by_id(&self, id: &str) -> Option<Arc<ComponentDescriptor>> {
        self.inner.lookup_by_id(id)
    }

    fn lookup_by_type_name(&self, type_name: &str) -> Option<Arc<ComponentDescriptor>> {
        self.inner.lookup_by_type_name(type_name)
    }

    fn membership_kind(&self, descriptor: &ComponentDescriptor) -> MembershipKind {
        self.inner.membership_kind(descriptor)
    }

    fn candidates_for(&self, type_name: &str) -> Vec<Arc<ComponentDescriptor>> {
        self.inner.candidates_for(type_name)
    }

    fn descriptors(&self) -> Vec<Arc<ComponentDescriptor>> {
        self.inner.descriptors()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn clear(&self) {
        thread::sleep(self.delay);
        self.inner.clear();
    }
}

/// 重置耗时为 `delay` 的注册表
pub fn slow_reset_registry(delay: Duration) -> Arc<ComponentRegistryImpl> {
    init_test_logger();
    Arc::new(ComponentRegistryImpl::with_store(
        Arc::new(SlowClearStore::new(delay)),
        RegistryConfig::default(),
    ))
}
