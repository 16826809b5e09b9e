//! 组件注册表实现
//!
//! 创建流程：
//!
//! 1. 调用描述符的实例工厂得到裸实例
//! 2. 类型已在当前解析链中时报告循环依赖，否则入链
//! 3. 单例把裸实例登记为半初始化条目
//! 4. 依次解析并注入各个依赖点
//! 5. 成功时发布实例；失败时撤销半初始化条目并原样传播错误

use crate::cache::InstanceCache;
use crate::matcher::{Candidate, TypeMatcherImpl};
use crate::store::DefinitionStoreImpl;
use di_abstractions::{
    ComponentRegistry, DefinitionStore, MembershipKind, RegistryConfig, RegistryStats,
    ResolveContext, TypeMatcher,
};
use infrastructure_common::{
    ComponentDescriptor, ComponentInstance, DependencyError, DependencyResult, EntryState,
    GenericArg, InjectableSlot, InstanceRecord, SlotReference,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 组件注册表
pub struct ComponentRegistryImpl {
    store: Arc<dyn DefinitionStore>,
    cache: InstanceCache,
    matcher: TypeMatcherImpl,
    config: RegistryConfig,
    resets_in_progress: AtomicUsize,
    creations: AtomicU64,
    failures: AtomicU64,
}

impl ComponentRegistryImpl {
    /// 使用默认配置创建注册表
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// 使用指定配置创建注册表
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_store(Arc::new(DefinitionStoreImpl::new()), config)
    }

    /// 使用自定义定义存储创建注册表
    pub fn with_store(store: Arc<dyn DefinitionStore>, config: RegistryConfig) -> Self {
        Self {
            store,
            cache: InstanceCache::new(),
            matcher: TypeMatcherImpl::new(),
            config,
            resets_in_progress: AtomicUsize::new(0),
            creations: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn ensure_active(&self) -> DependencyResult<()> {
        if self.resets_in_progress.load(Ordering::SeqCst) > 0 {
            return Err(DependencyError::RegistryResetting);
        }
        Ok(())
    }

    fn new_context(&self) -> ResolveContext {
        ResolveContext::with_options(self.config.resolve_options())
    }

    fn resolve_by_id(&self, id: &str, ctx: &mut ResolveContext) -> DependencyResult<ComponentInstance> {
        if let Some(record) = self.cache.published_by_id(id) {
            return Ok(record.instance);
        }
        let descriptor = self
            .store
            .lookup_by_id(id)
            .ok_or_else(|| DependencyError::not_found(id))?;
        self.instantiate(&descriptor, ctx)
    }

    fn resolve_by_type(
        &self,
        type_name: &str,
        generic_args: &[GenericArg],
        ctx: &mut ResolveContext,
    ) -> DependencyResult<Option<ComponentInstance>> {
        let published = self
            .cache
            .published_matching(|record| self.matcher.is_compatible(record, type_name, generic_args));
        let definitions: Vec<Arc<ComponentDescriptor>> = self
            .store
            .candidates_for(type_name)
            .into_iter()
            .filter(|descriptor| {
                !descriptor.is_singleton()
                    || !published.iter().any(|record| record.produced_by(descriptor))
            })
            .collect();

        let candidates: Vec<Candidate> = published
            .into_iter()
            .map(Candidate::Published)
            .chain(definitions.into_iter().map(Candidate::Definition))
            .collect();

        match self.matcher.select(candidates, type_name, generic_args)? {
            None => Ok(None),
            Some(Candidate::Published(record)) => Ok(Some(record.instance)),
            Some(Candidate::Definition(descriptor)) => self.instantiate(&descriptor, ctx).map(Some),
        }
    }

    fn instantiate(
        &self,
        descriptor: &Arc<ComponentDescriptor>,
        ctx: &mut ResolveContext,
    ) -> DependencyResult<ComponentInstance> {
        if descriptor.is_abstract() && !descriptor.is_proxy() {
            return Err(DependencyError::invalid_descriptor(
                descriptor.type_name(),
                "抽象类型必须以代理方式创建",
            ));
        }
        if !descriptor.is_singleton() {
            return self.create(descriptor, ctx);
        }

        // 类型锁不可重入，必须在加锁前检查循环依赖
        ctx.ensure_not_constructing(descriptor.type_name())?;
        let lock = self.cache.type_lock(descriptor.type_name());
        let _guard = lock.lock();
        if let Some(record) = self.cache.find_published(descriptor) {
            return Ok(record.instance);
        }
        self.create(descriptor, ctx)
    }

    fn create(
        &self,
        descriptor: &Arc<ComponentDescriptor>,
        ctx: &mut ResolveContext,
    ) -> DependencyResult<ComponentInstance> {
        let instance = descriptor.factory().create().map_err(|error| {
            self.record_failure(descriptor, &error);
            error
        })?;
        ctx.push_type(descriptor.type_name()).map_err(|error| {
            self.record_failure(descriptor, &error);
            error
        })?;

        let half = descriptor.is_singleton().then(|| {
            self.cache
                .begin_construction(InstanceRecord::from_descriptor(Arc::clone(&instance), descriptor))
        });
        let injected = self.inject_slots(descriptor, &instance, ctx);
        ctx.pop_type();

        match injected {
            Ok(()) => {
                if let Some(half) = half {
                    half.publish();
                }
                self.creations.fetch_add(1, Ordering::Relaxed);
                debug!(component = descriptor.key(), singleton = descriptor.is_singleton(), "组件创建完成");
                Ok(instance)
            }
            Err(error) => {
                drop(half);
                self.record_failure(descriptor, &error);
                Err(error)
            }
        }
    }

    fn record_failure(&self, descriptor: &ComponentDescriptor, error: &DependencyError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        warn!(component = descriptor.key(), error = %error, "组件创建失败");
    }

    fn inject_slots(
        &self,
        descriptor: &ComponentDescriptor,
        owner: &ComponentInstance,
        ctx: &mut ResolveContext,
    ) -> DependencyResult<()> {
        for slot in descriptor.slots() {
            if !slot.is_injectable() {
                continue;
            }
            let Some(setter) = slot.setter() else {
                continue;
            };

            match self.resolve_slot(slot, ctx) {
                Ok(value) => setter.invoke(owner, value)?,
                Err(error) if !slot.is_required() && error.is_not_found() => {
                    debug!(
                        component = descriptor.key(),
                        slot = slot.name(),
                        "可选依赖未找到，保持未赋值"
                    );
                }
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }

    /// 解析顺序：显式标识引用、与注入点同名的已知标识、显式类型引用、声明类型
    fn resolve_slot(&self, slot: &InjectableSlot, ctx: &mut ResolveContext) -> DependencyResult<ComponentInstance> {
        if let Some(SlotReference::ById(id)) = slot.reference() {
            return self.resolve_by_id(id, ctx);
        }
        if self.slot_name_is_known_id(slot) {
            return self.resolve_by_id(slot.name(), ctx);
        }
        let (type_name, generic_args) = match slot.reference() {
            Some(SlotReference::ByTypeName(type_name)) => (type_name.as_str(), &[][..]),
            _ => (slot.declared_type().name.as_str(), slot.generic_args()),
        };
        self.resolve_by_type(type_name, generic_args, ctx)?
            .ok_or_else(|| DependencyError::not_found(type_name))
    }

    /// 将被新描述符覆盖的已登记描述符
    ///
    /// 匿名描述符只覆盖同类型的匿名描述符，有标识的描述符仍保留在标识索引中。
    fn replaced_definition(&self, descriptor: &Arc<ComponentDescriptor>) -> Option<Arc<ComponentDescriptor>> {
        let previous = match descriptor.id() {
            Some(id) => self.store.lookup_by_id(id),
            None => self
                .store
                .lookup_by_type_name(descriptor.type_name())
                .filter(|previous| previous.id().is_none()),
        };
        previous.filter(|previous| !Arc::ptr_eq(previous, descriptor))
    }

    fn slot_name_is_known_id(&self, slot: &InjectableSlot) -> bool {
        let declared = slot.declared_type();
        if let Some(record) = self.cache.published_by_id(slot.name()) {
            return record.type_info.is_assignable_to(declared);
        }
        self.store
            .lookup_by_id(slot.name())
            .is_some_and(|descriptor| descriptor.type_info().is_assignable_to(declared))
    }
}

impl Default for ComponentRegistryImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry for ComponentRegistryImpl {
    fn register_definition(
        &self,
        descriptor: ComponentDescriptor,
        overwrite: bool,
    ) -> DependencyResult<Arc<ComponentDescriptor>> {
        let overwrite = overwrite || self.config.allow_definition_overriding;
        let descriptor = Arc::new(descriptor);
        let replaced = if overwrite { self.replaced_definition(&descriptor) } else { None };
        self.store.register(Arc::clone(&descriptor), overwrite)?;
        if let Some(replaced) = replaced {
            if self.cache.evict_produced_by(&replaced) {
                info!(component = descriptor.key(), "组件定义已覆盖，旧实例将在下次请求时重建");
            }
        }
        info!(
            component = descriptor.key(),
            type_name = descriptor.type_name(),
            singleton = descriptor.is_singleton(),
            "注册组件定义"
        );
        Ok(descriptor)
    }

    fn membership_kind(&self, descriptor: &ComponentDescriptor) -> MembershipKind {
        self.store.membership_kind(descriptor)
    }

    fn register_instance(&self, record: InstanceRecord, overwrite: bool) -> DependencyResult<()> {
        let key = record.key().to_string();
        self.cache.insert_raw(record, overwrite)?;
        info!(component = %key, "注册组件实例");
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> DependencyResult<ComponentInstance> {
        self.ensure_active()?;
        loop {
            let mut ctx = self.new_context();
            let instance = self.resolve_by_id(id, &mut ctx)?;
            if !self.cache.await_id_cleared(id) {
                return Ok(instance);
            }
            if let Some(record) = self.cache.published_by_id(id) {
                return Ok(record.instance);
            }
            self.ensure_active()?;
        }
    }

    fn get_by_type(&self, type_name: &str, generic_args: &[GenericArg]) -> DependencyResult<ComponentInstance> {
        self.find_by_type(type_name, generic_args)?
            .ok_or_else(|| DependencyError::not_found(type_name))
    }

    fn find_by_type(
        &self,
        type_name: &str,
        generic_args: &[GenericArg],
    ) -> DependencyResult<Option<ComponentInstance>> {
        self.ensure_active()?;
        loop {
            let mut ctx = self.new_context();
            let instance = self.resolve_by_type(type_name, generic_args, &mut ctx)?;
            let waited = self
                .cache
                .await_type_cleared(|record| self.matcher.is_compatible(record, type_name, generic_args));
            if !waited {
                return Ok(instance);
            }
            // 等待期间可能有兼容的实例发布，重新查询
            self.ensure_active()?;
        }
    }

    fn has_component(&self, id: &str) -> bool {
        self.cache.published_by_id(id).is_some()
            || self
                .store
                .lookup_by_id(id)
                .is_some_and(|descriptor| !descriptor.is_abstract())
    }

    fn has_component_of_type(&self, type_name: &str) -> bool {
        !self
            .cache
            .published_matching(|record| record.type_info.is_assignable_to_name(type_name))
            .is_empty()
            || !self.store.candidates_for(type_name).is_empty()
    }

    fn descriptor_by_id(&self, id: &str) -> Option<Arc<ComponentDescriptor>> {
        self.store.lookup_by_id(id)
    }

    fn descriptor_by_type_name(&self, type_name: &str) -> Option<Arc<ComponentDescriptor>> {
        self.store.lookup_by_type_name(type_name)
    }

    fn preinstantiate_singletons(&self) -> DependencyResult<usize> {
        self.ensure_active()?;
        let before = self.creations.load(Ordering::Relaxed);
        for descriptor in self.store.descriptors() {
            if !descriptor.is_singleton() || descriptor.is_lazy() || descriptor.is_abstract() {
                continue;
            }
            if self.cache.find_published(&descriptor).is_some() {
                continue;
            }
            let mut ctx = self.new_context();
            self.instantiate(&descriptor, &mut ctx)?;
        }
        // 作为依赖顺带创建的实例也计入
        let created = usize::try_from(self.creations.load(Ordering::Relaxed).saturating_sub(before))
            .unwrap_or(usize::MAX);
        info!(count = created, "预先创建单例组件完成");
        Ok(created)
    }

    fn entry_state(&self, id: &str) -> EntryState {
        if self.cache.published_by_id(id).is_some() {
            return EntryState::Published;
        }
        if self.cache.is_under_construction(id) {
            return EntryState::UnderConstruction;
        }
        match self.store.lookup_by_id(id) {
            Some(_) if self.cache.has_failed(id) => EntryState::Failed,
            Some(_) => EntryState::Defined,
            None => EntryState::Unregistered,
        }
    }

    fn stats(&self) -> RegistryStats {
        RegistryStats {
            definitions: self.store.len(),
            published_singletons: self.cache.published_len(),
            half_initialized: self.cache.half_len(),
            creations: self.creations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        // 重叠的重置全部结束后才恢复服务
        self.resets_in_progress.fetch_add(1, Ordering::SeqCst);
        self.cache.clear_with(|| {
            self.store.clear();
            self.creations.store(0, Ordering::Relaxed);
            self.failures.store(0, Ordering::Relaxed);
        });
        self.resets_in_progress.fetch_sub(1, Ordering::SeqCst);
        info!("组件注册表已重置");
    }
}
