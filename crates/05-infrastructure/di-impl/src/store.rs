//! 组件定义存储

use dashmap::DashMap;
use di_abstractions::{DefinitionStore, MembershipKind};
use infrastructure_common::{ComponentDescriptor, DependencyError, DependencyResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// 基于 `DashMap` 的定义存储
///
/// 有标识的描述符同时登记在标识索引和类型名称索引中，
/// 类型名称索引以最后一次注册为准。
#[derive(Default)]
pub struct DefinitionStoreImpl {
    by_id: DashMap<String, Arc<ComponentDescriptor>>,
    by_type_name: DashMap<String, Arc<ComponentDescriptor>>,
    write_lock: Mutex<()>,
}

impl DefinitionStoreImpl {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DefinitionStore for DefinitionStoreImpl {
    fn register(&self, descriptor: Arc<ComponentDescriptor>, overwrite: bool) -> DependencyResult<()> {
        let _guard = self.write_lock.lock();
        let type_name = descriptor.type_name().to_string();

        match descriptor.id() {
            Some(id) => {
                if !overwrite && self.by_id.contains_key(id) {
                    return Err(DependencyError::DefinitionExists { key: id.to_string() });
                }
                self.by_id.insert(id.to_string(), Arc::clone(&descriptor));
            }
            None => {
                if !overwrite && self.by_type_name.contains_key(&type_name) {
                    return Err(DependencyError::DefinitionExists { key: type_name });
                }
            }
        }

        debug!(component = descriptor.key(), overwrite, "登记组件定义");
        self.by_type_name.insert(type_name, descriptor);
        Ok(())
    }

    fn lookup_by_id(&self, id: &str) -> Option<Arc<ComponentDescriptor>> {
        self.by_id.get(id).map(|entry| Arc::clone(entry.value()))
    }

    fn lookup_by_type_name(&self, type_name: &str) -> Option<Arc<ComponentDescriptor>> {
        self.by_type_name
            .get(type_name)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn membership_kind(&self, descriptor: &ComponentDescriptor) -> MembershipKind {
        if let Some(id) = descriptor.id() {
            if self.by_id.contains_key(id) {
                return MembershipKind::ById;
            }
        }
        if self.by_type_name.contains_key(descriptor.type_name()) {
            return MembershipKind::ByTypeName;
        }
        MembershipKind::None
    }

    fn candidates_for(&self, type_name: &str) -> Vec<Arc<ComponentDescriptor>> {
        self.descriptors()
            .into_iter()
            .filter(|descriptor| {
                !descriptor.is_abstract() && descriptor.type_info().is_assignable_to_name(type_name)
            })
            .collect()
    }

    fn descriptors(&self) -> Vec<Arc<ComponentDescriptor>> {
        let mut all: Vec<Arc<ComponentDescriptor>> = self
            .by_id
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for entry in self.by_type_name.iter() {
            if !all.iter().any(|known| Arc::ptr_eq(known, entry.value())) {
                all.push(Arc::clone(entry.value()));
            }
        }
        all
    }

    fn len(&self) -> usize {
        self.descriptors().len()
    }

    fn clear(&self) {
        let _guard = self.write_lock.lock();
        self.by_id.clear();
        self.by_type_name.clear();
    }
}
