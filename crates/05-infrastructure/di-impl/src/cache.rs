//! 实例缓存与单例发布
//!
//! 完整实例和半初始化实例分别保存在两组映射中。半初始化条目的登记、
//! 移除以及向完整映射的迁移都在同一把发布锁下完成，每次发布或失败后
//! 通过条件变量唤醒等待中的调用方。

use dashmap::{DashMap, DashSet};
use infrastructure_common::{ComponentDescriptor, DependencyError, DependencyResult, InstanceRecord};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 实例缓存
#[derive(Default)]
pub struct InstanceCache {
    by_id: DashMap<String, InstanceRecord>,
    by_type: DashMap<String, Vec<InstanceRecord>>,
    half_by_id: DashMap<String, InstanceRecord>,
    half_by_type: DashMap<String, Vec<InstanceRecord>>,
    failed_ids: DashSet<String>,
    type_locks: DashMap<String, Arc<Mutex<()>>>,
    publication: Mutex<()>,
    half_cleared: Condvar,
    generation: AtomicU64,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按组件标识查找已发布实例
    pub fn published_by_id(&self, id: &str) -> Option<InstanceRecord> {
        self.by_id.get(id).map(|entry| entry.value().clone())
    }

    /// 所有满足条件的已发布实例
    pub fn published_matching(&self, predicate: impl Fn(&InstanceRecord) -> bool) -> Vec<InstanceRecord> {
        self.by_type
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|record| predicate(record))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// 查找由指定描述符产生的已发布实例
    pub fn find_published(&self, descriptor: &Arc<ComponentDescriptor>) -> Option<InstanceRecord> {
        if let Some(id) = descriptor.id() {
            return self.published_by_id(id);
        }
        self.by_type.get(descriptor.type_name()).and_then(|entry| {
            entry
                .value()
                .iter()
                .find(|record| record.produced_by(descriptor))
                .cloned()
        })
    }

    /// 登记半初始化实例，返回的守卫在未发布时自动撤销该条目
    pub fn begin_construction(&self, record: InstanceRecord) -> HalfEntryGuard<'_> {
        let _publication = self.publication.lock();
        if let Some(id) = &record.id {
            self.half_by_id.insert(id.clone(), record.clone());
        }
        self.half_by_type
            .entry(record.type_info.name.clone())
            .or_default()
            .push(record.clone());
        debug!(component = record.key(), "登记半初始化实例");

        HalfEntryGuard {
            cache: self,
            record: Some(record),
            generation: self.generation.load(Ordering::SeqCst),
        }
    }

    /// 直接登记完整实例
    pub fn insert_raw(&self, record: InstanceRecord, overwrite: bool) -> DependencyResult<()> {
        let _publication = self.publication.lock();
        let type_name = record.type_info.name.clone();

        match record.id.clone() {
            Some(id) => {
                let previous = self.by_id.get(&id).map(|entry| entry.value().clone());
                if let Some(previous) = previous {
                    if !overwrite {
                        return Err(DependencyError::InstanceExists { key: id });
                    }
                    self.remove_from_type_index(&self.by_type, &previous);
                }
                self.by_id.insert(id.clone(), record.clone());
                self.failed_ids.remove(&id);
            }
            None => {
                let occupied = self
                    .by_type
                    .get(&type_name)
                    .is_some_and(|entry| entry.value().iter().any(|existing| existing.id.is_none()));
                if occupied {
                    if !overwrite {
                        return Err(DependencyError::InstanceExists { key: type_name });
                    }
                    if let Some(mut entry) = self.by_type.get_mut(&type_name) {
                        entry.value_mut().retain(|existing| existing.id.is_some());
                    }
                }
            }
        }

        self.by_type.entry(type_name).or_default().push(record);
        self.half_cleared.notify_all();
        Ok(())
    }

    /// 移除由指定描述符产生的已发布实例，返回是否移除了实例
    ///
    /// 定义被覆盖后调用，新的定义在下一次请求时重新构建。
    pub fn evict_produced_by(&self, descriptor: &Arc<ComponentDescriptor>) -> bool {
        let _publication = self.publication.lock();
        if let Some(id) = descriptor.id() {
            self.failed_ids.remove(id);
        }
        let Some(record) = self
            .find_published(descriptor)
            .filter(|record| record.produced_by(descriptor))
        else {
            return false;
        };

        if let Some(id) = &record.id {
            self.by_id.remove_if(id, |_, existing| existing.same_entry(&record));
        }
        self.remove_from_type_index(&self.by_type, &record);
        debug!(component = record.key(), "定义已被覆盖，移除旧实例");
        true
    }

    /// 指定类型的单例创建锁
    pub fn type_lock(&self, type_name: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.type_locks
                .entry(type_name.to_string())
                .or_default()
                .value(),
        )
    }

    /// 等待指定标识的半初始化条目消失，返回是否发生过等待
    pub fn await_id_cleared(&self, id: &str) -> bool {
        let mut publication = self.publication.lock();
        let mut waited = false;
        while self.half_by_id.contains_key(id) {
            debug!(component = id, "等待半初始化实例完成");
            self.half_cleared.wait(&mut publication);
            waited = true;
        }
        waited
    }

    /// 等待所有满足条件的半初始化条目消失，返回是否发生过等待
    pub fn await_type_cleared(&self, predicate: impl Fn(&InstanceRecord) -> bool) -> bool {
        let mut publication = self.publication.lock();
        let mut waited = false;
        while self.has_half_matching(&predicate) {
            self.half_cleared.wait(&mut publication);
            waited = true;
        }
        waited
    }

    /// 指定标识是否正在构建
    pub fn is_under_construction(&self, id: &str) -> bool {
        self.half_by_id.contains_key(id)
    }

    /// 指定标识最近一次构建是否失败
    pub fn has_failed(&self, id: &str) -> bool {
        self.failed_ids.contains(id)
    }

    /// 半初始化条目数量
    pub fn half_len(&self) -> usize {
        self.half_by_type.iter().map(|entry| entry.value().len()).sum()
    }

    /// 已发布实例数量
    pub fn published_len(&self) -> usize {
        self.by_type.iter().map(|entry| entry.value().len()).sum()
    }

    /// 在发布锁下清空所有映射和类型锁，并执行附带的清理
    ///
    /// 清空之前开始的构建在完成时不会再被发布。
    pub fn clear_with(&self, also: impl FnOnce()) {
        let _publication = self.publication.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.by_id.clear();
        self.by_type.clear();
        self.half_by_id.clear();
        self.half_by_type.clear();
        self.failed_ids.clear();
        self.type_locks.clear();
        also();
        self.half_cleared.notify_all();
    }

    fn has_half_matching(&self, predicate: &impl Fn(&InstanceRecord) -> bool) -> bool {
        self.half_by_type
            .iter()
            .any(|entry| entry.value().iter().any(|record| predicate(record)))
    }

    fn remove_half(&self, record: &InstanceRecord) {
        if let Some(id) = &record.id {
            self.half_by_id
                .remove_if(id, |_, existing| existing.same_entry(record));
        }
        self.remove_from_type_index(&self.half_by_type, record);
    }

    fn remove_from_type_index(&self, index: &DashMap<String, Vec<InstanceRecord>>, record: &InstanceRecord) {
        let type_name = &record.type_info.name;
        if let Some(mut entry) = index.get_mut(type_name) {
            entry.value_mut().retain(|existing| !existing.same_entry(record));
        }
        index.remove_if(type_name, |_, records| records.is_empty());
    }

    fn publish(&self, record: InstanceRecord, generation: u64) -> bool {
        let _publication = self.publication.lock();
        self.remove_half(&record);

        let current = self.generation.load(Ordering::SeqCst) == generation;
        if current {
            if let Some(id) = &record.id {
                self.by_id.insert(id.clone(), record.clone());
                self.failed_ids.remove(id);
            }
            debug!(component = record.key(), "发布组件实例");
            self.by_type
                .entry(record.type_info.name.clone())
                .or_default()
                .push(record);
        } else {
            debug!(component = record.key(), "注册表已重置，丢弃构建结果");
        }

        self.half_cleared.notify_all();
        current
    }

    fn abandon(&self, record: &InstanceRecord, generation: u64) {
        let _publication = self.publication.lock();
        self.remove_half(record);
        if let Some(id) = &record.id {
            if self.generation.load(Ordering::SeqCst) == generation {
                self.failed_ids.insert(id.clone());
            }
        }
        debug!(component = record.key(), "撤销半初始化实例");
        self.half_cleared.notify_all();
    }
}

/// 半初始化条目守卫
///
/// 调用 [`HalfEntryGuard::publish`] 将实例迁移到完整映射；
/// 未发布即被丢弃（包括构建过程中发生 panic）时撤销半初始化条目。
pub struct HalfEntryGuard<'a> {
    cache: &'a InstanceCache,
    record: Option<InstanceRecord>,
    generation: u64,
}

impl HalfEntryGuard<'_> {
    /// 发布实例，注册表在构建期间被重置时返回 `false`
    pub fn publish(mut self) -> bool {
        match self.record.take() {
            Some(record) => self.cache.publish(record, self.generation),
            None => false,
        }
    }
}

impl Drop for HalfEntryGuard<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.cache.abandon(&record, self.generation);
        }
    }
}
