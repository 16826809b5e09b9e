//! 并发访问下的单例发布测试

mod common;

use common::*;
use di_abstractions::{ComponentRegistry, ComponentRegistryExt};
use infrastructure_common::{DependencyError, EntryState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 16;

#[test]
fn concurrent_lookups_construct_singleton_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = registry_with(vec![counted_engine_descriptor(
        Arc::clone(&counter),
        Duration::from_millis(20),
    )]);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.get_as::<Engine>("engine").unwrap()
            })
        })
        .collect();

    let engines: Vec<Arc<Engine>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(engines.iter().all(|engine| Arc::ptr_eq(engine, &engines[0])));
    assert_eq!(registry.stats().creations, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_type_lookups_from_async_tasks() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = registry_with(vec![counted_engine_descriptor(
        Arc::clone(&counter),
        Duration::from_millis(20),
    )]);

    let mut handles = Vec::new();
    for _ in 0..THREADS {
        let registry = Arc::clone(&registry);
        handles.push(tokio::task::spawn_blocking(move || {
            registry.get_typed::<Engine>().unwrap()
        }));
    }

    let mut engines = Vec::new();
    for handle in handles {
        engines.push(handle.await.unwrap());
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(engines.iter().all(|engine| Arc::ptr_eq(engine, &engines[0])));
}

#[test]
fn dependents_never_observe_half_initialized_singletons() {
    let registry = registry_with(vec![
        fueled_engine_descriptor(),
        slow_fuel_descriptor(Duration::from_millis(150)),
        car_descriptor(),
    ]);

    let builder = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.get_as::<Engine>("engine").unwrap())
    };

    // 等待发动机进入半初始化状态
    let mut waited = 0;
    while registry.entry_state("engine") != EntryState::UnderConstruction && waited < 100 {
        thread::sleep(Duration::from_millis(5));
        waited += 1;
    }

    let readers: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || match i % 3 {
                0 => Arc::clone(registry.get_as::<Car>("car").unwrap().engine.get().unwrap()),
                1 => registry.get_as::<Engine>("engine").unwrap(),
                _ => registry.get_typed::<Engine>().unwrap(),
            })
        })
        .collect();

    let engine = builder.join().unwrap();
    assert!(engine.fuel.get().is_some());

    for reader in readers {
        let seen = reader.join().unwrap();
        assert!(seen.fuel.get().is_some());
        assert!(Arc::ptr_eq(&seen, &engine));
    }

    let stats = registry.stats();
    assert_eq!(stats.half_initialized, 0);
    assert_eq!(stats.creations, 3);
}

#[test]
fn failed_construction_releases_waiting_threads() {
    let registry = registry_with(vec![
        fueled_engine_descriptor(),
        car_descriptor(),
    ]);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.get_by_id("car"))
        })
        .collect();

    for handle in handles {
        let error = handle.join().unwrap().unwrap_err();
        assert!(error.is_not_found());
    }

    let stats = registry.stats();
    assert_eq!(stats.half_initialized, 0);
    assert_eq!(stats.published_singletons, 0);
    assert_eq!(registry.entry_state("car"), EntryState::Failed);
}

#[test]
fn reset_discards_in_flight_construction() {
    let registry = registry_with(vec![
        fueled_engine_descriptor(),
        slow_fuel_descriptor(Duration::from_millis(150)),
    ]);

    let builder = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.get_by_id("engine"))
    };

    let mut waited = 0;
    while registry.entry_state("engine") != EntryState::UnderConstruction && waited < 100 {
        thread::sleep(Duration::from_millis(5));
        waited += 1;
    }
    registry.reset();

    // 重置前开始的构建仍把实例交给调用方，但不会发布
    assert!(builder.join().unwrap().is_ok());
    assert_eq!(registry.entry_state("engine"), EntryState::Unregistered);
    assert!(registry.get_by_id("engine").unwrap_err().is_not_found());
}

#[test]
fn lookups_fail_fast_while_reset_runs() {
    let registry = slow_reset_registry(Duration::from_millis(300));
    registry.register_definition(engine_descriptor(), false).unwrap();
    registry.get_by_id("engine").unwrap();

    let resetter = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.reset())
    };
    thread::sleep(Duration::from_millis(50));

    let error = registry.get_by_id("engine").unwrap_err();
    assert!(matches!(error, DependencyError::RegistryResetting));
    let error = registry.get_typed::<Engine>().unwrap_err();
    assert!(matches!(error, DependencyError::RegistryResetting));

    resetter.join().unwrap();
    assert!(registry.get_by_id("engine").unwrap_err().is_not_found());
}

#[test]
fn overlapping_resets_keep_registry_closed_until_the_last_finishes() {
    let registry = slow_reset_registry(Duration::from_millis(200));
    registry.register_definition(engine_descriptor(), false).unwrap();

    let first = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.reset())
    };
    thread::sleep(Duration::from_millis(50));
    let second = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.reset())
    };
    thread::sleep(Duration::from_millis(20));

    // 第一次重置结束时第二次仍在清空
    first.join().unwrap();
    let error = registry.get_by_id("engine").unwrap_err();
    assert!(matches!(error, DependencyError::RegistryResetting));

    second.join().unwrap();
    assert!(registry.get_by_id("engine").unwrap_err().is_not_found());
}
