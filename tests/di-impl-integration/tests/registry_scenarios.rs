//! 组件注册表端到端场景测试

mod common;

use common::*;
use di_abstractions::{ComponentRegistry, ComponentRegistryExt, MembershipKind, RegistryConfig, RegistryStats};
use di_impl::{ComponentRegistryImpl, DescriptorBuilder, SlotBuilder};
use infrastructure_common::{
    downcast_instance, ComponentInstance, DependencyError, EntryState, GenericArg, InstanceRecord,
    TypeInfo,
};
use once_cell::sync::OnceCell;
use std::any::type_name;
use std::sync::Arc;

trait Entity: Send + Sync {}

trait Repository: Send + Sync {
    fn table(&self) -> &'static str;
}

struct User;
struct Order;

impl Entity for User {}
impl Entity for Order {}

struct UserRepository;
struct OrderRepository;

impl Repository for UserRepository {
    fn table(&self) -> &'static str {
        "users"
    }
}

impl Repository for OrderRepository {
    fn table(&self) -> &'static str {
        "orders"
    }
}

#[derive(Default)]
struct OrderService {
    repository: OnceCell<Arc<dyn Repository>>,
}

#[derive(Default)]
struct Alpha {
    beta: OnceCell<Arc<Beta>>,
}

#[derive(Default)]
struct Beta {
    alpha: OnceCell<Arc<Alpha>>,
}

#[derive(Default)]
struct Dashboard {
    engine: OnceCell<Arc<Engine>>,
}

#[derive(Debug)]
struct Overheated;

impl std::fmt::Display for Overheated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "发动机过热")
    }
}

impl std::error::Error for Overheated {}

fn entity(type_info: TypeInfo) -> GenericArg {
    GenericArg::concrete(type_info.assignable_to::<dyn Entity>())
}

/// 两个仓储实例都可赋值给 `dyn Repository`，只有泛型参数不同
fn repository_registry() -> Arc<ComponentRegistryImpl> {
    let registry = registry_with(Vec::new());
    let users: ComponentInstance = Arc::new(UserRepository);
    let orders: ComponentInstance = Arc::new(OrderRepository);
    registry
        .register_instance(
            InstanceRecord::raw(
                users,
                TypeInfo::of::<UserRepository>().assignable_to::<dyn Repository>(),
            )
            .with_id("userRepository")
            .with_generic_args(vec![entity(TypeInfo::of::<User>())]),
            false,
        )
        .unwrap();
    registry
        .register_instance(
            InstanceRecord::raw(
                orders,
                TypeInfo::of::<OrderRepository>().assignable_to::<dyn Repository>(),
            )
            .with_id("orderRepository")
            .with_generic_args(vec![entity(TypeInfo::of::<Order>())]),
            false,
        )
        .unwrap();
    registry
}

#[test]
fn car_receives_the_shared_engine() {
    let registry = registry_with(vec![engine_descriptor(), car_descriptor()]);

    let car = registry.get_as::<Car>("car").unwrap();
    let engine = registry.get_as::<Engine>("engine").unwrap();

    assert!(Arc::ptr_eq(car.engine.get().unwrap(), &engine));
    assert!(Arc::ptr_eq(&car, &registry.get_as::<Car>("car").unwrap()));
    assert!(Arc::ptr_eq(&car, &registry.get_typed::<Car>().unwrap()));
    assert_eq!(registry.entry_state("car"), EntryState::Published);
    assert_eq!(registry.entry_state("engine"), EntryState::Published);

    let stats = registry.stats();
    assert_eq!(stats.definitions, 2);
    assert_eq!(stats.published_singletons, 2);
    assert_eq!(stats.creations, 2);
    assert_eq!(stats.failures, 0);
}

#[test]
fn prototype_dependents_share_singleton_dependencies() {
    let registry = registry_with(vec![engine_descriptor()]);
    registry
        .register_definition(
            DescriptorBuilder::new(Car::default)
                .id("car")
                .prototype()
                .slot(SlotBuilder::inject("engine", |car: &Car, engine: Arc<Engine>| {
                    let _ = car.engine.set(engine);
                }))
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

    let first = registry.get_as::<Car>("car").unwrap();
    let second = registry.get_as::<Car>("car").unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(first.engine.get().unwrap(), second.engine.get().unwrap()));
    assert_eq!(registry.entry_state("car"), EntryState::Defined);
}

#[test]
fn duplicate_definitions_are_rejected_unless_overwritten() {
    let registry = registry_with(vec![engine_descriptor()]);

    let error = registry.register_definition(engine_descriptor(), false).unwrap_err();
    assert!(matches!(error, DependencyError::DefinitionExists { ref key } if key == "engine"));

    let replacement = registry
        .register_definition(
            DescriptorBuilder::new(Engine::default)
                .id("engine")
                .description("替换的发动机")
                .build()
                .unwrap(),
            true,
        )
        .unwrap();

    let stored = registry.descriptor_by_id("engine").unwrap();
    assert!(Arc::ptr_eq(&stored, &replacement));
    assert_eq!(stored.description(), Some("替换的发动机"));
    assert_eq!(registry.membership_kind(&stored), MembershipKind::ById);
}

#[test]
fn overwriting_a_published_definition_rebuilds_the_component() {
    let registry = registry_with(vec![engine_descriptor()]);
    let original = registry.get_as::<Engine>("engine").unwrap();

    registry
        .register_definition(
            DescriptorBuilder::new(Engine::default)
                .id("engine")
                .description("替换的发动机")
                .build()
                .unwrap(),
            true,
        )
        .unwrap();
    assert_eq!(registry.entry_state("engine"), EntryState::Defined);

    let by_type = registry.get_typed::<Engine>().unwrap();
    let by_id = registry.get_as::<Engine>("engine").unwrap();
    assert!(Arc::ptr_eq(&by_type, &by_id));
    assert!(!Arc::ptr_eq(&by_id, &original));
    assert_eq!(registry.stats().published_singletons, 1);
}

#[test]
fn anonymous_definitions_are_indexed_by_type_name() {
    let registry = registry_with(vec![DescriptorBuilder::new(Engine::default).build().unwrap()]);

    let stored = registry.descriptor_by_type_name(type_name::<Engine>()).unwrap();
    assert_eq!(registry.membership_kind(&stored), MembershipKind::ByTypeName);
    assert!(registry.has_component_of_type(type_name::<Engine>()));
    assert!(!registry.has_component("engine"));

    let error = registry
        .register_definition(DescriptorBuilder::new(Engine::default).build().unwrap(), false)
        .unwrap_err();
    assert!(matches!(error, DependencyError::DefinitionExists { .. }));
}

#[test]
fn raw_instances_conflict_on_identifier() {
    let registry = registry_with(Vec::new());
    let first: ComponentInstance = Arc::new(Engine::default());
    let second: ComponentInstance = Arc::new(Engine::default());

    registry
        .register_instance(InstanceRecord::raw(first, TypeInfo::of::<Engine>()).with_id("engine"), false)
        .unwrap();
    let error = registry
        .register_instance(InstanceRecord::raw(second, TypeInfo::of::<Engine>()).with_id("engine"), false)
        .unwrap_err();

    assert!(matches!(error, DependencyError::InstanceExists { .. }));
    assert_eq!(registry.entry_state("engine"), EntryState::Published);
}

#[test]
fn circular_dependency_names_every_participant() {
    let registry = registry_with(vec![
        DescriptorBuilder::new(Alpha::default)
            .id("alpha")
            .slot(SlotBuilder::inject("beta", |alpha: &Alpha, beta: Arc<Beta>| {
                let _ = alpha.beta.set(beta);
            }))
            .build()
            .unwrap(),
        DescriptorBuilder::new(Beta::default)
            .id("beta")
            .slot(SlotBuilder::inject("alpha", |beta: &Beta, alpha: Arc<Alpha>| {
                let _ = beta.alpha.set(alpha);
            }))
            .build()
            .unwrap(),
    ]);

    let error = registry.get_by_id("alpha").unwrap_err();
    let DependencyError::CircularDependency { chain } = &error else {
        panic!("期望循环依赖错误，实际为: {error}");
    };
    assert!(chain.iter().any(|name| name == type_name::<Alpha>()));
    assert!(chain.iter().any(|name| name == type_name::<Beta>()));
    assert_eq!(chain.first(), chain.last());

    assert_ne!(registry.entry_state("alpha"), EntryState::Published);
    assert_ne!(registry.entry_state("beta"), EntryState::Published);
    let stats = registry.stats();
    assert_eq!(stats.published_singletons, 0);
    assert_eq!(stats.half_initialized, 0);
}

#[test]
fn generic_arguments_disambiguate_candidates() {
    let registry = repository_registry();
    let repository = type_name::<dyn Repository>();

    let error = registry.get_by_type(repository, &[]).unwrap_err();
    let DependencyError::AmbiguousComponent { candidates, .. } = &error else {
        panic!("期望多个候选错误，实际为: {error}");
    };
    assert_eq!(candidates.len(), 2);

    let users = registry
        .get_by_type(repository, &[GenericArg::of::<User>()])
        .unwrap();
    assert!(users.downcast::<UserRepository>().is_ok());

    let orders = registry
        .get_by_type(repository, &[GenericArg::of::<Order>()])
        .unwrap();
    assert!(orders.downcast::<OrderRepository>().is_ok());
}

#[test]
fn wildcard_bounds_accept_every_subtype() {
    let registry = repository_registry();
    let repository = type_name::<dyn Repository>();

    let error = registry
        .get_by_type(repository, &[GenericArg::extends(TypeInfo::of::<dyn Entity>())])
        .unwrap_err();
    assert!(matches!(error, DependencyError::AmbiguousComponent { .. }));

    let error = registry
        .get_by_type(repository, &[GenericArg::of::<String>()])
        .unwrap_err();
    assert!(error.is_not_found());
    assert!(registry
        .find_by_type(repository, &[GenericArg::of::<String>()])
        .unwrap()
        .is_none());
}

#[test]
fn generic_slot_is_injected_with_matching_candidate() {
    let registry = repository_registry();
    registry
        .register_definition(
            DescriptorBuilder::new(OrderService::default)
                .id("orderService")
                .slot(
                    SlotBuilder::inject_with(
                        "repository",
                        TypeInfo::of::<dyn Repository>(),
                        |service: &OrderService, value| {
                            let repository: Arc<dyn Repository> =
                                downcast_instance::<OrderRepository>(value, "repository")?;
                            let _ = service.repository.set(repository);
                            Ok(())
                        },
                    )
                    .generic_arg(GenericArg::of::<Order>()),
                )
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

    let service = registry.get_as::<OrderService>("orderService").unwrap();
    assert_eq!(service.repository.get().unwrap().table(), "orders");
}

#[test]
fn required_slot_fails_and_optional_slot_stays_empty() {
    let registry = registry_with(vec![car_descriptor()]);
    let error = registry.get_by_id("car").unwrap_err();
    assert!(error.is_not_found());
    assert_eq!(registry.entry_state("car"), EntryState::Failed);
    assert_eq!(registry.stats().half_initialized, 0);

    registry
        .register_definition(
            DescriptorBuilder::new(Dashboard::default)
                .id("dashboard")
                .slot(
                    SlotBuilder::inject("engine", |dashboard: &Dashboard, engine: Arc<Engine>| {
                        let _ = dashboard.engine.set(engine);
                    })
                    .optional(),
                )
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

    let dashboard = registry.get_as::<Dashboard>("dashboard").unwrap();
    assert!(dashboard.engine.get().is_none());
    assert_eq!(registry.entry_state("dashboard"), EntryState::Published);
}

#[test]
fn optional_slot_still_propagates_construction_failures() {
    let registry = registry_with(vec![
        DescriptorBuilder::<Engine>::try_new(|| Err(Overheated))
            .id("engine")
            .build()
            .unwrap(),
        DescriptorBuilder::new(Dashboard::default)
            .id("dashboard")
            .slot(
                SlotBuilder::inject("engine", |dashboard: &Dashboard, engine: Arc<Engine>| {
                    let _ = dashboard.engine.set(engine);
                })
                .optional(),
            )
            .build()
            .unwrap(),
    ]);

    let error = registry.get_by_id("dashboard").unwrap_err();
    assert!(matches!(error, DependencyError::ConstructionFailure { .. }));
    assert!(error.to_string().contains("发动机过热"));
    assert_eq!(registry.entry_state("dashboard"), EntryState::Failed);
}

#[test]
fn failed_singleton_can_be_retried() {
    let registry = registry_with(vec![car_descriptor()]);
    assert!(registry.get_by_id("car").is_err());

    registry.register_definition(engine_descriptor(), false).unwrap();
    let car = registry.get_as::<Car>("car").unwrap();

    assert!(car.engine.get().is_some());
    assert_eq!(registry.entry_state("car"), EntryState::Published);
}

#[test]
fn resolution_depth_is_bounded() {
    let registry = Arc::new(ComponentRegistryImpl::with_config(RegistryConfig {
        max_resolution_depth: 1,
        ..Default::default()
    }));
    registry.register_definition(engine_descriptor(), false).unwrap();
    registry.register_definition(car_descriptor(), false).unwrap();

    let error = registry.get_by_id("car").unwrap_err();
    assert!(matches!(error, DependencyError::ResolutionDepthExceeded { max_depth: 1, .. }));
    assert!(registry.get_by_id("engine").is_ok());
}

#[test]
fn reset_forgets_everything() {
    let registry = registry_with(vec![engine_descriptor(), car_descriptor()]);
    registry.get_by_id("car").unwrap();

    registry.reset();

    assert_eq!(registry.stats(), RegistryStats::default());
    assert_eq!(registry.entry_state("car"), EntryState::Unregistered);
    assert!(registry.get_by_id("car").unwrap_err().is_not_found());

    registry.register_definition(engine_descriptor(), false).unwrap();
    assert!(registry.get_by_id("engine").is_ok());
}
