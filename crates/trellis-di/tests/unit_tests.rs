//! Unit tests for the container core: store hierarchy, scopes and errors.

use std::sync::Arc;

use trellis_di::{
    BeanContext, BeanProvider, ConstantBeanProvider, ContainerBuilder, Dependency, InjectionError,
    LifecycleBeanProvider,
};

fn constant(value: i32) -> Arc<dyn BeanProvider> {
    Arc::new(ConstantBeanProvider::new(value))
}

/// Singleton producing `<dep> + 1`.
fn adder(dep: &str) -> Arc<dyn BeanProvider> {
    let dep = Dependency::on_name(dep);
    let lookup = dep.clone();
    Arc::new(LifecycleBeanProvider::singleton_fn(
        vec![dep],
        move |ctx| {
            let base = ctx.get_dependent_bean(&lookup)?;
            let base = base.downcast::<i32>().expect("an i32 bean");
            Ok(*base + 1)
        },
    ))
}

#[test]
fn singleton_is_cached() {
    let mut builder = ContainerBuilder::new();
    builder
        .add_bean_provider(
            None,
            "value",
            Arc::new(LifecycleBeanProvider::singleton_fn(vec![], |_| {
                Ok(String::from("produced"))
            })),
        )
        .unwrap();

    let context = BeanContext::new(builder.build().root());
    let first = context.get_named_bean::<String>("value").unwrap();
    let second = context.get_named_bean::<String>("value").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn factory_produces_fresh_instances() {
    let mut builder = ContainerBuilder::new();
    builder
        .add_bean_provider(
            None,
            "value",
            Arc::new(LifecycleBeanProvider::factory_fn(vec![], |_| {
                Ok(String::from("produced"))
            })),
        )
        .unwrap();

    let context = BeanContext::new(builder.build().root());
    let first = context.get_named_bean::<String>("value").unwrap();
    let second = context.get_named_bean::<String>("value").unwrap();
    assert_eq!(first, second);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn child_definition_shadows_parent() {
    let mut builder = ContainerBuilder::new();
    builder.add_bean_store("child", None).unwrap();
    builder
        .add_bean_provider(None, "value", constant(1))
        .unwrap();
    builder
        .add_bean_provider(Some("child"), "value", constant(2))
        .unwrap();

    let stores = builder.build();
    let context = BeanContext::new(stores.root());
    let child = stores.store("child").unwrap();

    let from_child = context.get_named_bean_in::<i32>("value", &child).unwrap();
    assert_eq!(*from_child, 2);
    let from_root = context.get_named_bean::<i32>("value").unwrap();
    assert_eq!(*from_root, 1);
}

#[test]
fn lookup_delegates_to_parent() {
    let mut builder = ContainerBuilder::new();
    builder.add_bean_store("child", None).unwrap();
    builder
        .add_bean_provider(None, "value", constant(1))
        .unwrap();

    let stores = builder.build();
    let context = BeanContext::new(stores.root());
    let child = stores.store("child").unwrap();

    let resolved = context.get_named_bean_in::<i32>("value", &child).unwrap();
    assert_eq!(*resolved, 1);
}

#[test]
fn dependent_bean_across_stores() {
    // root defines "a" -> 1; child defines "b" -> a + 1
    let mut builder = ContainerBuilder::new();
    builder.add_bean_store("child", None).unwrap();
    builder.add_bean_provider(None, "a", constant(1)).unwrap();
    builder
        .add_bean_provider(Some("child"), "b", adder("a"))
        .unwrap();

    let stores = builder.build();
    let context = BeanContext::new(stores.root());
    let child = stores.store("child").unwrap();

    assert_eq!(*context.get_named_bean_in::<i32>("b", &child).unwrap(), 2);
    assert_eq!(*context.get_named_bean_in::<i32>("a", &child).unwrap(), 1);

    let from_root = context.get_named_bean::<i32>("b");
    assert!(matches!(from_root, Err(InjectionError::NotFound { .. })));
}

#[test]
fn direct_cycle_is_detected() {
    let mut builder = ContainerBuilder::new();
    builder.add_bean_provider(None, "a", adder("b")).unwrap();
    builder.add_bean_provider(None, "b", adder("a")).unwrap();

    let context = BeanContext::new(builder.build().root());
    let result = context.get_named_bean::<i32>("a");
    match result {
        Err(InjectionError::CircularDependency { chain }) => {
            assert!(chain.contains("'a'"));
            assert!(chain.contains("'b'"));
        }
        other => panic!("expected a cycle error, got {other:?}"),
    }
}

#[test]
fn self_cycle_is_detected() {
    let mut builder = ContainerBuilder::new();
    builder.add_bean_provider(None, "a", adder("a")).unwrap();

    let context = BeanContext::new(builder.build().root());
    let result = context.get_named_bean::<i32>("a");
    assert!(matches!(
        result,
        Err(InjectionError::CircularDependency { .. })
    ));
}

#[test]
fn type_lookup_prefers_child_store() {
    let mut builder = ContainerBuilder::new();
    builder.add_bean_store("child", None).unwrap();
    builder
        .add_bean_provider(None, "root_value", constant(1))
        .unwrap();
    builder
        .add_bean_provider(Some("child"), "child_value", constant(2))
        .unwrap();

    let stores = builder.build();
    let context = BeanContext::new(stores.root());
    let child = stores.store("child").unwrap();

    // first match in the child wins over the ancestor definition
    assert_eq!(*context.get_bean_in::<i32>(&child).unwrap(), 2);
    assert_eq!(*context.get_bean::<i32>().unwrap(), 1);
}

#[test]
fn type_lookup_is_deterministic_within_a_store() {
    let mut builder = ContainerBuilder::new();
    builder
        .add_bean_provider(None, "beta", constant(20))
        .unwrap();
    builder
        .add_bean_provider(None, "alpha", constant(10))
        .unwrap();

    let context = BeanContext::new(builder.build().root());
    // lexicographic name order: "alpha" is enumerated first
    assert_eq!(*context.get_bean::<i32>().unwrap(), 10);
}

#[test]
fn contains_bean_never_fails() {
    let mut builder = ContainerBuilder::new();
    builder
        .add_bean_provider(None, "value", constant(1))
        .unwrap();

    let context = BeanContext::new(builder.build().root());
    assert!(context.contains_bean_named("value"));
    assert!(!context.contains_bean_named("ghost"));
    assert!(context.contains_bean::<i32>());
    assert!(!context.contains_bean::<String>());
}

#[test]
fn bean_names_union_over_the_chain() {
    let mut builder = ContainerBuilder::new();
    builder.add_bean_store("child", None).unwrap();
    builder
        .add_bean_provider(None, "shared", constant(1))
        .unwrap();
    builder
        .add_bean_provider(None, "root_only", constant(2))
        .unwrap();
    builder
        .add_bean_provider(Some("child"), "shared", constant(3))
        .unwrap();
    builder
        .add_bean_provider(Some("child"), "child_only", constant(4))
        .unwrap();

    let stores = builder.build();
    let context = BeanContext::new(stores.root());
    let child = stores.store("child").unwrap();

    let names = context.bean_names_in(&child);
    assert_eq!(
        names.into_iter().collect::<Vec<_>>(),
        vec!["child_only", "root_only", "shared"]
    );
}

#[test]
fn bean_name_for_reverse_lookup() {
    let provider = constant(1);
    let shadow = constant(2);

    let mut builder = ContainerBuilder::new();
    builder.add_bean_store("child", None).unwrap();
    builder
        .add_bean_provider(None, "value", provider.clone())
        .unwrap();
    builder
        .add_bean_provider(Some("child"), "other", shadow.clone())
        .unwrap();

    let stores = builder.build();
    let context = BeanContext::new(stores.root());
    let child = stores.store("child").unwrap();

    assert_eq!(
        context.bean_name_for_in(&provider, &child),
        Some("value".to_string())
    );
    assert_eq!(
        context.bean_name_for_in(&shadow, &child),
        Some("other".to_string())
    );
    // not reachable from the root store
    assert_eq!(context.bean_name_for(&shadow), None);

    let unregistered = constant(9);
    assert_eq!(context.bean_name_for(&unregistered), None);
}

#[test]
fn named_bean_type_mismatch() {
    let mut builder = ContainerBuilder::new();
    builder
        .add_bean_provider(None, "value", constant(1))
        .unwrap();

    let context = BeanContext::new(builder.build().root());
    let result = context.get_named_bean::<String>("value");
    assert!(matches!(result, Err(InjectionError::TypeMismatch { .. })));
}

#[test]
fn anonymous_beans_resolve_but_stay_hidden() {
    let mut builder = ContainerBuilder::new();
    let mut names = Vec::new();
    for i in 0..5 {
        names.push(
            builder
                .add_anonymous_bean_provider(None, constant(i))
                .unwrap(),
        );
    }

    let mut deduped = names.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), names.len());

    let stores = builder.build();
    let context = BeanContext::new(stores.root());
    for (i, name) in names.iter().enumerate() {
        assert_eq!(*context.get_named_bean::<i32>(name).unwrap(), i as i32);
    }
    assert!(context.bean_names().is_empty());
}

#[test]
fn default_store_can_be_swapped() {
    let mut builder = ContainerBuilder::new();
    builder.add_bean_store("other", None).unwrap();
    builder.add_bean_provider(None, "value", constant(1)).unwrap();
    builder
        .add_bean_provider(Some("other"), "value", constant(2))
        .unwrap();

    let stores = builder.build();
    let context = BeanContext::new(stores.root());
    assert_eq!(*context.get_named_bean::<i32>("value").unwrap(), 1);

    context.set_default_store(stores.store("other").unwrap());
    assert_eq!(*context.get_named_bean::<i32>("value").unwrap(), 2);
}

#[test]
fn production_failures_name_the_requested_bean() {
    let mut builder = ContainerBuilder::new();
    builder
        .add_bean_provider(None, "b", adder("missing"))
        .unwrap();

    let context = BeanContext::new(builder.build().root());
    match context.get_named_bean::<i32>("b") {
        Err(InjectionError::Production { name, source }) => {
            assert_eq!(name, "'b'");
            assert!(matches!(*source, InjectionError::NotFound { .. }));
        }
        other => panic!("expected a wrapped production error, got {other:?}"),
    }
}

#[test]
fn bean_classes_reports_reachable_types() {
    let mut builder = ContainerBuilder::new();
    builder.add_bean_store("child", None).unwrap();
    builder
        .add_bean_provider(None, "number", constant(1))
        .unwrap();
    builder
        .add_bean_provider(
            Some("child"),
            "text",
            Arc::new(ConstantBeanProvider::new(String::from("x"))),
        )
        .unwrap();

    let stores = builder.build();
    let context = BeanContext::new(stores.root());
    let child = stores.store("child").unwrap();

    let classes = context.bean_classes_in(&child).unwrap();
    assert_eq!(classes.len(), 2);
    let root_classes = context.bean_classes().unwrap();
    assert_eq!(root_classes.len(), 1);
}
