//! Integration tests for the component space: registration, namespace
//! merging and instance construction.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lattice_space::prelude::*;
use parking_lot::Mutex;
use serde_json::{Value, json};

fn data_of(pairs: &[(&str, Value)]) -> DataMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn register_named(space: &ComponentSpace, name: &str, f: impl FnOnce(&mut RawBuilder)) -> RawBehavior {
    let mut builder = space.define_named(name).unwrap();
    f(&mut builder);
    space.register_behavior(&builder).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Namespace merging
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn import_merges_parent_names() {
    let space = ComponentSpace::default();
    let x = register_named(&space, "x", |b| {
        b.property("visible", PropertyDef::new(PropertyType::Boolean).with_default(true))
            .unwrap();
        b.method("toggle", method(|_, _| Value::Null));
    });

    let y = register_named(&space, "y", |b| {
        b.import(&x).unwrap();
        b.property("label", PropertyDef::new(PropertyType::String)).unwrap();
    });

    let props: Vec<_> = y.namespace().names(FieldKind::Property).collect();
    assert_eq!(props, ["visible", "label"]);
    assert_eq!(y.methods().names().collect::<Vec<_>>(), ["toggle"]);
    assert_eq!(y.parents(), [x]);
}

#[test]
fn conflicting_import_names_both_behaviors() {
    let space = ComponentSpace::default();
    let a = register_named(&space, "a", |b| {
        b.property("label", PropertyDef::default()).unwrap();
    });

    let mut c = space.define_named("c").unwrap();
    c.property("label", PropertyDef::default()).unwrap();

    let err = c.import(&a).unwrap_err();
    match err {
        DefinitionError::DeclarationConflict {
            name,
            existing,
            incoming,
        } => {
            assert_eq!(name, "label");
            assert_eq!(existing.name(), "c");
            assert_eq!(incoming.name(), "a");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(c.parents().is_empty());
}

#[test]
fn diamond_import_is_not_a_conflict() {
    let space = ComponentSpace::default();
    let base = register_named(&space, "base", |b| {
        b.data(DataGenerator::new(["count"], DataMap::new)).unwrap();
    });
    let left = register_named(&space, "left", |b| b.import(&base).unwrap());
    let right = register_named(&space, "right", |b| b.import(&base).unwrap());

    let bottom = register_named(&space, "bottom", |b| {
        b.import(&left).unwrap();
        b.import(&right).unwrap();
    });

    let chain: Vec<_> = bottom.chain().map(RawBehavior::name).collect();
    assert_eq!(chain, ["base", "left", "right", "bottom"]);
    assert_eq!(bottom.namespace().len(), 1);
}

#[test]
fn later_methods_override_earlier_ones() {
    let space = ComponentSpace::default();
    let a = register_named(&space, "a", |b| {
        b.method("describe", method(|_, _| json!("a")));
    });
    let b = register_named(&space, "b", |b| {
        b.method("describe", method(|_, _| json!("b")));
    });
    let both = register_named(&space, "both", |builder| {
        builder.import(&a).unwrap();
        builder.import(&b).unwrap();
    });

    let instance = space.instantiate(&both, DataMap::new()).unwrap();
    assert_eq!(instance.call_method("describe", Value::Null).unwrap(), "b");
    assert_eq!(both.methods().origin_of("describe").map(Origin::name), Some("b"));
}

#[test]
fn bad_default_type_is_rejected() {
    let space = ComponentSpace::default();
    let mut builder = space.define().unwrap();
    let err = builder
        .property("count", PropertyDef::new(PropertyType::Number).with_default("zero"))
        .unwrap_err();
    assert!(matches!(
        err,
        DefinitionError::PropertyTypeMismatch { expected: PropertyType::Number, found: "string", .. }
    ));
}

#[test]
fn observer_on_unknown_field_fails_registration() {
    let space = ComponentSpace::default();
    let mut builder = space.define_named("watcher").unwrap();
    builder.observer("missing", observer(|_, _, _| {}));

    assert!(matches!(
        space.register_behavior(&builder),
        Err(DefinitionError::UnknownObserverTarget { ref name, .. }) if name == "missing"
    ));
}

#[test]
fn edits_through_declarations_are_validated() {
    let space = ComponentSpace::default();
    let mut builder = space.define_named("edited").unwrap();
    builder.property("title", PropertyDef::default()).unwrap();
    builder
        .declarations_mut()
        .add_property("title", PropertyDef::default());

    assert!(builder.validate().is_err());
    assert!(matches!(
        space.register_behavior(&builder),
        Err(DefinitionError::DeclarationConflict { .. })
    ));
    assert_eq!(space.registered_count(), 0);
}

#[test]
fn foreign_parent_is_rejected() {
    let home = ComponentSpace::default();
    let away = ComponentSpace::default();
    let stranger = register_named(&away, "stranger", |_| {});

    let mut builder = home.define().unwrap();
    assert!(matches!(
        builder.import(&stranger),
        Err(DefinitionError::Misuse(MisuseKind::ForeignSpace))
    ));
    assert!(matches!(
        home.instantiate(&stranger, DataMap::new()),
        Err(InstanceError::Misuse(MisuseKind::ForeignSpace))
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance construction
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn properties_materialize_from_supplied_default_or_zero() {
    let space = ComponentSpace::default();
    let widget = register_named(&space, "widget", |b| {
        b.property("visible", PropertyDef::new(PropertyType::Boolean).with_default(true))
            .unwrap();
        b.property("label", PropertyDef::new(PropertyType::String)).unwrap();
        b.property("size", PropertyDef::new(PropertyType::Number)).unwrap();
    });

    let instance = space
        .instantiate(&widget, data_of(&[("size", json!(3))]))
        .unwrap();
    assert_eq!(instance.property("visible").unwrap(), true);
    assert_eq!(instance.property("label").unwrap(), "");
    assert_eq!(instance.property("size").unwrap(), 3);
    assert!(instance.is_ready());
}

#[test]
fn unknown_or_mistyped_initial_values_fail() {
    let space = ComponentSpace::default();
    let widget = register_named(&space, "widget", |b| {
        b.property("size", PropertyDef::new(PropertyType::Number)).unwrap();
    });

    assert!(matches!(
        space.instantiate(&widget, data_of(&[("color", json!("red"))])),
        Err(InstanceError::UnknownProperty(ref name)) if name == "color"
    ));
    assert!(matches!(
        space.instantiate(&widget, data_of(&[("size", json!("big"))])),
        Err(InstanceError::PropertyTypeMismatch { .. })
    ));
}

#[test]
fn generators_run_once_per_instance() {
    let space = ComponentSpace::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let behavior = register_named(&space, "gen", move |b| {
        b.data(DataGenerator::new(["items", "cursor"], move || {
            counter.fetch_add(1, Ordering::SeqCst);
            data_of(&[("items", json!([]))])
        }))
        .unwrap();
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let first = space.instantiate(&behavior, DataMap::new()).unwrap();
    let _second = space.instantiate(&behavior, DataMap::new()).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(first.data("items").unwrap(), json!([]));
    assert_eq!(first.data("cursor").unwrap(), Value::Null);
}

#[test]
fn undeclared_generated_field_depends_on_config() {
    let generator = || {
        DataGenerator::new(["count"], || {
            data_of(&[("count", json!(0)), ("extra", json!(true))])
        })
    };

    let strict = ComponentSpace::default();
    let behavior = register_named(&strict, "noisy", |b| b.data(generator()).unwrap());
    assert!(matches!(
        strict.instantiate(&behavior, DataMap::new()),
        Err(InstanceError::UndeclaredDataField { ref name, .. }) if name == "extra"
    ));

    let lenient = ComponentSpace::new(SpaceConfig::new().with_strict_data_fields(false));
    let behavior = register_named(&lenient, "noisy", |b| b.data(generator()).unwrap());
    let instance = lenient.instantiate(&behavior, DataMap::new()).unwrap();
    assert_eq!(instance.data("extra").unwrap(), true);
    assert_eq!(instance.field_names(), ["count", "extra"]);
}

#[test]
fn lenient_extra_field_still_conflicts_with_declared_names() {
    let space = ComponentSpace::new(SpaceConfig::new().with_strict_data_fields(false));
    let owner = register_named(&space, "owner", |b| {
        b.property("title", PropertyDef::default()).unwrap();
    });
    let thief = register_named(&space, "thief", |b| {
        b.import(&owner).unwrap();
        b.data(DataGenerator::new(Vec::<String>::new(), || {
            data_of(&[("title", json!("mine"))])
        }))
        .unwrap();
    });

    match space.instantiate(&thief, DataMap::new()) {
        Err(InstanceError::DeclarationConflict {
            name,
            existing,
            incoming,
        }) => {
            assert_eq!(name, "title");
            assert_eq!(existing.name(), "owner");
            assert_eq!(incoming.name(), "thief");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn init_hooks_run_in_chain_order_after_materialization() {
    let space = ComponentSpace::default();
    let log = Arc::new(Mutex::new(Vec::new()));

    let parent_log = Arc::clone(&log);
    let parent = register_named(&space, "parent", move |b| {
        b.data(DataGenerator::new(["seed"], || data_of(&[("seed", json!(7))])))
            .unwrap();
        b.init(init_hook(move |ctx| {
            parent_log.lock().push("parent");
            ctx.data("seed").unwrap().as_i64().unwrap_or_default() * 2
        }));
    });

    let child_log = Arc::clone(&log);
    let parent_id = parent.id();
    let child = register_named(&space, "child", move |b| {
        b.import(&parent).unwrap();
        b.data(DataGenerator::new(["late"], || data_of(&[("late", json!("here"))])))
            .unwrap();
        b.init(init_hook(move |ctx| {
            child_log.lock().push("child");
            // Fields of the whole chain are in place, and the parent already exported.
            assert_eq!(ctx.data("late").unwrap(), "here");
            let helper = ctx.export::<i64>(parent_id).map(|v| *v).unwrap_or_default();
            format!("helper={helper}")
        }));
    });

    let instance = space.instantiate(&child, DataMap::new()).unwrap();
    assert_eq!(*log.lock(), ["parent", "child"]);
    assert_eq!(instance.init_export::<i64>(parent_id).as_deref(), Some(&14));
    assert_eq!(
        instance.init_export::<String>(child.id()).as_deref().map(String::as_str),
        Some("helper=14")
    );
    assert!(instance.has_behavior(parent_id));
}

#[test]
fn second_init_replaces_first() {
    let space = ComponentSpace::default();
    let mut builder = space.define_named("twice").unwrap();
    assert!(!builder.init(init_hook(|_| "first")));
    assert!(builder.init(init_hook(|_| "second")));
    let behavior = space.register_behavior(&builder).unwrap();

    let instance = space.instantiate(&behavior, DataMap::new()).unwrap();
    assert_eq!(instance.init_export::<&'static str>(behavior.id()).as_deref(), Some(&"second"));
}

#[test]
fn observers_fire_only_on_change() {
    let space = ComponentSpace::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let behavior = register_named(&space, "observed", move |b| {
        b.property(
            "visible",
            PropertyDef::new(PropertyType::Boolean).with_observer(move |_, new, old| {
                sink.lock().push((new.clone(), old.clone()));
            }),
        )
        .unwrap();
    });

    let instance = space.instantiate(&behavior, DataMap::new()).unwrap();
    instance.set_data("visible", false).unwrap();
    instance.set_data("visible", true).unwrap();
    instance.set_data("visible", true).unwrap();

    assert_eq!(*seen.lock(), [(json!(true), json!(false))]);
}

#[test]
fn methods_can_write_back_through_observers() {
    let space = ComponentSpace::default();
    let behavior = register_named(&space, "mirror", |b| {
        b.data(DataGenerator::new(["source", "copy"], DataMap::new)).unwrap();
        b.observer(
            "source",
            observer(|instance, new, _| {
                instance.set_data("copy", new.clone()).unwrap();
            }),
        );
        b.method(
            "write",
            method(|instance, args| {
                instance.set_data("source", args).unwrap();
                Value::Null
            }),
        );
    });

    let instance = space.instantiate(&behavior, DataMap::new()).unwrap();
    instance.call_method("write", json!("hello")).unwrap();
    assert_eq!(instance.data("copy").unwrap(), "hello");
    assert!(matches!(
        instance.call_method("missing", Value::Null),
        Err(InstanceError::UnknownMethod(_))
    ));
}

#[test]
fn property_writes_are_type_checked_unless_disabled() {
    let strict = ComponentSpace::default();
    let behavior = register_named(&strict, "typed", |b| {
        b.property("size", PropertyDef::new(PropertyType::Number)).unwrap();
    });
    let instance = strict.instantiate(&behavior, DataMap::new()).unwrap();
    assert!(matches!(
        instance.set_data("size", "large"),
        Err(InstanceError::PropertyTypeMismatch { .. })
    ));
    assert!(matches!(
        instance.set_data("nope", 1),
        Err(InstanceError::UnknownField(_))
    ));

    let lenient = ComponentSpace::new(SpaceConfig::new().with_property_type_check(false));
    let behavior = register_named(&lenient, "typed", |b| {
        b.property("size", PropertyDef::new(PropertyType::Number)).unwrap();
    });
    let instance = lenient.instantiate(&behavior, DataMap::new()).unwrap();
    instance.set_data("size", "large").unwrap();
    assert_eq!(instance.property("size").unwrap(), "large");
}

#[test]
fn closed_space_rejects_instantiation() {
    let space = ComponentSpace::default();
    let behavior = register_named(&space, "early", |_| {});
    let instance = space.instantiate(&behavior, DataMap::new()).unwrap();
    space.close();

    assert!(matches!(
        space.instantiate(&behavior, DataMap::new()),
        Err(InstanceError::Misuse(MisuseKind::SpaceClosed))
    ));
    assert!(instance.is_ready());
}
