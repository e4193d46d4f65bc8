// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use shape_vm::{
    Agent, DefaultHostHooks, JsResult, LanguageMode, NoopHeapHooks, Object, Options,
    PolicyReason, PropertyAttributes, PropertyDescriptor, PropertyKey, ShouldThrow, Value,
    ecmascript::{
        abstract_operations::{
            IntegrityLevel, create_data_property, create_data_property_or_throw, define_accessor,
            define_own_property, delete_property, get, get_own_property_attributes,
            get_own_property_descriptor, has_own_property, has_property, is_extensible,
            own_property_keys, prevent_extensions, set, set_integrity_level,
            test_integrity_level,
        },
        builtins::ordinary::{
            NormalizationMode,
            migration::{migrate_slow_to_fast, normalize_properties},
        },
    },
    heap::verify_object_layout,
};

use IntegrityLevel::{Frozen, Sealed};
use ShouldThrow::{DontThrow, ThrowOnError};

fn agent() -> Agent {
    Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks)
}

fn key(agent: &mut Agent, name: &str) -> PropertyKey {
    PropertyKey::from_str(agent, name)
}

fn object_with(agent: &mut Agent, names: &[&str]) -> (Object, Vec<PropertyKey>) {
    let object = Object::new(agent);
    let keys: Vec<_> = names.iter().map(|name| key(agent, name)).collect();
    for (i, &k) in keys.iter().enumerate() {
        set(agent, object, k, Value::Smi(i as i32), ThrowOnError).unwrap();
    }
    (object, keys)
}

fn forty_two(_: &mut Agent, _: Value, _: &[Value]) -> JsResult<Value> {
    Ok(Value::Smi(42))
}

fn return_this(_: &mut Agent, this: Value, _: &[Value]) -> JsResult<Value> {
    Ok(this)
}

fn store_in_backing(agent: &mut Agent, this: Value, arguments: &[Value]) -> JsResult<Value> {
    let this = this.as_object().unwrap();
    let backing = PropertyKey::from_str(agent, "backing");
    set(agent, this, backing, arguments[0], ThrowOnError)?;
    Ok(Value::Undefined)
}

#[test]
fn sealed_object_keeps_values_but_rejects_new_properties() {
    let mut agent = agent();
    let (object, keys) = object_with(&mut agent, &["a", "b", "c", "d", "e"]);
    assert!(set_integrity_level(&mut agent, object, Sealed, ThrowOnError).unwrap());
    assert!(test_integrity_level(&mut agent, object, Sealed).unwrap());
    assert!(!test_integrity_level(&mut agent, object, Frozen).unwrap());
    for &k in &keys {
        let attributes = get_own_property_attributes(&mut agent, object, k)
            .unwrap()
            .unwrap();
        assert!(!attributes.is_configurable());
        assert!(!attributes.is_read_only());
    }

    let f = key(&mut agent, "f");
    let error = set(&mut agent, object, f, Value::Smi(5), ThrowOnError).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::NotExtensible));
    assert!(!set(&mut agent, object, f, Value::Smi(5), DontThrow).unwrap());
    assert!(!has_own_property(&mut agent, object, f).unwrap());

    for (i, &k) in keys.iter().enumerate() {
        assert_eq!(get(&mut agent, object, k).unwrap(), Value::Smi(i as i32));
        assert!(set(&mut agent, object, k, Value::Smi(100), ThrowOnError).unwrap());
        assert_eq!(get(&mut agent, object, k).unwrap(), Value::Smi(100));
    }
    verify_object_layout(&agent, object).unwrap();
}

#[test]
fn sealing_shapes_are_shared() {
    let mut agent = agent();
    let (first, _) = object_with(&mut agent, &["a", "b"]);
    let (second, _) = object_with(&mut agent, &["a", "b"]);
    set_integrity_level(&mut agent, first, Sealed, ThrowOnError).unwrap();
    set_integrity_level(&mut agent, second, Sealed, ThrowOnError).unwrap();
    assert_eq!(first.shape(&agent), second.shape(&agent));
    assert!(first.has_fast_properties(&agent));
}

#[test]
fn frozen_object_rejects_writes() {
    let mut agent = agent();
    let (object, keys) = object_with(&mut agent, &["a", "b"]);
    set_integrity_level(&mut agent, object, Frozen, ThrowOnError).unwrap();
    assert!(test_integrity_level(&mut agent, object, Frozen).unwrap());
    let error = set(&mut agent, object, keys[0], Value::Smi(9), ThrowOnError).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::ReadOnly));
    assert!(!set(&mut agent, object, keys[1], Value::Smi(9), DontThrow).unwrap());
    assert_eq!(get(&mut agent, object, keys[0]).unwrap(), Value::Smi(0));
    assert_eq!(get(&mut agent, object, keys[1]).unwrap(), Value::Smi(1));
}

#[test]
fn deleting_non_configurable_property() {
    let mut agent = agent();
    let (object, keys) = object_with(&mut agent, &["a", "b"]);
    set_integrity_level(&mut agent, object, Sealed, ThrowOnError).unwrap();
    let shape = object.shape(&agent);

    let error = delete_property(&mut agent, object, keys[0], LanguageMode::Strict).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::NonConfigurable));
    assert!(has_own_property(&mut agent, object, keys[0]).unwrap());

    assert!(!delete_property(&mut agent, object, keys[1], LanguageMode::Sloppy).unwrap());
    assert!(has_own_property(&mut agent, object, keys[1]).unwrap());
    assert_eq!(object.shape(&agent), shape);
    assert_eq!(get(&mut agent, object, keys[1]).unwrap(), Value::Smi(1));
}

#[test]
fn deleting_configurable_properties() {
    let mut agent = agent();
    let (object, keys) = object_with(&mut agent, &["a", "b", "c"]);
    assert!(delete_property(&mut agent, object, keys[2], LanguageMode::Strict).unwrap());
    assert!(!has_own_property(&mut agent, object, keys[2]).unwrap());
    verify_object_layout(&agent, object).unwrap();

    assert!(delete_property(&mut agent, object, keys[0], LanguageMode::Strict).unwrap());
    assert!(!has_own_property(&mut agent, object, keys[0]).unwrap());
    assert_eq!(get(&mut agent, object, keys[1]).unwrap(), Value::Smi(1));
    let remaining = own_property_keys(&mut agent, object).unwrap();
    assert_eq!(remaining, vec![keys[1]]);
    verify_object_layout(&agent, object).unwrap();

    let missing = key(&mut agent, "missing");
    assert!(delete_property(&mut agent, object, missing, LanguageMode::Strict).unwrap());
}

#[test]
fn fast_dictionary_fast_round_trip() {
    let mut agent = agent();
    let (object, keys) = object_with(&mut agent, &["a", "b", "c", "d", "e", "f"]);
    let hidden = key(&mut agent, "hidden");
    define_own_property(
        &mut agent,
        object,
        hidden,
        PropertyDescriptor::new_data_with_attributes(Value::Null, PropertyAttributes::DONT_ENUM),
        ThrowOnError,
    )
    .unwrap();
    let snapshot = |agent: &mut Agent| {
        let keys = own_property_keys(agent, object).unwrap();
        keys.into_iter()
            .map(|k| {
                let descriptor = get_own_property_descriptor(agent, object, k)
                    .unwrap()
                    .unwrap();
                (k, descriptor)
            })
            .collect::<Vec<_>>()
    };
    let before = snapshot(&mut agent);
    assert_eq!(before.len(), keys.len() + 1);

    normalize_properties(
        &mut agent,
        object,
        NormalizationMode::KeepInobjectProperties,
        0,
        "RoundTrip",
    );
    assert!(!object.has_fast_properties(&agent));
    verify_object_layout(&agent, object).unwrap();
    assert_eq!(snapshot(&mut agent), before);

    migrate_slow_to_fast(&mut agent, object, 0, "RoundTrip");
    assert!(object.has_fast_properties(&agent));
    verify_object_layout(&agent, object).unwrap();
    assert_eq!(snapshot(&mut agent), before);
}

#[test]
fn own_data_property_wins_over_inherited_accessor() {
    let mut agent = agent();
    let prototype = Object::new(&mut agent);
    let getter = Object::create_builtin_function(&mut agent, forty_two);
    let x = key(&mut agent, "x");
    define_accessor(
        &mut agent,
        prototype,
        x,
        Some(Some(getter)),
        None,
        PropertyAttributes::NONE,
    )
    .unwrap();
    let receiver = Object::ordinary_object_create(&mut agent, Some(prototype));
    assert_eq!(get(&mut agent, receiver, x).unwrap(), Value::Smi(42));

    create_data_property_or_throw(&mut agent, receiver, x, Value::Smi(1)).unwrap();
    assert_eq!(get(&mut agent, receiver, x).unwrap(), Value::Smi(1));
    assert_eq!(get(&mut agent, prototype, x).unwrap(), Value::Smi(42));
}

#[test]
fn accessors_receive_the_receiver() {
    let mut agent = agent();
    let prototype = Object::new(&mut agent);
    let getter = Object::create_builtin_function(&mut agent, return_this);
    let setter = Object::create_builtin_function(&mut agent, store_in_backing);
    let x = key(&mut agent, "x");
    define_accessor(
        &mut agent,
        prototype,
        x,
        Some(Some(getter)),
        Some(Some(setter)),
        PropertyAttributes::NONE,
    )
    .unwrap();
    let receiver = Object::ordinary_object_create(&mut agent, Some(prototype));
    let this = get(&mut agent, receiver, x).unwrap();
    assert_eq!(this, Value::Object(receiver));

    assert!(set(&mut agent, receiver, x, Value::Smi(5), ThrowOnError).unwrap());
    assert!(!has_own_property(&mut agent, receiver, x).unwrap());
    let backing = key(&mut agent, "backing");
    assert_eq!(get(&mut agent, receiver, backing).unwrap(), Value::Smi(5));
}

#[test]
fn store_to_getter_only_accessor_fails() {
    let mut agent = agent();
    let object = Object::new(&mut agent);
    let getter = Object::create_builtin_function(&mut agent, forty_two);
    let x = key(&mut agent, "x");
    define_accessor(
        &mut agent,
        object,
        x,
        Some(Some(getter)),
        None,
        PropertyAttributes::NONE,
    )
    .unwrap();
    assert!(!set(&mut agent, object, x, Value::Smi(1), DontThrow).unwrap());
    let error = set(&mut agent, object, x, Value::Smi(1), ThrowOnError).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::ReadOnly));
    let descriptor = get_own_property_descriptor(&mut agent, object, x)
        .unwrap()
        .unwrap();
    assert!(descriptor.is_accessor_descriptor());
    assert_eq!(descriptor.get, Some(Some(getter)));
}

#[test]
fn data_and_accessor_redefinition() {
    let mut agent = agent();
    let object = Object::new(&mut agent);
    let x = key(&mut agent, "x");
    set(&mut agent, object, x, Value::Smi(1), ThrowOnError).unwrap();
    let getter = Object::create_builtin_function(&mut agent, forty_two);
    let accessor = PropertyDescriptor {
        get: Some(Some(getter)),
        ..Default::default()
    };
    assert!(define_own_property(&mut agent, object, x, accessor, ThrowOnError).unwrap());
    assert_eq!(get(&mut agent, object, x).unwrap(), Value::Smi(42));

    let data = PropertyDescriptor {
        value: Some(Value::Smi(3)),
        ..Default::default()
    };
    assert!(define_own_property(&mut agent, object, x, data, ThrowOnError).unwrap());
    assert_eq!(get(&mut agent, object, x).unwrap(), Value::Smi(3));
    let attributes = get_own_property_attributes(&mut agent, object, x)
        .unwrap()
        .unwrap();
    // Converting an accessor to data leaves it read-only unless stated.
    assert!(attributes.is_read_only());
    assert!(attributes.is_configurable());
    verify_object_layout(&agent, object).unwrap();
}

#[test]
fn create_data_property_on_non_extensible_object() {
    let mut agent = agent();
    let (object, keys) = object_with(&mut agent, &["a"]);
    assert!(prevent_extensions(&mut agent, object, ThrowOnError).unwrap());
    assert!(!is_extensible(&mut agent, object).unwrap());
    let b = key(&mut agent, "b");
    assert!(!create_data_property(&mut agent, object, b, Value::Smi(1)).unwrap());
    let error = create_data_property_or_throw(&mut agent, object, b, Value::Smi(1)).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::NotExtensible));
    // Existing properties can still be redefined.
    assert!(create_data_property(&mut agent, object, keys[0], Value::Smi(7)).unwrap());
    assert_eq!(get(&mut agent, object, keys[0]).unwrap(), Value::Smi(7));
}

#[test]
fn inherited_properties_are_found() {
    let mut agent = agent();
    let (prototype, keys) = object_with(&mut agent, &["inherited"]);
    let object = Object::ordinary_object_create(&mut agent, Some(prototype));
    assert!(has_property(&mut agent, object, keys[0]).unwrap());
    assert!(!has_own_property(&mut agent, object, keys[0]).unwrap());
    assert_eq!(get(&mut agent, object, keys[0]).unwrap(), Value::Smi(0));
    assert!(prototype.shape(&agent).is_prototype_map(&agent));

    // A later change to the prototype is visible through the chain.
    set(&mut agent, prototype, keys[0], Value::Smi(8), ThrowOnError).unwrap();
    assert_eq!(get(&mut agent, object, keys[0]).unwrap(), Value::Smi(8));
}

#[test]
fn integer_keys_on_ordinary_objects() {
    let mut agent = agent();
    let object = Object::new(&mut agent);
    let index = PropertyKey::Index(3);
    set(&mut agent, object, index, Value::Smi(3), ThrowOnError).unwrap();
    let three = key(&mut agent, "3");
    assert_eq!(three, index);
    assert_eq!(get(&mut agent, object, three).unwrap(), Value::Smi(3));
    assert_eq!(own_property_keys(&mut agent, object).unwrap(), vec![index]);
}
