// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use shape_vm::{
    Agent, DefaultHostHooks, NoopHeapHooks, Object, Options, PropertyAttributes, PropertyKey,
    ShouldThrow, Value,
    ecmascript::{
        abstract_operations::{define_own_property_ignore_attributes, get, set},
        builtins::ordinary::{
            ElementsKind, ObjectShape, TransitionKey, migration::transition_elements_kind,
            shape_updater::{try_update, update},
        },
        types::{Name, PropertyKind, Representation},
    },
    heap::verify_object_layout,
};

use ShouldThrow::ThrowOnError;

fn agent() -> Agent {
    Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks)
}

fn representation_of(agent: &Agent, shape: ObjectShape, name: Name) -> Representation {
    let descriptor = shape.lookup_descriptor(agent, name).unwrap();
    shape.descriptor_details(agent, descriptor).representation()
}

fn load(agent: &mut Agent, object: Object, name: Name) -> Value {
    get(agent, object, PropertyKey::Name(name)).unwrap()
}

fn store(agent: &mut Agent, object: Object, name: Name, value: Value) {
    assert!(set(agent, object, PropertyKey::Name(name), value, ThrowOnError).unwrap());
}

#[test]
fn same_property_from_same_root_shares_child_shape() {
    let mut agent = agent();
    let first = Object::new(&mut agent);
    let second = Object::new(&mut agent);
    let root = first.shape(&agent);
    assert_eq!(root, second.shape(&agent));
    assert_eq!(root.number_of_own_descriptors(&agent), 0);

    let a = Name::from_str(&mut agent, "a");
    store(&mut agent, first, a, Value::Smi(1));
    let child = first.shape(&agent);
    assert_ne!(child, root);
    assert_eq!(child.parent(&agent), Some(root));
    let key = TransitionKey::property(&agent, a, PropertyKind::Data, PropertyAttributes::NONE);
    assert_eq!(root.search_transition(&agent, key), Some(child));

    let shapes_before = agent.number_of_shapes();
    store(&mut agent, second, a, Value::Smi(2));
    assert_eq!(second.shape(&agent), child);
    assert_eq!(agent.number_of_shapes(), shapes_before);
    assert_eq!(root.number_of_transitions(&agent), 1);
}

#[test]
fn different_attributes_take_different_transitions() {
    let mut agent = agent();
    let writable = Object::new(&mut agent);
    let read_only = Object::new(&mut agent);
    let a = PropertyKey::from_str(&mut agent, "a");
    set(&mut agent, writable, a, Value::Smi(1), ThrowOnError).unwrap();
    define_own_property_ignore_attributes(
        &mut agent,
        read_only,
        a,
        Value::Smi(1),
        PropertyAttributes::READ_ONLY,
        ThrowOnError,
    )
    .unwrap();
    assert_ne!(writable.shape(&agent), read_only.shape(&agent));
    assert_eq!(
        writable.shape(&agent).parent(&agent),
        read_only.shape(&agent).parent(&agent)
    );
}

#[test]
fn smi_field_generalizes_to_double_for_all_instances() {
    let mut agent = agent();
    let a = Object::new(&mut agent);
    let b = Object::new(&mut agent);
    let name = Name::from_str(&mut agent, "a");
    store(&mut agent, a, name, Value::Smi(1));
    store(&mut agent, b, name, Value::Smi(2));
    let smi_shape = a.shape(&agent);
    assert_eq!(b.shape(&agent), smi_shape);
    assert_eq!(
        representation_of(&agent, smi_shape, name),
        Representation::Smi
    );

    let double = Value::from_f64(&mut agent, 1.5);
    store(&mut agent, a, name, double);
    let double_shape = a.shape(&agent);
    assert_ne!(double_shape, smi_shape);
    assert!(smi_shape.is_deprecated(&agent));
    assert_eq!(
        representation_of(&agent, double_shape, name),
        Representation::Double
    );
    let value = load(&mut agent, a, name);
    assert_eq!(value.to_number(&agent), Some(1.5));

    // The other instance moves over the next time it is accessed.
    assert_eq!(b.shape(&agent), smi_shape);
    let value = load(&mut agent, b, name);
    assert_eq!(value.to_number(&agent), Some(2.0));
    assert_eq!(b.shape(&agent), double_shape);
    verify_object_layout(&agent, a).unwrap();
    verify_object_layout(&agent, b).unwrap();

    // New instances follow the generalized branch directly.
    let c = Object::new(&mut agent);
    store(&mut agent, c, name, Value::Smi(3));
    assert_eq!(c.shape(&agent), double_shape);
}

#[test]
fn representation_only_widens() {
    let mut agent = agent();
    let object = Object::new(&mut agent);
    let x = Name::from_str(&mut agent, "x");
    let double = Value::from_f64(&mut agent, 0.25);
    let string = Value::from_str(&mut agent, "text");
    let mut previous = Representation::None;
    for value in [Value::Smi(1), double, string, Value::Smi(2), double] {
        store(&mut agent, object, x, value);
        let current = representation_of(&agent, object.shape(&agent), x);
        assert!(
            current == previous || current.is_more_general_than(previous),
            "{previous:?} narrowed to {current:?}"
        );
        verify_object_layout(&agent, object).unwrap();
        previous = current;
    }
    assert_eq!(previous, Representation::Tagged);
}

#[test]
fn heap_object_field_generalizes_in_place() {
    let mut agent = agent();
    let object = Object::new(&mut agent);
    let x = Name::from_str(&mut agent, "x");
    let string = Value::from_str(&mut agent, "text");
    store(&mut agent, object, x, string);
    let shape = object.shape(&agent);
    assert_eq!(
        representation_of(&agent, shape, x),
        Representation::HeapObject
    );
    store(&mut agent, object, x, Value::Smi(1));
    // HeapObject to Tagged keeps the shape.
    assert_eq!(object.shape(&agent), shape);
    assert!(!shape.is_deprecated(&agent));
    assert_eq!(representation_of(&agent, shape, x), Representation::Tagged);
}

#[test]
fn transition_fan_out_is_bounded() {
    let mut agent = agent();
    let root = Object::new(&mut agent).shape(&agent);
    let shapes_before = agent.number_of_shapes();
    let count = 2000;
    let mut last = None;
    for i in 0..count {
        let object = Object::new(&mut agent);
        let name = Name::from_str(&mut agent, &format!("p{i}"));
        store(&mut agent, object, name, Value::Smi(i));
        last = Some((object, name));
    }
    let max_transitions = agent.options.max_number_of_transitions;
    assert!(root.number_of_transitions(&agent) <= max_transitions);
    assert!(!root.can_have_more_transitions(&agent));

    let (object, name) = last.unwrap();
    let shape = object.shape(&agent);
    assert!(!shape.is_dictionary_map(&agent));
    assert_eq!(shape.parent(&agent), None);
    assert_eq!(
        representation_of(&agent, shape, name),
        Representation::Tagged
    );
    assert_eq!(load(&mut agent, object, name), Value::Smi(count - 1));
    verify_object_layout(&agent, object).unwrap();
    // One shape per added name, never one per instance and transition.
    assert!(agent.number_of_shapes() - shapes_before <= count as usize + 8);
}

#[test]
fn update_finds_replacement_of_deprecated_shape() {
    let mut agent = agent();
    let a = Object::new(&mut agent);
    let b = Object::new(&mut agent);
    let x = Name::from_str(&mut agent, "x");
    let y = Name::from_str(&mut agent, "y");
    store(&mut agent, a, x, Value::Smi(1));
    store(&mut agent, a, y, Value::Smi(2));
    store(&mut agent, b, x, Value::Smi(3));
    store(&mut agent, b, y, Value::Smi(4));
    let old = a.shape(&agent);
    assert_eq!(try_update(&mut agent, old), Some(old));

    let double = Value::from_f64(&mut agent, 2.5);
    store(&mut agent, a, x, double);
    assert!(old.is_deprecated(&agent));
    let new = a.shape(&agent);
    assert_eq!(try_update(&mut agent, old), Some(new));
    assert_eq!(update(&mut agent, old), new);
    assert_eq!(representation_of(&agent, new, y), Representation::Smi);
}

#[test]
fn elements_kind_change_keeps_properties() {
    let mut agent = agent();
    let object = Object::new(&mut agent);
    let x = Name::from_str(&mut agent, "x");
    store(&mut agent, object, x, Value::Smi(7));
    let before = object.shape(&agent);
    assert_eq!(before.elements_kind(&agent), ElementsKind::Holey);
    transition_elements_kind(&mut agent, object, ElementsKind::Dictionary);
    let after = object.shape(&agent);
    assert_ne!(after, before);
    assert_eq!(after.elements_kind(&agent), ElementsKind::Dictionary);
    assert_eq!(after.number_of_own_descriptors(&agent), 1);
    assert_eq!(load(&mut agent, object, x), Value::Smi(7));
    verify_object_layout(&agent, object).unwrap();
}

#[test]
fn double_fields_survive_out_of_object_growth() {
    let mut agent = agent();
    let object = Object::new(&mut agent);
    let inobject = object.shape(&agent).inobject_properties(&agent);
    let mut names = Vec::new();
    for i in 0..inobject + 4 {
        let name = Name::from_str(&mut agent, &format!("f{i}"));
        let value = Value::from_f64(&mut agent, i as f64 + 0.5);
        store(&mut agent, object, name, value);
        names.push(name);
        verify_object_layout(&agent, object).unwrap();
    }
    assert!(object.property_array_length(&agent) >= 4);
    for (i, name) in names.into_iter().enumerate() {
        let value = load(&mut agent, object, name);
        assert_eq!(value.to_number(&agent), Some(i as f64 + 0.5));
    }
}

#[test]
fn bootstrapping_records_no_transitions() {
    let mut agent = agent();
    let early = Object::new(&mut agent);
    let root = early.shape(&agent);
    let x = Name::from_str(&mut agent, "x");
    agent.with_bootstrapping(|agent| store(agent, early, x, Value::Smi(1)));
    assert_ne!(early.shape(&agent), root);
    assert_eq!(root.number_of_transitions(&agent), 0);
    assert_eq!(load(&mut agent, early, x), Value::Smi(1));

    let late = Object::new(&mut agent);
    store(&mut agent, late, x, Value::Smi(2));
    assert_eq!(root.number_of_transitions(&agent), 1);
    assert_ne!(late.shape(&agent), early.shape(&agent));
    assert_eq!(load(&mut agent, early, x), Value::Smi(1));
    assert_eq!(load(&mut agent, late, x), Value::Smi(2));
    verify_object_layout(&agent, early).unwrap();
    verify_object_layout(&agent, late).unwrap();
}
