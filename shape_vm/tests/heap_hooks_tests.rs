// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cell::RefCell;

use shape_vm::{
    Agent, DefaultHostHooks, HeapHooks, NoopHeapHooks, Object, Options, PropertyKey, ShouldThrow,
    Value,
    ecmascript::{
        abstract_operations::{get, set},
        builtins::ordinary::{
            ObjectShape, prototype_info::prototype_chain_validity_cell,
        },
        types::{FieldType, Name},
    },
    heap::{HeapReference, sweep_shapes, verify_object_layout, visit_object_pointers},
};

#[derive(Debug, Default)]
struct RecordingHooks {
    deprecated: RefCell<Vec<ObjectShape>>,
    layout_changes: RefCell<Vec<(Object, ObjectShape)>>,
    writes: RefCell<Vec<(Object, Value)>>,
}

impl HeapHooks for RecordingHooks {
    fn notify_object_layout_change(&self, object: Object, new_shape: ObjectShape) {
        self.layout_changes.borrow_mut().push((object, new_shape));
    }

    fn record_write(&self, host: Object, value: Value) {
        self.writes.borrow_mut().push((host, value));
    }

    fn notify_shape_deprecated(&self, shape: ObjectShape) {
        self.deprecated.borrow_mut().push(shape);
    }
}

fn recording_agent() -> (Agent, &'static RecordingHooks) {
    let hooks: &'static RecordingHooks = Box::leak(Box::default());
    (Agent::new(Options::default(), &DefaultHostHooks, hooks), hooks)
}

fn store(agent: &mut Agent, object: Object, name: &str, value: Value) {
    let key = PropertyKey::from_str(agent, name);
    assert!(set(agent, object, key, value, ShouldThrow::ThrowOnError).unwrap());
}

#[test]
fn deprecation_and_layout_changes_are_reported() {
    let (mut agent, hooks) = recording_agent();
    let object = Object::new(&mut agent);
    store(&mut agent, object, "x", Value::Smi(1));
    let smi_shape = object.shape(&agent);
    assert!(hooks.deprecated.borrow().is_empty());

    let double = Value::from_f64(&mut agent, 0.5);
    store(&mut agent, object, "x", double);
    let double_shape = object.shape(&agent);
    assert!(hooks.deprecated.borrow().contains(&smi_shape));
    assert!(
        hooks
            .layout_changes
            .borrow()
            .contains(&(object, double_shape))
    );
    verify_object_layout(&agent, object).unwrap();
}

#[test]
fn object_stores_go_through_the_write_barrier() {
    let (mut agent, hooks) = recording_agent();
    let object = Object::new(&mut agent);
    let inner = Object::new(&mut agent);
    store(&mut agent, object, "inner", Value::Object(inner));
    assert!(
        hooks
            .writes
            .borrow()
            .contains(&(object, Value::Object(inner)))
    );
}

#[test]
fn swept_class_field_type_generalizes_to_any() {
    let mut agent = Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks);
    let holder = Object::new(&mut agent);
    let prototype = Object::new(&mut agent);
    let child = Object::ordinary_object_create(&mut agent, Some(prototype));
    let child_shape = child.shape(&agent);
    assert!(child_shape.is_stable(&agent));

    store(&mut agent, holder, "child", Value::Object(child));
    let name = Name::from_str(&mut agent, "child");
    let shape = holder.shape(&agent);
    let descriptor = shape.lookup_descriptor(&agent, name).unwrap();
    assert_eq!(
        shape.descriptor_field_type(&agent, descriptor),
        FieldType::Class(child_shape)
    );

    sweep_shapes(&mut agent, |shape| shape != child_shape);
    assert_eq!(
        shape.descriptor_field_type(&agent, descriptor),
        FieldType::Cleared
    );

    let other = Object::new(&mut agent);
    store(&mut agent, holder, "child", Value::Object(other));
    let shape = holder.shape(&agent);
    let descriptor = shape.lookup_descriptor(&agent, name).unwrap();
    let field_type = shape.descriptor_field_type(&agent, descriptor);
    assert_eq!(field_type, FieldType::Any);
    assert_eq!(
        get(&mut agent, holder, PropertyKey::Name(name)).unwrap(),
        Value::Object(other)
    );
    verify_object_layout(&agent, holder).unwrap();
}

#[test]
fn pointer_visiting_covers_dictionary_objects() {
    let mut agent = Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks);
    let object = Object::new(&mut agent);
    let inner = Object::new(&mut agent);
    store(&mut agent, object, "a", Value::Smi(1));
    store(&mut agent, object, "b", Value::Object(inner));
    shape_vm::ecmascript::builtins::ordinary::migration::normalize_properties(
        &mut agent,
        object,
        shape_vm::ecmascript::builtins::ordinary::NormalizationMode::ClearInobjectProperties,
        0,
        "Test",
    );
    assert!(!object.has_fast_properties(&agent));
    verify_object_layout(&agent, object).unwrap();

    let b = Name::from_str(&mut agent, "b");
    let mut references = Vec::new();
    visit_object_pointers(&agent, object, |reference| references.push(reference));
    assert_eq!(references[0], HeapReference::Shape(object.shape(&agent)));
    assert!(references.contains(&HeapReference::Name(b)));
    assert!(references.contains(&HeapReference::Value(Value::Object(inner))));
}

#[test]
fn prototype_changes_invalidate_validity_cells() {
    let mut agent = Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks);
    let prototype = Object::new(&mut agent);
    let object = Object::ordinary_object_create(&mut agent, Some(prototype));
    let shape = object.shape(&agent);
    let cell = prototype_chain_validity_cell(&mut agent, shape).unwrap();
    assert!(cell.is_valid(&agent));
    assert_eq!(prototype_chain_validity_cell(&mut agent, shape), Some(cell));

    store(&mut agent, prototype, "z", Value::Smi(1));
    assert!(!cell.is_valid(&agent));
    let shape = object.shape(&agent);
    let fresh = prototype_chain_validity_cell(&mut agent, shape).unwrap();
    assert_ne!(fresh, cell);
    assert!(fresh.is_valid(&agent));
}

#[test]
fn shared_transitions_allocate_no_shapes() {
    let mut agent = Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks);
    let first = Object::new(&mut agent);
    let second = Object::new(&mut agent);

    let before = agent.allocated_bytes();
    store(&mut agent, first, "x", Value::Smi(1));
    store(&mut agent, first, "y", Value::Smi(2));
    let first_cost = agent.allocated_bytes() - before;
    let shapes = agent.number_of_shapes();

    let before = agent.allocated_bytes();
    store(&mut agent, second, "x", Value::Smi(1));
    store(&mut agent, second, "y", Value::Smi(2));
    let second_cost = agent.allocated_bytes() - before;
    assert_eq!(agent.number_of_shapes(), shapes);
    assert!(first_cost > 0);
    assert!(second_cost < first_cost);
}
