// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collector-facing surface of the shape engine: pointer visiting for the
//! marker, clearing of weak references to collected shapes, and a layout
//! verifier.

use super::Heap;
use crate::ecmascript::{
    builtins::{
        AccessorPair,
        ordinary::{
            descriptor_array::DescriptorValue,
            dictionary::DictionaryValue,
            field_index::FieldIndex,
            property_storage::is_unboxed_double_field,
            prototype_info::clear_dead_prototype_info,
            shape::ObjectShape,
        },
    },
    execution::{Agent, JsError, JsResult},
    types::{
        FieldType, HeapNumber, InternalSlots, Name, Object, PropertyLocation, PropertyStorage,
        Slot, Value,
    },
};

/// A pointer held by an instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeapReference {
    Shape(ObjectShape),
    Value(Value),
    /// Box of a double field that is not stored unboxed.
    Number(HeapNumber),
    Name(Name),
    AccessorPair(AccessorPair),
}

fn visit_slot(slot: &Slot, visitor: &mut impl FnMut(HeapReference)) {
    match *slot {
        Slot::Tagged(value) => visitor(HeapReference::Value(value)),
        Slot::MutableNumber(number) => visitor(HeapReference::Number(number)),
        // Raw double bits and unused space hold no pointers.
        Slot::Double(_) | Slot::Filler | Slot::Uninitialized => {}
    }
}

/// Report every pointer held by `object`: its shape, tagged and boxed
/// field values, dictionary keys and values, and internal slots.
pub fn visit_object_pointers(
    agent: &Agent,
    object: Object,
    mut visitor: impl FnMut(HeapReference),
) {
    let record = object.record(agent);
    visitor(HeapReference::Shape(record.shape()));
    record
        .inobject
        .iter()
        .for_each(|slot| visit_slot(slot, &mut visitor));
    match &record.properties {
        PropertyStorage::Empty => {}
        PropertyStorage::Array(slots) => {
            for slot in slots {
                visit_slot(slot, &mut visitor);
            }
        }
        PropertyStorage::Dictionary(dictionary) => {
            for entry in dictionary.entries_in_enumeration_order() {
                visitor(HeapReference::Name(entry.name));
                match entry.value {
                    DictionaryValue::Data(value) => visitor(HeapReference::Value(value)),
                    DictionaryValue::Accessors(pair) => visitor(HeapReference::AccessorPair(pair)),
                }
            }
        }
    }
    if let InternalSlots::Proxy(data) = &record.internal
        && let Some(target) = data.target
    {
        visitor(HeapReference::Value(Value::Object(target)));
    }
}

/// Clear every weak reference to shapes for which `is_live` returns false:
/// transition edges, prototype transitions, migration targets, the root
/// shape table, the normalized shape cache, prototype info entries and
/// class field types.
///
/// Cleared class field types generalize to `Any` the next time they are
/// joined with another type.
pub fn sweep_shapes(agent: &mut Agent, mut is_live: impl FnMut(ObjectShape) -> bool) {
    let Heap {
        object_shape_transitions,
        descriptor_arrays,
        prototype_infos,
        prototype_shapes,
        normalized_shape_cache,
        ..
    } = &mut agent.heap;

    object_shape_transitions
        .iter_mut()
        .for_each(|transitions| transitions.clear_dead_targets(&mut is_live));
    prototype_shapes.retain(&mut is_live);
    normalized_shape_cache.clear_dead(&mut is_live);
    prototype_infos
        .iter_mut()
        .for_each(|info| clear_dead_prototype_info(info, &mut is_live));

    let mut cleared_field_types = 0usize;
    for descriptors in descriptor_arrays.iter_mut() {
        for descriptor in 0..descriptors.len() {
            let value = descriptors.get(descriptor).value;
            if let DescriptorValue::FieldType(FieldType::Class(shape)) = value
                && !is_live(shape)
            {
                descriptors.set_value(descriptor, DescriptorValue::FieldType(FieldType::Cleared));
                cleared_field_types += 1;
            }
        }
    }
    log::debug!("Swept shapes: cleared {cleared_field_types} class field types");
}

fn check(condition: bool, message: &'static str) -> JsResult<()> {
    if condition {
        Ok(())
    } else {
        Err(JsError::InvariantViolation(message))
    }
}

/// Check that the storage of `object` agrees with its shape: dictionary
/// mode shapes have a dictionary, and every field of a fast mode shape has
/// a slot holding a value of the field's representation.
pub fn verify_object_layout(agent: &Agent, object: Object) -> JsResult<()> {
    let record = object.record(agent);
    let shape = record.shape();
    if shape.is_dictionary_map(agent) {
        return check(
            matches!(record.properties, PropertyStorage::Dictionary(_)),
            "Dictionary mode shape without a dictionary",
        );
    }
    check(
        !matches!(record.properties, PropertyStorage::Dictionary(_)),
        "Fast mode shape with a dictionary",
    )?;

    let inobject_properties = shape.inobject_properties(agent);
    check(
        record.inobject.len() as u32 >= inobject_properties,
        "Instance is smaller than its shape",
    )?;
    let mut inobject_fields = 0;
    let mut outobject_fields = 0;
    let number_of_descriptors = shape.number_of_own_descriptors(agent);
    for descriptor in 0..number_of_descriptors {
        let details = shape.descriptor_details(agent, descriptor);
        if details.location() != PropertyLocation::Field {
            continue;
        }
        let index = FieldIndex::for_descriptor(agent, shape, descriptor);
        if index.is_inobject() {
            inobject_fields += 1;
        } else {
            outobject_fields += 1;
        }
        let slot = if index.is_inobject() {
            record.inobject.get(index.inobject_index() as usize)
        } else {
            match &record.properties {
                PropertyStorage::Array(slots) => slots.get(index.outobject_array_index() as usize),
                _ => None,
            }
        };
        let Some(slot) = slot else {
            return Err(JsError::InvariantViolation("Field is outside of the instance"));
        };
        match *slot {
            Slot::Filler => {
                return Err(JsError::InvariantViolation("Field slot is a filler"));
            }
            Slot::Uninitialized => {}
            Slot::Double(_) => check(
                index.is_double() && is_unboxed_double_field(agent, index),
                "Raw double bits in a boxed or tagged field",
            )?,
            Slot::MutableNumber(_) => check(
                index.is_double(),
                "Boxed double in a field that is not a double field",
            )?,
            Slot::Tagged(value) => check(
                !index.is_double() && value.fits_representation(details.representation()),
                "Tagged value does not fit the field representation",
            )?,
        }
    }
    let number_of_fields = shape.number_of_fields(agent);
    check(
        inobject_fields == shape.used_inobject_slots(agent),
        "In-object fields do not fill the used in-object slots",
    )?;
    check(
        inobject_fields + outobject_fields == number_of_fields,
        "In-object and out-of-object fields do not add up to the shape's fields",
    )?;
    check(
        record.properties.array_len() >= outobject_fields,
        "Property array is shorter than the out-of-object field count",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ecmascript::{
            abstract_operations::set,
            execution::{DefaultHostHooks, Options, ShouldThrow},
            types::PropertyKey,
        },
        heap::NoopHeapHooks,
    };

    #[test]
    fn visits_shape_and_values() {
        let mut agent = Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks);
        let object = Object::new(&mut agent);
        let inner = Object::new(&mut agent);
        let key = PropertyKey::from_str(&mut agent, "inner");
        let value = Value::Object(inner);
        set(&mut agent, object, key, value, ShouldThrow::ThrowOnError).unwrap();
        let mut references = Vec::new();
        visit_object_pointers(&agent, object, |reference| references.push(reference));
        assert_eq!(references[0], HeapReference::Shape(object.shape(&agent)));
        assert!(references.contains(&HeapReference::Value(Value::Object(inner))));
        verify_object_layout(&agent, object).unwrap();
    }
}
