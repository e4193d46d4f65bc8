// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Fast property storage
//!
//! Reads and writes of field values through a [`FieldIndex`].

use crate::{
    ecmascript::{
        builtins::ordinary::field_index::FieldIndex,
        execution::Agent,
        types::{HeapNumber, Object, PropertyStorage, Representation, Slot, Value},
    },
    heap::CreateHeapData,
};

/// Bit pattern of the double hole: the value of a double field that has
/// not been written yet.
pub(crate) const HOLE_NAN_BITS: u64 = 0xFFF7_FFFF_FFF7_FFFF;

/// Whether the field stores its double unboxed in the instance.
pub(crate) fn is_unboxed_double_field(agent: &Agent, index: FieldIndex) -> bool {
    agent.options.unbox_double_fields && index.is_inobject() && index.is_double()
}

pub(crate) fn raw_fast_property_at(agent: &Agent, object: Object, index: FieldIndex) -> Slot {
    let record = object.record(agent);
    if index.is_inobject() {
        record.inobject[index.inobject_index() as usize]
    } else {
        match &record.properties {
            PropertyStorage::Array(slots) => slots
                .get(index.outobject_array_index() as usize)
                .copied()
                .unwrap_or(Slot::Filler),
            _ => Slot::Filler,
        }
    }
}

pub(crate) fn raw_fast_property_at_put(
    agent: &mut Agent,
    object: Object,
    index: FieldIndex,
    slot: Slot,
) {
    let record = object.record_mut(agent);
    if index.is_inobject() {
        record.inobject[index.inobject_index() as usize] = slot;
    } else if let PropertyStorage::Array(slots) = &mut record.properties {
        slots[index.outobject_array_index() as usize] = slot;
    } else {
        unreachable!("Out-of-object field without a property array");
    }
    if let Slot::Tagged(value) = slot
        && matches!(value, Value::Object(_) | Value::Number(_))
    {
        agent.heap_hooks.record_write(object, value);
    }
}

/// Turn a slot into a value. Boxed doubles are copied out so that the field
/// box is never shared.
pub(crate) fn wrap_for_read(agent: &mut Agent, slot: Slot) -> Value {
    match slot {
        Slot::Tagged(value) => value,
        Slot::Double(bits) => Value::from_f64(agent, f64::from_bits(bits)),
        Slot::MutableNumber(number) => {
            let value = number.value(agent);
            Value::from_f64(agent, value)
        }
        Slot::Uninitialized | Slot::Filler => Value::Undefined,
    }
}

/// Read a field value.
pub fn fast_property_at(agent: &mut Agent, object: Object, index: FieldIndex) -> Value {
    let slot = raw_fast_property_at(agent, object, index);
    wrap_for_read(agent, slot)
}

/// Build the slot for a fresh double field holding `value`.
pub(crate) fn new_double_slot(agent: &mut Agent, index: FieldIndex, bits: u64) -> Slot {
    if is_unboxed_double_field(agent, index) {
        Slot::Double(bits)
    } else {
        let number: HeapNumber = agent.heap.create(f64::from_bits(bits));
        Slot::MutableNumber(number)
    }
}

/// Write a field value, honouring the storage of double fields.
pub fn fast_property_at_put(agent: &mut Agent, object: Object, index: FieldIndex, value: Value) {
    if !index.is_double() {
        raw_fast_property_at_put(agent, object, index, Slot::Tagged(value));
        return;
    }
    let Some(number) = value.to_number(agent) else {
        debug_assert!(false, "Non-number written to a double field");
        return;
    };
    let bits = number.to_bits();
    match raw_fast_property_at(agent, object, index) {
        Slot::MutableNumber(box_) if !is_unboxed_double_field(agent, index) => {
            agent.heap.numbers[box_.get_index()] = number;
        }
        _ => {
            let slot = new_double_slot(agent, index, bits);
            raw_fast_property_at_put(agent, object, index, slot);
        }
    }
}

/// Default slot of a field that has not been written yet.
pub(crate) fn uninitialized_slot(
    agent: &mut Agent,
    index: FieldIndex,
    representation: Representation,
) -> Slot {
    if representation.is_double() {
        new_double_slot(agent, index, HOLE_NAN_BITS)
    } else {
        Slot::Uninitialized
    }
}
