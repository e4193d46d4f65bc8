// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Instance migration
//!
//! Moving an instance from one shape to another rewrites its storage to
//! match the new layout. Every migration writes the storage first and
//! publishes the new shape last, so that anyone reading the new shape sees
//! storage laid out for it. Migrations never fail.

use crate::{
    ecmascript::{
        builtins::{
            ordinary::{
                descriptor_array::{Descriptor, DescriptorArrayRecord},
                dictionary::{DictionaryValue, NameDictionary},
                field_index::FieldIndex,
                property_storage::{
                    HOLE_NAN_BITS, fast_property_at, is_unboxed_double_field, new_double_slot,
                    raw_fast_property_at, uninitialized_slot,
                },
                prototype_info::notify_map_change,
                shape::{
                    ElementsKind, HEADER_SIZE_IN_WORDS, NormalizationMode, ObjectShape, ShapeFlags,
                },
                shape_copy::{copy, copy_drop_descriptors, initialize_descriptors, normalize},
                shape_transitions::{transition_elements_to, transition_for_prevent_extensions},
                shape_updater::{try_update, update},
            },
            typed_array::typed_array_length,
        },
        execution::{Agent, JsResult, PolicyReason, ShouldThrow},
        types::{
            FieldType, HeapNumber, Name, Object, PropertyAttributes, PropertyConstness,
            PropertyDetails, PropertyKind, PropertyLocation, PropertyStorage,
            Representation, Slot, Value,
        },
    },
    heap::CreateHeapData,
};

/// ### MigrateToMap
///
/// Move `object` to `new_shape`, rewriting its storage as needed. Use
/// [`migrate_slow_to_fast`] to leave dictionary mode.
pub(crate) fn migrate_to_shape(agent: &mut Agent, object: Object, new_shape: ObjectShape) {
    migrate_to_shape_expecting(agent, object, new_shape, 0);
}

/// Like [`migrate_to_shape`]; a dictionary created for the object is sized
/// for `expected_additional_properties` more properties.
pub(crate) fn migrate_to_shape_expecting(
    agent: &mut Agent,
    object: Object,
    new_shape: ObjectShape,
    expected_additional_properties: u32,
) {
    let old_shape = object.shape(agent);
    if old_shape == new_shape {
        return;
    }
    notify_map_change(agent, old_shape, new_shape);
    if old_shape.is_dictionary_map(agent) {
        debug_assert!(
            new_shape.is_dictionary_map(agent),
            "Slow to fast migration must go through migrate_slow_to_fast"
        );
        object.record(agent).publish_shape(new_shape);
    } else if !new_shape.is_dictionary_map(agent) {
        migrate_fast_to_fast(agent, object, old_shape, new_shape);
        if old_shape.is_prototype_map(agent) {
            // Prototype shapes are never shared: the old one is abandoned.
            old_shape.set_flag(agent, ShapeFlags::OWNS_DESCRIPTORS, false);
        }
    } else {
        migrate_fast_to_slow(
            agent,
            object,
            old_shape,
            new_shape,
            expected_additional_properties,
        );
    }
}

/// Record the write barrier for every tagged heap value in `slots`.
fn record_writes(agent: &Agent, object: Object, slots: &[Slot]) {
    for slot in slots {
        if let Slot::Tagged(value) = *slot
            && matches!(value, Value::Object(_) | Value::Number(_))
        {
            agent.heap_hooks.record_write(object, value);
        }
    }
}

/// A field value on its way from the old layout to the new one.
#[derive(Debug, Clone, Copy)]
enum CarriedValue {
    Tagged(Value),
    Uninitialized,
    Double(u64),
    Boxed(HeapNumber),
}

/// Slot holding `value` in the new field `index`.
fn materialize(agent: &mut Agent, value: CarriedValue, index: FieldIndex) -> Slot {
    if index.is_double() {
        let bits = match value {
            CarriedValue::Boxed(number) if !is_unboxed_double_field(agent, index) => {
                // The box moves along with the field.
                return Slot::MutableNumber(number);
            }
            CarriedValue::Boxed(number) => number.value(agent).to_bits(),
            CarriedValue::Double(bits) => bits,
            CarriedValue::Tagged(value) => match value.to_number(agent) {
                Some(number) => number.to_bits(),
                None => {
                    debug_assert!(false, "Non-number carried into a double field");
                    HOLE_NAN_BITS
                }
            },
            CarriedValue::Uninitialized => HOLE_NAN_BITS,
        };
        return new_double_slot(agent, index, bits);
    }
    match value {
        CarriedValue::Tagged(value) => Slot::Tagged(value),
        CarriedValue::Uninitialized => Slot::Uninitialized,
        CarriedValue::Double(bits) => Slot::Tagged(Value::from_f64(agent, f64::from_bits(bits))),
        CarriedValue::Boxed(number) => {
            let value = number.value(agent);
            Slot::Tagged(Value::from_f64(agent, value))
        }
    }
}

/// ### InstancesNeedRewriting
///
/// Whether instances of `old_shape` can be moved to `new_shape` by
/// publishing the new shape alone.
fn instances_need_rewriting(agent: &Agent, old_shape: ObjectShape, new_shape: ObjectShape) -> bool {
    let old_number_of_fields = old_shape.number_of_fields(agent);
    let new_number_of_fields = new_shape.number_of_fields(agent);
    if old_number_of_fields != new_number_of_fields {
        return true;
    }
    let old_descriptors = old_shape.descriptors(agent);
    let new_descriptors = new_shape.descriptors(agent);
    let limit = old_shape.number_of_own_descriptors(agent);
    for i in 0..limit {
        let old_details = old_descriptors.details(i);
        let new_details = new_descriptors.details(i);
        if old_details.is_double_field() != new_details.is_double_field() {
            return true;
        }
    }
    let old_inobject = old_shape.inobject_properties(agent);
    let new_inobject = new_shape.inobject_properties(agent);
    if new_inobject == old_inobject {
        return false;
    }
    // A smaller instance works as long as every field stays in-object.
    new_number_of_fields > new_inobject
}

/// ### MigrateFastToFast
fn migrate_fast_to_fast(
    agent: &mut Agent,
    object: Object,
    old_shape: ObjectShape,
    new_shape: ObjectShape,
) {
    if new_shape.parent(agent) == Some(old_shape) {
        migrate_to_child(agent, object, old_shape, new_shape);
        return;
    }
    if !instances_need_rewriting(agent, old_shape, new_shape) {
        object.record(agent).publish_shape(new_shape);
        return;
    }

    let number_of_fields = new_shape.number_of_fields(agent);
    let inobject = new_shape.inobject_properties(agent);
    let external_length = new_shape.expected_property_array_length(agent) as usize;
    let mut inobject_slots = vec![Slot::Filler; inobject as usize];
    let mut external_slots = vec![Slot::Uninitialized; external_length];

    let old_nof = old_shape.number_of_own_descriptors(agent);
    let new_nof = new_shape.number_of_own_descriptors(agent);
    debug_assert!(old_nof <= new_nof);
    for i in 0..new_nof {
        let details = new_shape.descriptor_details(agent, i);
        if details.location() != PropertyLocation::Field {
            continue;
        }
        debug_assert_eq!(details.kind(), PropertyKind::Data);
        let carried = if i < old_nof {
            carried_value(agent, object, old_shape, i)
        } else {
            CarriedValue::Uninitialized
        };
        let index = FieldIndex::for_descriptor(agent, new_shape, i);
        let slot = materialize(agent, carried, index);
        if index.is_inobject() {
            inobject_slots[index.inobject_index() as usize] = slot;
        } else {
            external_slots[index.outobject_array_index() as usize] = slot;
        }
    }

    let hooks = agent.heap_hooks;
    hooks.notify_object_layout_change(object, new_shape);
    let old_number_of_fields = old_shape.number_of_fields(agent);
    let limit = inobject.min(number_of_fields) as usize;
    for (i, slot) in inobject_slots.iter().enumerate().take(limit) {
        let was_tagged = !matches!(object.record(agent).inobject[i], Slot::Double(_));
        if matches!(slot, Slot::Double(_)) && (i as u32) < old_number_of_fields && was_tagged {
            let offset = FieldIndex::for_property_index(inobject, i as u32, Representation::Double)
                .offset_in_words();
            hooks.clear_recorded_slots(object, offset, offset + 1);
        }
    }
    let record = object.record_mut(agent);
    for (i, target) in record.inobject.iter_mut().enumerate() {
        *target = if i < limit {
            inobject_slots[i]
        } else {
            Slot::Filler
        };
    }
    record.properties = if external_slots.is_empty() {
        PropertyStorage::Empty
    } else {
        PropertyStorage::Array(external_slots)
    };
    record_writes(agent, object, &inobject_slots[..limit]);
    if let PropertyStorage::Array(slots) = &object.record(agent).properties {
        record_writes(agent, object, slots);
    }

    let old_size = old_shape.instance_size_in_words(agent);
    let new_size = new_shape.instance_size_in_words(agent);
    if old_size > new_size {
        hooks.create_filler(object, new_size, old_size - new_size);
    }
    object.record(agent).publish_shape(new_shape);
}

/// Value of descriptor `descriptor` of an instance of `old_shape`.
fn carried_value(
    agent: &Agent,
    object: Object,
    old_shape: ObjectShape,
    descriptor: u32,
) -> CarriedValue {
    let old = old_shape.descriptors(agent).get(descriptor);
    match (old.details.location(), old.details.kind()) {
        // Reconfigured from an accessor: the data property starts empty.
        (PropertyLocation::Descriptor, PropertyKind::Accessor) => CarriedValue::Uninitialized,
        (PropertyLocation::Descriptor, PropertyKind::Data) => {
            CarriedValue::Tagged(old.constant().unwrap_or(Value::Undefined))
        }
        (PropertyLocation::Field, _) => {
            let index = FieldIndex::for_descriptor(agent, old_shape, descriptor);
            match raw_fast_property_at(agent, object, index) {
                Slot::Tagged(value) => CarriedValue::Tagged(value),
                Slot::Double(bits) => CarriedValue::Double(bits),
                Slot::MutableNumber(number) => CarriedValue::Boxed(number),
                Slot::Uninitialized | Slot::Filler => CarriedValue::Uninitialized,
            }
        }
    }
}

/// Migration along a single transition edge: at most one field was added.
fn migrate_to_child(
    agent: &mut Agent,
    object: Object,
    old_shape: ObjectShape,
    new_shape: ObjectShape,
) {
    let new_nof = new_shape.number_of_own_descriptors(agent);
    if old_shape.number_of_own_descriptors(agent) == new_nof {
        object.record(agent).publish_shape(new_shape);
        return;
    }
    let last = new_nof - 1;
    let details = new_shape.descriptor_details(agent, last);
    if details.location() == PropertyLocation::Descriptor {
        object.record(agent).publish_shape(new_shape);
        return;
    }
    let index = FieldIndex::for_descriptor(agent, new_shape, last);
    let have_space = old_shape.unused_property_fields(agent) > 0
        || (!index.is_inobject()
            && index.outobject_array_index() < object.property_array_length(agent));
    let slot = uninitialized_slot(agent, index, details.representation());
    if have_space {
        let record = object.record_mut(agent);
        if index.is_inobject() {
            record.inobject[index.inobject_index() as usize] = slot;
        } else if let PropertyStorage::Array(slots) = &mut record.properties {
            slots[index.outobject_array_index() as usize] = slot;
        }
        object.record(agent).publish_shape(new_shape);
        return;
    }

    // The old shape ran out of space: grow the property array.
    debug_assert!(!index.is_inobject());
    let grow_by = new_shape.unused_property_fields(agent) as usize + 1;
    let record = object.record_mut(agent);
    let mut slots = match core::mem::take(&mut record.properties) {
        PropertyStorage::Array(slots) => slots,
        _ => Vec::new(),
    };
    slots.resize(slots.len() + grow_by, Slot::Uninitialized);
    slots[index.outobject_array_index() as usize] = slot;
    record.properties = PropertyStorage::Array(slots);
    log::trace!("Grew the property array of {object:?} by {grow_by}");
    object.record(agent).publish_shape(new_shape);
}

/// ### MigrateFastToSlow
fn migrate_fast_to_slow(
    agent: &mut Agent,
    object: Object,
    old_shape: ObjectShape,
    new_shape: ObjectShape,
    expected_additional_properties: u32,
) {
    let real_size = old_shape.number_of_own_descriptors(agent);
    let additional = if expected_additional_properties > 0 {
        expected_additional_properties as usize
    } else {
        agent.options.initial_dictionary_capacity
    };
    let mut dictionary = NameDictionary::with_capacity(real_size as usize + additional);
    for i in 0..real_size {
        let descriptor = *old_shape.descriptors(agent).get(i);
        let details = descriptor.details;
        let value = match (details.location(), descriptor.accessors()) {
            (PropertyLocation::Field, _) => {
                let index = FieldIndex::for_descriptor(agent, old_shape, i);
                // Doubles come back as fresh numbers, never as field boxes.
                DictionaryValue::Data(fast_property_at(agent, object, index))
            }
            (PropertyLocation::Descriptor, Some(pair)) => DictionaryValue::Accessors(pair),
            (PropertyLocation::Descriptor, None) => {
                DictionaryValue::Data(descriptor.constant().unwrap_or(Value::Undefined))
            }
        };
        let details = PropertyDetails::dictionary(details.kind(), details.attributes(), 0);
        dictionary.add(descriptor.key, descriptor.key_hash, value, details);
    }
    dictionary.set_next_enumeration_index(real_size + 1);

    let hooks = agent.heap_hooks;
    hooks.notify_object_layout_change(object, new_shape);
    let old_size = old_shape.instance_size_in_words(agent);
    let new_size = new_shape.instance_size_in_words(agent);
    if old_size > new_size {
        hooks.create_filler(object, new_size, old_size - new_size);
    }
    if new_shape.inobject_properties(agent) > 0 {
        hooks.clear_recorded_slots(object, HEADER_SIZE_IN_WORDS, new_size);
    }
    let record = object.record_mut(agent);
    record.inobject.fill(Slot::Filler);
    record.properties = PropertyStorage::Dictionary(Box::new(dictionary));
    object.record(agent).publish_shape(new_shape);
    log::debug!("Migrated {object:?} to dictionary mode with {real_size} properties");
}

/// Whether elements of this kind may still transition to a more general
/// kind.
fn is_transitionable_fast_elements_kind(kind: ElementsKind) -> bool {
    matches!(
        kind,
        ElementsKind::PackedSmi
            | ElementsKind::HoleySmi
            | ElementsKind::PackedDouble
            | ElementsKind::HoleyDouble
            | ElementsKind::Packed
    )
}

/// ### MigrateSlowToFast
///
/// Turn a dictionary mode object back into a fast mode one with a private
/// shape, reserving `unused_property_fields` slots of slack. Objects with
/// too many properties stay in dictionary mode.
pub fn migrate_slow_to_fast(
    agent: &mut Agent,
    object: Object,
    unused_property_fields: u32,
    reason: &str,
) {
    if object.has_fast_properties(agent) {
        return;
    }
    let Some(dictionary) = object.dictionary(agent) else {
        return;
    };
    let number_of_elements = dictionary.number_of_elements();
    let limit = agent
        .options
        .max_dictionary_to_fast_properties
        .min(agent.options.max_number_of_descriptors as u32);
    if number_of_elements > limit {
        return;
    }
    let entries = dictionary.entries_in_enumeration_order();

    let old_shape = object.shape(agent);
    let inobject = old_shape.inobject_properties(agent);
    let new_shape = copy_drop_descriptors(agent, old_shape);
    {
        let interesting =
            new_shape.has_named_interceptor(agent) || new_shape.is_access_check_needed(agent);
        let record = new_shape.record_mut(agent);
        record
            .flags
            .set(ShapeFlags::MAY_HAVE_INTERESTING_SYMBOLS, interesting);
        record
            .flags
            .remove(ShapeFlags::IS_DICTIONARY_MAP | ShapeFlags::IS_UNSTABLE);
    }
    notify_map_change(agent, old_shape, new_shape);

    if number_of_elements == 0 {
        debug_assert!(unused_property_fields <= inobject);
        new_shape.record_mut(agent).unused_property_fields = inobject;
        let hooks = agent.heap_hooks;
        hooks.notify_object_layout_change(object, new_shape);
        let record = object.record_mut(agent);
        record.inobject.fill(Slot::Filler);
        record.properties = PropertyStorage::Empty;
        object.record(agent).publish_shape(new_shape);
        log::debug!("{reason}: {object:?} is fast again with no properties");
        return;
    }

    let constness = if agent.options.track_constant_fields
        && !is_transitionable_fast_elements_kind(old_shape.elements_kind(agent))
    {
        PropertyConstness::Const
    } else {
        PropertyConstness::Mutable
    };
    let mut descriptors = Vec::with_capacity(entries.len());
    let mut field_values = Vec::new();
    for entry in &entries {
        let attributes = entry.details.attributes();
        let descriptor = match entry.value {
            DictionaryValue::Data(value)
                if agent.options.embed_function_constants && value.is_callable(agent) =>
            {
                Descriptor::data_constant(agent, entry.name, value, attributes)
            }
            DictionaryValue::Data(value) => {
                let field_index = field_values.len() as u32;
                field_values.push(value);
                Descriptor::data_field(
                    agent,
                    entry.name,
                    field_index,
                    attributes,
                    constness,
                    Representation::Tagged,
                    FieldType::Any,
                )
            }
            DictionaryValue::Accessors(pair) => {
                Descriptor::accessor_constant(agent, entry.name, pair, attributes)
            }
        };
        descriptors.push(descriptor);
    }

    let number_of_fields = field_values.len() as u32;
    // Slack counts out-of-object once a property array is needed.
    let (allocated_fields, unused) =
        match (number_of_fields + unused_property_fields).checked_sub(inobject) {
            Some(allocated) if allocated > 0 => (allocated, unused_property_fields),
            _ => (0, inobject - number_of_fields),
        };

    let mut inobject_slots = vec![Slot::Filler; inobject as usize];
    let mut external_slots = vec![Slot::Uninitialized; allocated_fields as usize];
    for (i, value) in field_values.into_iter().enumerate() {
        let i = i as u32;
        if i < inobject {
            inobject_slots[i as usize] = Slot::Tagged(value);
        } else {
            external_slots[(i - inobject) as usize] = Slot::Tagged(value);
        }
    }

    let nof = descriptors.len() as u32;
    let descriptors = agent
        .heap
        .create(DescriptorArrayRecord::from_descriptors(descriptors));
    initialize_descriptors(agent, new_shape, descriptors, nof);
    new_shape.record_mut(agent).unused_property_fields = unused;

    let hooks = agent.heap_hooks;
    hooks.notify_object_layout_change(object, new_shape);
    let record = object.record_mut(agent);
    for (i, target) in record.inobject.iter_mut().enumerate() {
        *target = inobject_slots.get(i).copied().unwrap_or(Slot::Filler);
    }
    record.properties = if external_slots.is_empty() {
        PropertyStorage::Empty
    } else {
        PropertyStorage::Array(external_slots)
    };
    record_writes(agent, object, &inobject_slots);
    if let PropertyStorage::Array(slots) = &object.record(agent).properties {
        record_writes(agent, object, slots);
    }
    object.record(agent).publish_shape(new_shape);
    log::debug!("{reason}: {object:?} is fast again with {nof} properties in {new_shape:?}");
}

/// ### NormalizeProperties
///
/// Move a fast mode object into dictionary mode.
pub fn normalize_properties(
    agent: &mut Agent,
    object: Object,
    mode: NormalizationMode,
    expected_additional_properties: u32,
    reason: &str,
) {
    if !object.has_fast_properties(agent) {
        return;
    }
    let shape = object.shape(agent);
    let elements_kind = shape.elements_kind(agent);
    let new_shape = normalize(agent, shape, elements_kind, mode, reason);
    migrate_to_shape_expecting(agent, object, new_shape, expected_additional_properties);
}

/// ### MigrateInstance
///
/// Move an instance of a deprecated shape to its replacement.
pub fn migrate_instance(agent: &mut Agent, object: Object) {
    let original = object.shape(agent);
    let new_shape = update(agent, original);
    new_shape.set_flag(agent, ShapeFlags::IS_MIGRATION_TARGET, true);
    migrate_to_shape(agent, object, new_shape);
    log::trace!("Migrated instance {object:?} from {original:?} to {new_shape:?}");
}

/// ### TryMigrateInstance
///
/// Like [`migrate_instance`], but only moves the instance to a shape that
/// already exists. Returns whether the instance was migrated.
pub fn try_migrate_instance(agent: &mut Agent, object: Object) -> bool {
    let original = object.shape(agent);
    let Some(new_shape) = try_update(agent, original) else {
        return false;
    };
    migrate_to_shape(agent, object, new_shape);
    true
}

/// ### TransitionElementsKind
pub fn transition_elements_kind(agent: &mut Agent, object: Object, to_kind: ElementsKind) {
    let shape = object.shape(agent);
    if shape.elements_kind(agent) == to_kind {
        return;
    }
    let new_shape = transition_elements_to(agent, shape, to_kind);
    migrate_to_shape(agent, object, new_shape);
}

/// ### DeleteObjectPropertyFast
///
/// Delete the most recently added property of a fast mode object by
/// moving it back to the parent shape. Returns `false` if the rollback is
/// not possible and the property has to be deleted the slow way.
pub(crate) fn delete_property_fast(agent: &mut Agent, object: Object, name: Name) -> bool {
    let shape = object.shape(agent);
    if shape.is_dictionary_map(agent) || shape.is_special_receiver_map(agent) {
        return false;
    }
    let Some(descriptor) = shape.last_added(agent) else {
        return false;
    };
    if shape.descriptors(agent).key(descriptor) != name {
        return false;
    }
    let details = shape.descriptor_details(agent, descriptor);
    if !details.is_configurable() {
        return false;
    }
    // Following the transition again later must not observe a stale
    // constant.
    if details.location() == PropertyLocation::Field
        && details.constness() == PropertyConstness::Const
    {
        return false;
    }
    let Some(parent) = shape.parent(agent) else {
        return false;
    };
    if parent.number_of_own_descriptors(agent) != descriptor {
        return false;
    }

    if details.location() == PropertyLocation::Field {
        let hooks = agent.heap_hooks;
        hooks.notify_object_layout_change(object, parent);
        let index = FieldIndex::for_descriptor(agent, shape, descriptor);
        let unboxed = is_unboxed_double_field(agent, index);
        let record = object.record_mut(agent);
        if !index.is_inobject() && index.outobject_array_index() == 0 {
            record.properties = PropertyStorage::Empty;
        } else if index.is_inobject() {
            record.inobject[index.inobject_index() as usize] = Slot::Filler;
            if !unboxed {
                let offset = index.offset_in_words();
                agent
                    .heap_hooks
                    .clear_recorded_slots(object, offset, offset + 1);
            }
        } else if let PropertyStorage::Array(slots) = &mut record.properties {
            slots[index.outobject_array_index() as usize] = Slot::Filler;
        }
    }
    shape.mark_unstable(agent);
    object.record(agent).publish_shape(parent);
    log::trace!("Rolled {object:?} back from {shape:?} to {parent:?}");
    true
}

/// ### ApplyAttributesToDictionary
fn apply_attributes_to_dictionary(
    agent: &mut Agent,
    object: Object,
    attributes: PropertyAttributes,
) {
    let Some(dictionary) = object.dictionary(agent) else {
        return;
    };
    let updates: Vec<_> = dictionary
        .handles_in_enumeration_order()
        .into_iter()
        .filter_map(|entry| {
            let data = dictionary.get(entry)?;
            if data.name.is_private(agent) {
                return None;
            }
            let mut added = attributes;
            // Accessors have no writability.
            if data.details.kind() == PropertyKind::Accessor {
                added.remove(PropertyAttributes::READ_ONLY);
            }
            let details = data
                .details
                .with_attributes(data.details.attributes() | added);
            Some((entry, details))
        })
        .collect();
    if let Some(dictionary) = object.dictionary_mut(agent) {
        for (entry, details) in updates {
            dictionary.set_details(entry, details);
        }
    }
}

/// ### PreventExtensionsWithTransition
///
/// Make `object` non-extensible and add `attributes` (none, sealed or
/// frozen) to all of its own properties.
pub(crate) fn prevent_extensions_with_transition(
    agent: &mut Agent,
    object: Object,
    attributes: PropertyAttributes,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    debug_assert!(
        attributes == PropertyAttributes::NONE
            || attributes == PropertyAttributes::SEALED
            || attributes == PropertyAttributes::FROZEN
    );
    agent.access_check(object, None)?;
    let shape = object.shape(agent);
    if attributes == PropertyAttributes::NONE && !shape.is_extensible(agent) {
        return Ok(true);
    }
    match shape.elements_kind(agent) {
        ElementsKind::PackedFrozen => return Ok(true),
        ElementsKind::PackedSealed if attributes != PropertyAttributes::FROZEN => {
            return Ok(true);
        }
        _ => {}
    }
    if shape.has_named_interceptor(agent) {
        return agent.fail(should_throw, PolicyReason::CannotSeal, None);
    }

    match transition_for_prevent_extensions(agent, shape, attributes) {
        Some(new_shape) => migrate_to_shape(agent, object, new_shape),
        None => {
            normalize_properties(
                agent,
                object,
                NormalizationMode::ClearInobjectProperties,
                0,
                "SlowPreventExtensions",
            );
            // Other objects with the normalized shape may stay extensible.
            let normalized = object.shape(agent);
            let new_shape = copy(agent, normalized, "SlowCopyForPreventExtensions");
            new_shape.set_flag(agent, ShapeFlags::IS_EXTENSIBLE, false);
            migrate_to_shape(agent, object, new_shape);
            if attributes != PropertyAttributes::NONE {
                apply_attributes_to_dictionary(agent, object, attributes);
            }
        }
    }

    if object.is_typed_array(agent)
        && attributes == PropertyAttributes::FROZEN
        && typed_array_length(agent, object) > 0
    {
        return Err(agent.policy_failure(PolicyReason::CannotFreezeTypedArray, None));
    }
    Ok(true)
}
