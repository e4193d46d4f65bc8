// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Shape construction
//!
//! Every new shape is derived from an existing one. A derived shape either
//! becomes a child of its source in the transition tree, or it is created
//! as a private, unconnected copy whose fields are all generalized so that
//! no instance ever needs to be migrated away from it.

use crate::{
    ecmascript::{
        builtins::ordinary::{
            descriptor_array::{Descriptor, DescriptorArrayRecord},
            normalized_shape_cache::NormalizedShapeCache,
            shape::{ElementsKind, NormalizationMode, ObjectShape, ShapeFlags},
            transitions::{ObjectShapeTransitionMap, SpecialTransition, TransitionKey},
        },
        execution::Agent,
        types::{
            FieldType, Name, PropertyAttributes, PropertyConstness, PropertyKind,
            PropertyLocation, Representation, Value,
        },
    },
    heap::{CreateHeapData, indexes::DescriptorArrayIndex},
};

/// Whether a derived shape is recorded in the transition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TransitionFlag {
    InsertTransition,
    OmitTransition,
}

/// Transition key of the property described by `descriptor`.
pub(crate) fn descriptor_key(descriptor: &Descriptor) -> TransitionKey {
    TransitionKey::Property {
        name: descriptor.key,
        hash: descriptor.key_hash,
        kind: descriptor.details.kind(),
        attributes: descriptor.details.attributes(),
    }
}

/// Copy every shape attribute except the descriptors and the transition
/// tree links. The copy owns its (empty) descriptors and is not deprecated.
pub(crate) fn raw_copy(
    agent: &mut Agent,
    shape: ObjectShape,
    inobject_properties: u32,
    unused_property_fields: u32,
) -> ObjectShape {
    let mut record = shape.record(agent).clone();
    record.inobject_properties = inobject_properties;
    record.unused_property_fields = unused_property_fields;
    record.instance_descriptors = DescriptorArrayIndex::EMPTY;
    record.number_of_own_descriptors = 0;
    record.prototype_info = None;
    record.flags.insert(ShapeFlags::OWNS_DESCRIPTORS);
    record.flags.remove(ShapeFlags::IS_DEPRECATED);
    if !record.flags.contains(ShapeFlags::IS_DICTIONARY_MAP) {
        record.flags.remove(ShapeFlags::IS_UNSTABLE);
    }
    agent.heap.create((record, ObjectShapeTransitionMap::ROOT))
}

/// Copy of `shape` without descriptors but with the same field budget.
pub(crate) fn copy_drop_descriptors(agent: &mut Agent, shape: ObjectShape) -> ObjectShape {
    let inobject_properties = shape.inobject_properties(agent);
    let unused = shape.unused_property_fields(agent);
    raw_copy(agent, shape, inobject_properties, unused)
}

pub(crate) fn initialize_descriptors(
    agent: &mut Agent,
    shape: ObjectShape,
    descriptors: DescriptorArrayIndex,
    number_of_own_descriptors: u32,
) {
    let record = shape.record_mut(agent);
    record.instance_descriptors = descriptors;
    record.number_of_own_descriptors = number_of_own_descriptors;
}

fn install_descriptors(agent: &mut Agent, shape: ObjectShape, descriptors: DescriptorArrayRecord) {
    let number_of_own_descriptors = descriptors.len();
    let index = if descriptors.is_empty() {
        DescriptorArrayIndex::EMPTY
    } else {
        agent.heap.create(descriptors)
    };
    initialize_descriptors(agent, shape, index, number_of_own_descriptors);
}

/// Derive a shape from `shape` that is described by `descriptors`.
///
/// The result is connected to `shape` under `key` if transitions may be
/// inserted; otherwise it is a private copy with all fields generalized.
/// Prototype shapes are never connected and keep their field details.
pub(crate) fn copy_replace_descriptors(
    agent: &mut Agent,
    shape: ObjectShape,
    mut descriptors: DescriptorArrayRecord,
    flag: TransitionFlag,
    key: Option<TransitionKey>,
    reason: &str,
) -> ObjectShape {
    let result = copy_drop_descriptors(agent, shape);
    if shape.is_prototype_map(agent) {
        install_descriptors(agent, result, descriptors);
        return result;
    }
    if flag == TransitionFlag::InsertTransition
        && let Some(key) = key
        && shape.can_have_more_transitions(agent)
    {
        install_descriptors(agent, result, descriptors);
        shape.connect_transition(agent, result, key);
    } else {
        descriptors.generalize_all_fields();
        install_descriptors(agent, result, descriptors);
        log::debug!("{reason}: private shape {result:?} copied from {shape:?}");
    }
    result
}

/// Append `descriptor` to the descriptor array of `shape` and hand the
/// array over to the new child. `shape` must own its descriptors.
fn share_descriptor(agent: &mut Agent, shape: ObjectShape, descriptor: Descriptor) -> ObjectShape {
    let key = descriptor_key(&descriptor);
    let index = shape.instance_descriptors(agent);
    let index = if index == DescriptorArrayIndex::EMPTY {
        let mut descriptors = DescriptorArrayRecord::with_capacity(4);
        descriptors.append(descriptor);
        agent.heap.create(descriptors)
    } else {
        agent.heap.descriptor_arrays[index.into_index()].append(descriptor);
        index
    };
    let result = copy_drop_descriptors(agent, shape);
    let number_of_own_descriptors = shape.number_of_own_descriptors(agent) + 1;
    initialize_descriptors(agent, result, index, number_of_own_descriptors);
    shape.connect_transition(agent, result, key);
    result
}

/// Whether the descriptor array of `shape` may be appended to in place.
fn can_share_descriptors(agent: &Agent, shape: ObjectShape) -> bool {
    shape.owns_descriptors(agent)
        && shape.parent(agent).is_some()
        && !agent.is_bootstrapping()
        && shape.descriptors(agent).len() == shape.number_of_own_descriptors(agent)
        && shape.can_have_more_transitions(agent)
}

/// Derive a shape with `descriptor` added after the existing ones.
pub(crate) fn copy_add_descriptor(
    agent: &mut Agent,
    shape: ObjectShape,
    descriptor: Descriptor,
    flag: TransitionFlag,
) -> ObjectShape {
    if flag == TransitionFlag::InsertTransition && can_share_descriptors(agent, shape) {
        return share_descriptor(agent, shape, descriptor);
    }
    let key = descriptor_key(&descriptor);
    let nof = shape.number_of_own_descriptors(agent);
    let mut descriptors = shape.descriptors(agent).copy_up_to(nof, 1);
    descriptors.append(descriptor);
    copy_replace_descriptors(
        agent,
        shape,
        descriptors,
        flag,
        Some(key),
        "CopyAddDescriptor",
    )
}

/// Derive a shape with `descriptor` replacing the descriptor with the same
/// key, or added if there is none.
pub(crate) fn copy_insert_descriptor(
    agent: &mut Agent,
    shape: ObjectShape,
    descriptor: Descriptor,
    flag: TransitionFlag,
) -> ObjectShape {
    let nof = shape.number_of_own_descriptors(agent);
    match shape
        .descriptors(agent)
        .search(descriptor.key, descriptor.key_hash, nof)
    {
        Some(index) => copy_replace_descriptor(agent, shape, descriptor, index, flag),
        None => copy_add_descriptor(agent, shape, descriptor, flag),
    }
}

/// Derive a shape where the descriptor at `insertion_index` is replaced.
/// The child has as many descriptors as its parent.
pub(crate) fn copy_replace_descriptor(
    agent: &mut Agent,
    shape: ObjectShape,
    descriptor: Descriptor,
    insertion_index: u32,
    flag: TransitionFlag,
) -> ObjectShape {
    let key = descriptor_key(&descriptor);
    let nof = shape.number_of_own_descriptors(agent);
    let mut descriptors = shape.descriptors(agent).copy_up_to(nof, 0);
    descriptors.replace(insertion_index, descriptor);
    copy_replace_descriptors(
        agent,
        shape,
        descriptors,
        flag,
        Some(key),
        "CopyReplaceDescriptor",
    )
}

/// ### CopyWithField
///
/// Derive a shape with a new data field. Returns `None` if the shape
/// cannot describe another property; the caller must normalize instead.
#[allow(clippy::too_many_arguments)]
pub(crate) fn copy_with_field(
    agent: &mut Agent,
    shape: ObjectShape,
    name: Name,
    field_type: FieldType,
    attributes: PropertyAttributes,
    constness: PropertyConstness,
    representation: Representation,
    flag: TransitionFlag,
) -> Option<ObjectShape> {
    if shape.number_of_own_descriptors(agent) as usize >= agent.options.max_number_of_descriptors {
        return None;
    }
    let constness = if agent.options.track_constant_fields {
        constness
    } else {
        PropertyConstness::Mutable
    };
    let field_type = if agent.options.track_field_types {
        field_type
    } else {
        FieldType::Any
    };
    let index = shape.next_free_property_index(agent);
    let descriptor = Descriptor::data_field(
        agent,
        name,
        index,
        attributes,
        constness,
        representation,
        field_type,
    );
    let new_shape = copy_add_descriptor(agent, shape, descriptor, flag);
    new_shape.record_mut(agent).account_added_property_field();
    Some(new_shape)
}

/// ### CopyWithConstant
///
/// Derive a shape that stores `value` in the descriptor itself.
pub(crate) fn copy_with_constant(
    agent: &mut Agent,
    shape: ObjectShape,
    name: Name,
    value: Value,
    attributes: PropertyAttributes,
    flag: TransitionFlag,
) -> Option<ObjectShape> {
    if shape.number_of_own_descriptors(agent) as usize >= agent.options.max_number_of_descriptors {
        return None;
    }
    let descriptor = Descriptor::data_constant(agent, name, value, attributes);
    Some(copy_add_descriptor(agent, shape, descriptor, flag))
}

/// ### Copy
///
/// Unconnected copy of `shape`.
pub(crate) fn copy(agent: &mut Agent, shape: ObjectShape, reason: &str) -> ObjectShape {
    let nof = shape.number_of_own_descriptors(agent);
    let descriptors = shape.descriptors(agent).copy_up_to(nof, 0);
    copy_replace_descriptors(
        agent,
        shape,
        descriptors,
        TransitionFlag::OmitTransition,
        None,
        reason,
    )
}

/// Dictionary mode counterpart of `shape`.
pub(crate) fn copy_normalized(
    agent: &mut Agent,
    shape: ObjectShape,
    mode: NormalizationMode,
) -> ObjectShape {
    let inobject_properties = match mode {
        NormalizationMode::ClearInobjectProperties => 0,
        NormalizationMode::KeepInobjectProperties => shape.inobject_properties(agent),
    };
    let result = raw_copy(agent, shape, inobject_properties, 0);
    let record = result.record_mut(agent);
    let flags = ShapeFlags::IS_DICTIONARY_MAP | ShapeFlags::MAY_HAVE_INTERESTING_SYMBOLS;
    record.flags.insert(flags);
    record.flags.remove(ShapeFlags::IS_MIGRATION_TARGET);
    result
}

/// ### Normalize
///
/// Dictionary mode shape for instances of `fast_shape`. Shapes of ordinary
/// objects are shared through the normalized shape cache.
pub(crate) fn normalize(
    agent: &mut Agent,
    fast_shape: ObjectShape,
    elements_kind: ElementsKind,
    mode: NormalizationMode,
    reason: &str,
) -> ObjectShape {
    debug_assert!(!fast_shape.is_dictionary_map(agent));
    let use_cache = !fast_shape.is_prototype_map(agent);
    let cached = if use_cache {
        NormalizedShapeCache::get(agent, fast_shape, elements_kind, mode)
    } else {
        None
    };
    let new_shape = match cached {
        Some(shape) => shape,
        None => {
            let new_shape = copy_normalized(agent, fast_shape, mode);
            new_shape.record_mut(agent).elements_kind = elements_kind;
            if use_cache {
                NormalizedShapeCache::set(agent, fast_shape, new_shape);
            }
            new_shape
        }
    };
    fast_shape.mark_unstable(agent);
    log::debug!("{reason}: normalized {fast_shape:?} to {new_shape:?}");
    new_shape
}

/// Elements kind of a shape that gained the given integrity attributes.
fn elements_kind_for_integrity(kind: ElementsKind, attributes: PropertyAttributes) -> ElementsKind {
    if kind == ElementsKind::TypedArray {
        return kind;
    }
    if !kind.is_fast() {
        return ElementsKind::Dictionary;
    }
    if attributes == PropertyAttributes::FROZEN {
        ElementsKind::PackedFrozen
    } else if attributes == PropertyAttributes::SEALED {
        if kind == ElementsKind::PackedFrozen {
            kind
        } else {
            ElementsKind::PackedSealed
        }
    } else if kind.is_frozen_or_sealed() || kind == ElementsKind::PackedNonExtensible {
        kind
    } else {
        ElementsKind::PackedNonExtensible
    }
}

/// ### CopyForPreventExtensions
///
/// Non-extensible copy of `shape` with `attributes_to_add` added to every
/// property. The copy is reached through the `marker` transition.
pub(crate) fn copy_for_prevent_extensions(
    agent: &mut Agent,
    shape: ObjectShape,
    attributes_to_add: PropertyAttributes,
    marker: SpecialTransition,
    reason: &str,
) -> ObjectShape {
    let nof = shape.number_of_own_descriptors(agent);
    let descriptors = shape
        .descriptors(agent)
        .copy_up_to_add_attributes(agent, nof, attributes_to_add);
    let flag = if agent.is_bootstrapping() {
        TransitionFlag::OmitTransition
    } else {
        TransitionFlag::InsertTransition
    };
    let new_shape = copy_replace_descriptors(
        agent,
        shape,
        descriptors,
        flag,
        Some(TransitionKey::Special(marker)),
        reason,
    );
    let kind = elements_kind_for_integrity(shape.elements_kind(agent), attributes_to_add);
    let record = new_shape.record_mut(agent);
    record.flags.remove(ShapeFlags::IS_EXTENSIBLE);
    record.elements_kind = kind;
    new_shape
}

/// Copy of `shape` that keeps its descriptors. Ownership of the
/// descriptor array moves to the copy if `shape` owned it.
fn copy_for_elements_transition(agent: &mut Agent, shape: ObjectShape) -> ObjectShape {
    let new_shape = copy_drop_descriptors(agent, shape);
    let nof = shape.number_of_own_descriptors(agent);
    if shape.owns_descriptors(agent) {
        let index = shape.instance_descriptors(agent);
        initialize_descriptors(agent, new_shape, index, nof);
    } else {
        let descriptors = shape.descriptors(agent).copy_up_to(nof, 0);
        install_descriptors(agent, new_shape, descriptors);
    }
    new_shape
}

/// Whether `shape` already has an elements kind transition.
fn has_elements_transition(agent: &Agent, shape: ObjectShape) -> bool {
    shape.transitions(agent).iter().any(|(key, _)| {
        matches!(
            key,
            TransitionKey::Special(SpecialTransition::ElementsKind(_))
        )
    })
}

/// ### CopyAsElementsKind
pub(crate) fn copy_as_elements_kind(
    agent: &mut Agent,
    shape: ObjectShape,
    kind: ElementsKind,
    flag: TransitionFlag,
) -> ObjectShape {
    let insert_transition = flag == TransitionFlag::InsertTransition
        && !agent.is_bootstrapping()
        && shape.can_have_more_transitions(agent)
        && !has_elements_transition(agent, shape);
    if insert_transition {
        let new_shape = copy_for_elements_transition(agent, shape);
        new_shape.record_mut(agent).elements_kind = kind;
        shape.connect_transition(
            agent,
            new_shape,
            TransitionKey::Special(SpecialTransition::ElementsKind(kind)),
        );
        return new_shape;
    }
    let new_shape = copy(agent, shape, "CopyAsElementsKind");
    new_shape.record_mut(agent).elements_kind = kind;
    new_shape
}

/// ### CopyGeneralizeAllFields
///
/// Private copy of `shape` with every field generalized. Unless the
/// instance is merely being migrated, the descriptor at `modify_index` is
/// turned into a mutable data field with `attributes`.
pub(crate) fn copy_generalize_all_fields(
    agent: &mut Agent,
    shape: ObjectShape,
    elements_kind: ElementsKind,
    modify_index: Option<u32>,
    attributes: PropertyAttributes,
    reason: &str,
) -> ObjectShape {
    let nof = shape.number_of_own_descriptors(agent);
    let descriptors = shape.descriptors(agent).copy_up_to(nof, 0);
    let new_shape = copy_replace_descriptors(
        agent,
        shape,
        descriptors,
        TransitionFlag::OmitTransition,
        None,
        reason,
    );
    if let Some(modify_index) = modify_index {
        let descriptor = *new_shape.descriptors(agent).get(modify_index);
        let details = descriptor.details;
        if details.constness() != PropertyConstness::Mutable
            || details.location() != PropertyLocation::Field
            || details.kind() != PropertyKind::Data
            || details.attributes() != attributes
        {
            let is_field = details.location() == PropertyLocation::Field;
            let field_index = if is_field {
                details.field_index()
            } else {
                new_shape.next_free_property_index(agent)
            };
            let replacement = Descriptor::data_field(
                agent,
                descriptor.key,
                field_index,
                attributes,
                PropertyConstness::Mutable,
                Representation::Tagged,
                FieldType::Any,
            );
            let index = new_shape.instance_descriptors(agent);
            if index == DescriptorArrayIndex::EMPTY {
                unreachable!("Modified descriptor of a shape without descriptors");
            }
            agent.heap.descriptor_arrays[index.into_index()].replace(modify_index, replacement);
            if !is_field {
                new_shape.record_mut(agent).account_added_property_field();
            }
        }
        log::debug!(
            "{reason}: generalized all fields of {shape:?} into {new_shape:?}, modified descriptor {modify_index}"
        );
    }
    new_shape.record_mut(agent).elements_kind = elements_kind;
    new_shape
}
