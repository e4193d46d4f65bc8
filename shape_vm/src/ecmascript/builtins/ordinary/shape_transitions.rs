// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Shape transitions
//!
//! The shape an object moves to when it gains a property, changes a
//! property, changes its prototype or elements kind, or becomes
//! non-extensible. Existing transitions are reused; otherwise the new shape
//! is derived from the current one and recorded in the transition tree.

use crate::ecmascript::{
    builtins::{
        AccessorPair,
        ordinary::{
            descriptor_array::{Descriptor, DescriptorValue},
            prototype_info::optimize_as_prototype,
            shape::{ElementsKind, NormalizationMode, ObjectShape, ShapeFlags, StoreOrigin},
            shape_copy::{
                TransitionFlag, copy, copy_as_elements_kind, copy_for_prevent_extensions,
                copy_insert_descriptor, copy_with_constant, copy_with_field, normalize,
            },
            shape_updater::{ShapeUpdater, update},
            transitions::{SpecialTransition, TransitionKey},
        },
    },
    execution::Agent,
    types::{
        FieldType, Name, Object, PropertyAttributes, PropertyConstness, PropertyKind,
        PropertyLocation, Representation, Value,
    },
};

fn normalization_mode_for(agent: &Agent, shape: ObjectShape) -> NormalizationMode {
    if shape.is_prototype_map(agent) {
        NormalizationMode::KeepInobjectProperties
    } else {
        NormalizationMode::ClearInobjectProperties
    }
}

fn transition_flag(agent: &Agent) -> TransitionFlag {
    if agent.is_bootstrapping() {
        TransitionFlag::OmitTransition
    } else {
        TransitionFlag::InsertTransition
    }
}

/// ### AsElementsKind
///
/// Shape like `shape` with the given elements kind, following an existing
/// elements kind transition where there is one.
pub(crate) fn as_elements_kind(
    agent: &mut Agent,
    shape: ObjectShape,
    kind: ElementsKind,
) -> ObjectShape {
    if shape.elements_kind(agent) == kind {
        return shape;
    }
    let key = TransitionKey::Special(SpecialTransition::ElementsKind(kind));
    if let Some(target) = shape.search_transition(agent, key) {
        return target;
    }
    copy_as_elements_kind(agent, shape, kind, transition_flag(agent))
}

/// ### TransitionElementsTo
pub(crate) fn transition_elements_to(
    agent: &mut Agent,
    shape: ObjectShape,
    kind: ElementsKind,
) -> ObjectShape {
    let from_kind = shape.elements_kind(agent);
    if from_kind == kind {
        return shape;
    }
    if shape.is_dictionary_map(agent) || !from_kind.is_more_general_transition(kind) {
        let new_shape = copy(agent, shape, "TransitionElementsTo");
        new_shape.record_mut(agent).elements_kind = kind;
        return new_shape;
    }
    ShapeUpdater::new(agent, shape).reconfigure_elements_kind(agent, kind)
}

/// Whether the descriptor can hold `value` without changing the shape.
fn can_hold_value(
    agent: &Agent,
    shape: ObjectShape,
    descriptor: u32,
    constness: PropertyConstness,
    value: Value,
) -> bool {
    let descriptor = shape.descriptors(agent).get(descriptor);
    let details = descriptor.details;
    match (details.location(), details.kind()) {
        (PropertyLocation::Field, PropertyKind::Data) => {
            constness.is_generalizable_to(details.constness())
                && value.fits_representation(details.representation())
                && value.fits_field_type(agent, descriptor.field_type())
        }
        (PropertyLocation::Descriptor, PropertyKind::Data) => {
            descriptor.value == DescriptorValue::Constant(value)
        }
        (_, PropertyKind::Accessor) => false,
    }
}

/// ### UpdateDescriptorForValue
///
/// Shape whose descriptor `descriptor` can hold `value`, generalizing the
/// field if needed.
pub(crate) fn update_descriptor_for_value(
    agent: &mut Agent,
    shape: ObjectShape,
    descriptor: u32,
    constness: PropertyConstness,
    value: Value,
) -> ObjectShape {
    if can_hold_value(agent, shape, descriptor, constness, value) {
        return shape;
    }
    let attributes = shape.descriptor_details(agent, descriptor).attributes();
    let representation = value.optimal_representation();
    let field_type = value.optimal_type(agent, representation);
    ShapeUpdater::new(agent, shape).reconfigure_to_data_field(
        agent,
        descriptor,
        attributes,
        constness,
        representation,
        field_type,
    )
}

/// ### PrepareForDataProperty
///
/// Shape to store `value` into the existing data property `descriptor`
/// with.
pub(crate) fn prepare_for_data_property(
    agent: &mut Agent,
    shape: ObjectShape,
    descriptor: u32,
    constness: PropertyConstness,
    value: Value,
) -> ObjectShape {
    let shape = update(agent, shape);
    debug_assert!(!shape.is_dictionary_map(agent));
    update_descriptor_for_value(agent, shape, descriptor, constness, value)
}

/// ### TransitionToDataProperty
///
/// Shape of an object with `shape` after a data property `name` holding
/// `value` was added to it. Falls back to a dictionary mode shape if the
/// object has too many fast properties.
pub(crate) fn transition_to_data_property(
    agent: &mut Agent,
    shape: ObjectShape,
    name: Name,
    value: Value,
    attributes: PropertyAttributes,
    constness: PropertyConstness,
    store_origin: StoreOrigin,
) -> ObjectShape {
    let shape = update(agent, shape);
    let key = TransitionKey::property(agent, name, PropertyKind::Data, attributes);
    if let Some(transition) = shape.search_transition(agent, key) {
        let Some(descriptor) = transition.last_added(agent) else {
            return transition;
        };
        let details = transition.descriptor_details(agent, descriptor);
        debug_assert_eq!(details.attributes(), attributes);
        return update_descriptor_for_value(agent, transition, descriptor, constness, value);
    }
    log::trace!(
        "No transition for {} from {shape:?}",
        name.to_display_string(agent)
    );

    let flag = TransitionFlag::InsertTransition;
    let new_shape = if shape.too_many_fast_properties(agent, store_origin) {
        None
    } else if agent.options.embed_function_constants && value.is_callable(agent) {
        copy_with_constant(agent, shape, name, value, attributes, flag)
    } else {
        let representation = value.optimal_representation();
        let field_type = value.optimal_type(agent, representation);
        copy_with_field(
            agent,
            shape,
            name,
            field_type,
            attributes,
            constness,
            representation,
            flag,
        )
    };
    match new_shape {
        Some(new_shape) => new_shape,
        None => {
            let elements_kind = shape.elements_kind(agent);
            normalize(
                agent,
                shape,
                elements_kind,
                NormalizationMode::ClearInobjectProperties,
                "TooManyFastProperties",
            )
        }
    }
}

/// ### ReconfigureExistingProperty
///
/// Shape in which the existing property `descriptor` is a data property
/// with `attributes`.
pub(crate) fn reconfigure_existing_property(
    agent: &mut Agent,
    shape: ObjectShape,
    descriptor: u32,
    kind: PropertyKind,
    attributes: PropertyAttributes,
    constness: PropertyConstness,
) -> ObjectShape {
    debug_assert!(!shape.is_dictionary_map(agent));
    debug_assert_eq!(kind, PropertyKind::Data);
    if shape.parent(agent).is_none() {
        // Shapes outside of a tree gain nothing from rebuilding one.
        let elements_kind = shape.elements_kind(agent);
        return normalize(
            agent,
            shape,
            elements_kind,
            NormalizationMode::ClearInobjectProperties,
            "Normalize_AttributesMismatchProtoMap",
        );
    }
    ShapeUpdater::new(agent, shape).reconfigure_to_data_field(
        agent,
        descriptor,
        attributes,
        constness,
        Representation::None,
        FieldType::None,
    )
}

/// ### TransitionToAccessorProperty
///
/// Shape of an object with `shape` after the accessor `name` was defined
/// on it. `None` components are left as they are; `Some(None)` sets a
/// component to undefined.
pub(crate) fn transition_to_accessor_property(
    agent: &mut Agent,
    shape: ObjectShape,
    name: Name,
    descriptor: Option<u32>,
    getter: Option<Option<Object>>,
    setter: Option<Option<Object>>,
    attributes: PropertyAttributes,
) -> ObjectShape {
    let shape = update(agent, shape);
    if shape.is_dictionary_map(agent) {
        return shape;
    }
    let mode = normalization_mode_for(agent, shape);
    let elements_kind = shape.elements_kind(agent);
    let bail = |agent: &mut Agent, reason| normalize(agent, shape, elements_kind, mode, reason);
    let key = TransitionKey::property(agent, name, PropertyKind::Accessor, attributes);
    if let Some(transition) = shape.search_transition(agent, key) {
        let Some(last) = transition.last_added(agent) else {
            return bail(agent, "TransitionToAccessorFromNonPair");
        };
        let Some(pair) = transition.descriptors(agent).get(last).accessors() else {
            return bail(agent, "TransitionToAccessorFromNonPair");
        };
        if !pair.equals(agent, getter.flatten(), setter.flatten()) {
            return bail(agent, "TransitionToDifferentAccessor");
        }
        return transition;
    }

    let descriptors_full =
        shape.number_of_own_descriptors(agent) as usize >= agent.options.max_number_of_descriptors;
    let pair = if let Some(descriptor) = descriptor {
        if Some(descriptor) != shape.last_added(agent) {
            return bail(agent, "AccessorsOverwritingNonLast");
        }
        let existing = *shape.descriptors(agent).get(descriptor);
        if existing.details.kind() != PropertyKind::Accessor {
            return bail(agent, "AccessorsOverwritingNonAccessors");
        }
        if existing.details.attributes() != attributes {
            return bail(agent, "AccessorsWithAttributes");
        }
        let Some(current) = existing.accessors() else {
            return bail(agent, "AccessorsOverwritingNonPair");
        };
        let current_getter = current.getter(agent);
        let current_setter = current.setter(agent);
        let new_getter = getter.unwrap_or(current_getter);
        let new_setter = setter.unwrap_or(current_setter);
        if new_getter == current_getter && new_setter == current_setter {
            return shape;
        }
        let overwrites = |component: Option<Option<Object>>, current: Option<Object>| {
            matches!(component, Some(new) if current.is_some() && new != current)
        };
        if overwrites(getter, current_getter) || overwrites(setter, current_setter) {
            return bail(agent, "AccessorsOverwritingAccessors");
        }
        AccessorPair::new(agent, new_getter, new_setter)
    } else if descriptors_full || shape.too_many_fast_properties(agent, StoreOrigin::Named) {
        return normalize(
            agent,
            shape,
            elements_kind,
            NormalizationMode::ClearInobjectProperties,
            "TooManyAccessors",
        );
    } else {
        AccessorPair::new(agent, getter.flatten(), setter.flatten())
    };

    let descriptor = Descriptor::accessor_constant(agent, name, pair, attributes);
    let flag = transition_flag(agent);
    copy_insert_descriptor(agent, shape, descriptor, flag)
}

/// ### TransitionToPrototype
///
/// Shape like `shape` with a different prototype. Results are cached per
/// shape and prototype.
pub(crate) fn transition_to_prototype(
    agent: &mut Agent,
    shape: ObjectShape,
    prototype: Option<Object>,
) -> ObjectShape {
    if let Some(prototype) = prototype
        && let Some(cached) = shape.transitions(agent).get_prototype_transition(prototype)
    {
        return cached;
    }
    let new_shape = copy(agent, shape, "TransitionToPrototype");
    if let Some(prototype) = prototype
        && !shape.is_prototype_map(agent)
        && !shape.is_dictionary_map(agent)
    {
        shape
            .transitions_mut(agent)
            .put_prototype_transition(prototype, new_shape);
    }
    new_shape.record_mut(agent).prototype = prototype;
    if let Some(prototype) = prototype {
        optimize_as_prototype(agent, prototype);
    }
    new_shape
}

/// ### TransitionToImmutableProto
pub(crate) fn transition_to_immutable_proto(agent: &mut Agent, shape: ObjectShape) -> ObjectShape {
    let new_shape = copy(agent, shape, "ImmutablePrototype");
    new_shape.set_flag(agent, ShapeFlags::IS_IMMUTABLE_PROTO, true);
    new_shape
}

/// Marker of the special transition that applies an integrity level.
pub(crate) fn integrity_marker(attributes: PropertyAttributes) -> SpecialTransition {
    if attributes == PropertyAttributes::FROZEN {
        SpecialTransition::Frozen
    } else if attributes == PropertyAttributes::SEALED {
        SpecialTransition::Sealed
    } else {
        SpecialTransition::NonExtensible
    }
}

/// Non-extensible shape with `attributes` added to every property, reached
/// through the special transition for the integrity level. `None` if the
/// tree cannot take another transition; the object has to be normalized.
pub(crate) fn transition_for_prevent_extensions(
    agent: &mut Agent,
    shape: ObjectShape,
    attributes: PropertyAttributes,
) -> Option<ObjectShape> {
    let shape = update(agent, shape);
    let marker = integrity_marker(attributes);
    if let Some(transition) = shape.search_transition(agent, TransitionKey::Special(marker)) {
        debug_assert!(!transition.is_extensible(agent));
        return Some(transition);
    }
    if shape.is_dictionary_map(agent)
        || !(shape.is_prototype_map(agent) || shape.can_have_more_transitions(agent))
    {
        return None;
    }
    Some(copy_for_prevent_extensions(
        agent,
        shape,
        attributes,
        marker,
        "CopyForPreventExtensions",
    ))
}
