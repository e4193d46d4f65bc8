// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Shape updates
//!
//! Generalizing a field, reconfiguring an existing property and updating a
//! deprecated shape all rebuild a part of a transition tree. The updater
//! walks down from the root of the old shape's tree along the old shape's
//! properties, reuses every shape that can hold the new layout and creates
//! the missing ones. The part of the tree that became incompatible is
//! deprecated; instances still using it are migrated lazily.
//!
//! Whenever the tree cannot be reused the updater falls back to a private
//! copy of the old shape with all fields generalized.

use crate::{
    ecmascript::{
        builtins::ordinary::{
            descriptor_array::{Descriptor, DescriptorArrayRecord, DescriptorValue},
            prototype_info::invalidate_prototype_chains,
            shape::{ElementsKind, ObjectShape, ShapeFlags},
            shape_copy::{
                copy_drop_descriptors, copy_for_prevent_extensions, copy_generalize_all_fields,
                descriptor_key, initialize_descriptors,
            },
            shape_transitions::as_elements_kind,
            transitions::{SpecialTransition, TransitionKey},
        },
        execution::Agent,
        types::{
            FieldType, Name, PropertyAttributes, PropertyConstness, PropertyDetails, PropertyKind,
            PropertyLocation, Representation,
        },
    },
    heap::{CreateHeapData, indexes::DescriptorArrayIndex},
};

/// Integrity level transitions between an extensible shape and the old
/// shape.
#[derive(Debug, Clone, Copy)]
struct IntegrityLevelTransition {
    /// Last extensible shape before the integrity level transitions.
    source: ObjectShape,
    /// The most restrictive of the transitions.
    marker: SpecialTransition,
}

impl IntegrityLevelTransition {
    fn attributes(self) -> PropertyAttributes {
        match self.marker {
            SpecialTransition::Frozen => PropertyAttributes::FROZEN,
            SpecialTransition::Sealed => PropertyAttributes::SEALED,
            _ => PropertyAttributes::NONE,
        }
    }

    fn keeps_old_attributes(self) -> bool {
        matches!(
            self.marker,
            SpecialTransition::Sealed | SpecialTransition::Frozen
        )
    }
}

/// Integrity level marker of the transition from `parent` to `child`.
fn integrity_level_transition_to(
    agent: &Agent,
    parent: ObjectShape,
    child: ObjectShape,
) -> Option<SpecialTransition> {
    [
        SpecialTransition::Frozen,
        SpecialTransition::Sealed,
        SpecialTransition::NonExtensible,
    ]
    .into_iter()
    .find(|marker| parent.search_transition(agent, TransitionKey::Special(*marker)) == Some(child))
}

/// Find the integrity level transitions that lead to the non-extensible
/// `shape`. Fails if anything else is interleaved with them.
fn detect_integrity_level_transitions(
    agent: &Agent,
    shape: ObjectShape,
) -> Option<IntegrityLevelTransition> {
    let previous = shape.parent(agent)?;
    let marker = integrity_level_transition_to(agent, previous, shape)?;
    let mut source = previous;
    while !source.is_extensible(agent) {
        let previous = source.parent(agent)?;
        integrity_level_transition_to(agent, previous, source)?;
        source = previous;
    }
    debug_assert_eq!(
        shape.number_of_own_descriptors(agent),
        source.number_of_own_descriptors(agent)
    );
    Some(IntegrityLevelTransition { source, marker })
}

/// Join of two field types of a field with the given representation.
pub(crate) fn generalize_field_type(
    representation: Representation,
    a: FieldType,
    b: FieldType,
) -> FieldType {
    if representation.is_none() {
        return a.generalize(b);
    }
    if !representation.is_heap_object() {
        return FieldType::Any;
    }
    a.generalize(b)
}

/// Field type the given descriptor implies for `representation`.
fn field_type_of(
    agent: &Agent,
    descriptor: &Descriptor,
    representation: Representation,
) -> FieldType {
    match descriptor.value {
        DescriptorValue::FieldType(field_type) => field_type,
        DescriptorValue::Constant(value) => value.optimal_type(agent, representation),
        DescriptorValue::Accessors(_) => FieldType::Any,
    }
}

fn location_is_generalizable_to(from: PropertyLocation, to: PropertyLocation) -> bool {
    to == PropertyLocation::Field || from == PropertyLocation::Descriptor
}

/// ### Field owner
///
/// The shape that introduced the given descriptor. Field details are
/// modified at the owner and everywhere below it.
pub(crate) fn find_field_owner(
    agent: &Agent,
    shape: ObjectShape,
    descriptor: u32,
) -> ObjectShape {
    let details = shape.descriptor_details(agent, descriptor);
    debug_assert_eq!(details.location(), PropertyLocation::Field);
    let mut result = shape;
    while let Some(parent) = result.parent(agent) {
        if parent.number_of_own_descriptors(agent) <= descriptor {
            break;
        }
        result = parent;
    }
    result
}

/// Update the details of field `descriptor` in `owner` and every shape
/// reachable from it through transitions.
fn update_field_type(
    agent: &mut Agent,
    owner: ObjectShape,
    descriptor: u32,
    name: Name,
    constness: PropertyConstness,
    representation: Representation,
    field_type: FieldType,
) {
    let details = owner.descriptor_details(agent, descriptor);
    if details.location() != PropertyLocation::Field {
        return;
    }
    if constness != details.constness() && owner.is_prototype_map(agent) {
        invalidate_prototype_chains(agent, owner);
    }
    let mut backlog = vec![owner];
    while let Some(current) = backlog.pop() {
        backlog.extend(current.transitions(agent).iter().map(|(_, target)| target));
        if current.number_of_own_descriptors(agent) <= descriptor {
            continue;
        }
        let index = current.instance_descriptors(agent);
        let existing = *agent.heap.descriptor_arrays[index.into_index()].get(descriptor);
        if existing.key != name || !existing.details.is_data_field() {
            continue;
        }
        debug_assert!(
            existing.details.representation() == representation
                || existing
                    .details
                    .representation()
                    .can_be_in_place_changed_to(representation)
        );
        // Shared arrays are visited once per sharer.
        if existing.details.constness() == constness
            && existing.details.representation() == representation
            && existing.field_type() == field_type
        {
            continue;
        }
        let replacement = Descriptor::data_field(
            agent,
            name,
            existing.details.field_index(),
            existing.details.attributes(),
            constness,
            representation,
            field_type,
        );
        agent.heap.descriptor_arrays[index.into_index()].replace(descriptor, replacement);
    }
}

/// ### GeneralizeField
///
/// Generalize field `descriptor` of `shape` in place so that it can hold
/// values of the given constness, representation and field type. The
/// change is made at the field owner and reaches every shape below it.
/// Only in-place representation changes are allowed.
pub(crate) fn generalize_field(
    agent: &mut Agent,
    shape: ObjectShape,
    descriptor: u32,
    new_constness: PropertyConstness,
    new_representation: Representation,
    new_field_type: FieldType,
) {
    let old = *shape.descriptors(agent).get(descriptor);
    let old_constness = old.details.constness();
    let old_representation = old.details.representation();
    let old_field_type = old.field_type();
    if new_constness.is_generalizable_to(old_constness)
        && old_representation == new_representation
        && !new_field_type.is_cleared()
        && new_field_type.now_is(old_field_type)
    {
        return;
    }
    let field_owner = find_field_owner(agent, shape, descriptor);
    let field_type = generalize_field_type(new_representation, old_field_type, new_field_type);
    let constness = old_constness.generalize(new_constness);
    update_field_type(
        agent,
        field_owner,
        descriptor,
        old.key,
        constness,
        new_representation,
        field_type,
    );
    log::debug!(
        "Generalized field {} of {shape:?} at owner {field_owner:?}: {} -> {}, {old_constness:?} -> {constness:?}",
        old.key.to_display_string(agent),
        old_representation.mnemonic(),
        new_representation.mnemonic(),
    );
}

/// Replace the descriptor array of `shape` and of its ancestors sharing
/// it with `descriptors`. Roots keep their array.
fn replace_descriptors(agent: &mut Agent, shape: ObjectShape, descriptors: DescriptorArrayIndex) {
    if shape.number_of_own_descriptors(agent) == 0 || shape.parent(agent).is_none() {
        return;
    }
    let to_replace = shape.instance_descriptors(agent);
    let mut current = shape;
    while current.instance_descriptors(agent) == to_replace {
        let Some(next) = current.parent(agent) else {
            break;
        };
        current.record_mut(agent).instance_descriptors = descriptors;
        current = next;
    }
    shape.set_flag(agent, ShapeFlags::OWNS_DESCRIPTORS, false);
}

/// Create the chain of shapes from `split_shape` to a shape described by
/// the first `number_of_descriptors` entries of `descriptors`.
fn add_missing_transitions(
    agent: &mut Agent,
    split_shape: ObjectShape,
    descriptors: DescriptorArrayIndex,
    number_of_descriptors: u32,
) -> ObjectShape {
    let split_nof = split_shape.number_of_own_descriptors(agent);
    debug_assert!(split_nof < number_of_descriptors);
    let mut shape = split_shape;
    for i in split_nof..number_of_descriptors {
        let new_shape = copy_drop_descriptors(agent, shape);
        initialize_descriptors(agent, new_shape, descriptors, i + 1);
        let descriptor = *agent.heap.descriptor_arrays[descriptors.into_index()].get(i);
        if descriptor.details.location() == PropertyLocation::Field {
            new_shape.record_mut(agent).account_added_property_field();
        }
        shape.connect_transition(agent, new_shape, descriptor_key(&descriptor));
        shape = new_shape;
    }
    shape
}

/// Rebuilds the transition tree of one shape.
#[derive(Debug)]
pub(crate) struct ShapeUpdater {
    old_shape: ObjectShape,
    old_descriptors: DescriptorArrayIndex,
    old_nof: u32,
    new_elements_kind: ElementsKind,
    /// Descriptor being reconfigured into a data field, if any.
    modified_descriptor: Option<u32>,
    new_attributes: PropertyAttributes,
    new_constness: PropertyConstness,
    new_representation: Representation,
    new_field_type: FieldType,
    root_shape: ObjectShape,
    target_shape: ObjectShape,
    integrity: Option<IntegrityLevelTransition>,
}

impl ShapeUpdater {
    pub(crate) fn new(agent: &Agent, old_shape: ObjectShape) -> Self {
        debug_assert!(!old_shape.is_dictionary_map(agent));
        Self {
            old_shape,
            old_descriptors: old_shape.instance_descriptors(agent),
            old_nof: old_shape.number_of_own_descriptors(agent),
            new_elements_kind: old_shape.elements_kind(agent),
            modified_descriptor: None,
            new_attributes: PropertyAttributes::NONE,
            new_constness: PropertyConstness::Mutable,
            new_representation: Representation::None,
            new_field_type: FieldType::None,
            root_shape: old_shape,
            target_shape: old_shape,
            integrity: None,
        }
    }

    /// ### ReconfigureToDataField
    ///
    /// Shape in which `descriptor` is a data field with the given
    /// attributes that can hold values of the given constness,
    /// representation and field type.
    pub(crate) fn reconfigure_to_data_field(
        mut self,
        agent: &mut Agent,
        descriptor: u32,
        attributes: PropertyAttributes,
        constness: PropertyConstness,
        representation: Representation,
        field_type: FieldType,
    ) -> ObjectShape {
        let constness = if agent.options.track_constant_fields {
            constness
        } else {
            PropertyConstness::Mutable
        };
        let field_type = if agent.options.track_field_types || representation.is_none() {
            field_type
        } else {
            FieldType::Any
        };
        self.modified_descriptor = Some(descriptor);
        self.new_attributes = attributes;
        let old = self.old_descriptor(agent, descriptor);
        if old.details.kind() == PropertyKind::Data {
            // Merge with what the old descriptor already allows.
            self.new_constness = constness.generalize(old.details.constness());
            let old_representation = old.details.representation();
            self.new_representation = representation.generalize(old_representation);
            let old_field_type = field_type_of(agent, &old, self.new_representation);
            self.new_field_type =
                generalize_field_type(self.new_representation, old_field_type, field_type);
        } else {
            // The previous value of a former accessor is unknown.
            self.new_constness = PropertyConstness::Mutable;
            self.new_representation = representation;
            self.new_field_type = field_type;
        }
        if let Some(result) = self.try_reconfigure_to_data_field_in_place(agent) {
            return result;
        }
        self.run(agent)
    }

    /// ### ReconfigureElementsKind
    pub(crate) fn reconfigure_elements_kind(
        mut self,
        agent: &mut Agent,
        elements_kind: ElementsKind,
    ) -> ObjectShape {
        self.new_elements_kind = elements_kind;
        self.run(agent)
    }

    /// Replacement of a deprecated shape.
    pub(crate) fn update(self, agent: &mut Agent) -> ObjectShape {
        debug_assert!(self.old_shape.is_deprecated(agent));
        self.run(agent)
    }

    fn run(mut self, agent: &mut Agent) -> ObjectShape {
        if let Some(result) = self.find_root_shape(agent) {
            return result;
        }
        if let Some(result) = self.find_target_shape(agent) {
            return result;
        }
        self.construct_new_shape(agent)
    }

    fn old_descriptor(&self, agent: &Agent, descriptor: u32) -> Descriptor {
        *agent.heap.descriptor_arrays[self.old_descriptors.into_index()].get(descriptor)
    }

    /// Details of old descriptor `descriptor` with the reconfiguration
    /// applied.
    fn details(&self, agent: &Agent, descriptor: u32) -> PropertyDetails {
        let old = self.old_descriptor(agent, descriptor).details;
        if self.modified_descriptor != Some(descriptor) {
            return old;
        }
        // Sealing and freezing leave no room for attribute changes, so the
        // old transition path is followed.
        let attributes = match self.integrity {
            Some(integrity) if integrity.keeps_old_attributes() => old.attributes(),
            _ => self.new_attributes,
        };
        let field_index = if old.location() == PropertyLocation::Field {
            old.field_index()
        } else {
            0
        };
        PropertyDetails::data_field(
            attributes,
            self.new_constness,
            self.new_representation,
            field_index,
        )
    }

    fn transition_key(&self, agent: &Agent, descriptor: u32) -> TransitionKey {
        let old = self.old_descriptor(agent, descriptor);
        let details = self.details(agent, descriptor);
        TransitionKey::Property {
            name: old.key,
            hash: old.key_hash,
            kind: details.kind(),
            attributes: details.attributes(),
        }
    }

    fn value(&self, agent: &Agent, descriptor: u32) -> DescriptorValue {
        if self.modified_descriptor == Some(descriptor) {
            return DescriptorValue::FieldType(self.new_field_type);
        }
        self.old_descriptor(agent, descriptor).value
    }

    fn field_type(
        &self,
        agent: &Agent,
        descriptor: u32,
        representation: Representation,
    ) -> FieldType {
        if self.modified_descriptor == Some(descriptor) {
            return self.new_field_type;
        }
        let old = self.old_descriptor(agent, descriptor);
        field_type_of(agent, &old, representation)
    }

    fn copy_generalize_all_fields(&self, agent: &mut Agent, reason: &str) -> ObjectShape {
        let attributes = match self.modified_descriptor {
            Some(descriptor) => self.details(agent, descriptor).attributes(),
            None => self.new_attributes,
        };
        copy_generalize_all_fields(
            agent,
            self.old_shape,
            self.new_elements_kind,
            self.modified_descriptor,
            attributes,
            reason,
        )
    }

    fn try_reconfigure_to_data_field_in_place(&self, agent: &mut Agent) -> Option<ObjectShape> {
        if self.old_shape.is_deprecated(agent) || self.new_representation.is_none() {
            return None;
        }
        let descriptor = self.modified_descriptor?;
        let old_details = self.old_descriptor(agent, descriptor).details;
        if old_details.attributes() != self.new_attributes
            || old_details.kind() != PropertyKind::Data
            || old_details.location() != PropertyLocation::Field
        {
            return None;
        }
        if !old_details
            .representation()
            .can_be_in_place_changed_to(self.new_representation)
        {
            return None;
        }
        generalize_field(
            agent,
            self.old_shape,
            descriptor,
            self.new_constness,
            self.new_representation,
            self.new_field_type,
        );
        Some(self.old_shape)
    }

    fn try_save_integrity_level_transitions(&mut self, agent: &Agent) -> bool {
        let Some(integrity) = detect_integrity_level_transitions(agent, self.old_shape) else {
            return false;
        };
        self.old_descriptors = integrity.source.instance_descriptors(agent);
        self.integrity = Some(integrity);
        true
    }

    fn find_root_shape(&mut self, agent: &mut Agent) -> Option<ObjectShape> {
        let root = self.old_shape.find_root_map(agent);
        self.root_shape = root;
        let from_kind = root.elements_kind(agent);
        let mut to_kind = self.new_elements_kind;
        if root.is_deprecated(agent) {
            return Some(self.copy_generalize_all_fields(agent, "GenAll_RootDeprecated"));
        }
        if !self.old_shape.equivalent_to_for_transition(agent, root) {
            return Some(self.copy_generalize_all_fields(agent, "GenAll_NotEquivalent"));
        }
        if self.old_shape.is_extensible(agent) != root.is_extensible(agent) {
            if !self.try_save_integrity_level_transitions(agent) {
                return Some(self.copy_generalize_all_fields(
                    agent,
                    "GenAll_PrivateSymbolsOnNonExtensible",
                ));
            }
            // Elements kind transitions are replayed before the integrity
            // level transition.
            if let Some(integrity) = self.integrity {
                to_kind = integrity.source.elements_kind(agent);
            }
        }
        if from_kind != to_kind
            && to_kind != ElementsKind::Dictionary
            && to_kind != ElementsKind::TypedArray
            && !from_kind.is_more_general_transition(to_kind)
        {
            return Some(self.copy_generalize_all_fields(agent, "GenAll_InvalidElementsTransition"));
        }
        let root_nof = root.number_of_own_descriptors(agent);
        if let Some(descriptor) = self.modified_descriptor
            && descriptor < root_nof
        {
            let old_details = self.old_descriptor(agent, descriptor).details;
            if old_details.kind() != PropertyKind::Data
                || old_details.attributes() != self.new_attributes
            {
                return Some(self.copy_generalize_all_fields(agent, "GenAll_RootModification1"));
            }
            if old_details.location() != PropertyLocation::Field {
                return Some(self.copy_generalize_all_fields(agent, "GenAll_RootModification2"));
            }
            if !self
                .new_representation
                .fits_into(old_details.representation())
            {
                return Some(self.copy_generalize_all_fields(agent, "GenAll_RootModification4"));
            }
            // The root itself is modified in place.
            generalize_field(
                agent,
                self.old_shape,
                descriptor,
                self.new_constness,
                old_details.representation(),
                self.new_field_type,
            );
        }
        self.root_shape = as_elements_kind(agent, root, to_kind);
        None
    }

    fn find_target_shape(&mut self, agent: &mut Agent) -> Option<ObjectShape> {
        self.target_shape = self.root_shape;
        let root_nof = self.root_shape.number_of_own_descriptors(agent);
        for i in root_nof..self.old_nof {
            let old_details = self.details(agent, i);
            let key = self.transition_key(agent, i);
            let Some(transition) = self.target_shape.search_transition(agent, key) else {
                break;
            };
            let target = *transition.descriptors(agent).get(i);
            let target_details = target.details;
            debug_assert_eq!(old_details.kind(), target_details.kind());
            debug_assert_eq!(old_details.attributes(), target_details.attributes());
            if old_details.kind() == PropertyKind::Accessor
                && self.value(agent, i) != target.value
            {
                return Some(self.copy_generalize_all_fields(agent, "GenAll_Incompatible"));
            }
            if !location_is_generalizable_to(old_details.location(), target_details.location()) {
                break;
            }
            let target_representation = target_details.representation();
            let old_representation = old_details.representation();
            if !old_representation.fits_into(target_representation) {
                break;
            }
            if target_details.location() == PropertyLocation::Field {
                let old_field_type = self.field_type(agent, i, target_representation);
                generalize_field(
                    agent,
                    transition,
                    i,
                    old_details.constness(),
                    target_representation,
                    old_field_type,
                );
            } else if self.value(agent, i) != target.value {
                break;
            }
            debug_assert!(!transition.is_deprecated(agent));
            self.target_shape = transition;
        }

        let target_nof = self.target_shape.number_of_own_descriptors(agent);
        if target_nof == self.old_nof {
            if self.target_shape != self.old_shape {
                self.old_shape.mark_unstable(agent);
            }
            match self.integrity {
                None => return Some(self.target_shape),
                Some(integrity) => {
                    let key = TransitionKey::Special(integrity.marker);
                    if let Some(result) = self.target_shape.search_transition(agent, key) {
                        return Some(result);
                    }
                }
            }
        }

        // Continue to the last shape of the old property sequence; its
        // descriptors are merged into the new ones.
        for i in target_nof..self.old_nof {
            let old_details = self.details(agent, i);
            let key = self.transition_key(agent, i);
            let Some(transition) = self.target_shape.search_transition(agent, key) else {
                break;
            };
            let target = *transition.descriptors(agent).get(i);
            if old_details.kind() == PropertyKind::Accessor
                && self.value(agent, i) != target.value
            {
                return Some(self.copy_generalize_all_fields(agent, "GenAll_Incompatible"));
            }
            self.target_shape = transition;
        }
        None
    }

    /// Merge the old descriptors with those of the target shape.
    fn build_descriptor_array(&self, agent: &Agent) -> DescriptorArrayRecord {
        let root_nof = self.root_shape.number_of_own_descriptors(agent);
        let target_nof = self.target_shape.number_of_own_descriptors(agent);
        let target_descriptors = self.target_shape.descriptors(agent);
        let mut descriptors = Vec::with_capacity(self.old_nof as usize);
        let mut current_offset = 0;

        for i in 0..root_nof {
            let old = self.old_descriptor(agent, i);
            if old.details.location() == PropertyLocation::Field {
                current_offset += 1;
            }
            descriptors.push(old);
        }

        for i in root_nof..target_nof.min(self.old_nof) {
            let old = self.old_descriptor(agent, i);
            let old_details = self.details(agent, i);
            let target = target_descriptors.get(i);
            let target_details = target.details;
            let attributes = old_details.attributes();
            let old_value = self.value(agent, i);
            if old_details.kind() == PropertyKind::Accessor {
                descriptors.push(Descriptor {
                    details: PropertyDetails::accessor_constant(attributes),
                    value: old_value,
                    ..old
                });
                continue;
            }
            let location = if old_details.location() == PropertyLocation::Field
                || target_details.location() == PropertyLocation::Field
                || old_value != target.value
            {
                PropertyLocation::Field
            } else {
                PropertyLocation::Descriptor
            };
            if location == PropertyLocation::Descriptor {
                descriptors.push(Descriptor {
                    details: PropertyDetails::data_constant(attributes),
                    value: old_value,
                    ..old
                });
                continue;
            }
            let constness = if agent.options.track_constant_fields {
                old_details
                    .constness()
                    .generalize(target_details.constness())
            } else {
                PropertyConstness::Mutable
            };
            let representation = old_details
                .representation()
                .generalize(target_details.representation());
            let old_field_type = self.field_type(agent, i, representation);
            let target_field_type = field_type_of(agent, target, representation);
            let field_type =
                generalize_field_type(representation, old_field_type, target_field_type);
            descriptors.push(Descriptor::data_field(
                agent,
                old.key,
                current_offset,
                attributes,
                constness,
                representation,
                field_type,
            ));
            current_offset += 1;
        }

        for i in target_nof.max(root_nof)..self.old_nof {
            let old = self.old_descriptor(agent, i);
            let details = self.details(agent, i);
            if details.location() != PropertyLocation::Field {
                descriptors.push(old);
                continue;
            }
            let field_type = self.field_type(agent, i, details.representation());
            descriptors.push(Descriptor::data_field(
                agent,
                old.key,
                current_offset,
                details.attributes(),
                details.constness(),
                details.representation(),
                field_type,
            ));
            current_offset += 1;
        }
        DescriptorArrayRecord::from_descriptors(descriptors)
    }

    /// Deepest shape on the path from the root that matches `descriptors`
    /// exactly.
    fn find_split_shape(&self, agent: &Agent, descriptors: &DescriptorArrayRecord) -> ObjectShape {
        let root_nof = self.root_shape.number_of_own_descriptors(agent);
        let mut current = self.root_shape;
        for i in root_nof..self.old_nof {
            let descriptor = descriptors.get(i);
            let Some(next) = current.search_transition(agent, descriptor_key(descriptor)) else {
                break;
            };
            let next_descriptor = next.descriptors(agent).get(i);
            let details = descriptor.details;
            let next_details = next_descriptor.details;
            if details.constness() != next_details.constness()
                || details.location() != next_details.location()
                || details.representation() != next_details.representation()
            {
                break;
            }
            if next_details.location() == PropertyLocation::Field {
                if !descriptor
                    .field_type()
                    .now_is(next_descriptor.field_type())
                {
                    break;
                }
            } else if descriptor.value != next_descriptor.value {
                break;
            }
            current = next;
        }
        current
    }

    fn construct_new_shape(&mut self, agent: &mut Agent) -> ObjectShape {
        let descriptors = self.build_descriptor_array(agent);
        let split_shape = self.find_split_shape(agent, &descriptors);
        let split_nof = split_shape.number_of_own_descriptors(agent);
        if split_nof == self.old_nof {
            return match self.integrity {
                Some(integrity) => self.apply_integrity_level(agent, split_shape, integrity),
                None => split_shape,
            };
        }

        // The old subtree below the split point is replaced.
        let split_key = self.transition_key(agent, split_nof);
        let maybe_transition = split_shape.search_transition(agent, split_key);
        if let Some(transition) = maybe_transition {
            transition.deprecate_transition_tree(agent);
        }
        if maybe_transition.is_none() && !split_shape.can_have_more_transitions(agent) {
            return self.copy_generalize_all_fields(agent, "GenAll_CantHaveMoreTransitions");
        }
        self.old_shape.mark_unstable(agent);

        let descriptors = agent.heap.create(descriptors);
        let new_shape = add_missing_transitions(agent, split_shape, descriptors, self.old_nof);
        // The surviving part of the tree shares the new descriptors.
        replace_descriptors(agent, split_shape, descriptors);
        log::debug!(
            "Updated {:?} to {new_shape:?}, split at {split_shape:?} after {split_nof} descriptors",
            self.old_shape
        );
        match self.integrity {
            Some(integrity) => self.apply_integrity_level(agent, new_shape, integrity),
            None => new_shape,
        }
    }

    fn apply_integrity_level(
        &self,
        agent: &mut Agent,
        target: ObjectShape,
        integrity: IntegrityLevelTransition,
    ) -> ObjectShape {
        if !target.can_have_more_transitions(agent) {
            return self.copy_generalize_all_fields(agent, "GenAll_CantHaveMoreTransitions");
        }
        copy_for_prevent_extensions(
            agent,
            target,
            integrity.attributes(),
            integrity.marker,
            "CopyForPreventExtensions",
        )
    }
}

fn search_migration_target(agent: &Agent, shape: ObjectShape) -> Option<ObjectShape> {
    let target = shape.transitions(agent).migration_target?;
    (!target.is_deprecated(agent)).then_some(target)
}

/// ### Update
///
/// The up to date replacement of a deprecated shape. Other shapes are
/// returned unchanged.
pub fn update(agent: &mut Agent, shape: ObjectShape) -> ObjectShape {
    if !shape.is_deprecated(agent) {
        return shape;
    }
    if let Some(target) = search_migration_target(agent, shape) {
        return target;
    }
    let result = ShapeUpdater::new(agent, shape).update(agent);
    shape.transitions_mut(agent).migration_target = Some(result);
    result
}

/// ### TryUpdate
///
/// Like [`update`], but only finds existing shapes. Nothing is created and
/// no field is generalized.
pub fn try_update(agent: &mut Agent, shape: ObjectShape) -> Option<ObjectShape> {
    if !shape.is_deprecated(agent) {
        return Some(shape);
    }
    if let Some(target) = search_migration_target(agent, shape) {
        return Some(target);
    }
    let result = try_update_slow(agent, shape)?;
    shape.transitions_mut(agent).migration_target = Some(result);
    Some(result)
}

fn try_update_slow(agent: &Agent, old_shape: ObjectShape) -> Option<ObjectShape> {
    let mut root = old_shape.find_root_map(agent);
    if root.is_deprecated(agent) || !old_shape.equivalent_to_for_transition(agent, root) {
        return None;
    }
    let from_kind = root.elements_kind(agent);
    let mut to_kind = old_shape.elements_kind(agent);
    let mut source = old_shape;
    let mut marker = None;
    if root.is_extensible(agent) != old_shape.is_extensible(agent) {
        let integrity = detect_integrity_level_transitions(agent, old_shape)?;
        source = integrity.source;
        marker = Some(integrity.marker);
        to_kind = source.elements_kind(agent);
    }
    if from_kind != to_kind {
        let key = TransitionKey::Special(SpecialTransition::ElementsKind(to_kind));
        root = root.search_transition(agent, key)?;
    }
    let mut result = try_replay_property_transitions(agent, root, source)?;
    if let Some(marker) = marker {
        result = result.search_transition(agent, TransitionKey::Special(marker))?;
    }
    debug_assert_eq!(result.elements_kind(agent), old_shape.elements_kind(agent));
    Some(result)
}

/// Follow the property transitions of `old_shape` starting at `start` as
/// long as the shapes found can hold the old layout.
pub(crate) fn try_replay_property_transitions(
    agent: &Agent,
    start: ObjectShape,
    old_shape: ObjectShape,
) -> Option<ObjectShape> {
    let root_nof = start.number_of_own_descriptors(agent);
    let old_nof = old_shape.number_of_own_descriptors(agent);
    let old_descriptors = old_shape.descriptors(agent);
    let mut new_shape = start;
    for i in root_nof..old_nof {
        let old = old_descriptors.get(i);
        let old_details = old.details;
        new_shape = new_shape.search_transition(agent, descriptor_key(old))?;
        if new_shape.is_deprecated(agent) {
            return None;
        }
        let new = new_shape.descriptors(agent).get(i);
        let new_details = new.details;
        debug_assert_eq!(old_details.kind(), new_details.kind());
        debug_assert_eq!(old_details.attributes(), new_details.attributes());
        if !old_details
            .constness()
            .is_generalizable_to(new_details.constness())
        {
            return None;
        }
        if !old_details
            .representation()
            .fits_into(new_details.representation())
        {
            return None;
        }
        if new_details.location() == PropertyLocation::Field {
            if new_details.kind() != PropertyKind::Data {
                return None;
            }
            let new_type = new.field_type();
            if new_type.is_cleared() {
                return None;
            }
            let old_type = field_type_of(agent, old, new_details.representation());
            if old_type.is_cleared() || !old_type.now_is(new_type) {
                return None;
            }
        } else if old_details.location() == PropertyLocation::Field || old.value != new.value {
            return None;
        }
    }
    (new_shape.number_of_own_descriptors(agent) == old_nof).then_some(new_shape)
}
