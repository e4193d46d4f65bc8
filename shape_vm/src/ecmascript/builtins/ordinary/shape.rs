// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::num::NonZeroU32;

use ahash::AHashMap;
use bitflags::bitflags;

use crate::{
    ecmascript::{
        builtins::ordinary::{
            descriptor_array::DescriptorArrayRecord,
            transitions::{ObjectShapeTransitionMap, TransitionKey},
        },
        execution::Agent,
        types::{FieldType, Name, Object, PropertyConstness, PropertyDetails, PropertyLocation},
    },
    heap::{
        CreateHeapData, Heap,
        indexes::{DescriptorArrayIndex, InterceptorIndex, PrototypeInfoIndex},
    },
};

/// Number of slots in an object header: shape, properties and elements.
pub(crate) const HEADER_SIZE_IN_WORDS: u32 = 3;

/// Number of out-of-object slots added when the property array grows.
pub(crate) const FIELDS_ADDED: u32 = 3;

/// Data structure describing the shape of an object.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectShape(NonZeroU32);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct ShapeFlags: u32 {
        const IS_EXTENSIBLE = 1 << 0;
        const IS_PROTOTYPE_MAP = 1 << 1;
        const IS_DEPRECATED = 1 << 2;
        const IS_UNSTABLE = 1 << 3;
        const IS_DICTIONARY_MAP = 1 << 4;
        const OWNS_DESCRIPTORS = 1 << 5;
        const IS_CALLABLE = 1 << 6;
        const HAS_NAMED_INTERCEPTOR = 1 << 7;
        const IS_ACCESS_CHECK_NEEDED = 1 << 8;
        const IS_IMMUTABLE_PROTO = 1 << 9;
        const IS_MIGRATION_TARGET = 1 << 10;
        const MAY_HAVE_INTERESTING_SYMBOLS = 1 << 11;
    }
}

impl ShapeFlags {
    /// Flags that two shapes must agree on to be interchangeable.
    const TRANSITION_EQUIVALENCE: Self = Self::IS_CALLABLE
        .union(Self::HAS_NAMED_INTERCEPTOR)
        .union(Self::IS_ACCESS_CHECK_NEEDED)
        .union(Self::IS_IMMUTABLE_PROTO);
}

/// Kind of object a shape describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceType {
    Ordinary,
    Function,
    TypedArray,
    Proxy,
    /// Host object that may carry interceptors or require access checks.
    Api,
}

impl InstanceType {
    /// Objects that need the full lookup protocol instead of plain
    /// descriptor and dictionary probing.
    pub fn is_special_receiver(self) -> bool {
        matches!(
            self,
            InstanceType::TypedArray | InstanceType::Proxy | InstanceType::Api
        )
    }
}

/// Layout of the indexed elements of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementsKind {
    PackedSmi,
    HoleySmi,
    PackedDouble,
    HoleyDouble,
    Packed,
    Holey,
    PackedNonExtensible,
    PackedSealed,
    PackedFrozen,
    Dictionary,
    TypedArray,
}

impl ElementsKind {
    pub fn is_fast(self) -> bool {
        !matches!(self, ElementsKind::Dictionary | ElementsKind::TypedArray)
    }

    pub fn is_frozen_or_sealed(self) -> bool {
        matches!(
            self,
            ElementsKind::PackedSealed | ElementsKind::PackedFrozen
        )
    }

    /// Position in the smi, double, tagged lattice and holeyness.
    fn lattice_position(self) -> Option<(u8, bool)> {
        match self {
            ElementsKind::PackedSmi => Some((0, false)),
            ElementsKind::HoleySmi => Some((0, true)),
            ElementsKind::PackedDouble => Some((1, false)),
            ElementsKind::HoleyDouble => Some((1, true)),
            ElementsKind::Packed => Some((2, false)),
            ElementsKind::Holey => Some((2, true)),
            _ => None,
        }
    }

    /// Whether moving from `self` to `to` only widens what the elements may
    /// hold.
    pub fn is_more_general_transition(self, to: Self) -> bool {
        match (self.lattice_position(), to.lattice_position()) {
            (Some((from_rank, from_holey)), Some((to_rank, to_holey))) => {
                self != to && from_rank <= to_rank && (to_holey || !from_holey)
            }
            _ => false,
        }
    }
}

/// How many in-object properties survive normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizationMode {
    ClearInobjectProperties,
    KeepInobjectProperties,
}

/// Data structure describing the shape of an object.
///
/// ## What is a shape?
///
/// Object shapes describe the layout of an object: which properties it has,
/// where their values are stored and what they may be assumed to look like.
/// Shapes form a tree: the shape `{ x, y }` is a child of the shape `{ x }`,
/// reached through the transition that adds `y`. Objects that get their
/// properties in the same order end up sharing the same shape.
///
/// A shape in dictionary mode describes nothing but the behaviour of its
/// instances; their properties live in a per-instance dictionary.
#[derive(Debug, Clone)]
pub struct ObjectShapeRecord {
    pub(crate) instance_type: InstanceType,
    /// Number of property slots embedded in the instance.
    pub(crate) inobject_properties: u32,
    /// Unused property slots: in-object slack while the fields fit in the
    /// instance, out-of-object slack in the property array afterwards.
    pub(crate) unused_property_fields: u32,
    pub(crate) elements_kind: ElementsKind,
    pub(crate) flags: ShapeFlags,
    /// Prototype of the object shape.
    ///
    /// This takes the place of the \[\[Prototype]] internal slot for all
    /// objects with this shape.
    pub(crate) prototype: Option<Object>,
    pub(crate) constructor: Option<Object>,
    pub(crate) instance_descriptors: DescriptorArrayIndex,
    /// The prefix of the descriptor array valid for this shape.
    pub(crate) number_of_own_descriptors: u32,
    pub(crate) prototype_info: Option<PrototypeInfoIndex>,
    pub(crate) interceptor: Option<InterceptorIndex>,
}

impl ObjectShapeRecord {
    /// Root shape record for the given prototype and instance type.
    pub(crate) fn create_root(
        prototype: Option<Object>,
        instance_type: InstanceType,
        inobject_properties: u32,
    ) -> Self {
        let mut flags = ShapeFlags::IS_EXTENSIBLE | ShapeFlags::OWNS_DESCRIPTORS;
        if instance_type == InstanceType::Function {
            flags |= ShapeFlags::IS_CALLABLE;
        }
        let elements_kind = if instance_type == InstanceType::TypedArray {
            ElementsKind::TypedArray
        } else {
            ElementsKind::Holey
        };
        Self {
            instance_type,
            inobject_properties,
            unused_property_fields: inobject_properties,
            elements_kind,
            flags,
            prototype,
            constructor: None,
            instance_descriptors: DescriptorArrayIndex::EMPTY,
            number_of_own_descriptors: 0,
            prototype_info: None,
            interceptor: None,
        }
    }

    /// Update the slack accounting for one added field.
    pub(crate) fn account_added_property_field(&mut self) {
        if self.unused_property_fields > 0 {
            self.unused_property_fields -= 1;
        } else {
            self.unused_property_fields = FIELDS_ADDED - 1;
        }
    }
}

impl DescriptorArrayIndex {
    /// The shared empty descriptor array. It is never appended to.
    pub(crate) const EMPTY: Self = Self::from_index(0);
}

impl ObjectShape {
    /// Get the implied usize index of the ObjectShape reference.
    #[inline(always)]
    pub(crate) fn get_index(self) -> usize {
        self.0.get().wrapping_sub(1) as usize
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index < u32::MAX as usize);
        // SAFETY: Number is not max value and will not overflow to zero.
        Self(unsafe { NonZeroU32::new_unchecked(index as u32 + 1) })
    }

    /// Get an Object Shape pointing to the last Object Shape Record.
    pub(crate) fn last(shapes: &[ObjectShapeRecord]) -> Self {
        debug_assert!(!shapes.is_empty());
        Self::from_index(shapes.len() - 1)
    }

    pub(crate) fn record(self, agent: &impl AsRef<[ObjectShapeRecord]>) -> &ObjectShapeRecord {
        &agent.as_ref()[self.get_index()]
    }

    pub(crate) fn record_mut(
        self,
        agent: &mut impl AsMut<[ObjectShapeRecord]>,
    ) -> &mut ObjectShapeRecord {
        &mut agent.as_mut()[self.get_index()]
    }

    pub(crate) fn transitions(
        self,
        agent: &impl AsRef<[ObjectShapeTransitionMap]>,
    ) -> &ObjectShapeTransitionMap {
        &agent.as_ref()[self.get_index()]
    }

    /// Get the Object Shape transitions as mutable.
    pub(crate) fn transitions_mut(
        self,
        agent: &mut impl AsMut<[ObjectShapeTransitionMap]>,
    ) -> &mut ObjectShapeTransitionMap {
        &mut agent.as_mut()[self.get_index()]
    }

    /// Get the prototype of the Object Shape.
    pub fn prototype(self, agent: &Agent) -> Option<Object> {
        self.record(agent).prototype
    }

    pub fn instance_type(self, agent: &Agent) -> InstanceType {
        self.record(agent).instance_type
    }

    pub fn elements_kind(self, agent: &Agent) -> ElementsKind {
        self.record(agent).elements_kind
    }

    pub fn inobject_properties(self, agent: &Agent) -> u32 {
        self.record(agent).inobject_properties
    }

    pub fn unused_property_fields(self, agent: &Agent) -> u32 {
        self.record(agent).unused_property_fields
    }

    /// Instance size in words, header included.
    pub fn instance_size_in_words(self, agent: &Agent) -> u32 {
        HEADER_SIZE_IN_WORDS + self.record(agent).inobject_properties
    }

    pub fn number_of_own_descriptors(self, agent: &Agent) -> u32 {
        self.record(agent).number_of_own_descriptors
    }

    /// ### countOwnProperties
    ///
    /// Number of properties described by this shape. Dictionary mode
    /// shapes describe none.
    pub fn number_of_own_properties(self, agent: &Agent) -> u32 {
        if self.is_dictionary_map(agent) {
            0
        } else {
            self.number_of_own_descriptors(agent)
        }
    }

    pub(crate) fn instance_descriptors(self, agent: &Agent) -> DescriptorArrayIndex {
        self.record(agent).instance_descriptors
    }

    pub(crate) fn descriptors(self, agent: &Agent) -> &DescriptorArrayRecord {
        &agent.heap.descriptor_arrays[self.instance_descriptors(agent).into_index()]
    }

    pub fn descriptor_details(self, agent: &Agent, descriptor: u32) -> PropertyDetails {
        self.descriptors(agent).details(descriptor)
    }

    /// Field type recorded for the field at `descriptor`. Constants and
    /// accessors report `FieldType::Any`.
    pub fn descriptor_field_type(self, agent: &Agent, descriptor: u32) -> FieldType {
        self.descriptors(agent).get(descriptor).field_type()
    }

    pub fn last_added(self, agent: &Agent) -> Option<u32> {
        self.number_of_own_descriptors(agent).checked_sub(1)
    }

    /// Get the parent Object Shape of this Object Shape.
    pub fn parent(self, agent: &Agent) -> Option<ObjectShape> {
        self.transitions(agent).parent
    }

    pub(crate) fn flags(self, agent: &Agent) -> ShapeFlags {
        self.record(agent).flags
    }

    fn has_flag(self, agent: &Agent, flag: ShapeFlags) -> bool {
        self.flags(agent).contains(flag)
    }

    pub(crate) fn set_flag(self, agent: &mut Agent, flag: ShapeFlags, value: bool) {
        self.record_mut(agent).flags.set(flag, value);
    }

    pub fn is_dictionary_map(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::IS_DICTIONARY_MAP)
    }

    pub fn is_deprecated(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::IS_DEPRECATED)
    }

    pub fn is_stable(self, agent: &Agent) -> bool {
        !self.has_flag(agent, ShapeFlags::IS_UNSTABLE)
    }

    pub fn is_prototype_map(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::IS_PROTOTYPE_MAP)
    }

    pub fn is_extensible(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::IS_EXTENSIBLE)
    }

    pub fn owns_descriptors(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::OWNS_DESCRIPTORS)
    }

    pub fn is_callable(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::IS_CALLABLE)
    }

    pub fn has_named_interceptor(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::HAS_NAMED_INTERCEPTOR)
    }

    pub fn is_access_check_needed(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::IS_ACCESS_CHECK_NEEDED)
    }

    pub fn is_immutable_proto(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::IS_IMMUTABLE_PROTO)
    }

    pub fn is_migration_target(self, agent: &Agent) -> bool {
        self.has_flag(agent, ShapeFlags::IS_MIGRATION_TARGET)
    }

    pub fn is_special_receiver_map(self, agent: &Agent) -> bool {
        let record = self.record(agent);
        record.instance_type.is_special_receiver()
            || record.flags.intersects(
                ShapeFlags::HAS_NAMED_INTERCEPTOR | ShapeFlags::IS_ACCESS_CHECK_NEEDED,
            )
    }

    pub(crate) fn mark_unstable(self, agent: &mut Agent) {
        self.set_flag(agent, ShapeFlags::IS_UNSTABLE, true);
    }

    /// Number of field backed descriptors.
    pub fn number_of_fields(self, agent: &Agent) -> u32 {
        let nof = self.number_of_own_descriptors(agent);
        self.descriptors(agent).number_of_fields(nof)
    }

    /// Field index the next added field gets.
    pub(crate) fn next_free_property_index(self, agent: &Agent) -> u32 {
        let nof = self.number_of_own_descriptors(agent);
        self.descriptors(agent)
            .iter(nof)
            .filter(|d| d.details.location() == PropertyLocation::Field)
            .map(|d| d.details.field_index() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of mutable fields and constant fields.
    pub(crate) fn field_counts(self, agent: &Agent) -> (u32, u32) {
        let nof = self.number_of_own_descriptors(agent);
        let mut mutable_count = 0;
        let mut const_count = 0;
        for descriptor in self.descriptors(agent).iter(nof) {
            if descriptor.details.location() != PropertyLocation::Field {
                continue;
            }
            match descriptor.details.constness() {
                PropertyConstness::Const => const_count += 1,
                PropertyConstness::Mutable => mutable_count += 1,
            }
        }
        (mutable_count, const_count)
    }

    /// Length of the property array of an instance with this shape.
    pub fn expected_property_array_length(self, agent: &Agent) -> u32 {
        let record = self.record(agent);
        let number_of_fields = self.number_of_fields(agent);
        if number_of_fields < record.inobject_properties {
            return 0;
        }
        number_of_fields - record.inobject_properties + record.unused_property_fields
    }

    /// Number of in-object slots in use.
    pub fn used_inobject_slots(self, agent: &Agent) -> u32 {
        self.number_of_fields(agent)
            .min(self.record(agent).inobject_properties)
    }

    /// ### lookup(shape, name)
    ///
    /// Descriptor number of `name` in this shape, if present.
    pub fn lookup_descriptor(self, agent: &Agent, name: Name) -> Option<u32> {
        if self.is_dictionary_map(agent) {
            return None;
        }
        let nof = self.number_of_own_descriptors(agent);
        self.descriptors(agent).search(name, name.hash(agent), nof)
    }

    pub fn interceptor(self, agent: &Agent) -> Option<InterceptorIndex> {
        self.record(agent).interceptor
    }

    /// Search the transition tree for a child.
    pub fn search_transition(self, agent: &Agent, key: TransitionKey) -> Option<ObjectShape> {
        self.transitions(agent).search(key)
    }

    pub fn number_of_transitions(self, agent: &Agent) -> usize {
        self.transitions(agent).number_of_transitions()
    }

    /// ### CanHaveMoreTransitions
    pub fn can_have_more_transitions(self, agent: &Agent) -> bool {
        if self.is_prototype_map(agent) || self.is_dictionary_map(agent) {
            return false;
        }
        self.transitions(agent)
            .can_have_more_transitions(agent.options.max_number_of_transitions)
    }

    /// Get the root shape of the transition tree this shape belongs to.
    pub fn find_root_map(self, agent: &Agent) -> ObjectShape {
        let mut result = self;
        while let Some(parent) = result.parent(agent) {
            result = parent;
        }
        result
    }

    /// ### Equivalent for transition
    ///
    /// Shapes that agree on everything but their own descriptors.
    /// Function shapes must additionally agree on the descriptors both of
    /// them describe.
    pub fn equivalent_to_for_transition(self, agent: &Agent, other: ObjectShape) -> bool {
        let a = self.record(agent);
        let b = other.record(agent);
        if a.constructor != b.constructor
            || a.prototype != b.prototype
            || a.instance_type != b.instance_type
            || a.interceptor != b.interceptor
            || (a.flags & ShapeFlags::TRANSITION_EQUIVALENCE)
                != (b.flags & ShapeFlags::TRANSITION_EQUIVALENCE)
        {
            return false;
        }
        if a.instance_type == InstanceType::Function {
            let nof = a
                .number_of_own_descriptors
                .min(b.number_of_own_descriptors);
            return self
                .descriptors(agent)
                .is_equal_up_to(other.descriptors(agent), nof);
        }
        true
    }

    /// ### Equivalent for normalization
    ///
    /// A cached normalized shape `other` may stand in for the normalized
    /// version of `self`.
    pub fn equivalent_to_for_normalization(
        self,
        agent: &Agent,
        other: ObjectShape,
        elements_kind: ElementsKind,
        mode: NormalizationMode,
    ) -> bool {
        let inobject_properties = match mode {
            NormalizationMode::ClearInobjectProperties => 0,
            NormalizationMode::KeepInobjectProperties => self.inobject_properties(agent),
        };
        other.is_dictionary_map(agent)
            && self.equivalent_to_for_transition(agent, other)
            && self.is_extensible(agent) == other.is_extensible(agent)
            && other.elements_kind(agent) == elements_kind
            && other.inobject_properties(agent) == inobject_properties
            && self.is_prototype_map(agent) == other.is_prototype_map(agent)
    }

    /// Whether a named store should give up on fast properties.
    pub(crate) fn too_many_fast_properties(self, agent: &Agent, store_origin: StoreOrigin) -> bool {
        if self.unused_property_fields(agent) != 0 {
            return false;
        }
        if self.is_prototype_map(agent) {
            return false;
        }
        let inobject = self.inobject_properties(agent) as i64;
        match store_origin {
            StoreOrigin::Named => {
                let limit = (agent.options.max_fast_properties as i64).max(inobject);
                let (mutable_count, const_count) = self.field_counts(agent);
                // Constant fields do not count against the limit.
                let external = mutable_count as i64 - inobject;
                external > limit
                    || (mutable_count + const_count) as usize
                        > agent.options.max_number_of_descriptors
            }
            StoreOrigin::MaybeKeyed => {
                let limit = (agent.options.fast_properties_soft_limit as i64).max(inobject);
                let external = self.number_of_fields(agent) as i64 - inobject;
                external > limit
            }
        }
    }

    /// Root shape for the given prototype and instance type, shared by all
    /// objects created with that prototype.
    pub fn get_or_create_root(
        agent: &mut Agent,
        prototype: Option<Object>,
        instance_type: InstanceType,
        inobject_properties: u32,
    ) -> ObjectShape {
        let key = (prototype, instance_type, inobject_properties);
        if let Some(shape) = agent.heap.prototype_shapes.get(key) {
            return shape;
        }
        let shape = agent.heap.create((
            ObjectShapeRecord::create_root(prototype, instance_type, inobject_properties),
            ObjectShapeTransitionMap::ROOT,
        ));
        agent.heap.prototype_shapes.set(key, shape);
        shape
    }

    /// Link `child` under `self` with the given key.
    ///
    /// A non-root parent hands ownership of the shared descriptor array to
    /// the child. Nothing is recorded while bootstrapping, and prototype
    /// shapes never record transitions.
    pub(crate) fn connect_transition(
        self,
        agent: &mut Agent,
        child: ObjectShape,
        key: TransitionKey,
    ) {
        if agent.is_bootstrapping() {
            log::trace!("Transition {self:?} via {key:?} omitted while bootstrapping");
            return;
        }
        if self.parent(agent).is_some() {
            self.set_flag(agent, ShapeFlags::OWNS_DESCRIPTORS, false);
        }
        if self.is_prototype_map(agent) {
            return;
        }
        child.transitions_mut(agent).parent = Some(self);
        let previous = self.transitions_mut(agent).insert(key, child);
        log::trace!("Transition {:?} -> {:?} via {:?}", self, child, key);
        debug_assert!(
            previous.is_none_or(|previous| previous == child || previous.is_deprecated(agent)),
            "Replaced a live transition"
        );
    }

    /// Mark this shape and all shapes reachable from it through
    /// transitions as deprecated.
    pub(crate) fn deprecate_transition_tree(self, agent: &mut Agent) {
        let mut stack = vec![self];
        while let Some(shape) = stack.pop() {
            if shape.is_deprecated(agent) {
                continue;
            }
            stack.extend(shape.transitions(agent).iter().map(|(_, child)| child));
            let record = shape.record_mut(agent);
            record.flags |= ShapeFlags::IS_DEPRECATED | ShapeFlags::IS_UNSTABLE;
            log::debug!("Deprecated shape {:?}", shape);
            agent.heap_hooks.notify_shape_deprecated(shape);
        }
    }
}

/// Origin of a store: a named access or a possibly keyed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreOrigin {
    #[default]
    Named,
    MaybeKeyed,
}

/// Lookup-table to find a root Object Shape for a given prototype.
///
/// > NOTE: The values in the map are held weakly, while keys are held
/// > strongly.
#[derive(Debug, Default)]
#[repr(transparent)]
pub(crate) struct PrototypeShapeTable {
    table: AHashMap<(Option<Object>, InstanceType, u32), ObjectShape>,
}

impl PrototypeShapeTable {
    /// Create a new PrototypeShapeTable with the given capacity.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            table: AHashMap::with_capacity(capacity),
        }
    }

    /// Get the root Object Shape for the given prototype.
    pub(crate) fn get(&self, key: (Option<Object>, InstanceType, u32)) -> Option<ObjectShape> {
        self.table.get(&key).copied()
    }

    pub(crate) fn set(&mut self, key: (Option<Object>, InstanceType, u32), shape: ObjectShape) {
        let previous = self.table.insert(key, shape);
        assert!(previous.is_none(), "Re-set prototype root Object Shape");
    }

    pub(crate) fn retain(&mut self, mut is_live: impl FnMut(ObjectShape) -> bool) {
        self.table.retain(|_, shape| is_live(*shape));
    }
}

impl CreateHeapData<(ObjectShapeRecord, ObjectShapeTransitionMap), ObjectShape> for Heap {
    fn create(&mut self, data: (ObjectShapeRecord, ObjectShapeTransitionMap)) -> ObjectShape {
        let (record, transitions) = data;
        self.object_shapes.push(record);
        self.object_shape_transitions.push(transitions);
        self.alloc_counter += core::mem::size_of::<ObjectShapeRecord>()
            + core::mem::size_of::<ObjectShapeTransitionMap>();
        ObjectShape::last(&self.object_shapes)
    }
}

impl AsRef<[ObjectShapeRecord]> for Agent {
    fn as_ref(&self) -> &[ObjectShapeRecord] {
        &self.heap.object_shapes
    }
}

impl AsMut<[ObjectShapeRecord]> for Agent {
    fn as_mut(&mut self) -> &mut [ObjectShapeRecord] {
        &mut self.heap.object_shapes
    }
}

impl AsRef<[ObjectShapeTransitionMap]> for Agent {
    fn as_ref(&self) -> &[ObjectShapeTransitionMap] {
        &self.heap.object_shape_transitions
    }
}

impl AsMut<[ObjectShapeTransitionMap]> for Agent {
    fn as_mut(&mut self) -> &mut [ObjectShapeTransitionMap] {
        &mut self.heap.object_shape_transitions
    }
}
