// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Property lookup
//!
//! The resolution cursor shared by every property operation. A lookup
//! starts at the receiver and walks the prototype chain until a holder
//! resolves the key into one of the [`LookupState`]s. Operations act on
//! the state and either finish or call [`LookupIterator::next`] to resume
//! the walk behind the current holder.
//!
//! Advancing the cursor only reads the heap. Changing the holder (moving it
//! to a new shape, adding or reconfiguring the property) goes through the
//! `prepare_*`, `apply_*` and `*_data_property` methods, which keep the
//! cursor pointing at the property afterwards.

use std::rc::Rc;

use crate::ecmascript::{
    builtins::{
        AccessorComponent, AccessorPair, NamedInterceptor, get_interceptor,
        ordinary::{
            dictionary::{DictionaryEntry, DictionaryValue},
            field_index::FieldIndex,
            migration::{migrate_instance, migrate_to_shape, normalize_properties},
            property_storage::{
                HOLE_NAN_BITS, fast_property_at, fast_property_at_put, raw_fast_property_at,
            },
            prototype_info::{invalidate_prototype_chains, reoptimize_if_prototype},
            shape::{NormalizationMode, ObjectShape, StoreOrigin},
            shape_transitions::{
                prepare_for_data_property, reconfigure_existing_property,
                transition_to_accessor_property, transition_to_data_property,
            },
        },
        typed_array::{
            ELEMENT_ATTRIBUTES, NumericKey, canonical_numeric_key, is_valid_integer_index,
            typed_array_get_element, typed_array_set_element,
        },
    },
    execution::{Agent, JsError, JsResult},
    types::{
        Name, Object, PropertyAttributes, PropertyConstness, PropertyDetails, PropertyKey,
        PropertyKind, PropertyLocation, Slot, Value,
    },
};

/// What a lookup resolved the key to at the current holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum LookupState {
    /// The key is not present anywhere on the walked chain.
    NotFound,
    /// The holder requires a host access check before it may be inspected.
    AccessCheck,
    /// The holder has a named interceptor that may take over the access.
    Interceptor,
    /// The holder is a proxy: the operation is delegated to its handler.
    Proxy,
    Accessor,
    Data,
    /// A numeric key on an indexed exotic object that names no element.
    IndexedExotic,
    /// A new data property is about to be added to the receiver.
    Transition,
}

/// Which holders a lookup visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum LookupConfiguration {
    OwnSkipInterceptor,
    Own,
    PrototypeChain,
}

impl LookupConfiguration {
    fn check_prototype_chain(self) -> bool {
        self == LookupConfiguration::PrototypeChain
    }

    fn check_interceptor(self) -> bool {
        matches!(
            self,
            LookupConfiguration::PrototypeChain | LookupConfiguration::Own
        )
    }
}

/// Non-masking interceptors are only consulted once the whole chain missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InterceptorState {
    Uninitialized,
    SkipNonMasking,
    ProcessNonMasking,
}

/// Where the found property lives within its holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PropertyHandle {
    None,
    Descriptor(u32),
    Dictionary(DictionaryEntry),
    Element(u32),
}

fn empty_details() -> PropertyDetails {
    PropertyDetails::dictionary(PropertyKind::Data, PropertyAttributes::NONE, 0)
}

/// ### Number::sameValue on raw numbers.
fn same_number_value(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    a == b && a.is_sign_negative() == b.is_sign_negative()
}

#[derive(Debug, Clone)]
pub(crate) struct LookupIterator {
    configuration: LookupConfiguration,
    state: LookupState,
    interceptor_state: InterceptorState,
    has_property: bool,
    details: PropertyDetails,
    key: PropertyKey,
    /// Name form of the key; array indexes are their decimal string.
    name: Name,
    receiver: Object,
    holder: Object,
    handle: PropertyHandle,
    transition: Option<ObjectShape>,
    hops: u32,
}

impl LookupIterator {
    /// Start a lookup of `key` on `receiver`. An instance on a deprecated
    /// shape is migrated to the up to date shape first.
    pub(crate) fn new(
        agent: &mut Agent,
        receiver: Object,
        key: PropertyKey,
        configuration: LookupConfiguration,
    ) -> JsResult<Self> {
        let name = key.to_name(agent);
        if receiver.shape(agent).is_deprecated(agent) {
            migrate_instance(agent, receiver);
        }
        let mut iterator = Self {
            configuration,
            state: LookupState::NotFound,
            interceptor_state: InterceptorState::Uninitialized,
            has_property: false,
            details: empty_details(),
            key,
            name,
            receiver,
            holder: receiver,
            handle: PropertyHandle::None,
            transition: None,
            hops: 0,
        };
        iterator.start(agent)?;
        Ok(iterator)
    }

    pub(crate) fn state(&self) -> LookupState {
        self.state
    }

    pub(crate) fn is_found(&self) -> bool {
        self.state != LookupState::NotFound
    }

    pub(crate) fn key(&self) -> PropertyKey {
        self.key
    }

    pub(crate) fn receiver(&self) -> Object {
        self.receiver
    }

    pub(crate) fn holder(&self) -> Object {
        self.holder
    }

    pub(crate) fn holder_is_receiver(&self) -> bool {
        self.holder == self.receiver
    }

    pub(crate) fn property_details(&self) -> PropertyDetails {
        debug_assert!(self.has_property);
        self.details
    }

    pub(crate) fn property_attributes(&self) -> PropertyAttributes {
        self.property_details().attributes()
    }

    pub(crate) fn is_read_only(&self) -> bool {
        self.property_attributes().is_read_only()
    }

    pub(crate) fn is_configurable(&self) -> bool {
        self.property_attributes().is_configurable()
    }

    /// Whether the found property is an element of an indexed exotic
    /// object.
    pub(crate) fn is_element(&self) -> bool {
        matches!(self.handle, PropertyHandle::Element(_))
    }

    /// Adding the property would extend a non-extensible receiver.
    pub(crate) fn extending_non_extensible(&self, agent: &Agent) -> bool {
        !self.receiver.shape(agent).is_extensible(agent) && !self.name.is_private(agent)
    }

    pub(crate) fn interceptor(&self, agent: &Agent) -> Option<Rc<dyn NamedInterceptor>> {
        get_interceptor(agent, self.holder)
    }

    /// Begin the walk again from the receiver.
    pub(crate) fn restart(&mut self, agent: &Agent) -> JsResult<()> {
        self.restart_internal(agent, InterceptorState::Uninitialized)
    }

    fn restart_internal(&mut self, agent: &Agent, state: InterceptorState) -> JsResult<()> {
        self.interceptor_state = state;
        self.start(agent)
    }

    fn start(&mut self, agent: &Agent) -> JsResult<()> {
        self.holder = self.receiver;
        self.hops = 0;
        self.has_property = false;
        self.details = empty_details();
        self.handle = PropertyHandle::None;
        self.transition = None;
        self.state = LookupState::NotFound;
        let holder = self.holder;
        self.state = self.lookup_in_holder(agent, holder);
        if self.is_found() {
            return Ok(());
        }
        self.next_internal(agent, holder)
    }

    /// ### advance
    ///
    /// Resume the walk behind the current state: special holders continue
    /// with their next stage, everything else moves on to the prototype.
    pub(crate) fn next(&mut self, agent: &Agent) -> JsResult<()> {
        debug_assert_ne!(self.state, LookupState::Transition);
        self.has_property = false;
        let holder = self.holder;
        if holder.shape(agent).is_special_receiver_map(agent) {
            self.state = self.lookup_in_special_holder(agent, holder);
            if self.is_found() {
                return Ok(());
            }
        }
        self.next_internal(agent, holder)
    }

    fn next_internal(&mut self, agent: &Agent, mut holder: Object) -> JsResult<()> {
        loop {
            let Some(next) = self.next_holder(agent, holder) else {
                if self.interceptor_state == InterceptorState::SkipNonMasking {
                    return self.restart_internal(agent, InterceptorState::ProcessNonMasking);
                }
                self.state = LookupState::NotFound;
                self.holder = holder;
                return Ok(());
            };
            self.hops += 1;
            if self.hops > agent.options.max_prototype_chain_length {
                return Err(JsError::InvariantViolation(
                    "prototype chain is cyclic or exceeds the maximum length",
                ));
            }
            holder = next;
            self.state = LookupState::NotFound;
            self.state = self.lookup_in_holder(agent, holder);
            if self.is_found() {
                self.holder = holder;
                return Ok(());
            }
        }
    }

    fn next_holder(&self, agent: &Agent, holder: Object) -> Option<Object> {
        if !self.configuration.check_prototype_chain() {
            return None;
        }
        holder.shape(agent).prototype(agent)
    }

    fn lookup_in_holder(&mut self, agent: &Agent, holder: Object) -> LookupState {
        if holder.shape(agent).is_special_receiver_map(agent) {
            self.lookup_in_special_holder(agent, holder)
        } else {
            self.lookup_in_regular_holder(agent, holder)
        }
    }

    /// Stages of a special holder, in order: proxy or access check, then
    /// interceptor, then the holder's own properties.
    fn lookup_in_special_holder(&mut self, agent: &Agent, holder: Object) -> LookupState {
        let shape = holder.shape(agent);
        let is_private = self.name.is_private(agent);
        let mut state = self.state;
        if state == LookupState::NotFound {
            if holder.is_proxy(agent) && !is_private {
                return LookupState::Proxy;
            }
            if shape.is_access_check_needed(agent) && !is_private {
                return LookupState::AccessCheck;
            }
            state = LookupState::AccessCheck;
        }
        if state == LookupState::AccessCheck {
            if self.configuration.check_interceptor()
                && shape.has_named_interceptor(agent)
                && !is_private
                && !self.skip_interceptor(agent, holder)
            {
                return LookupState::Interceptor;
            }
            state = LookupState::Interceptor;
        }
        match state {
            LookupState::Interceptor => self.lookup_in_regular_holder(agent, holder),
            // The property of this holder was already handed out.
            LookupState::Accessor | LookupState::Data | LookupState::IndexedExotic => {
                LookupState::NotFound
            }
            _ => {
                debug_assert!(false, "Cannot resume a lookup from {state:?}");
                LookupState::NotFound
            }
        }
    }

    fn lookup_in_regular_holder(&mut self, agent: &Agent, holder: Object) -> LookupState {
        if self.interceptor_state == InterceptorState::ProcessNonMasking {
            return LookupState::NotFound;
        }
        if holder.is_typed_array(agent)
            && let Some(numeric) = canonical_numeric_key(agent, self.key)
        {
            return match numeric {
                NumericKey::Index(index) if is_valid_integer_index(agent, holder, index) => {
                    self.handle = PropertyHandle::Element(index);
                    self.details =
                        PropertyDetails::dictionary(PropertyKind::Data, ELEMENT_ATTRIBUTES, 0);
                    self.has_property = true;
                    LookupState::Data
                }
                _ => LookupState::IndexedExotic,
            };
        }
        let shape = holder.shape(agent);
        if !shape.is_dictionary_map(agent) {
            let Some(descriptor) = shape.lookup_descriptor(agent, self.name) else {
                return LookupState::NotFound;
            };
            self.handle = PropertyHandle::Descriptor(descriptor);
            self.details = shape.descriptor_details(agent, descriptor);
        } else {
            let Some(dictionary) = holder.dictionary(agent) else {
                return LookupState::NotFound;
            };
            let Some(entry) = dictionary.find(self.name, self.name.hash(agent)) else {
                return LookupState::NotFound;
            };
            let Some(details) = dictionary.details_at(entry) else {
                return LookupState::NotFound;
            };
            self.handle = PropertyHandle::Dictionary(entry);
            self.details = details;
        }
        self.has_property = true;
        match self.details.kind() {
            PropertyKind::Data => LookupState::Data,
            PropertyKind::Accessor => LookupState::Accessor,
        }
    }

    fn skip_interceptor(&mut self, agent: &Agent, holder: Object) -> bool {
        let Some(interceptor) = get_interceptor(agent, holder) else {
            return true;
        };
        if self.name.is_symbol(agent) && !interceptor.can_intercept_symbols() {
            return true;
        }
        if interceptor.is_non_masking() {
            match self.interceptor_state {
                InterceptorState::Uninitialized => {
                    self.interceptor_state = InterceptorState::SkipNonMasking;
                    return true;
                }
                InterceptorState::SkipNonMasking => return true,
                InterceptorState::ProcessNonMasking => return false,
            }
        }
        self.interceptor_state == InterceptorState::ProcessNonMasking
    }

    /// Look the property up again in the current holder after the holder
    /// changed shape.
    fn reload_property_information(&mut self, agent: &Agent) {
        self.interceptor_state = InterceptorState::Uninitialized;
        self.has_property = false;
        let holder = self.holder;
        self.state = self.lookup_in_regular_holder(agent, holder);
    }

    fn descriptor_number(&self) -> Option<u32> {
        match self.handle {
            PropertyHandle::Descriptor(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    fn field_index(&self, agent: &Agent) -> Option<FieldIndex> {
        let descriptor = self.descriptor_number()?;
        if self.details.location() != PropertyLocation::Field {
            return None;
        }
        Some(FieldIndex::for_descriptor(
            agent,
            self.holder.shape(agent),
            descriptor,
        ))
    }

    /// ### GetDataValue
    pub(crate) fn get_data_value(&self, agent: &mut Agent) -> Value {
        debug_assert_eq!(self.state, LookupState::Data);
        let holder = self.holder;
        match self.handle {
            PropertyHandle::Element(index) => {
                typed_array_get_element(agent, holder, index).unwrap_or(Value::Undefined)
            }
            PropertyHandle::Dictionary(entry) => match holder
                .dictionary(agent)
                .and_then(|dictionary| dictionary.value_at(entry))
            {
                Some(DictionaryValue::Data(value)) => value,
                _ => Value::Undefined,
            },
            PropertyHandle::Descriptor(descriptor) => match self.field_index(agent) {
                Some(index) => fast_property_at(agent, holder, index),
                None => holder
                    .shape(agent)
                    .descriptors(agent)
                    .get(descriptor)
                    .constant()
                    .unwrap_or(Value::Undefined),
            },
            PropertyHandle::None => Value::Undefined,
        }
    }

    /// ### WriteDataValue
    ///
    /// Store `value` into the found data property. The holder's shape must
    /// already be able to hold the value.
    pub(crate) fn write_data_value(&self, agent: &mut Agent, value: Value) {
        debug_assert_eq!(self.state, LookupState::Data);
        let holder = self.holder;
        match self.handle {
            PropertyHandle::Element(index) => {
                typed_array_set_element(agent, holder, index, value);
            }
            PropertyHandle::Dictionary(entry) => {
                if let Some(dictionary) = holder.dictionary_mut(agent) {
                    let written = dictionary.set_value(entry, DictionaryValue::Data(value));
                    debug_assert!(written, "Stale dictionary entry");
                }
            }
            PropertyHandle::Descriptor(_) => match self.field_index(agent) {
                Some(index) => fast_property_at_put(agent, holder, index, value),
                None => {
                    debug_assert_eq!(self.details.constness(), PropertyConstness::Const);
                }
            },
            PropertyHandle::None => debug_assert!(false, "No property to write to"),
        }
    }

    /// ### GetAccessors
    pub(crate) fn get_accessors(&self, agent: &Agent) -> Option<AccessorPair> {
        match self.handle {
            PropertyHandle::Descriptor(descriptor) => self
                .holder
                .shape(agent)
                .descriptors(agent)
                .get(descriptor)
                .accessors(),
            PropertyHandle::Dictionary(entry) => match self
                .holder
                .dictionary(agent)
                .and_then(|dictionary| dictionary.value_at(entry))
            {
                Some(DictionaryValue::Accessors(pair)) => Some(pair),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether storing `value` into the found const field keeps it
    /// constant. A field that was never written accepts any value.
    fn is_const_field_value_equal_to(&self, agent: &Agent, value: Value) -> bool {
        let Some(descriptor) = self.descriptor_number() else {
            return false;
        };
        let Some(index) = self.field_index(agent) else {
            let constant = self
                .holder
                .shape(agent)
                .descriptors(agent)
                .get(descriptor)
                .constant();
            return constant == Some(value);
        };
        let slot = raw_fast_property_at(agent, self.holder, index);
        if self.details.representation().is_double() {
            let Some(number) = value.to_number(agent) else {
                return false;
            };
            let bits = match slot {
                Slot::Double(bits) => bits,
                Slot::MutableNumber(number) => number.value(agent).to_bits(),
                Slot::Uninitialized => return true,
                _ => return false,
            };
            if bits == HOLE_NAN_BITS {
                return true;
            }
            return same_number_value(f64::from_bits(bits), number);
        }
        match slot {
            Slot::Uninitialized => true,
            Slot::Tagged(current) => current == value || current.same_value(agent, value),
            _ => false,
        }
    }

    /// ### PrepareForDataProperty
    ///
    /// Make the holder's shape able to hold `value` in the found data
    /// property, migrating the holder if needed.
    pub(crate) fn prepare_for_data_property(&mut self, agent: &mut Agent, value: Value) {
        debug_assert_eq!(self.state, LookupState::Data);
        let holder = self.holder;
        let old_shape = holder.shape(agent);
        if old_shape.is_dictionary_map(agent) {
            return;
        }
        let Some(descriptor) = self.descriptor_number() else {
            return;
        };
        let mut new_constness = PropertyConstness::Const;
        if self.details.constness() == PropertyConstness::Const {
            debug_assert_eq!(self.details.kind(), PropertyKind::Data);
            if !self.is_const_field_value_equal_to(agent, value) {
                new_constness = PropertyConstness::Mutable;
            }
        }
        let new_shape =
            prepare_for_data_property(agent, old_shape, descriptor, new_constness, value);
        if new_shape == old_shape {
            if self.details.constness() != new_constness
                || self.details.representation().is_none()
            {
                self.details = new_shape.descriptor_details(agent, descriptor);
            }
            return;
        }
        migrate_to_shape(agent, holder, new_shape);
        self.reload_property_information(agent);
    }

    /// ### ReconfigureDataProperty
    ///
    /// Turn the found own property into a data property with `value` and
    /// `attributes`.
    pub(crate) fn reconfigure_data_property(
        &mut self,
        agent: &mut Agent,
        value: Value,
        attributes: PropertyAttributes,
    ) {
        debug_assert!(matches!(
            self.state,
            LookupState::Data | LookupState::Accessor
        ));
        debug_assert!(self.holder_is_receiver());
        let holder = self.holder;
        if self.is_element() {
            // Elements of indexed exotic objects keep their attributes.
            self.write_data_value(agent, value);
            return;
        }
        if holder.has_fast_properties(agent)
            && let Some(descriptor) = self.descriptor_number()
        {
            let old_shape = holder.shape(agent);
            let mut new_shape = reconfigure_existing_property(
                agent,
                old_shape,
                descriptor,
                PropertyKind::Data,
                attributes,
                PropertyConstness::Const,
            );
            if !new_shape.is_dictionary_map(agent) {
                // Reconfiguring through an accessor must not leave a stale
                // constant behind.
                new_shape = prepare_for_data_property(
                    agent,
                    new_shape,
                    descriptor,
                    PropertyConstness::Mutable,
                    value,
                );
            }
            migrate_to_shape(agent, holder, new_shape);
            self.reload_property_information(agent);
        }
        if !holder.has_fast_properties(agent) {
            let details = PropertyDetails::dictionary(PropertyKind::Data, attributes, 0);
            let shape = holder.shape(agent);
            if shape.is_prototype_map(agent)
                && self.has_property
                && !self.details.is_read_only()
                && attributes.is_read_only()
            {
                invalidate_prototype_chains(agent, shape);
            }
            set_normalized_property(
                agent,
                holder,
                self.name,
                DictionaryValue::Data(value),
                details,
            );
            reoptimize_if_prototype(agent, holder);
            self.reload_property_information(agent);
        }
        self.write_data_value(agent, value);
    }

    /// ### PrepareTransitionToDataProperty
    ///
    /// Find the shape the receiver moves to when the property is added to
    /// it. The cursor enters the [`LookupState::Transition`] state.
    pub(crate) fn prepare_transition_to_data_property(
        &mut self,
        agent: &mut Agent,
        value: Value,
        attributes: PropertyAttributes,
        store_origin: StoreOrigin,
    ) {
        if self.state == LookupState::Transition {
            return;
        }
        debug_assert_ne!(self.state, LookupState::IndexedExotic);
        let mut attributes = attributes;
        if self.name.is_private(agent) {
            attributes |= PropertyAttributes::DONT_ENUM;
        }
        let shape = self.receiver.shape(agent);
        if shape.is_dictionary_map(agent) {
            self.state = LookupState::Transition;
            self.details = PropertyDetails::dictionary(PropertyKind::Data, attributes, 0);
            self.transition = Some(shape);
            return;
        }
        let constness = if agent.options.track_constant_fields {
            PropertyConstness::Const
        } else {
            PropertyConstness::Mutable
        };
        let transition = transition_to_data_property(
            agent,
            shape,
            self.name,
            value,
            attributes,
            constness,
            store_origin,
        );
        self.state = LookupState::Transition;
        self.transition = Some(transition);
        match transition.last_added(agent) {
            Some(last) if !transition.is_dictionary_map(agent) => {
                self.details = transition.descriptor_details(agent, last);
                self.has_property = true;
            }
            _ => {
                self.details = PropertyDetails::dictionary(PropertyKind::Data, attributes, 0);
            }
        }
    }

    /// ### ApplyTransitionToDataProperty
    ///
    /// Move the receiver to the transition shape and point the cursor at
    /// the new, not yet written, property.
    pub(crate) fn apply_transition_to_data_property(&mut self, agent: &mut Agent) {
        debug_assert_eq!(self.state, LookupState::Transition);
        let receiver = self.receiver;
        self.holder = receiver;
        let Some(transition) = self.transition else {
            return;
        };
        let simple_transition = transition.parent(agent) == Some(receiver.shape(agent));
        migrate_to_shape(agent, receiver, transition);
        if simple_transition && let Some(last) = transition.last_added(agent) {
            self.handle = PropertyHandle::Descriptor(last);
            self.details = transition.descriptor_details(agent, last);
            self.has_property = true;
            self.state = LookupState::Data;
        } else if receiver.shape(agent).is_dictionary_map(agent) {
            let shape = receiver.shape(agent);
            if shape.is_prototype_map(agent) {
                invalidate_prototype_chains(agent, shape);
            }
            let name = self.name;
            let hash = name.hash(agent);
            let details = self.details;
            let Some(dictionary) = receiver.dictionary_mut(agent) else {
                self.state = LookupState::NotFound;
                return;
            };
            let entry =
                dictionary.add(name, hash, DictionaryValue::Data(Value::Undefined), details);
            self.details = dictionary.details_at(entry).unwrap_or(details);
            self.handle = PropertyHandle::Dictionary(entry);
            self.has_property = true;
            self.state = LookupState::Data;
        } else {
            self.reload_property_information(agent);
        }
    }

    /// ### TransitionToAccessorProperty
    ///
    /// Define or update the accessor property on the receiver. `None`
    /// components are left as they are; `Some(None)` sets a component to
    /// undefined.
    pub(crate) fn transition_to_accessor_property(
        &mut self,
        agent: &mut Agent,
        getter: Option<Option<Object>>,
        setter: Option<Option<Object>>,
        attributes: PropertyAttributes,
    ) {
        let receiver = self.receiver;
        let mut attributes = attributes;
        if self.name.is_private(agent) {
            attributes |= PropertyAttributes::DONT_ENUM;
        }
        if !receiver.shape(agent).is_dictionary_map(agent) {
            let old_shape = receiver.shape(agent);
            if self.holder != receiver {
                self.holder = receiver;
                self.state = LookupState::NotFound;
            } else if self.state == LookupState::Interceptor {
                self.state = self.lookup_in_regular_holder(agent, receiver);
            }
            let descriptor = if self.is_found() {
                self.descriptor_number()
            } else {
                None
            };
            let new_shape = transition_to_accessor_property(
                agent, old_shape, self.name, descriptor, getter, setter, attributes,
            );
            let simple_transition = new_shape.parent(agent) == Some(receiver.shape(agent));
            migrate_to_shape(agent, receiver, new_shape);
            if simple_transition && let Some(last) = new_shape.last_added(agent) {
                self.handle = PropertyHandle::Descriptor(last);
                self.details = new_shape.descriptor_details(agent, last);
                self.has_property = true;
                self.state = LookupState::Accessor;
                return;
            }
            self.reload_property_information(agent);
            if !new_shape.is_dictionary_map(agent) {
                return;
            }
        }

        let existing = if self.state == LookupState::Accessor {
            self.get_accessors(agent)
        } else {
            None
        };
        let pair = match existing {
            Some(pair) => {
                let new_getter = getter.unwrap_or_else(|| pair.getter(agent));
                let new_setter = setter.unwrap_or_else(|| pair.setter(agent));
                if pair.equals(agent, new_getter, new_setter) {
                    if self.property_attributes() == attributes {
                        reoptimize_if_prototype(agent, receiver);
                        return;
                    }
                    pair
                } else {
                    let pair = pair.copy(agent);
                    pair.set(agent, AccessorComponent::Getter, new_getter);
                    pair.set(agent, AccessorComponent::Setter, new_setter);
                    pair
                }
            }
            None => AccessorPair::new(agent, getter.flatten(), setter.flatten()),
        };
        self.transition_to_accessor_pair(agent, pair, attributes);
    }

    /// ### TransitionToAccessorPair
    fn transition_to_accessor_pair(
        &mut self,
        agent: &mut Agent,
        pair: AccessorPair,
        attributes: PropertyAttributes,
    ) {
        let receiver = self.receiver;
        self.holder = receiver;
        let details = PropertyDetails::dictionary(PropertyKind::Accessor, attributes, 0);
        let shape = receiver.shape(agent);
        let mode = if shape.is_prototype_map(agent) {
            invalidate_prototype_chains(agent, shape);
            NormalizationMode::KeepInobjectProperties
        } else {
            NormalizationMode::ClearInobjectProperties
        };
        normalize_properties(agent, receiver, mode, 0, "TransitionToAccessorPair");
        set_normalized_property(
            agent,
            receiver,
            self.name,
            DictionaryValue::Accessors(pair),
            details,
        );
        reoptimize_if_prototype(agent, receiver);
        self.reload_property_information(agent);
    }

    /// ### Delete
    ///
    /// Remove the found own property. The holder is normalized first.
    pub(crate) fn delete(&mut self, agent: &mut Agent) {
        debug_assert!(matches!(
            self.state,
            LookupState::Data | LookupState::Accessor
        ));
        let holder = self.holder;
        let mode = if holder.shape(agent).is_prototype_map(agent) {
            NormalizationMode::KeepInobjectProperties
        } else {
            NormalizationMode::ClearInobjectProperties
        };
        if holder.has_fast_properties(agent) {
            normalize_properties(agent, holder, mode, 0, "DeletingProperty");
            self.reload_property_information(agent);
        }
        let shape = holder.shape(agent);
        if shape.is_prototype_map(agent) {
            invalidate_prototype_chains(agent, shape);
        }
        if let PropertyHandle::Dictionary(entry) = self.handle
            && let Some(dictionary) = holder.dictionary_mut(agent)
        {
            let deleted = dictionary.delete(entry);
            debug_assert!(deleted, "Stale dictionary entry");
        }
        reoptimize_if_prototype(agent, holder);
        self.handle = PropertyHandle::None;
        self.has_property = false;
        self.state = LookupState::NotFound;
    }
}

/// ### SetNormalizedProperty
///
/// Add or overwrite a property of a dictionary mode object. An existing
/// entry keeps its enumeration index.
pub(crate) fn set_normalized_property(
    agent: &mut Agent,
    object: Object,
    name: Name,
    value: DictionaryValue,
    details: PropertyDetails,
) {
    let hash = name.hash(agent);
    let Some(dictionary) = object.dictionary_mut(agent) else {
        debug_assert!(false, "Object is not in dictionary mode");
        return;
    };
    match dictionary.find(name, hash) {
        Some(entry) => {
            dictionary.set_entry(entry, value, details);
        }
        None => {
            dictionary.add(name, hash, value, details);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ecmascript::{
            builtins::ordinary::migration::normalize_properties,
            execution::{DefaultHostHooks, Options},
        },
        heap::NoopHeapHooks,
    };

    fn agent() -> Agent {
        Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks)
    }

    fn add(agent: &mut Agent, object: Object, key: &str, value: Value) {
        let key = PropertyKey::from_str(agent, key);
        let mut it =
            LookupIterator::new(agent, object, key, LookupConfiguration::Own).unwrap();
        assert_eq!(it.state(), LookupState::NotFound);
        it.prepare_transition_to_data_property(
            agent,
            value,
            PropertyAttributes::NONE,
            StoreOrigin::Named,
        );
        it.apply_transition_to_data_property(agent);
        it.write_data_value(agent, value);
    }

    #[test]
    fn finds_own_data_before_prototype() {
        let mut agent = agent();
        let prototype = Object::new(&mut agent);
        add(&mut agent, prototype, "x", Value::Smi(1));
        let object = Object::ordinary_object_create(&mut agent, Some(prototype));
        let key = PropertyKey::from_str(&mut agent, "x");

        let it = LookupIterator::new(&mut agent, object, key, LookupConfiguration::PrototypeChain)
            .unwrap();
        assert_eq!(it.state(), LookupState::Data);
        assert_eq!(it.holder(), prototype);

        add(&mut agent, object, "x", Value::Smi(2));
        let it = LookupIterator::new(&mut agent, object, key, LookupConfiguration::PrototypeChain)
            .unwrap();
        assert_eq!(it.state(), LookupState::Data);
        assert!(it.holder_is_receiver());
        assert_eq!(it.get_data_value(&mut agent), Value::Smi(2));
    }

    #[test]
    fn own_lookup_stops_at_receiver() {
        let mut agent = agent();
        let prototype = Object::new(&mut agent);
        add(&mut agent, prototype, "x", Value::Smi(1));
        let object = Object::ordinary_object_create(&mut agent, Some(prototype));
        let key = PropertyKey::from_str(&mut agent, "x");
        let it = LookupIterator::new(&mut agent, object, key, LookupConfiguration::Own).unwrap();
        assert_eq!(it.state(), LookupState::NotFound);
        assert_eq!(it.holder(), object);
    }

    #[test]
    fn dictionary_mode_lookup() {
        let mut agent = agent();
        let object = Object::new(&mut agent);
        add(&mut agent, object, "a", Value::Smi(1));
        add(&mut agent, object, "b", Value::Boolean(true));
        normalize_properties(
            &mut agent,
            object,
            NormalizationMode::ClearInobjectProperties,
            0,
            "test",
        );
        assert!(!object.has_fast_properties(&agent));
        let key = PropertyKey::from_str(&mut agent, "b");
        let it = LookupIterator::new(&mut agent, object, key, LookupConfiguration::Own).unwrap();
        assert_eq!(it.state(), LookupState::Data);
        assert_eq!(it.get_data_value(&mut agent), Value::Boolean(true));
    }

    #[test]
    fn typed_array_elements() {
        let mut agent = agent();
        let array = Object::create_typed_array(&mut agent, 2);
        let it = LookupIterator::new(
            &mut agent,
            array,
            PropertyKey::Index(1),
            LookupConfiguration::PrototypeChain,
        )
        .unwrap();
        assert_eq!(it.state(), LookupState::Data);
        assert!(it.is_element());
        assert!(!it.is_configurable());

        let it = LookupIterator::new(
            &mut agent,
            array,
            PropertyKey::Index(2),
            LookupConfiguration::PrototypeChain,
        )
        .unwrap();
        assert_eq!(it.state(), LookupState::IndexedExotic);
    }

    #[test]
    fn same_number_value_distinguishes_zeroes() {
        assert!(same_number_value(f64::NAN, f64::NAN));
        assert!(!same_number_value(0.0, -0.0));
        assert!(same_number_value(1.5, 1.5));
    }
}
