// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## [7.3 Operations on Objects](https://tc39.es/ecma262/#sec-operations-on-objects)
//!
//! Every operation resolves its key with a [`LookupIterator`] and acts on
//! the state the lookup stops in. Proxies are delegated to their handler in
//! a single step; interceptors may decline, in which case the lookup
//! continues behind them.

use crate::ecmascript::{
    abstract_operations::lookup_iterator::{
        LookupConfiguration, LookupIterator, LookupState,
    },
    builtins::{
        builtin_function::call_function,
        get_interceptor,
        ordinary::{
            migration::{delete_property_fast, migrate_to_shape, prevent_extensions_with_transition},
            shape::StoreOrigin,
            shape_transitions::{transition_to_immutable_proto, transition_to_prototype},
        },
        proxy::proxy_parts,
        typed_array::{
            NumericKey, canonical_numeric_key, element_keys, is_valid_integer_index,
            typed_array_length, typed_array_set_element,
        },
    },
    execution::{Agent, JsResult, LanguageMode, PolicyReason, ShouldThrow},
    types::{
        Name, Object, PropertyAttributes, PropertyDescriptor, PropertyDetails, PropertyKey,
        PropertyKind, Value,
    },
};

/// Integrity level of [`set_integrity_level`] and [`test_integrity_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrityLevel {
    Sealed,
    Frozen,
}

impl IntegrityLevel {
    fn attributes(self) -> PropertyAttributes {
        match self {
            IntegrityLevel::Sealed => PropertyAttributes::SEALED,
            IntegrityLevel::Frozen => PropertyAttributes::FROZEN,
        }
    }
}

/// Turn a falsish trap result into a policy failure when throwing.
fn trap_result(
    agent: &Agent,
    result: bool,
    should_throw: ShouldThrow,
    key: Option<PropertyKey>,
) -> JsResult<bool> {
    if result {
        return Ok(true);
    }
    agent.fail(should_throw, PolicyReason::TrapReturnedFalsish, key)
}

/// ### [7.3.2 Get ( O, P )](https://tc39.es/ecma262/#sec-get-o-p)
pub fn get(agent: &mut Agent, o: Object, p: PropertyKey) -> JsResult<Value> {
    // 1. Return ? O.[[Get]](P, O).
    get_with_receiver(agent, o, p, Value::Object(o))
}

/// ### [10.1.8 \[\[Get\]\] ( P, Receiver )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-get-p-receiver)
///
/// Getters are called with `receiver` as their this value.
pub fn get_with_receiver(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    receiver: Value,
) -> JsResult<Value> {
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::PrototypeChain)?;
    get_property(agent, &mut it, receiver)
}

fn get_property(agent: &mut Agent, it: &mut LookupIterator, receiver: Value) -> JsResult<Value> {
    loop {
        match it.state() {
            LookupState::NotFound | LookupState::Transition => return Ok(Value::Undefined),
            LookupState::Proxy => {
                let (target, handler) = proxy_parts(agent, it.holder())?;
                return handler.get(agent, target, it.key(), receiver);
            }
            LookupState::AccessCheck => {
                agent.access_check(it.holder(), Some(it.key()))?;
            }
            LookupState::Interceptor => {
                if let Some(interceptor) = it.interceptor(agent)
                    && let Some(value) = interceptor.getter(agent, it.holder(), it.key())?
                {
                    return Ok(value);
                }
            }
            LookupState::Accessor => {
                let getter = it.get_accessors(agent).and_then(|pair| pair.getter(agent));
                return match getter {
                    Some(getter) => call_function(agent, getter, receiver, &[]),
                    None => Ok(Value::Undefined),
                };
            }
            LookupState::IndexedExotic => return Ok(Value::Undefined),
            LookupState::Data => return Ok(it.get_data_value(agent)),
        }
        it.next(agent)?;
    }
}

/// ### [7.3.4 Set ( O, P, V, Throw )](https://tc39.es/ecma262/#sec-set-o-p-v-throw)
///
/// Returns `Ok(false)` for a failed store when `should_throw` is
/// [`ShouldThrow::DontThrow`].
pub fn set(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    v: Value,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    set_property(agent, o, p, v, should_throw, StoreOrigin::Named)
}

/// Like [`set`], with the origin of the store. Keyed stores get a smaller
/// out-of-object field budget before the object is normalized.
pub fn set_property(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    v: Value,
    should_throw: ShouldThrow,
    store_origin: StoreOrigin,
) -> JsResult<bool> {
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::PrototypeChain)?;
    if let Some(result) = set_property_internal(agent, &mut it, v, should_throw)? {
        return Ok(result);
    }
    add_data_property(
        agent,
        &mut it,
        v,
        PropertyAttributes::NONE,
        should_throw,
        store_origin,
    )
}

/// ### SetPropertyInternal
///
/// `Ok(None)` means the property has to be added to the receiver.
fn set_property_internal(
    agent: &mut Agent,
    it: &mut LookupIterator,
    value: Value,
    should_throw: ShouldThrow,
) -> JsResult<Option<bool>> {
    loop {
        match it.state() {
            LookupState::NotFound | LookupState::Transition => return Ok(None),
            LookupState::Proxy => {
                let (target, handler) = proxy_parts(agent, it.holder())?;
                let receiver = Value::Object(it.receiver());
                let result = handler.set(agent, target, it.key(), value, receiver)?;
                return trap_result(agent, result, should_throw, Some(it.key())).map(Some);
            }
            LookupState::AccessCheck => {
                agent.access_check(it.holder(), Some(it.key()))?;
            }
            LookupState::Interceptor => {
                let Some(interceptor) = it.interceptor(agent) else {
                    it.next(agent)?;
                    continue;
                };
                if it.holder_is_receiver() {
                    if interceptor.setter(agent, it.holder(), it.key(), value)? {
                        return Ok(Some(true));
                    }
                } else if let Some(attributes) =
                    get_property_attributes_with_interceptor(agent, it)?
                {
                    if attributes.is_read_only() {
                        return write_to_read_only_property(agent, it, should_throw).map(Some);
                    }
                    // The intercepted property is shadowed on the receiver.
                    return Ok(None);
                }
            }
            LookupState::Accessor => {
                if it.is_read_only() {
                    return write_to_read_only_property(agent, it, should_throw).map(Some);
                }
                let setter = it.get_accessors(agent).and_then(|pair| pair.setter(agent));
                let Some(setter) = setter else {
                    return write_to_read_only_property(agent, it, should_throw).map(Some);
                };
                call_function(agent, setter, Value::Object(it.receiver()), &[value])?;
                return Ok(Some(true));
            }
            LookupState::IndexedExotic => {
                // Stores to numeric keys outside of the elements are dropped.
                return Ok(Some(true));
            }
            LookupState::Data => {
                if it.is_read_only() {
                    return write_to_read_only_property(agent, it, should_throw).map(Some);
                }
                if it.holder_is_receiver() {
                    return set_data_property(agent, it, value).map(Some);
                }
                return Ok(None);
            }
        }
        it.next(agent)?;
    }
}

fn write_to_read_only_property(
    agent: &Agent,
    it: &LookupIterator,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    agent.fail(should_throw, PolicyReason::ReadOnly, Some(it.key()))
}

/// ### SetDataProperty
fn set_data_property(agent: &mut Agent, it: &mut LookupIterator, value: Value) -> JsResult<bool> {
    it.prepare_for_data_property(agent, value);
    it.write_data_value(agent, value);
    Ok(true)
}

/// ### AddDataProperty
fn add_data_property(
    agent: &mut Agent,
    it: &mut LookupIterator,
    value: Value,
    attributes: PropertyAttributes,
    should_throw: ShouldThrow,
    store_origin: StoreOrigin,
) -> JsResult<bool> {
    if it.extending_non_extensible(agent) {
        return agent.fail(should_throw, PolicyReason::NotExtensible, Some(it.key()));
    }
    it.prepare_transition_to_data_property(agent, value, attributes, store_origin);
    it.apply_transition_to_data_property(agent);
    it.write_data_value(agent, value);
    Ok(true)
}

/// ### GetPropertyAttributesWithInterceptor
///
/// Attributes reported by the interceptor of the current holder. A
/// property only known to the getter callback is reported as
/// non-enumerable.
fn get_property_attributes_with_interceptor(
    agent: &mut Agent,
    it: &LookupIterator,
) -> JsResult<Option<PropertyAttributes>> {
    let Some(interceptor) = it.interceptor(agent) else {
        return Ok(None);
    };
    if let Some(attributes) = interceptor.query(agent, it.holder(), it.key())? {
        return Ok(Some(attributes));
    }
    if interceptor.getter(agent, it.holder(), it.key())?.is_some() {
        return Ok(Some(PropertyAttributes::DONT_ENUM));
    }
    Ok(None)
}

/// ### GetPropertyAttributes
///
/// Leaves the iterator at the state the attributes were found in.
fn get_property_attributes_internal(
    agent: &mut Agent,
    it: &mut LookupIterator,
) -> JsResult<Option<PropertyAttributes>> {
    loop {
        match it.state() {
            LookupState::NotFound | LookupState::Transition => return Ok(None),
            LookupState::Proxy => {
                let (target, handler) = proxy_parts(agent, it.holder())?;
                let descriptor = handler.get_own_property(agent, target, it.key())?;
                return Ok(descriptor.map(|descriptor| descriptor.to_attributes()));
            }
            LookupState::AccessCheck => {
                agent.access_check(it.holder(), Some(it.key()))?;
            }
            LookupState::Interceptor => {
                if let Some(attributes) = get_property_attributes_with_interceptor(agent, it)? {
                    return Ok(Some(attributes));
                }
            }
            LookupState::IndexedExotic => return Ok(None),
            LookupState::Accessor | LookupState::Data => {
                return Ok(Some(it.property_attributes()));
            }
        }
        it.next(agent)?;
    }
}

/// Attributes of the property `p` as seen from `o`, or `None` if it is not
/// present on the prototype chain.
pub fn get_property_attributes(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
) -> JsResult<Option<PropertyAttributes>> {
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::PrototypeChain)?;
    get_property_attributes_internal(agent, &mut it)
}

/// Attributes of the own property `p` of `o`.
pub fn get_own_property_attributes(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
) -> JsResult<Option<PropertyAttributes>> {
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::Own)?;
    get_property_attributes_internal(agent, &mut it)
}

fn has_property_internal(agent: &mut Agent, it: &mut LookupIterator, own: bool) -> JsResult<bool> {
    loop {
        match it.state() {
            LookupState::NotFound | LookupState::Transition => return Ok(false),
            LookupState::Proxy => {
                let (target, handler) = proxy_parts(agent, it.holder())?;
                if own {
                    return Ok(handler.get_own_property(agent, target, it.key())?.is_some());
                }
                return handler.has(agent, target, it.key());
            }
            LookupState::AccessCheck => {
                agent.access_check(it.holder(), Some(it.key()))?;
            }
            LookupState::Interceptor => {
                if get_property_attributes_with_interceptor(agent, it)?.is_some() {
                    return Ok(true);
                }
            }
            LookupState::IndexedExotic => return Ok(false),
            LookupState::Accessor | LookupState::Data => return Ok(true),
        }
        it.next(agent)?;
    }
}

/// ### [7.3.12 HasProperty ( O, P )](https://tc39.es/ecma262/#sec-hasproperty)
pub fn has_property(agent: &mut Agent, o: Object, p: PropertyKey) -> JsResult<bool> {
    // 1. Return ? O.[[HasProperty]](P).
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::PrototypeChain)?;
    has_property_internal(agent, &mut it, false)
}

/// ### [7.3.13 HasOwnProperty ( O, P )](https://tc39.es/ecma262/#sec-hasownproperty)
pub fn has_own_property(agent: &mut Agent, o: Object, p: PropertyKey) -> JsResult<bool> {
    // 1. Let desc be ? O.[[GetOwnProperty]](P).
    // 2. If desc is undefined, return false.
    // 3. Return true.
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::Own)?;
    has_property_internal(agent, &mut it, true)
}

/// ### [10.1.10 \[\[Delete\]\] ( P )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-delete-p)
///
/// Deleting a non-configurable property fails with a policy failure in
/// strict mode and returns `false` in sloppy mode.
pub fn delete_property(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    language_mode: LanguageMode,
) -> JsResult<bool> {
    let should_throw = ShouldThrow::from(language_mode);
    let name = p.to_name(agent);
    if delete_property_fast(agent, o, name) {
        return Ok(true);
    }
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::Own)?;
    loop {
        match it.state() {
            LookupState::NotFound | LookupState::Transition => return Ok(true),
            LookupState::Proxy => {
                let (target, handler) = proxy_parts(agent, it.holder())?;
                let result = handler.delete_property(agent, target, p)?;
                return trap_result(agent, result, should_throw, Some(p));
            }
            LookupState::AccessCheck => {
                agent.access_check(it.holder(), Some(p))?;
            }
            LookupState::Interceptor => {
                if let Some(interceptor) = it.interceptor(agent)
                    && let Some(result) = interceptor.deleter(agent, it.holder(), p)?
                {
                    return Ok(result);
                }
            }
            LookupState::IndexedExotic => return Ok(true),
            LookupState::Data | LookupState::Accessor => {
                // 1. Let desc be ? O.[[GetOwnProperty]](P).
                // 3. If desc.[[Configurable]] is true, then
                if it.is_configurable() {
                    // a. Remove the own property with name P from O.
                    it.delete(agent);
                    // b. Return true.
                    return Ok(true);
                }
                // 4. Return false.
                return agent.fail(should_throw, PolicyReason::NonConfigurable, Some(p));
            }
        }
        it.next(agent)?;
    }
}

/// ### [10.1.5 \[\[GetOwnProperty\]\] ( P )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-getownproperty-p)
pub fn get_own_property_descriptor(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
) -> JsResult<Option<PropertyDescriptor>> {
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::Own)?;
    get_own_property_descriptor_internal(agent, &mut it)
}

fn get_own_property_descriptor_internal(
    agent: &mut Agent,
    it: &mut LookupIterator,
) -> JsResult<Option<PropertyDescriptor>> {
    if it.state() == LookupState::Proxy {
        let (target, handler) = proxy_parts(agent, it.holder())?;
        return handler.get_own_property(agent, target, it.key());
    }
    if it.state() == LookupState::AccessCheck {
        agent.access_check(it.holder(), Some(it.key()))?;
        it.next(agent)?;
    }
    if it.state() == LookupState::Interceptor
        && let Some(interceptor) = it.interceptor(agent)
        && let Some(descriptor) = interceptor.descriptor(agent, it.holder(), it.key())?
    {
        return Ok(Some(descriptor));
    }
    // 1. If O does not have an own property with key P, return undefined.
    let Some(attributes) = get_property_attributes_internal(agent, it)? else {
        return Ok(None);
    };
    // 2. Let D be a newly created Property Descriptor with no fields.
    // 3. Let X be O's own property whose key is P.
    if it.state() == LookupState::Accessor {
        // 5. Else,
        // a. Assert: X is an accessor property.
        let pair = it.get_accessors(agent);
        let getter = pair.and_then(|pair| pair.getter(agent));
        let setter = pair.and_then(|pair| pair.setter(agent));
        // b. Set D.[[Get]] to the value of X's [[Get]] attribute.
        // c. Set D.[[Set]] to the value of X's [[Set]] attribute.
        // 6. Set D.[[Enumerable]] to the value of X's [[Enumerable]] attribute.
        // 7. Set D.[[Configurable]] to the value of X's [[Configurable]] attribute.
        return Ok(Some(PropertyDescriptor::new_accessor_with_attributes(
            getter, setter, attributes,
        )));
    }
    // 4. If X is a data property, then
    // a. Set D.[[Value]] to the value of X's [[Value]] attribute.
    // b. Set D.[[Writable]] to the value of X's [[Writable]] attribute.
    let receiver = Value::Object(it.receiver());
    let value = get_property(agent, it, receiver)?;
    // 8. Return D.
    Ok(Some(PropertyDescriptor::new_data_with_attributes(
        value, attributes,
    )))
}

/// ### [7.3.5 CreateDataProperty ( O, P, V )](https://tc39.es/ecma262/#sec-createdataproperty)
pub fn create_data_property(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    v: Value,
) -> JsResult<bool> {
    create_data_property_with(agent, o, p, v, ShouldThrow::DontThrow)
}

/// ### [7.3.7 CreateDataPropertyOrThrow ( O, P, V )](https://tc39.es/ecma262/#sec-createdatapropertyorthrow)
pub fn create_data_property_or_throw(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    v: Value,
) -> JsResult<()> {
    create_data_property_with(agent, o, p, v, ShouldThrow::ThrowOnError)?;
    Ok(())
}

fn create_data_property_with(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    v: Value,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    if o.is_proxy(agent) || o.is_typed_array(agent) {
        // 1. Let newDesc be the PropertyDescriptor { [[Value]]: V, [[Writable]]: true, [[Enumerable]]: true, [[Configurable]]: true }.
        let new_desc = PropertyDescriptor::new_data_descriptor(v);
        // 2. Return ? O.[[DefineOwnProperty]](P, newDesc).
        return define_own_property(agent, o, p, new_desc, should_throw);
    }
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::Own)?;
    if it.is_found() {
        let attributes = get_property_attributes_internal(agent, &mut it)?;
        if attributes.is_some_and(|attributes| !attributes.is_configurable()) {
            return agent.fail(should_throw, PolicyReason::CannotRedefine, Some(p));
        }
    } else if !o.shape(agent).is_extensible(agent) && !p.is_private(agent) {
        return agent.fail(should_throw, PolicyReason::NotExtensible, Some(p));
    }
    define_own_property_ignore_attributes(agent, o, p, v, PropertyAttributes::NONE, should_throw)
}

/// ### [10.1.6 \[\[DefineOwnProperty\]\] ( P, Desc )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-defineownproperty-p-desc)
pub fn define_own_property(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    desc: PropertyDescriptor,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    if o.is_proxy(agent) && !p.is_private(agent) {
        let (target, handler) = proxy_parts(agent, o)?;
        let result = handler.define_own_property(agent, target, p, desc)?;
        return trap_result(agent, result, should_throw, Some(p));
    }
    if o.is_typed_array(agent)
        && let Some(numeric_key) = canonical_numeric_key(agent, p)
    {
        return typed_array_define_own_property(agent, o, p, numeric_key, desc, should_throw);
    }
    ordinary_define_own_property(agent, o, p, desc, should_throw)
}

/// ### [10.4.5.3 \[\[DefineOwnProperty\]\] ( P, Desc )](https://tc39.es/ecma262/#sec-typedarray-defineownproperty)
///
/// Elements are writable, enumerable and non-configurable data properties
/// and cannot be redefined as anything else.
fn typed_array_define_own_property(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    numeric_key: NumericKey,
    desc: PropertyDescriptor,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    let fail = |agent: &Agent| agent.fail(should_throw, PolicyReason::CannotRedefine, Some(p));
    // i. If IsValidIntegerIndex(O, numericIndex) is false, return false.
    let NumericKey::Index(index) = numeric_key else {
        return fail(agent);
    };
    if !is_valid_integer_index(agent, o, index) {
        return fail(agent);
    }
    // ii. If Desc has a [[Configurable]] field and Desc.[[Configurable]] is true, return false.
    if desc.configurable == Some(true) {
        return fail(agent);
    }
    // iii. If Desc has an [[Enumerable]] field and Desc.[[Enumerable]] is false, return false.
    if desc.enumerable == Some(false) {
        return fail(agent);
    }
    // iv. If IsAccessorDescriptor(Desc) is true, return false.
    if desc.is_accessor_descriptor() {
        return fail(agent);
    }
    // v. If Desc has a [[Writable]] field and Desc.[[Writable]] is false, return false.
    if desc.writable == Some(false) {
        return fail(agent);
    }
    // vi. If Desc has a [[Value]] field, perform ? TypedArraySetElement(O, numericIndex, Desc.[[Value]]).
    if let Some(value) = desc.value {
        typed_array_set_element(agent, o, index, value);
    }
    // vii. Return true.
    Ok(true)
}

/// ### [10.1.6.1 OrdinaryDefineOwnProperty ( O, P, Desc )](https://tc39.es/ecma262/#sec-ordinarydefineownproperty)
fn ordinary_define_own_property(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    desc: PropertyDescriptor,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::Own)?;
    if it.state() == LookupState::AccessCheck {
        agent.access_check(o, Some(p))?;
        it.next(agent)?;
    }
    // Interceptors of the receiver get to handle the definition first.
    while it.is_found() {
        if it.state() == LookupState::Interceptor
            && it.holder_is_receiver()
            && let Some(interceptor) = it.interceptor(agent)
            && interceptor.definer(agent, o, p, &desc)?
        {
            return Ok(true);
        }
        if it.state() != LookupState::Interceptor {
            break;
        }
        it.next(agent)?;
    }
    it.restart(agent)?;
    // 1. Let current be ? O.[[GetOwnProperty]](P).
    let current = get_own_property_descriptor_internal(agent, &mut it)?;
    // 2. Let extensible be ? IsExtensible(O).
    let extensible = o.shape(agent).is_extensible(agent) || p.is_private(agent);
    // 3. Return ValidateAndApplyPropertyDescriptor(O, P, extensible, Desc, current).
    validate_and_apply_property_descriptor(agent, o, p, extensible, desc, current, should_throw)
}

/// ### [10.1.6.3 ValidateAndApplyPropertyDescriptor ( O, P, extensible, Desc, current )](https://tc39.es/ecma262/#sec-validateandapplypropertydescriptor)
fn validate_and_apply_property_descriptor(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    extensible: bool,
    desc: PropertyDescriptor,
    current: Option<PropertyDescriptor>,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    let fail = |agent: &Agent, reason| agent.fail(should_throw, reason, Some(p));
    // 1. Assert: IsPropertyKey(P) is true.
    // 2. If current is undefined, then
    let Some(current) = current else {
        // a. If extensible is false, return false.
        if !extensible {
            return fail(agent, PolicyReason::NotExtensible);
        }
        // b. If O is undefined, return true.
        // c. If IsAccessorDescriptor(Desc) is true, then
        if desc.is_accessor_descriptor() {
            // i. Create an own accessor property named P of object O whose
            //    [[Get]], [[Set]], [[Enumerable]], and [[Configurable]]
            //    attributes are set to the value of the corresponding field
            //    in Desc if Desc has that field, or to the attribute's
            //    default value otherwise.
            define_accessor(
                agent,
                o,
                p,
                Some(desc.get.flatten()),
                Some(desc.set.flatten()),
                desc.to_attributes(),
            )?;
        } else {
            // d. Else,
            // i. Create an own data property named P of object O whose
            //    [[Value]], [[Writable]], [[Enumerable]], and
            //    [[Configurable]] attributes are set to the value of the
            //    corresponding field in Desc if Desc has that field, or to
            //    the attribute's default value otherwise.
            let value = desc.value.unwrap_or(Value::Undefined);
            define_own_property_ignore_attributes(
                agent,
                o,
                p,
                value,
                desc.to_attributes(),
                should_throw,
            )?;
        }
        // e. Return true.
        return Ok(true);
    };

    // 3. Assert: current is a fully populated Property Descriptor.
    // 4. If Desc does not have any fields, return true.
    if !desc.has_fields() {
        return Ok(true);
    }

    // 5. If current.[[Configurable]] is false, then
    if current.configurable == Some(false) {
        // a. If Desc has a [[Configurable]] field and Desc.[[Configurable]] is true, return false.
        if desc.configurable == Some(true) {
            return fail(agent, PolicyReason::CannotRedefine);
        }
        // b. If Desc has an [[Enumerable]] field and SameValue(Desc.[[Enumerable]], current.[[Enumerable]]) is false, return false.
        if desc.enumerable.is_some() && desc.enumerable != current.enumerable {
            return fail(agent, PolicyReason::CannotRedefine);
        }
        // c. If IsGenericDescriptor(Desc) is false and SameValue(IsAccessorDescriptor(Desc), IsAccessorDescriptor(current)) is false, return false.
        if !desc.is_generic_descriptor()
            && desc.is_accessor_descriptor() != current.is_accessor_descriptor()
        {
            return fail(agent, PolicyReason::CannotRedefine);
        }
        // d. If IsAccessorDescriptor(current) is true, then
        if current.is_accessor_descriptor() {
            // i. If Desc has a [[Get]] field and SameValue(Desc.[[Get]], current.[[Get]]) is false, return false.
            if desc.get.is_some() && desc.get != current.get {
                return fail(agent, PolicyReason::CannotRedefine);
            }
            // ii. If Desc has a [[Set]] field and SameValue(Desc.[[Set]], current.[[Set]]) is false, return false.
            if desc.set.is_some() && desc.set != current.set {
                return fail(agent, PolicyReason::CannotRedefine);
            }
        } else if current.writable == Some(false) {
            // e. Else if current.[[Writable]] is false, then
            // i. If Desc has a [[Writable]] field and Desc.[[Writable]] is true, return false.
            if desc.writable == Some(true) {
                return fail(agent, PolicyReason::CannotRedefine);
            }
            // ii. If Desc has a [[Value]] field and SameValue(Desc.[[Value]], current.[[Value]]) is false, return false.
            if let (Some(new_value), Some(current_value)) = (desc.value, current.value)
                && !new_value.same_value(agent, current_value)
            {
                return fail(agent, PolicyReason::CannotRedefine);
            }
        }
    }

    let current_attributes = current.to_attributes();
    // 6. If O is not undefined, then
    if current.is_data_descriptor() && desc.is_accessor_descriptor() {
        // a. If IsDataDescriptor(current) is true and IsAccessorDescriptor(Desc) is true, then
        // i. If Desc has a [[Configurable]] field, let configurable be
        //    Desc.[[Configurable]]; else let configurable be
        //    current.[[Configurable]].
        // ii. If Desc has a [[Enumerable]] field, let enumerable be
        //     Desc.[[Enumerable]]; else let enumerable be
        //     current.[[Enumerable]].
        // iii. Replace the property named P of object O with an accessor
        //      property whose [[Configurable]] and [[Enumerable]]
        //      attributes are set to configurable and enumerable,
        //      respectively, and whose [[Get]] and [[Set]] attributes are
        //      set to the value of the corresponding field in Desc if Desc
        //      has that field, or to the attribute's default value
        //      otherwise.
        define_accessor(
            agent,
            o,
            p,
            Some(desc.get.flatten()),
            Some(desc.set.flatten()),
            desc.attributes_over(current_attributes),
        )?;
    } else if current.is_accessor_descriptor() && desc.is_data_descriptor() {
        // b. Else if IsAccessorDescriptor(current) is true and IsDataDescriptor(Desc) is true, then
        // iii. Replace the property named P of object O with a data property
        //      whose [[Configurable]] and [[Enumerable]] attributes are set
        //      to configurable and enumerable, respectively, and whose
        //      [[Value]] and [[Writable]] attributes are set to the value of
        //      the corresponding field in Desc if Desc has that field, or to
        //      the attribute's default value otherwise.
        let mut attributes = desc.attributes_over(current_attributes);
        if desc.writable.is_none() {
            attributes |= PropertyAttributes::READ_ONLY;
        }
        let value = desc.value.unwrap_or(Value::Undefined);
        define_own_property_ignore_attributes(agent, o, p, value, attributes, should_throw)?;
    } else if current.is_accessor_descriptor() {
        // c. Else,
        // i. For each field of Desc, set the corresponding attribute of the
        //    property named P of object O to the value of the field.
        define_accessor(
            agent,
            o,
            p,
            desc.get,
            desc.set,
            desc.attributes_over(current_attributes),
        )?;
    } else {
        let value = desc
            .value
            .or(current.value)
            .unwrap_or(Value::Undefined);
        define_own_property_ignore_attributes(
            agent,
            o,
            p,
            value,
            desc.attributes_over(current_attributes),
            should_throw,
        )?;
    }
    // 7. Return true.
    Ok(true)
}

/// ### DefineOwnPropertyIgnoreAttributes
///
/// Define or overwrite the own data property `p` with `value` and
/// `attributes`, regardless of the attributes it had before.
pub fn define_own_property_ignore_attributes(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    value: Value,
    attributes: PropertyAttributes,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::Own)?;
    loop {
        match it.state() {
            LookupState::NotFound | LookupState::Transition => break,
            LookupState::Proxy => {
                let desc = PropertyDescriptor::new_data_with_attributes(value, attributes);
                return define_own_property(agent, o, p, desc, should_throw);
            }
            LookupState::AccessCheck => {
                agent.access_check(o, Some(p))?;
            }
            LookupState::Interceptor => {
                if let Some(interceptor) = it.interceptor(agent)
                    && interceptor.setter(agent, o, p, value)?
                {
                    return Ok(true);
                }
            }
            LookupState::Accessor => {
                it.reconfigure_data_property(agent, value, attributes);
                return Ok(true);
            }
            LookupState::IndexedExotic => {
                return agent.fail(should_throw, PolicyReason::CannotRedefine, Some(p));
            }
            LookupState::Data => {
                if it.property_attributes() == attributes {
                    return set_data_property(agent, &mut it, value);
                }
                if it.is_element() {
                    return agent.fail(should_throw, PolicyReason::CannotRedefine, Some(p));
                }
                it.reconfigure_data_property(agent, value, attributes);
                return Ok(true);
            }
        }
        it.next(agent)?;
    }
    add_data_property(
        agent,
        &mut it,
        value,
        attributes,
        should_throw,
        StoreOrigin::Named,
    )
}

/// ### DefineAccessor
///
/// Define or update the own accessor property `p`. `None` components keep
/// their current value; `Some(None)` sets a component to undefined.
/// Accessors cannot be defined on typed array elements and are ignored.
pub fn define_accessor(
    agent: &mut Agent,
    o: Object,
    p: PropertyKey,
    getter: Option<Option<Object>>,
    setter: Option<Option<Object>>,
    attributes: PropertyAttributes,
) -> JsResult<()> {
    let mut it = LookupIterator::new(agent, o, p, LookupConfiguration::OwnSkipInterceptor)?;
    if it.state() == LookupState::Proxy {
        let desc = PropertyDescriptor {
            get: getter,
            set: setter,
            enumerable: Some(attributes.is_enumerable()),
            configurable: Some(attributes.is_configurable()),
            ..Default::default()
        };
        define_own_property(agent, o, p, desc, ShouldThrow::ThrowOnError)?;
        return Ok(());
    }
    if it.state() == LookupState::AccessCheck {
        agent.access_check(o, Some(p))?;
        it.next(agent)?;
    }
    if it.is_element() || it.state() == LookupState::IndexedExotic {
        return Ok(());
    }
    it.transition_to_accessor_property(agent, getter, setter, attributes);
    Ok(())
}

/// ### [10.1.11 \[\[OwnPropertyKeys\]\] ( )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-ownpropertykeys)
///
/// Integer keys in ascending order, then string keys and then symbols in
/// property creation order. Private symbols are never listed.
pub fn own_property_keys(agent: &mut Agent, o: Object) -> JsResult<Vec<PropertyKey>> {
    if o.is_proxy(agent) {
        let (target, handler) = proxy_parts(agent, o)?;
        return handler.own_property_keys(agent, target);
    }
    agent.access_check(o, None)?;

    // 1. Let keys be a new empty List.
    let mut keys: Vec<PropertyKey> = if o.is_typed_array(agent) {
        element_keys(agent, o).collect()
    } else {
        Vec::new()
    };

    let shape = o.shape(agent);
    let names: Vec<_> = if shape.is_dictionary_map(agent) {
        o.dictionary(agent)
            .map(|dictionary| {
                dictionary
                    .entries_in_enumeration_order()
                    .into_iter()
                    .map(|entry| entry.name)
                    .collect()
            })
            .unwrap_or_default()
    } else {
        let number_of_descriptors = shape.number_of_own_descriptors(agent);
        shape
            .descriptors(agent)
            .iter(number_of_descriptors)
            .map(|descriptor| descriptor.key)
            .collect()
    };

    let mut indexes = Vec::new();
    let mut strings = Vec::new();
    let mut symbols = Vec::new();
    for name in names {
        if name.is_symbol(agent) {
            if !name.is_private(agent) {
                symbols.push(PropertyKey::Name(name));
            }
            continue;
        }
        match PropertyKey::from_name(agent, name) {
            PropertyKey::Index(index) => indexes.push(index),
            key => strings.push(key),
        }
    }
    // 2. For each own property key P of O such that P is an array index, in
    //    ascending numeric index order, do
    //    a. Append P to keys.
    indexes.sort_unstable();
    keys.extend(indexes.into_iter().map(PropertyKey::Index));
    // 3. For each own property key P of O such that P is a String and P is
    //    not an array index, in ascending chronological order of property
    //    creation, do
    //    a. Append P to keys.
    keys.extend(strings);
    // 4. For each own property key P of O such that P is a Symbol, in
    //    ascending chronological order of property creation, do
    //    a. Append P to keys.
    keys.extend(symbols);

    if shape.has_named_interceptor(agent)
        && let Some(interceptor) = get_interceptor(agent, o)
    {
        for key in interceptor.enumerator(agent, o)? {
            if !keys.contains(&key) && !key.is_private(agent) {
                keys.push(key);
            }
        }
    }
    // 5. Return keys.
    Ok(keys)
}

/// ### [7.3.15 SetIntegrityLevel ( O, level )](https://tc39.es/ecma262/#sec-setintegritylevel)
pub fn set_integrity_level(
    agent: &mut Agent,
    o: Object,
    level: IntegrityLevel,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    if !o.is_proxy(agent) {
        if test_integrity_level(agent, o, level)? {
            return Ok(true);
        }
        return prevent_extensions_with_transition(agent, o, level.attributes(), should_throw);
    }
    // 1. Let status be ? O.[[PreventExtensions]]().
    // 2. If status is false, return false.
    if !prevent_extensions(agent, o, should_throw)? {
        return Ok(false);
    }
    // 3. Let keys be ? O.[[OwnPropertyKeys]]().
    let keys = own_property_keys(agent, o)?;
    for k in keys {
        let desc = match level {
            // 4. If level is sealed, then
            // a. For each element k of keys, do
            // i. Perform ? DefinePropertyOrThrow(O, k, PropertyDescriptor { [[Configurable]]: false }).
            IntegrityLevel::Sealed => PropertyDescriptor {
                configurable: Some(false),
                ..Default::default()
            },
            // 5. Else,
            // a. Assert: level is frozen.
            // b. For each element k of keys, do
            // i. Let currentDesc be ? O.[[GetOwnProperty]](k).
            // ii. If currentDesc is not undefined, then
            IntegrityLevel::Frozen => match get_own_property_descriptor(agent, o, k)? {
                // 1. If IsAccessorDescriptor(currentDesc) is true, then
                // a. Let desc be the PropertyDescriptor { [[Configurable]]: false }.
                Some(current) if current.is_accessor_descriptor() => PropertyDescriptor {
                    configurable: Some(false),
                    ..Default::default()
                },
                // 2. Else,
                // a. Let desc be the PropertyDescriptor { [[Configurable]]: false, [[Writable]]: false }.
                Some(_) => PropertyDescriptor {
                    configurable: Some(false),
                    writable: Some(false),
                    ..Default::default()
                },
                None => continue,
            },
        };
        // 3. Perform ? DefinePropertyOrThrow(O, k, desc).
        if !define_own_property(agent, o, k, desc, should_throw)? {
            return Ok(false);
        }
    }
    // 6. Return true.
    Ok(true)
}

/// ### [7.3.16 TestIntegrityLevel ( O, level )](https://tc39.es/ecma262/#sec-testintegritylevel)
pub fn test_integrity_level(agent: &mut Agent, o: Object, level: IntegrityLevel) -> JsResult<bool> {
    let shape = o.shape(agent);
    if !o.is_proxy(agent) && !shape.has_named_interceptor(agent) {
        if shape.is_extensible(agent) {
            return Ok(false);
        }
        if o.is_typed_array(agent)
            && level == IntegrityLevel::Frozen
            && typed_array_length(agent, o) > 0
        {
            return Ok(false);
        }
        return Ok(test_properties_integrity_level(agent, o, level));
    }
    // 1. Let extensible be ? IsExtensible(O).
    // 2. If extensible is true, return false.
    if is_extensible(agent, o)? {
        return Ok(false);
    }
    // 3. NOTE: If the object is extensible, none of its properties are examined.
    // 4. Let keys be ? O.[[OwnPropertyKeys]]().
    let keys = own_property_keys(agent, o)?;
    // 5. For each element k of keys, do
    for k in keys {
        // a. Let currentDesc be ? O.[[GetOwnProperty]](k).
        // b. If currentDesc is not undefined, then
        if let Some(current) = get_own_property_descriptor(agent, o, k)? {
            // i. If currentDesc.[[Configurable]] is true, return false.
            if current.configurable == Some(true) {
                return Ok(false);
            }
            // ii. If level is frozen and IsDataDescriptor(currentDesc) is true, then
            // 1. If currentDesc.[[Writable]] is true, return false.
            if level == IntegrityLevel::Frozen
                && current.is_data_descriptor()
                && current.writable == Some(true)
            {
                return Ok(false);
            }
        }
    }
    // 6. Return true.
    Ok(true)
}

fn test_properties_integrity_level(agent: &Agent, o: Object, level: IntegrityLevel) -> bool {
    let satisfies = |name: Name, details: PropertyDetails| {
        if name.is_private(agent) {
            return true;
        }
        if details.is_configurable() {
            return false;
        }
        !(level == IntegrityLevel::Frozen
            && details.kind() == PropertyKind::Data
            && !details.is_read_only())
    };
    let shape = o.shape(agent);
    if shape.is_dictionary_map(agent) {
        let Some(dictionary) = o.dictionary(agent) else {
            return true;
        };
        return dictionary
            .entries_in_enumeration_order()
            .into_iter()
            .all(|entry| satisfies(entry.name, entry.details));
    }
    let number_of_descriptors = shape.number_of_own_descriptors(agent);
    shape
        .descriptors(agent)
        .iter(number_of_descriptors)
        .all(|descriptor| satisfies(descriptor.key, descriptor.details))
}

/// ### [10.1.4 \[\[PreventExtensions\]\] ( )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-preventextensions)
pub fn prevent_extensions(
    agent: &mut Agent,
    o: Object,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    if o.is_proxy(agent) {
        let (target, handler) = proxy_parts(agent, o)?;
        let result = handler.prevent_extensions(agent, target)?;
        return trap_result(agent, result, should_throw, None);
    }
    // 1. Set O.[[Extensible]] to false.
    // 2. Return true.
    prevent_extensions_with_transition(agent, o, PropertyAttributes::NONE, should_throw)
}

/// ### [10.1.3 \[\[IsExtensible\]\] ( )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-isextensible)
///
/// Objects that fail their access check report as extensible.
pub fn is_extensible(agent: &mut Agent, o: Object) -> JsResult<bool> {
    if o.is_proxy(agent) {
        let (target, handler) = proxy_parts(agent, o)?;
        return handler.is_extensible(agent, target);
    }
    let shape = o.shape(agent);
    if shape.is_access_check_needed(agent) && !agent.host_hooks.may_access(agent, o, None) {
        return Ok(true);
    }
    // 1. Return O.[[Extensible]].
    Ok(shape.is_extensible(agent))
}

/// ### [10.1.1 \[\[GetPrototypeOf\]\] ( )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-getprototypeof)
pub fn get_prototype_of(agent: &mut Agent, o: Object) -> JsResult<Option<Object>> {
    if o.is_proxy(agent) {
        let (target, handler) = proxy_parts(agent, o)?;
        return handler.get_prototype_of(agent, target);
    }
    let shape = o.shape(agent);
    if shape.is_access_check_needed(agent) && !agent.host_hooks.may_access(agent, o, None) {
        return Ok(None);
    }
    // 1. Return O.[[Prototype]].
    Ok(shape.prototype(agent))
}

/// ### [10.1.2 \[\[SetPrototypeOf\]\] ( V )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-setprototypeof-v)
pub fn set_prototype_of(
    agent: &mut Agent,
    o: Object,
    v: Option<Object>,
    should_throw: ShouldThrow,
) -> JsResult<bool> {
    if o.is_proxy(agent) {
        let (target, handler) = proxy_parts(agent, o)?;
        let result = handler.set_prototype_of(agent, target, v)?;
        return trap_result(agent, result, should_throw, None);
    }
    agent.access_check(o, None)?;
    let shape = o.shape(agent);
    // 1. Let current be O.[[Prototype]].
    let current = shape.prototype(agent);
    // 2. If SameValue(V, current) is true, return true.
    if v == current {
        return Ok(true);
    }
    if shape.is_immutable_proto(agent) {
        return agent.fail(should_throw, PolicyReason::ImmutablePrototype, None);
    }
    // 3. Let extensible be O.[[Extensible]].
    // 4. If extensible is false, return false.
    if !shape.is_extensible(agent) {
        return agent.fail(should_throw, PolicyReason::NonExtensiblePrototype, None);
    }
    // 5. Let p be V.
    let mut p = v;
    // 6. Let done be false.
    // 7. Repeat, while done is false,
    let mut hops = 0;
    while let Some(p_inner) = p {
        // a. If p is null, set done to true.
        // b. Else if SameValue(p, O) is true, return false.
        if p_inner == o {
            return agent.fail(should_throw, PolicyReason::CyclicPrototype, None);
        }
        // c. Else,
        // i. If p.[[GetPrototypeOf]] is not the ordinary object internal
        //    method defined in 10.1.1, set done to true.
        if p_inner.is_proxy(agent) {
            break;
        }
        hops += 1;
        if hops > agent.options.max_prototype_chain_length {
            return agent.fail(should_throw, PolicyReason::CyclicPrototype, None);
        }
        // ii. Else, set p to p.[[Prototype]].
        p = p_inner.shape(agent).prototype(agent);
    }
    // 8. Set O.[[Prototype]] to V.
    let new_shape = transition_to_prototype(agent, shape, v);
    migrate_to_shape(agent, o, new_shape);
    // 9. Return true.
    Ok(true)
}

/// ### SetImmutablePrototype
///
/// Lock the prototype of `o`: later [`set_prototype_of`] calls with a
/// different prototype fail.
pub fn set_immutable_prototype(agent: &mut Agent, o: Object) {
    let shape = o.shape(agent);
    if shape.is_immutable_proto(agent) {
        return;
    }
    let new_shape = transition_to_immutable_proto(agent, shape);
    migrate_to_shape(agent, o, new_shape);
}

#[cfg(test)]
mod tests {
    use super::ShouldThrow::{DontThrow, ThrowOnError};
    use super::*;
    use crate::{
        ecmascript::execution::{DefaultHostHooks, JsError, Options},
        heap::NoopHeapHooks,
    };

    fn agent() -> Agent {
        Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks)
    }

    fn key(agent: &mut Agent, name: &str) -> PropertyKey {
        PropertyKey::from_str(agent, name)
    }

    #[test]
    fn set_then_get() {
        let mut agent = agent();
        let object = Object::new(&mut agent);
        let x = key(&mut agent, "x");
        assert_eq!(get(&mut agent, object, x).unwrap(), Value::Undefined);
        assert!(set(&mut agent, object, x, Value::Smi(3), ThrowOnError).unwrap());
        assert_eq!(get(&mut agent, object, x).unwrap(), Value::Smi(3));
        assert!(has_own_property(&mut agent, object, x).unwrap());
    }

    #[test]
    fn read_only_prototype_property_blocks_store() {
        let mut agent = agent();
        let prototype = Object::new(&mut agent);
        let x = key(&mut agent, "x");
        define_own_property_ignore_attributes(
            &mut agent,
            prototype,
            x,
            Value::Smi(1),
            PropertyAttributes::READ_ONLY,
            ThrowOnError,
        )
        .unwrap();
        let object = Object::ordinary_object_create(&mut agent, Some(prototype));
        assert!(!set(&mut agent, object, x, Value::Smi(2), DontThrow).unwrap());
        let error = set(&mut agent, object, x, Value::Smi(2), ThrowOnError).unwrap_err();
        assert_eq!(error.policy_reason(), Some(PolicyReason::ReadOnly));
        assert!(!has_own_property(&mut agent, object, x).unwrap());
    }

    #[test]
    fn writable_prototype_property_is_shadowed() {
        let mut agent = agent();
        let prototype = Object::new(&mut agent);
        let x = key(&mut agent, "x");
        set(&mut agent, prototype, x, Value::Smi(1), ThrowOnError).unwrap();
        let object = Object::ordinary_object_create(&mut agent, Some(prototype));
        set(&mut agent, object, x, Value::Smi(2), ThrowOnError).unwrap();
        assert_eq!(get(&mut agent, object, x).unwrap(), Value::Smi(2));
        assert_eq!(get(&mut agent, prototype, x).unwrap(), Value::Smi(1));
    }

    #[test]
    fn own_keys_order() {
        let mut agent = agent();
        let object = Object::new(&mut agent);
        let b = key(&mut agent, "b");
        let a = key(&mut agent, "a");
        let symbol = PropertyKey::Name(Name::new_symbol(&mut agent, Some("s")));
        let private = PropertyKey::Name(Name::new_private_symbol(&mut agent, Some("p")));
        let (two, ten) = (PropertyKey::Index(2), PropertyKey::Index(10));
        for k in [symbol, b, ten, private, a, two] {
            set(&mut agent, object, k, Value::Null, ThrowOnError).unwrap();
        }
        let keys = own_property_keys(&mut agent, object).unwrap();
        assert_eq!(keys, vec![two, ten, b, a, symbol]);
    }

    #[test]
    fn define_rejects_incompatible_redefinition() {
        let mut agent = agent();
        let object = Object::new(&mut agent);
        let x = key(&mut agent, "x");
        define_own_property_ignore_attributes(
            &mut agent,
            object,
            x,
            Value::Smi(1),
            PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_DELETE,
            ThrowOnError,
        )
        .unwrap();
        let desc = PropertyDescriptor::new_data_descriptor(Value::Smi(2));
        assert!(!define_own_property(&mut agent, object, x, desc, DontThrow).unwrap());
        let same = PropertyDescriptor {
            value: Some(Value::Smi(1)),
            ..Default::default()
        };
        assert!(define_own_property(&mut agent, object, x, same, ThrowOnError).unwrap());
    }

    #[test]
    fn prototype_cycle_is_rejected() {
        let mut agent = agent();
        let a = Object::new(&mut agent);
        let b = Object::ordinary_object_create(&mut agent, Some(a));
        let error = set_prototype_of(&mut agent, a, Some(b), ThrowOnError).unwrap_err();
        assert!(matches!(error, JsError::Policy(_)));
        assert_eq!(error.policy_reason(), Some(PolicyReason::CyclicPrototype));
        assert!(set_prototype_of(&mut agent, b, None, ThrowOnError).unwrap());
        assert_eq!(get_prototype_of(&mut agent, b).unwrap(), None);
    }

    #[test]
    fn immutable_prototype() {
        let mut agent = agent();
        let object = Object::new(&mut agent);
        set_immutable_prototype(&mut agent, object);
        assert!(!set_prototype_of(&mut agent, object, None, DontThrow).unwrap());
        let prototype = get_prototype_of(&mut agent, object).unwrap();
        assert!(set_prototype_of(&mut agent, object, prototype, ThrowOnError).unwrap());
    }
}
