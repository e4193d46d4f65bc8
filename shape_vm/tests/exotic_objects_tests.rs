// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use shape_vm::{
    Agent, DefaultHostHooks, HostHooks, JsError, JsResult, LanguageMode, NoopHeapHooks, Object,
    Options, PolicyReason, PropertyAttributes, PropertyKey, ShouldThrow, Value,
    ecmascript::{
        abstract_operations::{
            IntegrityLevel, delete_property, get, get_own_property_attributes, get_prototype_of,
            has_own_property, has_property, is_extensible, own_property_keys, set,
            set_integrity_level,
        },
        builtins::{
            NamedInterceptor,
            proxy::{ForwardingHandler, ProxyHandler, revoke},
        },
        types::Name,
    },
};

use IntegrityLevel::{Frozen, Sealed};
use ShouldThrow::{DontThrow, ThrowOnError};

fn agent() -> Agent {
    Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks)
}

fn key(agent: &mut Agent, name: &str) -> PropertyKey {
    PropertyKey::from_str(agent, name)
}

fn is_named(agent: &Agent, key: PropertyKey, name: &str) -> bool {
    key.as_name()
        .and_then(|key| key.as_str(agent))
        .is_some_and(|key| key == name)
}

/// Serves a read-only `magic` property and declines everything else.
#[derive(Debug)]
struct MagicInterceptor;

impl NamedInterceptor for MagicInterceptor {
    fn getter(
        &self,
        agent: &mut Agent,
        _holder: Object,
        key: PropertyKey,
    ) -> JsResult<Option<Value>> {
        Ok(is_named(agent, key, "magic").then_some(Value::Smi(7)))
    }

    fn query(
        &self,
        agent: &mut Agent,
        _holder: Object,
        key: PropertyKey,
    ) -> JsResult<Option<PropertyAttributes>> {
        Ok(is_named(agent, key, "magic").then_some(PropertyAttributes::READ_ONLY))
    }

    fn deleter(
        &self,
        agent: &mut Agent,
        _holder: Object,
        key: PropertyKey,
    ) -> JsResult<Option<bool>> {
        Ok(is_named(agent, key, "magic").then_some(false))
    }

    fn enumerator(&self, agent: &mut Agent, _holder: Object) -> JsResult<Vec<PropertyKey>> {
        Ok(vec![PropertyKey::from_str(agent, "magic")])
    }
}

/// Throws from every getter call.
#[derive(Debug)]
struct ThrowingInterceptor;

impl NamedInterceptor for ThrowingInterceptor {
    fn getter(
        &self,
        _agent: &mut Agent,
        _holder: Object,
        _key: PropertyKey,
    ) -> JsResult<Option<Value>> {
        Err(JsError::Thrown(Value::Smi(-1)))
    }
}

#[derive(Debug)]
struct DenySecret;

impl HostHooks for DenySecret {
    fn may_access(&self, agent: &Agent, _receiver: Object, key: Option<PropertyKey>) -> bool {
        key.is_none_or(|key| !is_named(agent, key, "secret"))
    }
}

#[derive(Debug)]
struct RejectingHandler;

impl ProxyHandler for RejectingHandler {
    fn set(
        &self,
        _agent: &mut Agent,
        _target: Option<Object>,
        _key: PropertyKey,
        _value: Value,
        _receiver: Value,
    ) -> JsResult<bool> {
        Ok(false)
    }
}

#[test]
fn interceptor_serves_and_declines() {
    let mut agent = agent();
    let prototype = agent.object_prototype();
    let object = Object::create_api_object(
        &mut agent,
        Some(prototype),
        Some(Rc::new(MagicInterceptor)),
        false,
    );
    assert!(object.shape(&agent).has_named_interceptor(&agent));
    let magic = key(&mut agent, "magic");
    let plain = key(&mut agent, "plain");
    assert_eq!(get(&mut agent, object, magic).unwrap(), Value::Smi(7));
    assert_eq!(get(&mut agent, object, plain).unwrap(), Value::Undefined);
    assert_eq!(
        get_own_property_attributes(&mut agent, object, magic).unwrap(),
        Some(PropertyAttributes::READ_ONLY)
    );
    assert!(has_property(&mut agent, object, magic).unwrap());

    // Declined stores create ordinary properties behind the interceptor.
    assert!(set(&mut agent, object, plain, Value::Smi(1), ThrowOnError).unwrap());
    assert_eq!(get(&mut agent, object, plain).unwrap(), Value::Smi(1));
    let keys = own_property_keys(&mut agent, object).unwrap();
    assert_eq!(keys, vec![plain, magic]);

    assert!(!delete_property(&mut agent, object, magic, LanguageMode::Strict).unwrap());
    assert!(delete_property(&mut agent, object, plain, LanguageMode::Strict).unwrap());
    assert!(!has_own_property(&mut agent, object, plain).unwrap());
}

#[test]
fn intercepted_read_only_property_blocks_inherited_store() {
    let mut agent = agent();
    let prototype = agent.object_prototype();
    let holder = Object::create_api_object(
        &mut agent,
        Some(prototype),
        Some(Rc::new(MagicInterceptor)),
        false,
    );
    let object = Object::ordinary_object_create(&mut agent, Some(holder));
    let magic = key(&mut agent, "magic");
    assert_eq!(get(&mut agent, object, magic).unwrap(), Value::Smi(7));
    let error = set(&mut agent, object, magic, Value::Smi(1), ThrowOnError).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::ReadOnly));
    assert!(!has_own_property(&mut agent, object, magic).unwrap());
}

#[test]
fn interceptor_errors_propagate() {
    let mut agent = agent();
    let interceptor: Rc<dyn NamedInterceptor> = Rc::new(ThrowingInterceptor);
    let object = Object::create_api_object(&mut agent, None, Some(interceptor), false);
    let x = key(&mut agent, "x");
    assert_eq!(
        get(&mut agent, object, x),
        Err(JsError::Thrown(Value::Smi(-1)))
    );
}

#[test]
fn interceptors_cannot_be_sealed() {
    let mut agent = agent();
    let interceptor: Rc<dyn NamedInterceptor> = Rc::new(MagicInterceptor);
    let object = Object::create_api_object(&mut agent, None, Some(interceptor), false);
    let error = set_integrity_level(&mut agent, object, Sealed, ThrowOnError).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::CannotSeal));
    assert!(is_extensible(&mut agent, object).unwrap());
}

#[test]
fn access_check_denies_named_property() {
    let mut agent = Agent::new(Options::default(), &DenySecret, &NoopHeapHooks);
    let prototype = agent.object_prototype();
    let object = Object::create_api_object(&mut agent, Some(prototype), None, true);
    assert!(object.shape(&agent).is_access_check_needed(&agent));
    let secret = key(&mut agent, "secret");
    let open = key(&mut agent, "open");

    let error = get(&mut agent, object, secret).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::AccessDenied));
    let error = set(&mut agent, object, secret, Value::Smi(1), DontThrow).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::AccessDenied));

    assert!(set(&mut agent, object, open, Value::Smi(2), ThrowOnError).unwrap());
    assert_eq!(get(&mut agent, object, open).unwrap(), Value::Smi(2));
    let found = get_prototype_of(&mut agent, object).unwrap();
    assert_eq!(found, Some(prototype));
}

#[test]
fn proxy_forwards_to_target() {
    let mut agent = agent();
    let target = Object::new(&mut agent);
    let x = key(&mut agent, "x");
    set(&mut agent, target, x, Value::Smi(1), ThrowOnError).unwrap();
    let proxy = Object::create_proxy(&mut agent, Some(target), Rc::new(ForwardingHandler));
    assert!(proxy.is_proxy(&agent));

    assert_eq!(get(&mut agent, proxy, x).unwrap(), Value::Smi(1));
    assert!(set(&mut agent, proxy, x, Value::Smi(2), ThrowOnError).unwrap());
    assert_eq!(get(&mut agent, target, x).unwrap(), Value::Smi(2));
    assert!(has_property(&mut agent, proxy, x).unwrap());
    assert_eq!(own_property_keys(&mut agent, proxy).unwrap(), vec![x]);

    // Private symbols never reach the handler.
    let private = PropertyKey::Name(Name::new_private_symbol(&mut agent, Some("brand")));
    assert!(set(&mut agent, proxy, private, Value::Smi(3), ThrowOnError).unwrap());
    assert_eq!(get(&mut agent, proxy, private).unwrap(), Value::Smi(3));
    assert!(!has_own_property(&mut agent, target, private).unwrap());

    revoke(&mut agent, proxy);
    let error = get(&mut agent, proxy, x).unwrap_err();
    assert_eq!(error.policy_reason(), Some(PolicyReason::ProxyRevoked));
}

#[test]
fn falsish_proxy_trap() {
    let mut agent = agent();
    let target = Object::new(&mut agent);
    let proxy = Object::create_proxy(&mut agent, Some(target), Rc::new(RejectingHandler));
    let x = key(&mut agent, "x");
    assert!(!set(&mut agent, proxy, x, Value::Smi(1), DontThrow).unwrap());
    let error = set(&mut agent, proxy, x, Value::Smi(1), ThrowOnError).unwrap_err();
    assert_eq!(
        error.policy_reason(),
        Some(PolicyReason::TrapReturnedFalsish)
    );
    assert!(!has_own_property(&mut agent, target, x).unwrap());
}

#[test]
fn proxy_as_prototype_is_consulted() {
    let mut agent = agent();
    let target = Object::new(&mut agent);
    let x = key(&mut agent, "x");
    set(&mut agent, target, x, Value::Smi(5), ThrowOnError).unwrap();
    let proxy = Object::create_proxy(&mut agent, Some(target), Rc::new(ForwardingHandler));
    let object = Object::ordinary_object_create(&mut agent, Some(proxy));
    assert_eq!(get(&mut agent, object, x).unwrap(), Value::Smi(5));
    assert!(has_property(&mut agent, object, x).unwrap());
}

#[test]
fn typed_array_elements() {
    let mut agent = agent();
    let array = Object::create_typed_array(&mut agent, 4);
    assert!(array.is_typed_array(&agent));
    let one = PropertyKey::Index(1);
    let ten = PropertyKey::Index(10);

    assert!(set(&mut agent, array, one, Value::Smi(7), ThrowOnError).unwrap());
    assert_eq!(get(&mut agent, array, one).unwrap(), Value::Smi(7));
    let half = Value::from_f64(&mut agent, 0.5);
    set(&mut agent, array, PropertyKey::Index(2), half, ThrowOnError).unwrap();
    let value = get(&mut agent, array, PropertyKey::Index(2)).unwrap();
    assert_eq!(value.to_number(&agent), Some(0.5));

    // Out of bounds: reads are absent, writes are dropped.
    assert_eq!(get(&mut agent, array, ten).unwrap(), Value::Undefined);
    assert!(set(&mut agent, array, ten, Value::Smi(1), ThrowOnError).unwrap());
    assert!(!has_property(&mut agent, array, ten).unwrap());
    assert!(has_own_property(&mut agent, array, one).unwrap());

    let named = key(&mut agent, "named");
    set(&mut agent, array, named, Value::Null, ThrowOnError).unwrap();
    let mut expected: Vec<PropertyKey> = (0..4).map(PropertyKey::Index).collect();
    expected.push(named);
    assert_eq!(own_property_keys(&mut agent, array).unwrap(), expected);
}

#[test]
fn non_empty_typed_array_cannot_be_frozen() {
    let mut agent = agent();
    let array = Object::create_typed_array(&mut agent, 2);
    let error = set_integrity_level(&mut agent, array, Frozen, ThrowOnError).unwrap_err();
    assert_eq!(
        error.policy_reason(),
        Some(PolicyReason::CannotFreezeTypedArray)
    );

    let empty = Object::create_typed_array(&mut agent, 0);
    assert!(set_integrity_level(&mut agent, empty, Frozen, ThrowOnError).unwrap());
    let sealed = Object::create_typed_array(&mut agent, 2);
    assert!(set_integrity_level(&mut agent, sealed, Sealed, ThrowOnError).unwrap());
}
