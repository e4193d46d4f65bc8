// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [10.5 Proxy Object Internal Methods and Internal Slots](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots)
//!
//! Proxies own no properties. Each internal method resolves in a single step
//! by calling the corresponding trap of the handler. The default traps
//! forward to the target; a proxy without a target behaves as an empty,
//! extensible object without a prototype.

use core::fmt::Debug;
use std::rc::Rc;

use crate::ecmascript::{
    abstract_operations::operations_on_objects::{
        define_own_property, delete_property, get_own_property_descriptor, get_prototype_of,
        get_with_receiver, has_property, is_extensible, own_property_keys, prevent_extensions,
        set, set_prototype_of,
    },
    execution::{Agent, JsResult, LanguageMode, PolicyReason, ShouldThrow},
    types::{InternalSlots, Object, PropertyDescriptor, PropertyKey, Value},
};

pub trait ProxyHandler: Debug {
    /// ### [10.5.8 \[\[Get\]\] ( P, Receiver )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-get-p-receiver)
    fn get(
        &self,
        agent: &mut Agent,
        target: Option<Object>,
        key: PropertyKey,
        receiver: Value,
    ) -> JsResult<Value> {
        match target {
            Some(target) => get_with_receiver(agent, target, key, receiver),
            None => Ok(Value::Undefined),
        }
    }

    /// ### [10.5.9 \[\[Set\]\] ( P, V, Receiver )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-set-p-v-receiver)
    fn set(
        &self,
        agent: &mut Agent,
        target: Option<Object>,
        key: PropertyKey,
        value: Value,
        receiver: Value,
    ) -> JsResult<bool> {
        let _ = receiver;
        match target {
            Some(target) => set(agent, target, key, value, ShouldThrow::DontThrow),
            None => Ok(false),
        }
    }

    /// ### [10.5.7 \[\[HasProperty\]\] ( P )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-hasproperty-p)
    fn has(&self, agent: &mut Agent, target: Option<Object>, key: PropertyKey) -> JsResult<bool> {
        match target {
            Some(target) => has_property(agent, target, key),
            None => Ok(false),
        }
    }

    /// ### [10.5.10 \[\[Delete\]\] ( P )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-delete-p)
    fn delete_property(
        &self,
        agent: &mut Agent,
        target: Option<Object>,
        key: PropertyKey,
    ) -> JsResult<bool> {
        match target {
            Some(target) => delete_property(agent, target, key, LanguageMode::Sloppy),
            None => Ok(true),
        }
    }

    /// ### [10.5.5 \[\[GetOwnProperty\]\] ( P )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-getownproperty-p)
    fn get_own_property(
        &self,
        agent: &mut Agent,
        target: Option<Object>,
        key: PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        match target {
            Some(target) => get_own_property_descriptor(agent, target, key),
            None => Ok(None),
        }
    }

    /// ### [10.5.6 \[\[DefineOwnProperty\]\] ( P, Desc )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-defineownproperty-p-desc)
    fn define_own_property(
        &self,
        agent: &mut Agent,
        target: Option<Object>,
        key: PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> JsResult<bool> {
        match target {
            Some(target) => {
                define_own_property(agent, target, key, descriptor, ShouldThrow::DontThrow)
            }
            None => Ok(false),
        }
    }

    /// ### [10.5.11 \[\[OwnPropertyKeys\]\] ( )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-ownpropertykeys)
    fn own_property_keys(
        &self,
        agent: &mut Agent,
        target: Option<Object>,
    ) -> JsResult<Vec<PropertyKey>> {
        match target {
            Some(target) => own_property_keys(agent, target),
            None => Ok(Vec::new()),
        }
    }

    /// ### [10.5.1 \[\[GetPrototypeOf\]\] ( )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-getprototypeof)
    fn get_prototype_of(
        &self,
        agent: &mut Agent,
        target: Option<Object>,
    ) -> JsResult<Option<Object>> {
        match target {
            Some(target) => get_prototype_of(agent, target),
            None => Ok(None),
        }
    }

    /// ### [10.5.2 \[\[SetPrototypeOf\]\] ( V )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-setprototypeof-v)
    fn set_prototype_of(
        &self,
        agent: &mut Agent,
        target: Option<Object>,
        prototype: Option<Object>,
    ) -> JsResult<bool> {
        match target {
            Some(target) => set_prototype_of(agent, target, prototype, ShouldThrow::DontThrow),
            None => Ok(false),
        }
    }

    /// ### [10.5.4 \[\[PreventExtensions\]\] ( )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-preventextensions)
    fn prevent_extensions(&self, agent: &mut Agent, target: Option<Object>) -> JsResult<bool> {
        match target {
            Some(target) => prevent_extensions(agent, target, ShouldThrow::DontThrow),
            None => Ok(false),
        }
    }

    /// ### [10.5.3 \[\[IsExtensible\]\] ( )](https://tc39.es/ecma262/#sec-proxy-object-internal-methods-and-internal-slots-isextensible)
    fn is_extensible(&self, agent: &mut Agent, target: Option<Object>) -> JsResult<bool> {
        match target {
            Some(target) => is_extensible(agent, target),
            None => Ok(true),
        }
    }
}

/// Handler that forwards every trap to the target.
#[derive(Debug, Default)]
pub struct ForwardingHandler;

impl ProxyHandler for ForwardingHandler {}

#[derive(Debug, Clone)]
pub struct ProxyData {
    pub(crate) target: Option<Object>,
    /// `None` once the proxy has been revoked.
    pub(crate) handler: Option<Rc<dyn ProxyHandler>>,
}

/// Target and handler of a live proxy.
pub(crate) fn proxy_parts(
    agent: &Agent,
    proxy: Object,
) -> JsResult<(Option<Object>, Rc<dyn ProxyHandler>)> {
    match &proxy.record(agent).internal {
        InternalSlots::Proxy(ProxyData {
            target,
            handler: Some(handler),
        }) => Ok((*target, handler.clone())),
        _ => Err(agent.policy_failure(PolicyReason::ProxyRevoked, None)),
    }
}

/// Revoke a proxy: every later operation on it fails.
pub fn revoke(agent: &mut Agent, proxy: Object) {
    if let InternalSlots::Proxy(data) = &mut proxy.record_mut(agent).internal {
        data.target = None;
        data.handler = None;
    }
}
