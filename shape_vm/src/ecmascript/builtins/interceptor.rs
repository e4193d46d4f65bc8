// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Named property interceptors
//!
//! Host callbacks that take over named property accesses of an object.
//! Every callback may decline, in which case the access continues as if the
//! interceptor was not there.

use core::fmt::Debug;
use std::rc::Rc;

use crate::{
    ecmascript::{
        execution::{Agent, JsResult},
        types::{Object, PropertyAttributes, PropertyDescriptor, PropertyKey, Value},
    },
    heap::{CreateHeapData, Heap, indexes::InterceptorIndex},
};

pub trait NamedInterceptor: Debug {
    /// `Ok(None)` declines.
    fn getter(
        &self,
        agent: &mut Agent,
        holder: Object,
        key: PropertyKey,
    ) -> JsResult<Option<Value>> {
        let _ = (agent, holder, key);
        Ok(None)
    }

    /// Returns whether the store was intercepted.
    fn setter(
        &self,
        agent: &mut Agent,
        holder: Object,
        key: PropertyKey,
        value: Value,
    ) -> JsResult<bool> {
        let _ = (agent, holder, key, value);
        Ok(false)
    }

    /// Attributes of an intercepted property; `Ok(None)` declines.
    fn query(
        &self,
        agent: &mut Agent,
        holder: Object,
        key: PropertyKey,
    ) -> JsResult<Option<PropertyAttributes>> {
        let _ = (agent, holder, key);
        Ok(None)
    }

    /// Result of an intercepted delete; `Ok(None)` declines.
    fn deleter(
        &self,
        agent: &mut Agent,
        holder: Object,
        key: PropertyKey,
    ) -> JsResult<Option<bool>> {
        let _ = (agent, holder, key);
        Ok(None)
    }

    /// Returns whether the definition was intercepted.
    fn definer(
        &self,
        agent: &mut Agent,
        holder: Object,
        key: PropertyKey,
        descriptor: &PropertyDescriptor,
    ) -> JsResult<bool> {
        let _ = (agent, holder, key, descriptor);
        Ok(false)
    }

    fn descriptor(
        &self,
        agent: &mut Agent,
        holder: Object,
        key: PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        let _ = (agent, holder, key);
        Ok(None)
    }

    /// Keys contributed to own property enumeration.
    fn enumerator(&self, agent: &mut Agent, holder: Object) -> JsResult<Vec<PropertyKey>> {
        let _ = (agent, holder);
        Ok(Vec::new())
    }

    /// Non-masking interceptors are only consulted for properties that are
    /// not found anywhere on the prototype chain.
    fn is_non_masking(&self) -> bool {
        false
    }

    fn can_intercept_symbols(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct InterceptorRecord {
    pub(crate) handler: Rc<dyn NamedInterceptor>,
}

impl InterceptorIndex {
    pub(crate) fn handler(self, agent: &Agent) -> Rc<dyn NamedInterceptor> {
        agent.heap.interceptors[self.into_index()].handler.clone()
    }
}

/// Interceptor of `holder`, if its shape has one.
pub(crate) fn get_interceptor(agent: &Agent, holder: Object) -> Option<Rc<dyn NamedInterceptor>> {
    let shape = holder.shape(agent);
    if !shape.has_named_interceptor(agent) {
        return None;
    }
    shape.interceptor(agent).map(|index| index.handler(agent))
}

impl CreateHeapData<InterceptorRecord, InterceptorIndex> for Heap {
    fn create(&mut self, data: InterceptorRecord) -> InterceptorIndex {
        self.interceptors.push(data);
        InterceptorIndex::last(&self.interceptors)
    }
}
