// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod data;
mod property_key;

use std::rc::Rc;

pub(crate) use data::{InternalSlots, PropertyStorage, Slot};
pub use data::ObjectRecord;
pub use property_key::PropertyKey;

use crate::{
    ecmascript::{
        builtins::{
            InterceptorRecord, NamedInterceptor, ProxyData, ProxyHandler,
            builtin_function::Behaviour,
            ordinary::{
                dictionary::NameDictionary,
                prototype_info::{get_object_create_map, optimize_as_prototype},
                shape::{InstanceType, ObjectShape, ObjectShapeRecord, ShapeFlags},
                shape_copy,
                transitions::ObjectShapeTransitionMap,
            },
        },
        execution::Agent,
    },
    heap::{
        CreateHeapData, Heap,
        indexes::{BaseIndex, InterceptorIndex},
    },
};

pub type ObjectIndex = BaseIndex<ObjectRecord>;

/// ### [6.1.7 The Object Type](https://tc39.es/ecma262/#sec-object-type)
///
/// Handle to an object in the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Object(pub(crate) ObjectIndex);

impl Object {
    /// The `%Object.prototype%` intrinsic. It is the first object created in
    /// every heap.
    pub(crate) const OBJECT_PROTOTYPE: Self = Self(ObjectIndex::from_index(0));

    pub(crate) const fn get_index(self) -> usize {
        self.0.into_index()
    }

    pub(crate) fn record(self, agent: &Agent) -> &ObjectRecord {
        &agent.heap.objects[self.get_index()]
    }

    pub(crate) fn record_mut(self, agent: &mut Agent) -> &mut ObjectRecord {
        &mut agent.heap.objects[self.get_index()]
    }

    /// Current shape of the object.
    pub fn shape(self, agent: &Agent) -> ObjectShape {
        self.record(agent).shape()
    }

    pub fn instance_type(self, agent: &Agent) -> InstanceType {
        self.shape(agent).instance_type(agent)
    }

    /// Whether the properties of the object are described by its shape
    /// rather than a dictionary.
    pub fn has_fast_properties(self, agent: &Agent) -> bool {
        !self.shape(agent).is_dictionary_map(agent)
    }

    pub fn is_callable(self, agent: &Agent) -> bool {
        self.shape(agent).is_callable(agent)
    }

    pub fn is_proxy(self, agent: &Agent) -> bool {
        matches!(self.record(agent).internal, InternalSlots::Proxy(_))
    }

    pub fn is_typed_array(self, agent: &Agent) -> bool {
        matches!(self.record(agent).internal, InternalSlots::TypedArray(_))
    }

    /// Length of the property array, including slack.
    pub fn property_array_length(self, agent: &Agent) -> u32 {
        self.record(agent).properties.array_len()
    }

    pub(crate) fn dictionary(self, agent: &Agent) -> Option<&NameDictionary> {
        self.record(agent).properties.as_dictionary()
    }

    pub(crate) fn dictionary_mut(self, agent: &mut Agent) -> Option<&mut NameDictionary> {
        self.record_mut(agent).properties.as_dictionary_mut()
    }

    /// Allocate an instance of the given shape with uninitialized fields.
    pub(crate) fn create_with_shape(
        agent: &mut Agent,
        shape: ObjectShape,
        internal: InternalSlots,
    ) -> Object {
        let properties = if shape.is_dictionary_map(agent) {
            PropertyStorage::Dictionary(Box::new(NameDictionary::with_capacity(
                agent.options.initial_dictionary_capacity,
            )))
        } else {
            match shape.expected_property_array_length(agent) {
                0 => PropertyStorage::Empty,
                length => PropertyStorage::Array(vec![Slot::Uninitialized; length as usize]),
            }
        };
        let inobject_capacity = shape.inobject_properties(agent);
        let used_inobject = shape.used_inobject_slots(agent) as usize;
        let mut record = ObjectRecord::new(shape, inobject_capacity, properties, internal);
        record.inobject[..used_inobject].fill(Slot::Uninitialized);
        agent.heap.create(record)
    }

    /// ### [10.1.12 OrdinaryObjectCreate ( proto \[ , additionalInternalSlotsList \] )](https://tc39.es/ecma262/#sec-ordinaryobjectcreate)
    pub fn ordinary_object_create(agent: &mut Agent, prototype: Option<Object>) -> Object {
        let shape = get_object_create_map(agent, prototype);
        Object::create_with_shape(agent, shape, InternalSlots::Ordinary)
    }

    /// Create an empty ordinary object inheriting from `%Object.prototype%`.
    pub fn new(agent: &mut Agent) -> Object {
        Object::ordinary_object_create(agent, Some(Object::OBJECT_PROTOTYPE))
    }

    /// Create a callable object backed by a native function.
    pub fn create_builtin_function(agent: &mut Agent, behaviour: Behaviour) -> Object {
        let shape = ObjectShape::get_or_create_root(
            agent,
            Some(Object::OBJECT_PROTOTYPE),
            InstanceType::Function,
            0,
        );
        Object::create_with_shape(agent, shape, InternalSlots::Function(behaviour))
    }

    /// Create a typed array of the given length, filled with zeroes.
    pub fn create_typed_array(agent: &mut Agent, length: u32) -> Object {
        let shape = ObjectShape::get_or_create_root(
            agent,
            Some(Object::OBJECT_PROTOTYPE),
            InstanceType::TypedArray,
            0,
        );
        Object::create_with_shape(
            agent,
            shape,
            InternalSlots::TypedArray(vec![0.0; length as usize]),
        )
    }

    /// Create a proxy object. Proxies have no properties of their own;
    /// every operation on them is forwarded to the handler.
    pub fn create_proxy(
        agent: &mut Agent,
        target: Option<Object>,
        handler: Rc<dyn ProxyHandler>,
    ) -> Object {
        let callable = target.is_some_and(|target| target.is_callable(agent));
        let shape = ObjectShape::get_or_create_root(agent, None, InstanceType::Proxy, 0);
        let shape = if callable {
            let callable_shape = shape_copy::copy(agent, shape, "ProxyCallable");
            callable_shape.set_flag(agent, ShapeFlags::IS_CALLABLE, true);
            callable_shape
        } else {
            shape
        };
        Object::create_with_shape(
            agent,
            shape,
            InternalSlots::Proxy(ProxyData {
                target,
                handler: Some(handler),
            }),
        )
    }

    /// Create a host object whose named property accesses go through an
    /// interceptor and optionally an access check.
    pub fn create_api_object(
        agent: &mut Agent,
        prototype: Option<Object>,
        interceptor: Option<Rc<dyn NamedInterceptor>>,
        access_check_needed: bool,
    ) -> Object {
        let interceptor: Option<InterceptorIndex> = interceptor.map(|handler| {
            agent.heap.create(InterceptorRecord { handler })
        });
        let mut record = ObjectShapeRecord::create_root(
            prototype,
            InstanceType::Api,
            agent.options.default_inobject_properties,
        );
        record.interceptor = interceptor;
        record
            .flags
            .set(ShapeFlags::HAS_NAMED_INTERCEPTOR, interceptor.is_some());
        record
            .flags
            .set(ShapeFlags::IS_ACCESS_CHECK_NEEDED, access_check_needed);
        let shape = agent
            .heap
            .create((record, ObjectShapeTransitionMap::ROOT));
        if let Some(prototype) = prototype {
            optimize_as_prototype(agent, prototype);
        }
        Object::create_with_shape(agent, shape, InternalSlots::Ordinary)
    }
}

impl CreateHeapData<ObjectRecord, Object> for Heap {
    fn create(&mut self, data: ObjectRecord) -> Object {
        self.objects.push(data);
        self.alloc_counter += core::mem::size_of::<ObjectRecord>();
        Object(ObjectIndex::last(&self.objects))
    }
}
