// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::fmt::Debug;

use crate::{
    ecmascript::{
        builtins::ordinary::{
            prototype_info::optimize_as_prototype,
            shape::{InstanceType, ObjectShape},
        },
        types::{InternalSlots, Object, PropertyKey, Value},
    },
    heap::{Heap, HeapHooks},
};

/// Policy constants of the shape engine.
#[derive(Debug, Clone)]
pub struct Options {
    /// Fan-out bound of a single shape in the transition tree.
    pub max_number_of_transitions: usize,
    /// Maximum number of own descriptors of a fast mode shape.
    pub max_number_of_descriptors: usize,
    /// Out-of-object field budget of named stores.
    pub max_fast_properties: u32,
    /// Out-of-object field budget of keyed stores.
    pub fast_properties_soft_limit: u32,
    /// Dictionary mode objects with more properties stay in dictionary mode.
    pub max_dictionary_to_fast_properties: u32,
    pub max_prototype_chain_length: u32,
    pub unbox_double_fields: bool,
    pub track_field_types: bool,
    pub track_constant_fields: bool,
    /// In-object slots of ordinary objects.
    pub default_inobject_properties: u32,
    /// Callable values added to an object are stored in the descriptor.
    pub embed_function_constants: bool,
    pub initial_dictionary_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_number_of_transitions: 1024,
            max_number_of_descriptors: 1020,
            max_fast_properties: 128,
            fast_properties_soft_limit: 12,
            max_dictionary_to_fast_properties: 1024,
            max_prototype_chain_length: 100 * 1024,
            unbox_double_fields: true,
            track_field_types: true,
            track_constant_fields: true,
            default_inobject_properties: 4,
            embed_function_constants: true,
            initial_dictionary_capacity: 8,
        }
    }
}

pub type JsResult<T> = std::result::Result<T, JsError>;

/// Reason code of a policy failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum PolicyReason {
    #[error("Cannot assign to read only property")]
    ReadOnly,
    #[error("Cannot delete or redefine non-configurable property")]
    NonConfigurable,
    #[error("Cannot add property, object is not extensible")]
    NotExtensible,
    #[error("Cyclic __proto__ value")]
    CyclicPrototype,
    #[error("Immutable prototype object cannot have its prototype set")]
    ImmutablePrototype,
    #[error("Cannot change the prototype of a non-extensible object")]
    NonExtensiblePrototype,
    #[error("Access to property denied")]
    AccessDenied,
    #[error("Cannot redefine property")]
    CannotRedefine,
    #[error("Cannot freeze array buffer views with elements")]
    CannotFreezeTypedArray,
    #[error("Cannot seal or freeze object")]
    CannotSeal,
    #[error("Cannot perform operation on a revoked proxy")]
    ProxyRevoked,
    #[error("Value is not callable")]
    NotCallable,
    #[error("Proxy trap returned falsish")]
    TrapReturnedFalsish,
}

/// A read-only, non-configurable or non-extensible violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} '{name}'")]
pub struct PolicyFailure {
    pub key: Option<PropertyKey>,
    /// Display form of the violating property name.
    pub name: String,
    pub reason: PolicyReason,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JsError {
    #[error(transparent)]
    Policy(#[from] PolicyFailure),
    /// A getter, setter, interceptor or proxy trap threw.
    #[error("Uncaught exception: {0:?}")]
    Thrown(Value),
    /// Broken engine invariant; the operation was aborted.
    #[error("Invariant violated: {0}")]
    InvariantViolation(&'static str),
}

impl JsError {
    pub fn policy_reason(&self) -> Option<PolicyReason> {
        match self {
            JsError::Policy(failure) => Some(failure.reason),
            _ => None,
        }
    }

    pub fn is_policy_failure(&self) -> bool {
        matches!(self, JsError::Policy(_))
    }
}

/// Propagation of policy failures: as errors, or as a `false` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShouldThrow {
    ThrowOnError,
    DontThrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageMode {
    #[default]
    Sloppy,
    Strict,
}

impl From<LanguageMode> for ShouldThrow {
    fn from(value: LanguageMode) -> Self {
        match value {
            LanguageMode::Sloppy => ShouldThrow::DontThrow,
            LanguageMode::Strict => ShouldThrow::ThrowOnError,
        }
    }
}

pub trait HostHooks: Debug {
    /// Access check predicate for objects whose shape requires one. `key`
    /// is `None` for operations on the object as a whole.
    fn may_access(&self, agent: &Agent, receiver: Object, key: Option<PropertyKey>) -> bool {
        let _ = (agent, receiver, key);
        true
    }

    /// Called when an access check failed.
    fn report_failed_access_check(&self, agent: &Agent, receiver: Object) {
        let _ = (agent, receiver);
    }
}

/// ### [9.7 Agents](https://tc39.es/ecma262/#sec-agents)
pub struct Agent {
    pub(crate) heap: Heap,
    pub options: Options,
    pub(crate) host_hooks: &'static dyn HostHooks,
    pub(crate) heap_hooks: &'static dyn HeapHooks,
}

impl Debug for Agent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Agent")
            .field("options", &self.options)
            .field("host_hooks", &self.host_hooks)
            .field("heap_hooks", &self.heap_hooks)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn new(
        options: Options,
        host_hooks: &'static dyn HostHooks,
        heap_hooks: &'static dyn HeapHooks,
    ) -> Self {
        let mut agent = Self {
            heap: Heap::new(),
            options,
            host_hooks,
            heap_hooks,
        };
        agent.with_bootstrapping(|agent| {
            let inobject_properties = agent.options.default_inobject_properties;
            let shape = ObjectShape::get_or_create_root(
                agent,
                None,
                InstanceType::Ordinary,
                inobject_properties,
            );
            let prototype = Object::create_with_shape(agent, shape, InternalSlots::Ordinary);
            debug_assert_eq!(prototype, Object::OBJECT_PROTOTYPE);
        });
        optimize_as_prototype(&mut agent, Object::OBJECT_PROTOTYPE);
        agent
    }

    /// The `%Object.prototype%` of this agent.
    pub fn object_prototype(&self) -> Object {
        Object::OBJECT_PROTOTYPE
    }

    /// Run `f` with transition recording disabled. Shapes created inside
    /// are left out of the transition tree.
    pub fn with_bootstrapping<R>(&mut self, f: impl FnOnce(&mut Agent) -> R) -> R {
        let previous = core::mem::replace(&mut self.heap.bootstrapping, true);
        let result = f(self);
        self.heap.bootstrapping = previous;
        result
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.heap.bootstrapping
    }

    pub(crate) fn policy_failure(&self, reason: PolicyReason, key: Option<PropertyKey>) -> JsError {
        let name = key.map_or_else(String::new, |key| key.to_display_string(self));
        JsError::Policy(PolicyFailure { key, name, reason })
    }

    /// Report a policy failure according to `should_throw`.
    pub(crate) fn fail(
        &self,
        should_throw: ShouldThrow,
        reason: PolicyReason,
        key: Option<PropertyKey>,
    ) -> JsResult<bool> {
        match should_throw {
            ShouldThrow::ThrowOnError => Err(self.policy_failure(reason, key)),
            ShouldThrow::DontThrow => Ok(false),
        }
    }

    /// Run the host access check on `receiver` if its shape requires one.
    /// A failed check is reported to the host and always throws.
    pub(crate) fn access_check(&self, receiver: Object, key: Option<PropertyKey>) -> JsResult<()> {
        if !receiver.shape(self).is_access_check_needed(self)
            || self.host_hooks.may_access(self, receiver, key)
        {
            return Ok(());
        }
        self.host_hooks.report_failed_access_check(self, receiver);
        Err(self.policy_failure(PolicyReason::AccessDenied, key))
    }

    /// Total number of shapes ever created in this agent.
    pub fn number_of_shapes(&self) -> usize {
        self.heap.object_shapes.len()
    }

    /// Bytes of heap records allocated since the agent was created.
    pub fn allocated_bytes(&self) -> usize {
        self.heap.allocated_bytes()
    }
}
