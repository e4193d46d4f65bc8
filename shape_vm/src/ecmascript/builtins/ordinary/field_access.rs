// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Cached field access
//!
//! Load and store handlers for callers that remember where a property was
//! found. A handler records the shape it was created for and the field
//! location in that shape. Using it on an object with any other shape, or
//! after the shape was deprecated, reports [`FieldAccessResult::Stale`]
//! instead of resolving the property; the caller then goes through the full
//! property lookup and creates a fresh handler.

use crate::ecmascript::{
    builtins::ordinary::{
        field_index::FieldIndex,
        migration::migrate_to_shape,
        property_storage::{fast_property_at, fast_property_at_put},
        prototype_info::{ValidityCell, prototype_chain_validity_cell},
        shape::ObjectShape,
        transitions::TransitionKey,
    },
    execution::Agent,
    types::{
        Name, Object, PropertyAttributes, PropertyConstness, PropertyKind, PropertyLocation, Value,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldAccessResult<T> {
    Hit(T),
    /// The handler no longer describes the object.
    Stale,
}

impl<T> FieldAccessResult<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, FieldAccessResult::Hit(_))
    }

    pub fn hit(self) -> Option<T> {
        match self {
            FieldAccessResult::Hit(value) => Some(value),
            FieldAccessResult::Stale => None,
        }
    }
}

/// Handler for an own data field of objects with a given shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldAccess {
    shape: ObjectShape,
    descriptor: u32,
    index: FieldIndex,
}

impl FieldAccess {
    /// Handler for the own data field `name` of `object`. `None` if the
    /// property is not stored in a field of a fast mode object.
    pub fn for_own_field(agent: &Agent, object: Object, name: Name) -> Option<Self> {
        let shape = object.shape(agent);
        if shape.is_dictionary_map(agent) || shape.is_deprecated(agent) {
            return None;
        }
        let descriptor = shape.lookup_descriptor(agent, name)?;
        let details = shape.descriptor_details(agent, descriptor);
        if details.kind() != PropertyKind::Data || details.location() != PropertyLocation::Field {
            return None;
        }
        Some(Self {
            shape,
            descriptor,
            index: FieldIndex::for_descriptor(agent, shape, descriptor),
        })
    }

    pub fn shape(&self) -> ObjectShape {
        self.shape
    }

    pub fn field_index(&self) -> FieldIndex {
        self.index
    }

    /// Whether the handler still describes `object`.
    pub fn is_valid_for(&self, agent: &Agent, object: Object) -> bool {
        object.shape(agent) == self.shape && !self.shape.is_deprecated(agent)
    }

    pub fn load(&self, agent: &mut Agent, object: Object) -> FieldAccessResult<Value> {
        if !self.is_valid_for(agent, object) {
            return FieldAccessResult::Stale;
        }
        FieldAccessResult::Hit(fast_property_at(agent, object, self.index))
    }

    /// Store `value` into the field. Stores that would have to generalize
    /// the field, or that hit a read-only or constant field, are stale.
    pub fn store(&self, agent: &mut Agent, object: Object, value: Value) -> FieldAccessResult<()> {
        if !self.is_valid_for(agent, object) {
            return FieldAccessResult::Stale;
        }
        // Field descriptors are generalized in place; read their current
        // state.
        let descriptors = self.shape.descriptors(agent);
        let details = descriptors.details(self.descriptor);
        let field_type = descriptors.get(self.descriptor).field_type();
        if details.is_read_only()
            || details.constness() == PropertyConstness::Const
            || !value.fits_representation(details.representation())
            || !value.fits_field_type(agent, field_type)
        {
            return FieldAccessResult::Stale;
        }
        fast_property_at_put(agent, object, self.index, value);
        FieldAccessResult::Hit(())
    }
}

/// Handler for a store that adds a new writable, enumerable and
/// configurable data field by following an existing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionAccess {
    from: ObjectShape,
    to: ObjectShape,
    index: FieldIndex,
    /// Guards against setters or read-only properties appearing on the
    /// prototype chain.
    validity_cell: Option<ValidityCell>,
}

impl TransitionAccess {
    /// Handler for adding `name` to objects with shape `from`. `None` if the
    /// transition does not exist yet or does not lead to a field.
    pub fn for_add(agent: &mut Agent, from: ObjectShape, name: Name) -> Option<Self> {
        if from.is_dictionary_map(agent) || from.is_deprecated(agent) || !from.is_extensible(agent)
        {
            return None;
        }
        let attributes = PropertyAttributes::NONE;
        let key = TransitionKey::property(agent, name, PropertyKind::Data, attributes);
        let to = from.search_transition(agent, key)?;
        if to.is_deprecated(agent) || to.is_dictionary_map(agent) {
            return None;
        }
        let descriptor = to.last_added(agent)?;
        let details = to.descriptor_details(agent, descriptor);
        if details.location() != PropertyLocation::Field {
            return None;
        }
        let index = FieldIndex::for_descriptor(agent, to, descriptor);
        let validity_cell = prototype_chain_validity_cell(agent, from);
        Some(Self {
            from,
            to,
            index,
            validity_cell,
        })
    }

    pub fn target(&self) -> ObjectShape {
        self.to
    }

    /// Add the field holding `value` to `object`.
    pub fn store(&self, agent: &mut Agent, object: Object, value: Value) -> FieldAccessResult<()> {
        if object.shape(agent) != self.from
            || self.from.is_deprecated(agent)
            || self.to.is_deprecated(agent)
        {
            return FieldAccessResult::Stale;
        }
        if self
            .validity_cell
            .is_some_and(|cell| !cell.is_valid(agent))
        {
            return FieldAccessResult::Stale;
        }
        let Some(descriptor) = self.to.last_added(agent) else {
            return FieldAccessResult::Stale;
        };
        let descriptors = self.to.descriptors(agent);
        let details = descriptors.details(descriptor);
        let field_type = descriptors.get(descriptor).field_type();
        if details.constness() == PropertyConstness::Const
            || !value.fits_representation(details.representation())
            || !value.fits_field_type(agent, field_type)
        {
            return FieldAccessResult::Stale;
        }
        migrate_to_shape(agent, object, self.to);
        fast_property_at_put(agent, object, self.index, value);
        FieldAccessResult::Hit(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ecmascript::{
            abstract_operations::set,
            execution::{DefaultHostHooks, Options, ShouldThrow},
            types::PropertyKey,
        },
        heap::NoopHeapHooks,
    };

    fn agent() -> Agent {
        let options = Options {
            track_constant_fields: false,
            ..Default::default()
        };
        Agent::new(options, &DefaultHostHooks, &NoopHeapHooks)
    }

    #[test]
    fn load_and_store_through_handler() {
        let mut agent = agent();
        let object = Object::new(&mut agent);
        let name = Name::from_str(&mut agent, "x");
        set(
            &mut agent,
            object,
            PropertyKey::Name(name),
            Value::Smi(1),
            ShouldThrow::ThrowOnError,
        )
        .unwrap();
        let access = FieldAccess::for_own_field(&agent, object, name).unwrap();
        assert_eq!(access.load(&mut agent, object).hit(), Some(Value::Smi(1)));
        assert!(access.store(&mut agent, object, Value::Smi(5)).is_hit());
        assert_eq!(access.load(&mut agent, object).hit(), Some(Value::Smi(5)));
        // A double does not fit the small integer field.
        let double = Value::from_f64(&mut agent, 0.5);
        assert_eq!(
            access.store(&mut agent, object, double),
            FieldAccessResult::Stale
        );

        let other = Object::new(&mut agent);
        assert_eq!(access.load(&mut agent, other), FieldAccessResult::Stale);
    }

    #[test]
    fn transitioning_store() {
        let mut agent = agent();
        let first = Object::new(&mut agent);
        let second = Object::new(&mut agent);
        let root = second.shape(&agent);
        let name = Name::from_str(&mut agent, "y");
        set(
            &mut agent,
            first,
            PropertyKey::Name(name),
            Value::Smi(1),
            ShouldThrow::ThrowOnError,
        )
        .unwrap();
        let access = TransitionAccess::for_add(&mut agent, root, name).unwrap();
        assert!(access.store(&mut agent, second, Value::Smi(2)).is_hit());
        assert_eq!(second.shape(&agent), first.shape(&agent));
        let load = FieldAccess::for_own_field(&agent, second, name).unwrap();
        assert_eq!(load.load(&mut agent, second).hit(), Some(Value::Smi(2)));
        // The object already moved on.
        assert_eq!(
            access.store(&mut agent, second, Value::Smi(3)),
            FieldAccessResult::Stale
        );
    }
}
