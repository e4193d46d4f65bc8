// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::{
    builtins::ordinary::shape::{HEADER_SIZE_IN_WORDS, ObjectShape},
    execution::Agent,
    types::Representation,
};

/// Location of a field in an instance: an in-object slot or an index into
/// the property array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldIndex {
    property_index: u32,
    inobject_properties: u32,
    is_double: bool,
}

impl FieldIndex {
    pub(crate) fn for_property_index(
        inobject_properties: u32,
        property_index: u32,
        representation: Representation,
    ) -> Self {
        Self {
            property_index,
            inobject_properties,
            is_double: representation.is_double(),
        }
    }

    /// Field index of a field descriptor of `shape`.
    pub fn for_descriptor(agent: &Agent, shape: ObjectShape, descriptor: u32) -> Self {
        let details = shape.descriptor_details(agent, descriptor);
        debug_assert!(details.is_data_field());
        Self::for_property_index(
            shape.inobject_properties(agent),
            details.field_index(),
            details.representation(),
        )
    }

    pub fn property_index(self) -> u32 {
        self.property_index
    }

    pub fn is_inobject(self) -> bool {
        self.property_index < self.inobject_properties
    }

    pub fn is_double(self) -> bool {
        self.is_double
    }

    /// Slot number within the in-object slots.
    pub fn inobject_index(self) -> u32 {
        debug_assert!(self.is_inobject());
        self.property_index
    }

    /// Index into the property array.
    pub fn outobject_array_index(self) -> u32 {
        debug_assert!(!self.is_inobject());
        self.property_index - self.inobject_properties
    }

    /// Offset of an in-object field from the start of the instance.
    pub fn offset_in_words(self) -> u32 {
        HEADER_SIZE_IN_WORDS + self.property_index
    }
}
