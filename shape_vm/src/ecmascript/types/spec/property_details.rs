// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use bitflags::bitflags;

use super::representation::{PropertyConstness, Representation};

bitflags! {
    /// Property attributes in their negated form: an empty set is a
    /// writable, enumerable, configurable property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyAttributes: u8 {
        const READ_ONLY = 1 << 0;
        const DONT_ENUM = 1 << 1;
        const DONT_DELETE = 1 << 2;

        const SEALED = Self::DONT_DELETE.bits();
        const FROZEN = Self::SEALED.bits() | Self::READ_ONLY.bits();
    }
}

impl PropertyAttributes {
    pub const NONE: Self = Self::empty();

    pub fn from_flags(writable: bool, enumerable: bool, configurable: bool) -> Self {
        let mut attributes = Self::NONE;
        attributes.set(Self::READ_ONLY, !writable);
        attributes.set(Self::DONT_ENUM, !enumerable);
        attributes.set(Self::DONT_DELETE, !configurable);
        attributes
    }

    pub fn is_read_only(self) -> bool {
        self.contains(Self::READ_ONLY)
    }

    pub fn is_enumerable(self) -> bool {
        !self.contains(Self::DONT_ENUM)
    }

    pub fn is_configurable(self) -> bool {
        !self.contains(Self::DONT_DELETE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Data,
    Accessor,
}

/// Where the value of a fast property lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyLocation {
    /// In an instance slot, see `field_index`.
    Field,
    /// In the descriptor itself: a constant value or an accessor pair.
    Descriptor,
}

/// ## Property details
///
/// Packed metadata of a single property. Fast properties use the
/// location, constness, representation and field index parts; dictionary
/// properties use the enumeration index instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyDetails {
    kind: PropertyKind,
    location: PropertyLocation,
    constness: PropertyConstness,
    attributes: PropertyAttributes,
    representation: Representation,
    field_index: u32,
    dictionary_index: u32,
}

impl PropertyDetails {
    pub(crate) fn data_field(
        attributes: PropertyAttributes,
        constness: PropertyConstness,
        representation: Representation,
        field_index: u32,
    ) -> Self {
        Self {
            kind: PropertyKind::Data,
            location: PropertyLocation::Field,
            constness,
            attributes,
            representation,
            field_index,
            dictionary_index: 0,
        }
    }

    pub(crate) fn data_constant(attributes: PropertyAttributes) -> Self {
        Self {
            kind: PropertyKind::Data,
            location: PropertyLocation::Descriptor,
            constness: PropertyConstness::Const,
            attributes,
            representation: Representation::Tagged,
            field_index: 0,
            dictionary_index: 0,
        }
    }

    pub(crate) fn accessor_constant(attributes: PropertyAttributes) -> Self {
        Self {
            kind: PropertyKind::Accessor,
            location: PropertyLocation::Descriptor,
            constness: PropertyConstness::Const,
            attributes,
            representation: Representation::Tagged,
            field_index: 0,
            dictionary_index: 0,
        }
    }

    /// Details of a dictionary mode property. An enumeration index of zero
    /// means the dictionary assigns the next free one.
    pub(crate) fn dictionary(
        kind: PropertyKind,
        attributes: PropertyAttributes,
        dictionary_index: u32,
    ) -> Self {
        Self {
            kind,
            location: PropertyLocation::Field,
            constness: PropertyConstness::Mutable,
            attributes,
            representation: Representation::Tagged,
            field_index: 0,
            dictionary_index,
        }
    }

    pub fn kind(self) -> PropertyKind {
        self.kind
    }

    pub fn location(self) -> PropertyLocation {
        self.location
    }

    pub fn constness(self) -> PropertyConstness {
        self.constness
    }

    pub fn attributes(self) -> PropertyAttributes {
        self.attributes
    }

    pub fn representation(self) -> Representation {
        self.representation
    }

    pub fn field_index(self) -> u32 {
        self.field_index
    }

    pub fn dictionary_index(self) -> u32 {
        self.dictionary_index
    }

    pub fn is_read_only(self) -> bool {
        self.attributes.is_read_only()
    }

    pub fn is_configurable(self) -> bool {
        self.attributes.is_configurable()
    }

    pub fn is_enumerable(self) -> bool {
        self.attributes.is_enumerable()
    }

    pub(crate) fn is_data_field(self) -> bool {
        self.kind == PropertyKind::Data && self.location == PropertyLocation::Field
    }

    pub(crate) fn with_attributes(self, attributes: PropertyAttributes) -> Self {
        Self { attributes, ..self }
    }

    pub(crate) fn with_representation(self, representation: Representation) -> Self {
        Self {
            representation,
            ..self
        }
    }

    pub(crate) fn with_constness(self, constness: PropertyConstness) -> Self {
        Self { constness, ..self }
    }

    pub(crate) fn with_dictionary_index(self, dictionary_index: u32) -> Self {
        Self {
            dictionary_index,
            ..self
        }
    }

    /// Field descriptors with a `Double` representation hold their value
    /// as raw bits instead of a tagged value.
    pub(crate) fn is_double_field(self) -> bool {
        self.is_data_field() && self.representation.is_double()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_flags_are_negated() {
        let attributes = PropertyAttributes::from_flags(true, true, true);
        assert_eq!(attributes, PropertyAttributes::NONE);
        let attributes = PropertyAttributes::from_flags(false, true, false);
        assert!(attributes.is_read_only());
        assert!(attributes.is_enumerable());
        assert!(!attributes.is_configurable());
        assert_eq!(attributes, PropertyAttributes::FROZEN);
    }

    #[test]
    fn details_builders() {
        let details = PropertyDetails::data_field(
            PropertyAttributes::NONE,
            PropertyConstness::Const,
            Representation::Smi,
            3,
        );
        assert!(details.is_data_field());
        assert_eq!(details.field_index(), 3);
        let details = details.with_representation(Representation::Double);
        assert!(details.is_double_field());
        let details = PropertyDetails::accessor_constant(PropertyAttributes::DONT_ENUM);
        assert_eq!(details.kind(), PropertyKind::Accessor);
        assert!(!details.is_enumerable());
    }
}
