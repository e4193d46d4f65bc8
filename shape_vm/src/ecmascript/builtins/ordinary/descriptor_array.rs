// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    ecmascript::{
        builtins::AccessorPair,
        execution::Agent,
        types::{
            FieldType, Name, PropertyAttributes, PropertyConstness, PropertyDetails, PropertyKind,
            PropertyLocation, Representation, Value,
        },
    },
    heap::{CreateHeapData, Heap, indexes::DescriptorArrayIndex},
};

/// Arrays at or below this length are searched linearly.
const MAX_LINEAR_SEARCH_LENGTH: u32 = 8;

/// Value part of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DescriptorValue {
    /// Field descriptors record the field type of their values.
    FieldType(FieldType),
    /// Constant data property stored in the descriptor.
    Constant(Value),
    /// Constant accessor property stored in the descriptor.
    Accessors(AccessorPair),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Descriptor {
    pub(crate) key: Name,
    pub(crate) key_hash: u32,
    pub(crate) details: PropertyDetails,
    pub(crate) value: DescriptorValue,
}

impl Descriptor {
    pub(crate) fn data_field(
        agent: &Agent,
        key: Name,
        field_index: u32,
        attributes: PropertyAttributes,
        constness: PropertyConstness,
        representation: Representation,
        field_type: FieldType,
    ) -> Self {
        Self {
            key,
            key_hash: key.hash(agent),
            details: PropertyDetails::data_field(
                attributes,
                constness,
                representation,
                field_index,
            ),
            value: DescriptorValue::FieldType(field_type),
        }
    }

    pub(crate) fn data_constant(
        agent: &Agent,
        key: Name,
        value: Value,
        attributes: PropertyAttributes,
    ) -> Self {
        Self {
            key,
            key_hash: key.hash(agent),
            details: PropertyDetails::data_constant(attributes),
            value: DescriptorValue::Constant(value),
        }
    }

    pub(crate) fn accessor_constant(
        agent: &Agent,
        key: Name,
        pair: AccessorPair,
        attributes: PropertyAttributes,
    ) -> Self {
        Self {
            key,
            key_hash: key.hash(agent),
            details: PropertyDetails::accessor_constant(attributes),
            value: DescriptorValue::Accessors(pair),
        }
    }

    pub(crate) fn field_type(&self) -> FieldType {
        match self.value {
            DescriptorValue::FieldType(field_type) => field_type,
            _ => FieldType::Any,
        }
    }

    pub(crate) fn constant(&self) -> Option<Value> {
        match self.value {
            DescriptorValue::Constant(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn accessors(&self) -> Option<AccessorPair> {
        match self.value {
            DescriptorValue::Accessors(pair) => Some(pair),
            _ => None,
        }
    }
}

/// ## Descriptor array
///
/// The ordered property descriptors of one or more shapes. Shapes along a
/// transition path share a single array, each seeing the prefix given by
/// its number of own descriptors. Entries are kept in insertion order; a
/// secondary index sorted by key hash makes binary search possible.
#[derive(Debug, Default, Clone)]
pub struct DescriptorArrayRecord {
    descriptors: Vec<Descriptor>,
    /// Descriptor numbers ordered by key hash, ties by descriptor number.
    sorted: Vec<u32>,
}

impl DescriptorArrayRecord {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            descriptors: Vec::with_capacity(capacity),
            sorted: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn from_descriptors(descriptors: Vec<Descriptor>) -> Self {
        let mut array = Self {
            sorted: Vec::with_capacity(descriptors.len()),
            descriptors,
        };
        array.sort();
        array
    }

    pub(crate) fn len(&self) -> u32 {
        self.descriptors.len() as u32
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub(crate) fn get(&self, descriptor: u32) -> &Descriptor {
        &self.descriptors[descriptor as usize]
    }

    pub(crate) fn key(&self, descriptor: u32) -> Name {
        self.descriptors[descriptor as usize].key
    }

    pub(crate) fn details(&self, descriptor: u32) -> PropertyDetails {
        self.descriptors[descriptor as usize].details
    }

    pub(crate) fn iter(&self, number_of_descriptors: u32) -> impl Iterator<Item = &Descriptor> {
        self.descriptors[..number_of_descriptors as usize].iter()
    }

    pub(crate) fn set_value(&mut self, descriptor: u32, value: DescriptorValue) {
        self.descriptors[descriptor as usize].value = value;
    }

    /// Replace a descriptor in place, keeping its key.
    pub(crate) fn replace(&mut self, descriptor: u32, replacement: Descriptor) {
        let current = &mut self.descriptors[descriptor as usize];
        debug_assert_eq!(current.key, replacement.key);
        *current = replacement;
    }

    /// Append a descriptor, keeping the hash index ordered.
    pub(crate) fn append(&mut self, descriptor: Descriptor) {
        let number = self.len();
        let hash = descriptor.key_hash;
        self.descriptors.push(descriptor);
        let position = self
            .sorted
            .partition_point(|&i| self.descriptors[i as usize].key_hash <= hash);
        self.sorted.insert(position, number);
    }

    /// Rebuild the hash index after bulk construction.
    pub(crate) fn sort(&mut self) {
        let descriptors = &self.descriptors;
        self.sorted.clear();
        self.sorted.extend(0..descriptors.len() as u32);
        self.sorted
            .sort_by_key(|&i| (descriptors[i as usize].key_hash, i));
    }

    /// Find the descriptor number of `key` among the first
    /// `valid_descriptors` entries.
    pub(crate) fn search(&self, key: Name, key_hash: u32, valid_descriptors: u32) -> Option<u32> {
        if valid_descriptors == 0 {
            return None;
        }
        if valid_descriptors <= MAX_LINEAR_SEARCH_LENGTH {
            return self.descriptors[..valid_descriptors as usize]
                .iter()
                .position(|d| d.key == key)
                .map(|i| i as u32);
        }
        let start = self
            .sorted
            .partition_point(|&i| self.descriptors[i as usize].key_hash < key_hash);
        self.sorted[start..]
            .iter()
            .take_while(|&&i| self.descriptors[i as usize].key_hash == key_hash)
            .find(|&&i| i < valid_descriptors && self.descriptors[i as usize].key == key)
            .copied()
    }

    /// Copy of the first `count` descriptors with room for `slack` more.
    pub(crate) fn copy_up_to(&self, count: u32, slack: u32) -> Self {
        let mut descriptors = Vec::with_capacity((count + slack) as usize);
        descriptors.extend_from_slice(&self.descriptors[..count as usize]);
        Self::from_descriptors(descriptors)
    }

    /// Copy of the first `count` descriptors with `attributes` added to every
    /// property. Accessors never become read-only; private symbols keep their
    /// attributes.
    pub(crate) fn copy_up_to_add_attributes(
        &self,
        agent: &Agent,
        count: u32,
        attributes: PropertyAttributes,
    ) -> Self {
        let descriptors = self.descriptors[..count as usize]
            .iter()
            .map(|descriptor| {
                if descriptor.key.is_private(agent) {
                    return *descriptor;
                }
                let mut added = attributes;
                if descriptor.details.kind() == PropertyKind::Accessor {
                    added.remove(PropertyAttributes::READ_ONLY);
                }
                let details = descriptor
                    .details
                    .with_attributes(descriptor.details.attributes() | added);
                Descriptor {
                    details,
                    ..*descriptor
                }
            })
            .collect();
        Self::from_descriptors(descriptors)
    }

    /// Generalize every field to the most general representation, type and
    /// constness.
    pub(crate) fn generalize_all_fields(&mut self) {
        for descriptor in &mut self.descriptors {
            if descriptor.details.location() != PropertyLocation::Field {
                continue;
            }
            descriptor.details = descriptor
                .details
                .with_representation(Representation::Tagged)
                .with_constness(PropertyConstness::Mutable);
            descriptor.value = DescriptorValue::FieldType(FieldType::Any);
        }
    }

    /// Number of field backed descriptors among the first `count`.
    pub(crate) fn number_of_fields(&self, count: u32) -> u32 {
        self.descriptors[..count as usize]
            .iter()
            .filter(|d| d.details.location() == PropertyLocation::Field)
            .count() as u32
    }

    /// Two arrays describe the same properties up to `count`.
    pub(crate) fn is_equal_up_to(&self, other: &Self, count: u32) -> bool {
        if self.len() < count || other.len() < count {
            return false;
        }
        self.descriptors[..count as usize] == other.descriptors[..count as usize]
    }
}

impl CreateHeapData<DescriptorArrayRecord, DescriptorArrayIndex> for Heap {
    fn create(&mut self, data: DescriptorArrayRecord) -> DescriptorArrayIndex {
        self.descriptor_arrays.push(data);
        DescriptorArrayIndex::last(&self.descriptor_arrays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecmascript::execution::{Agent, DefaultHostHooks, Options};
    use crate::heap::NoopHeapHooks;

    fn field(agent: &Agent, key: Name, index: u32) -> Descriptor {
        Descriptor::data_field(
            agent,
            key,
            index,
            PropertyAttributes::NONE,
            PropertyConstness::Const,
            Representation::Smi,
            FieldType::Any,
        )
    }

    #[test]
    fn search_small_and_large_arrays() {
        let mut agent = Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks);
        let names: Vec<Name> = (0..20)
            .map(|i| Name::from_str(&mut agent, &format!("p{i}")))
            .collect();
        let mut array = DescriptorArrayRecord::default();
        for (i, name) in names.iter().enumerate() {
            array.append(field(&agent, *name, i as u32));
        }
        for (i, name) in names.iter().enumerate() {
            let hash = name.hash(&agent);
            assert_eq!(array.search(*name, hash, 20), Some(i as u32));
            assert_eq!(array.search(*name, hash, 5), (i < 5).then_some(i as u32));
            // Entries beyond the valid prefix are invisible.
            assert_eq!(array.search(*name, hash, i as u32), None);
        }
        let missing = Name::from_str(&mut agent, "missing");
        assert_eq!(array.search(missing, missing.hash(&agent), 20), None);
    }

    #[test]
    fn copy_add_attributes_skips_accessor_read_only() {
        let mut agent = Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks);
        let a = Name::from_str(&mut agent, "a");
        let b = Name::from_str(&mut agent, "b");
        let pair = AccessorPair::new(&mut agent, None, None);
        let mut array = DescriptorArrayRecord::default();
        array.append(field(&agent, a, 0));
        array.append(Descriptor::accessor_constant(
            &agent,
            b,
            pair,
            PropertyAttributes::NONE,
        ));
        let frozen = array.copy_up_to_add_attributes(&agent, 2, PropertyAttributes::FROZEN);
        assert_eq!(frozen.details(0).attributes(), PropertyAttributes::FROZEN);
        assert_eq!(frozen.details(1).attributes(), PropertyAttributes::SEALED);
        assert_eq!(frozen.number_of_fields(2), 1);
    }
}
