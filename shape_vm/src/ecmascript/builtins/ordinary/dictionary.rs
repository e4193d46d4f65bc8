// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Name dictionary
//!
//! Property storage of dictionary mode objects. Entries live in a dense
//! vector in insertion order with a hash index over it. Deleted entries are
//! tombstoned and compacted away once they outnumber the live ones.
//!
//! Entry handles carry the generation of the dictionary they were taken
//! from. Every structural change (insertion, deletion, compaction) bumps the
//! generation, so a handle held across a mutation is detected as stale
//! instead of silently aliasing another entry.

use hashbrown::HashTable;

use crate::ecmascript::{
    builtins::AccessorPair,
    types::{Name, PropertyDetails, PropertyKind, Value},
};

/// First enumeration index handed out.
pub(crate) const INITIAL_ENUMERATION_INDEX: u32 = 1;

/// Largest enumeration index before the dictionary renumbers its entries.
pub(crate) const MAX_ENUMERATION_INDEX: u32 = (1 << 23) - 1;

/// Handle to a dictionary entry, valid until the next structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DictionaryEntry {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DictionaryValue {
    Data(Value),
    Accessors(AccessorPair),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DictionaryEntryData {
    pub(crate) name: Name,
    hash: u32,
    pub(crate) value: DictionaryValue,
    pub(crate) details: PropertyDetails,
}

#[derive(Debug, Clone)]
pub(crate) struct NameDictionary {
    index: HashTable<u32>,
    entries: Vec<Option<DictionaryEntryData>>,
    generation: u32,
    number_of_elements: u32,
    next_enumeration_index: u32,
}

impl NameDictionary {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashTable::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            generation: 0,
            number_of_elements: 0,
            next_enumeration_index: INITIAL_ENUMERATION_INDEX,
        }
    }

    pub(crate) fn number_of_elements(&self) -> u32 {
        self.number_of_elements
    }

    pub(crate) fn number_of_deleted_elements(&self) -> u32 {
        self.entries.len() as u32 - self.number_of_elements
    }

    #[cfg(test)]
    pub(crate) fn next_enumeration_index(&self) -> u32 {
        self.next_enumeration_index
    }

    pub(crate) fn set_next_enumeration_index(&mut self, index: u32) {
        debug_assert!(index >= INITIAL_ENUMERATION_INDEX);
        self.next_enumeration_index = index;
    }

    /// ### find(table, name)
    pub(crate) fn find(&self, name: Name, hash: u32) -> Option<DictionaryEntry> {
        let entries = &self.entries;
        self.index
            .find(hash as u64, |&i| {
                entries[i as usize].is_some_and(|entry| entry.name == name)
            })
            .map(|&index| DictionaryEntry {
                index,
                generation: self.generation,
            })
    }

    /// Checks that a handle still refers to the entry it was taken for.
    pub(crate) fn is_valid(&self, entry: DictionaryEntry) -> bool {
        entry.generation == self.generation
            && self
                .entries
                .get(entry.index as usize)
                .is_some_and(Option::is_some)
    }

    pub(crate) fn get(&self, entry: DictionaryEntry) -> Option<&DictionaryEntryData> {
        if entry.generation != self.generation {
            return None;
        }
        self.entries.get(entry.index as usize)?.as_ref()
    }

    fn get_mut(&mut self, entry: DictionaryEntry) -> Option<&mut DictionaryEntryData> {
        if entry.generation != self.generation {
            return None;
        }
        self.entries.get_mut(entry.index as usize)?.as_mut()
    }

    pub(crate) fn details_at(&self, entry: DictionaryEntry) -> Option<PropertyDetails> {
        self.get(entry).map(|data| data.details)
    }

    pub(crate) fn value_at(&self, entry: DictionaryEntry) -> Option<DictionaryValue> {
        self.get(entry).map(|data| data.value)
    }

    /// Overwrite the value of an entry. Not a structural change.
    pub(crate) fn set_value(&mut self, entry: DictionaryEntry, value: DictionaryValue) -> bool {
        let Some(data) = self.get_mut(entry) else {
            return false;
        };
        debug_assert_eq!(
            matches!(value, DictionaryValue::Accessors(_)),
            data.details.kind() == PropertyKind::Accessor
        );
        data.value = value;
        true
    }

    /// Replace the details of an entry, keeping its enumeration index
    /// unless the new details carry one.
    pub(crate) fn set_details(&mut self, entry: DictionaryEntry, details: PropertyDetails) -> bool {
        let Some(data) = self.get_mut(entry) else {
            return false;
        };
        let details = if details.dictionary_index() == 0 {
            details.with_dictionary_index(data.details.dictionary_index())
        } else {
            details
        };
        data.details = details;
        true
    }

    /// Overwrite value and details of an entry together, which may change
    /// the property kind. The enumeration index is kept.
    pub(crate) fn set_entry(
        &mut self,
        entry: DictionaryEntry,
        value: DictionaryValue,
        details: PropertyDetails,
    ) -> bool {
        let Some(data) = self.get_mut(entry) else {
            return false;
        };
        data.details = details.with_dictionary_index(data.details.dictionary_index());
        data.value = value;
        true
    }

    /// ### insert
    ///
    /// Add a new entry. Details with a zero enumeration index get the next
    /// free one. Invalidates all outstanding entry handles.
    pub(crate) fn add(
        &mut self,
        name: Name,
        hash: u32,
        value: DictionaryValue,
        details: PropertyDetails,
    ) -> DictionaryEntry {
        debug_assert!(self.find(name, hash).is_none(), "Duplicate dictionary key");
        if self.number_of_deleted_elements() > self.number_of_elements.max(8) {
            self.compact();
        }
        let details = if details.dictionary_index() == 0 {
            if self.next_enumeration_index > MAX_ENUMERATION_INDEX {
                self.generate_new_enumeration_indices();
            }
            let details = details.with_dictionary_index(self.next_enumeration_index);
            self.next_enumeration_index += 1;
            details
        } else {
            self.next_enumeration_index = self
                .next_enumeration_index
                .max(details.dictionary_index() + 1);
            details
        };
        let index = self.entries.len() as u32;
        self.entries.push(Some(DictionaryEntryData {
            name,
            hash,
            value,
            details,
        }));
        let entries = &self.entries;
        self.index.insert_unique(hash as u64, index, |&i| {
            entries[i as usize].map_or(0, |entry| entry.hash as u64)
        });
        self.number_of_elements += 1;
        self.generation = self.generation.wrapping_add(1);
        DictionaryEntry {
            index,
            generation: self.generation,
        }
    }

    /// ### delete
    ///
    /// Tombstone an entry. Invalidates all outstanding entry handles.
    pub(crate) fn delete(&mut self, entry: DictionaryEntry) -> bool {
        if !self.is_valid(entry) {
            return false;
        }
        let Some(data) = self.entries[entry.index as usize].take() else {
            return false;
        };
        if let Ok(found) = self
            .index
            .find_entry(data.hash as u64, |&i| i == entry.index)
        {
            found.remove();
        }
        self.number_of_elements -= 1;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    /// Drop tombstones and rebuild the hash index.
    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        self.index.clear();
        let entries = &self.entries;
        for (i, entry) in entries.iter().enumerate() {
            let Some(entry) = entry else { continue };
            self.index.insert_unique(entry.hash as u64, i as u32, |&i| {
                entries[i as usize].map_or(0, |entry| entry.hash as u64)
            });
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Renumber enumeration indices densely, keeping their order.
    pub(crate) fn generate_new_enumeration_indices(&mut self) {
        let order = self.iteration_indices();
        for (position, index) in order.into_iter().enumerate() {
            if let Some(entry) = &mut self.entries[index as usize] {
                entry.details = entry
                    .details
                    .with_dictionary_index(INITIAL_ENUMERATION_INDEX + position as u32);
            }
        }
        self.next_enumeration_index = INITIAL_ENUMERATION_INDEX + self.number_of_elements;
    }

    /// Entry slots of the live entries in enumeration order.
    fn iteration_indices(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.map(|_| i as u32))
            .collect();
        indices.sort_by_key(|&i| {
            self.entries[i as usize].map_or(0, |entry| entry.details.dictionary_index())
        });
        indices
    }

    /// Live entries in enumeration order.
    pub(crate) fn entries_in_enumeration_order(&self) -> Vec<DictionaryEntryData> {
        self.iteration_indices()
            .into_iter()
            .filter_map(|i| self.entries[i as usize])
            .collect()
    }

    /// Handles of the live entries in enumeration order.
    pub(crate) fn handles_in_enumeration_order(&self) -> Vec<DictionaryEntry> {
        self.iteration_indices()
            .into_iter()
            .map(|index| DictionaryEntry {
                index,
                generation: self.generation,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecmascript::types::PropertyAttributes;
    use crate::ecmascript::types::name::NameTable;

    fn details() -> PropertyDetails {
        PropertyDetails::dictionary(PropertyKind::Data, PropertyAttributes::NONE, 0)
    }

    #[test]
    fn add_find_delete() {
        let mut names = NameTable::default();
        let a = names.intern("a");
        let b = names.intern("b");
        let mut dictionary = NameDictionary::with_capacity(4);
        let ha = names.get(a).hash;
        let hb = names.get(b).hash;
        dictionary.add(a, ha, DictionaryValue::Data(Value::Smi(1)), details());
        dictionary.add(b, hb, DictionaryValue::Data(Value::Smi(2)), details());
        let entry = dictionary.find(a, ha).unwrap();
        assert_eq!(
            dictionary.value_at(entry),
            Some(DictionaryValue::Data(Value::Smi(1)))
        );
        assert_eq!(dictionary.details_at(entry).unwrap().dictionary_index(), 1);
        assert!(dictionary.delete(entry));
        assert!(dictionary.find(a, ha).is_none());
        assert_eq!(dictionary.number_of_elements(), 1);
        assert_eq!(dictionary.next_enumeration_index(), 3);
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut names = NameTable::default();
        let a = names.intern("a");
        let b = names.intern("b");
        let mut dictionary = NameDictionary::with_capacity(4);
        let ha = names.get(a).hash;
        let entry = dictionary.add(a, ha, DictionaryValue::Data(Value::Smi(1)), details());
        assert!(dictionary.is_valid(entry));
        let hb = names.get(b).hash;
        dictionary.add(b, hb, DictionaryValue::Data(Value::Null), details());
        assert!(!dictionary.is_valid(entry));
        assert!(dictionary.value_at(entry).is_none());
        assert!(!dictionary.set_value(entry, DictionaryValue::Data(Value::Smi(5))));
        let entry = dictionary.find(a, ha).unwrap();
        assert!(dictionary.set_value(entry, DictionaryValue::Data(Value::Smi(5))));
    }

    #[test]
    fn enumeration_order_skips_deleted_entries() {
        let mut names = NameTable::default();
        let mut dictionary = NameDictionary::with_capacity(4);
        let keys: Vec<Name> = (0..40).map(|i| names.intern(&format!("k{i}"))).collect();
        for key in &keys {
            let hash = names.get(*key).hash;
            dictionary.add(*key, hash, DictionaryValue::Data(Value::Null), details());
        }
        for key in keys.iter().step_by(2) {
            let entry = dictionary.find(*key, names.get(*key).hash).unwrap();
            dictionary.delete(entry);
        }
        let extra = names.intern("extra");
        let hash = names.get(extra).hash;
        dictionary.add(extra, hash, DictionaryValue::Data(Value::Null), details());
        let order: Vec<Name> = dictionary
            .entries_in_enumeration_order()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        let mut expected: Vec<Name> = keys.iter().skip(1).step_by(2).copied().collect();
        expected.push(extra);
        assert_eq!(order, expected);
        dictionary.generate_new_enumeration_indices();
        assert_eq!(dictionary.next_enumeration_index(), 22);
    }
}
