// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use hashbrown::{HashTable, hash_table::Entry};

use crate::ecmascript::{
    builtins::ordinary::shape::{ElementsKind, ObjectShape},
    execution::Agent,
    types::{Name, Object, PropertyAttributes, PropertyKind},
};

/// Transition arrays up to this length are kept sorted and binary searched;
/// larger ones are promoted to a hash table.
pub(crate) const MAX_SORTED_TRANSITIONS: usize = 16;

/// Upper bound of cached prototype transitions per shape.
pub(crate) const MAX_CACHED_PROTOTYPE_TRANSITIONS: usize = 256;

/// Seeds for the transition table hasher.
const TRANSITION_HASH_SEEDS: [u64; 4] = [
    0x4528_21e6_38d0_1377,
    0xbe54_66cf_34e9_0c6c,
    0xc0ac_29b7_c97c_50dd,
    0x3f84_d5b5_b547_0917,
];

/// Transitions that do not add a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialTransition {
    ElementsKind(ElementsKind),
    NonExtensible,
    Sealed,
    Frozen,
    ImmutablePrototype,
}

impl SpecialTransition {
    fn sort_hash(self) -> u32 {
        match self {
            SpecialTransition::ElementsKind(kind) => kind as u32,
            SpecialTransition::NonExtensible => 0x100,
            SpecialTransition::Sealed => 0x101,
            SpecialTransition::Frozen => 0x102,
            SpecialTransition::ImmutablePrototype => 0x103,
        }
    }
}

/// Key of an edge in the transition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKey {
    Property {
        name: Name,
        hash: u32,
        kind: PropertyKind,
        attributes: PropertyAttributes,
    },
    Special(SpecialTransition),
}

impl TransitionKey {
    pub fn property(
        agent: &Agent,
        name: Name,
        kind: PropertyKind,
        attributes: PropertyAttributes,
    ) -> Self {
        TransitionKey::Property {
            name,
            hash: name.hash(agent),
            kind,
            attributes,
        }
    }

    pub fn name(self) -> Option<Name> {
        match self {
            TransitionKey::Property { name, .. } => Some(name),
            TransitionKey::Special(_) => None,
        }
    }

    /// Total order used by sorted transition arrays: name hash first, then
    /// name identity, property kind and attributes.
    fn sort_key(self) -> (u32, u32, u8, u8) {
        match self {
            TransitionKey::Property {
                name,
                hash,
                kind,
                attributes,
            } => (
                hash,
                name.get_index() as u32,
                kind as u8,
                attributes.bits(),
            ),
            TransitionKey::Special(special) => (special.sort_hash(), u32::MAX, u8::MAX, u8::MAX),
        }
    }
}

/// A transition edge. The target is held weakly: `None` marks a hole left
/// behind by a collected target.
type TransitionEntry = (TransitionKey, Option<ObjectShape>);

/// Transition storage tiers, from cheapest to most scalable.
#[derive(Debug, Default)]
pub(crate) enum TransitionStorage {
    #[default]
    Uninitialized,
    /// A single transition stored inline.
    Weak(TransitionKey, Option<ObjectShape>),
    /// Sorted array searched with binary search.
    Sorted(Vec<TransitionEntry>),
    /// Hash table for large fan-outs.
    Table(HashTable<TransitionEntry>),
}

/// Data structure for finding a forward transition from an Object Shape to
/// its child when a property is added or an attribute level changes.
#[derive(Debug, Default)]
pub struct ObjectShapeTransitionMap {
    /// Parent Shape back-pointer.
    ///
    /// Root shapes and shapes created without a transition have no parent.
    pub(crate) parent: Option<ObjectShape>,
    pub(crate) storage: TransitionStorage,
    /// Prototype transitions: new prototype to resulting shape.
    ///
    /// > NOTE: Shapes in this cache are weakly held.
    pub(crate) prototype_transitions: Vec<(Object, Option<ObjectShape>)>,
    /// Weakly held replacement of a deprecated shape.
    pub(crate) migration_target: Option<ObjectShape>,
}

fn table_hasher() -> ahash::RandomState {
    let [k0, k1, k2, k3] = TRANSITION_HASH_SEEDS;
    ahash::RandomState::with_seeds(k0, k1, k2, k3)
}

fn table_hash(key: &TransitionKey) -> u64 {
    table_hasher().hash_one(key.sort_key())
}

impl ObjectShapeTransitionMap {
    /// Root Object Shape transition map.
    pub(crate) const ROOT: Self = Self {
        parent: None,
        storage: TransitionStorage::Uninitialized,
        prototype_transitions: Vec::new(),
        migration_target: None,
    };

    /// Search for a live transition.
    pub(crate) fn search(&self, key: TransitionKey) -> Option<ObjectShape> {
        match &self.storage {
            TransitionStorage::Uninitialized => None,
            TransitionStorage::Weak(k, target) => (*k == key).then_some(*target).flatten(),
            TransitionStorage::Sorted(entries) => {
                let sort_key = key.sort_key();
                entries
                    .binary_search_by_key(&sort_key, |(k, _)| k.sort_key())
                    .ok()
                    .and_then(|i| entries[i].1)
            }
            TransitionStorage::Table(table) => table
                .find(table_hash(&key), |(k, _)| *k == key)
                .and_then(|(_, target)| *target),
        }
    }

    /// Number of live transitions.
    pub(crate) fn number_of_transitions(&self) -> usize {
        self.iter().count()
    }

    /// Whether another transition may be added without exceeding the
    /// fan-out bound.
    pub(crate) fn can_have_more_transitions(&self, max_number_of_transitions: usize) -> bool {
        self.number_of_transitions() < max_number_of_transitions
    }

    /// Iterate all live transitions.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (TransitionKey, ObjectShape)> + '_ {
        let entries: Box<dyn Iterator<Item = &TransitionEntry> + '_> = match &self.storage {
            TransitionStorage::Uninitialized => Box::new(core::iter::empty()),
            TransitionStorage::Weak(key, target) => {
                return TransitionIter::Single(target.map(|target| (*key, target)));
            }
            TransitionStorage::Sorted(entries) => Box::new(entries.iter()),
            TransitionStorage::Table(table) => Box::new(table.iter()),
        };
        TransitionIter::Many(entries)
    }

    /// Insert a transition, overwriting a previous edge with the same key.
    /// Returns the previous target, if any.
    pub(crate) fn insert(
        &mut self,
        key: TransitionKey,
        target: ObjectShape,
    ) -> Option<ObjectShape> {
        match &mut self.storage {
            TransitionStorage::Uninitialized => {
                self.storage = TransitionStorage::Weak(key, Some(target));
                None
            }
            TransitionStorage::Weak(existing_key, existing_target) => {
                if *existing_key == key || existing_target.is_none() {
                    let previous = existing_target.replace(target);
                    let previous = if *existing_key == key { previous } else { None };
                    *existing_key = key;
                    return previous;
                }
                let mut entries = vec![(*existing_key, *existing_target), (key, Some(target))];
                entries.sort_by_key(|(k, _)| k.sort_key());
                self.storage = TransitionStorage::Sorted(entries);
                None
            }
            TransitionStorage::Sorted(entries) => {
                let sort_key = key.sort_key();
                match entries.binary_search_by_key(&sort_key, |(k, _)| k.sort_key()) {
                    Ok(i) => entries[i].1.replace(target),
                    Err(_) => {
                        // Reuse the slots of collected targets before growing.
                        entries.retain(|(_, target)| target.is_some());
                        let i = entries.partition_point(|(k, _)| k.sort_key() < sort_key);
                        entries.insert(i, (key, Some(target)));
                        if entries.len() > MAX_SORTED_TRANSITIONS {
                            self.promote_to_table();
                        }
                        None
                    }
                }
            }
            TransitionStorage::Table(table) => {
                match table.entry(table_hash(&key), |(k, _)| *k == key, |(k, _)| table_hash(k)) {
                    Entry::Occupied(mut entry) => entry.get_mut().1.replace(target),
                    Entry::Vacant(entry) => {
                        entry.insert((key, Some(target)));
                        None
                    }
                }
            }
        }
    }

    fn promote_to_table(&mut self) {
        let TransitionStorage::Sorted(entries) = core::mem::take(&mut self.storage) else {
            return;
        };
        let mut table = HashTable::with_capacity(entries.len() * 2);
        for entry in entries {
            table.insert_unique(table_hash(&entry.0), entry, |(k, _)| table_hash(k));
        }
        self.storage = TransitionStorage::Table(table);
    }

    /// Clear edges whose target is no longer alive, leaving holes that the
    /// next insertion may reuse.
    pub(crate) fn clear_dead_targets(&mut self, is_live: &mut impl FnMut(ObjectShape) -> bool) {
        let mut clear = |target: &mut Option<ObjectShape>| {
            if let Some(shape) = *target
                && !is_live(shape)
            {
                *target = None;
            }
        };
        match &mut self.storage {
            TransitionStorage::Uninitialized => {}
            TransitionStorage::Weak(_, target) => clear(target),
            TransitionStorage::Sorted(entries) => {
                entries.iter_mut().for_each(|(_, target)| clear(target))
            }
            TransitionStorage::Table(table) => {
                // Hash tables have no use for holes.
                table.retain(|(_, target)| {
                    clear(target);
                    target.is_some()
                });
            }
        }
        self.prototype_transitions.retain_mut(|(_, target)| {
            clear(target);
            target.is_some()
        });
        clear(&mut self.migration_target);
        if let Some(parent) = self.parent
            && !is_live(parent)
        {
            self.parent = None;
        }
    }

    pub(crate) fn get_prototype_transition(&self, prototype: Object) -> Option<ObjectShape> {
        self.prototype_transitions
            .iter()
            .find(|(p, _)| *p == prototype)
            .and_then(|(_, target)| *target)
    }

    pub(crate) fn put_prototype_transition(&mut self, prototype: Object, target: ObjectShape) {
        if let Some(entry) = self
            .prototype_transitions
            .iter_mut()
            .find(|(p, _)| *p == prototype)
        {
            entry.1 = Some(target);
            return;
        }
        let transitions = &mut self.prototype_transitions;
        transitions.retain(|(_, target)| target.is_some());
        if transitions.len() >= MAX_CACHED_PROTOTYPE_TRANSITIONS {
            // Full cache: drop the oldest entry.
            transitions.remove(0);
        }
        transitions.push((prototype, Some(target)));
    }
}

enum TransitionIter<'a> {
    Single(Option<(TransitionKey, ObjectShape)>),
    Many(Box<dyn Iterator<Item = &'a TransitionEntry> + 'a>),
}

impl Iterator for TransitionIter<'_> {
    type Item = (TransitionKey, ObjectShape);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            TransitionIter::Single(entry) => entry.take(),
            TransitionIter::Many(entries) => loop {
                let (key, target) = entries.next()?;
                if let Some(target) = target {
                    return Some((*key, *target));
                }
            },
        }
    }
}
