// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::num::NonZeroU32;

use ahash::AHashMap;

use crate::ecmascript::execution::Agent;

/// Seeds for the name hasher. Fixed so that descriptor and transition
/// ordering is reproducible between runs.
const NAME_HASH_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// ### Name
///
/// A unique property name: either an interned string or a symbol. Two
/// string names with equal contents are always the same `Name`, so names
/// compare by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Name(NonZeroU32);

#[derive(Debug)]
pub(crate) enum NameKind {
    String(Box<str>),
    Symbol {
        description: Option<Box<str>>,
        /// Private symbols are never exposed through key enumeration or
        /// integrity level checks.
        is_private: bool,
    },
}

#[derive(Debug)]
pub(crate) struct NameRecord {
    pub(crate) kind: NameKind,
    pub(crate) hash: u32,
    /// Canonical array index value of a string name, eg. "7" => 7.
    pub(crate) array_index: Option<u32>,
}

#[derive(Debug)]
pub(crate) struct NameTable {
    records: Vec<NameRecord>,
    interned: AHashMap<Box<str>, Name>,
    hasher: ahash::RandomState,
}

impl Default for NameTable {
    fn default() -> Self {
        let [k0, k1, k2, k3] = NAME_HASH_SEEDS;
        Self {
            records: Vec::with_capacity(256),
            interned: AHashMap::with_capacity(256),
            hasher: ahash::RandomState::with_seeds(k0, k1, k2, k3),
        }
    }
}

impl NameTable {
    fn push(&mut self, record: NameRecord) -> Name {
        self.records.push(record);
        let index = u32::try_from(self.records.len())
            .ok()
            .and_then(NonZeroU32::new)
            .expect("Name table overflowed");
        Name(index)
    }

    pub(crate) fn intern(&mut self, str: &str) -> Name {
        if let Some(name) = self.interned.get(str) {
            return *name;
        }
        let hash = self.hasher.hash_one(str) as u32;
        let name = self.push(NameRecord {
            kind: NameKind::String(str.into()),
            hash,
            array_index: parse_array_index(str),
        });
        self.interned.insert(str.into(), name);
        name
    }

    pub(crate) fn new_symbol(&mut self, description: Option<&str>, is_private: bool) -> Name {
        let seed = self.records.len() as u64 | (1 << 63);
        let hash = self.hasher.hash_one(seed) as u32;
        self.push(NameRecord {
            kind: NameKind::Symbol {
                description: description.map(Into::into),
                is_private,
            },
            hash,
            array_index: None,
        })
    }

    pub(crate) fn get(&self, name: Name) -> &NameRecord {
        &self.records[name.0.get() as usize - 1]
    }
}

/// Parse a canonical array index string: "0" or a decimal number without
/// leading zeroes below 2^32 - 1.
pub(crate) fn parse_array_index(str: &str) -> Option<u32> {
    let bytes = str.as_bytes();
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value: u64 = str.parse().ok()?;
    if value >= u32::MAX as u64 {
        return None;
    }
    Some(value as u32)
}

impl Name {
    /// Intern a string as a name.
    pub fn from_str(agent: &mut Agent, str: &str) -> Self {
        agent.heap.names.intern(str)
    }

    /// Create a new, unique symbol.
    pub fn new_symbol(agent: &mut Agent, description: Option<&str>) -> Self {
        agent.heap.names.new_symbol(description, false)
    }

    /// Create a new, unique private symbol. Private symbols are skipped by
    /// key enumeration, integrity levels and proxy traps.
    pub fn new_private_symbol(agent: &mut Agent, description: Option<&str>) -> Self {
        agent.heap.names.new_symbol(description, true)
    }

    pub(crate) const fn get_index(self) -> usize {
        self.0.get() as usize - 1
    }

    pub fn hash(self, agent: &Agent) -> u32 {
        agent.heap.names.get(self).hash
    }

    pub fn is_symbol(self, agent: &Agent) -> bool {
        matches!(agent.heap.names.get(self).kind, NameKind::Symbol { .. })
    }

    pub fn is_private(self, agent: &Agent) -> bool {
        matches!(
            agent.heap.names.get(self).kind,
            NameKind::Symbol {
                is_private: true,
                ..
            }
        )
    }

    /// Returns the string contents of a string name.
    pub fn as_str(self, agent: &Agent) -> Option<&str> {
        match &agent.heap.names.get(self).kind {
            NameKind::String(str) => Some(str),
            NameKind::Symbol { .. } => None,
        }
    }

    pub fn as_array_index(self, agent: &Agent) -> Option<u32> {
        agent.heap.names.get(self).array_index
    }

    /// Human readable form used in error messages.
    pub fn to_display_string(self, agent: &Agent) -> String {
        match &agent.heap.names.get(self).kind {
            NameKind::String(str) => str.to_string(),
            NameKind::Symbol {
                description: Some(description),
                ..
            } => format!("Symbol({description})"),
            NameKind::Symbol {
                description: None, ..
            } => "Symbol()".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interned_names_are_identical() {
        let mut table = NameTable::default();
        let a = table.intern("foo");
        let b = table.intern("foo");
        let c = table.intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.get(a).hash, table.get(b).hash);
    }

    #[test]
    fn symbols_are_unique() {
        let mut table = NameTable::default();
        let a = table.new_symbol(Some("foo"), false);
        let b = table.new_symbol(Some("foo"), false);
        assert_ne!(a, b);
        assert!(table.get(a).array_index.is_none());
    }

    #[test]
    fn array_index_parsing() {
        assert_eq!(parse_array_index("0"), Some(0));
        assert_eq!(parse_array_index("42"), Some(42));
        assert_eq!(parse_array_index("4294967294"), Some(4294967294));
        assert_eq!(parse_array_index("4294967295"), None);
        assert_eq!(parse_array_index("007"), None);
        assert_eq!(parse_array_index("-1"), None);
        assert_eq!(parse_array_index("1.5"), None);
        assert_eq!(parse_array_index(""), None);
    }
}
