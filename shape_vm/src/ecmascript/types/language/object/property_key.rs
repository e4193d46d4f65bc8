// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::{
    execution::Agent,
    types::{Name, name::parse_array_index},
};

/// # [Property key](https://tc39.es/ecma262/#property-key)
///
/// The properties of an object are uniquely identified using property keys.
/// A property key is either a name or an array index. An _array index_ is a
/// property name `n` such that `CanonicalNumericIndexString(n)` returns an
/// integral Number in the inclusive interval from `+0𝔽` to `𝔽(2**32 - 2)`;
/// such keys are always represented by the `Index` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Name(Name),
    Index(u32),
}

impl From<u32> for PropertyKey {
    fn from(value: u32) -> Self {
        PropertyKey::Index(value)
    }
}

impl PropertyKey {
    pub fn from_str(agent: &mut Agent, str: &str) -> Self {
        parse_array_index(str)
            .map(PropertyKey::Index)
            .unwrap_or_else(|| PropertyKey::Name(Name::from_str(agent, str)))
    }

    /// Canonicalize a name into a key.
    pub fn from_name(agent: &Agent, name: Name) -> Self {
        match name.as_array_index(agent) {
            Some(index) => PropertyKey::Index(index),
            None => PropertyKey::Name(name),
        }
    }

    /// The name form of the key. Array indexes are interned as their
    /// decimal string.
    pub fn to_name(self, agent: &mut Agent) -> Name {
        match self {
            PropertyKey::Name(name) => name,
            PropertyKey::Index(index) => Name::from_str(agent, &index.to_string()),
        }
    }

    pub fn as_name(self) -> Option<Name> {
        match self {
            PropertyKey::Name(name) => Some(name),
            PropertyKey::Index(_) => None,
        }
    }

    pub fn as_index(self) -> Option<u32> {
        match self {
            PropertyKey::Index(index) => Some(index),
            PropertyKey::Name(_) => None,
        }
    }

    pub fn is_symbol(self, agent: &Agent) -> bool {
        matches!(self, PropertyKey::Name(name) if name.is_symbol(agent))
    }

    pub fn is_private(self, agent: &Agent) -> bool {
        matches!(self, PropertyKey::Name(name) if name.is_private(agent))
    }

    pub fn to_display_string(self, agent: &Agent) -> String {
        match self {
            PropertyKey::Name(name) => name.to_display_string(agent),
            PropertyKey::Index(index) => index.to_string(),
        }
    }
}
