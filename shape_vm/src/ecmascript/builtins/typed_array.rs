// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [10.4.5 TypedArray Exotic Objects](https://tc39.es/ecma262/#sec-typedarray-exotic-objects)
//!
//! Fixed length views of numeric elements. Elements are writable,
//! enumerable and non-configurable data properties; indexes outside of the
//! view read as absent and ignore writes.

use crate::ecmascript::{
    execution::Agent,
    types::{InternalSlots, Object, PropertyAttributes, PropertyKey, Value},
};

/// Attributes of every in-bounds element.
pub const ELEMENT_ATTRIBUTES: PropertyAttributes = PropertyAttributes::DONT_DELETE;

fn elements(agent: &Agent, object: Object) -> &[f64] {
    match &object.record(agent).internal {
        InternalSlots::TypedArray(elements) => elements,
        _ => &[],
    }
}

/// Number of elements of the view.
pub fn typed_array_length(agent: &Agent, object: Object) -> u32 {
    elements(agent, object).len() as u32
}

/// ### [10.4.5.14 IsValidIntegerIndex ( O, index )](https://tc39.es/ecma262/#sec-isvalidintegerindex)
pub fn is_valid_integer_index(agent: &Agent, object: Object, index: u32) -> bool {
    index < typed_array_length(agent, object)
}

/// ### [10.4.5.15 TypedArrayGetElement ( O, index )](https://tc39.es/ecma262/#sec-typedarraygetelement)
pub fn typed_array_get_element(agent: &mut Agent, object: Object, index: u32) -> Option<Value> {
    let value = *elements(agent, object).get(index as usize)?;
    Some(Value::from_f64(agent, value))
}

/// ### [10.4.5.16 TypedArraySetElement ( O, index, value )](https://tc39.es/ecma262/#sec-typedarraysetelement)
///
/// Out-of-bounds writes are ignored.
pub fn typed_array_set_element(agent: &mut Agent, object: Object, index: u32, value: Value) {
    let number = to_number_lossy(agent, value);
    if let InternalSlots::TypedArray(elements) = &mut object.record_mut(agent).internal
        && let Some(element) = elements.get_mut(index as usize)
    {
        *element = number;
    }
}

/// Key of an integer-indexed access: array indexes and canonical numeric
/// strings that are not array indexes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NumericKey {
    Index(u32),
    /// Canonical numeric string that can never be a valid index.
    Invalid,
}

/// ### [7.1.21 CanonicalNumericIndexString ( argument )](https://tc39.es/ecma262/#sec-canonicalnumericindexstring)
pub(crate) fn canonical_numeric_key(agent: &Agent, key: PropertyKey) -> Option<NumericKey> {
    let name = match key {
        PropertyKey::Index(index) => return Some(NumericKey::Index(index)),
        PropertyKey::Name(name) => name,
    };
    let str = name.as_str(agent)?;
    // 1. If argument is "-0", return -0𝔽.
    if str == "-0" {
        return Some(NumericKey::Invalid);
    }
    // 2. Let n be ! ToNumber(argument).
    let n = match str {
        "Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        "NaN" => f64::NAN,
        _ => str.parse::<f64>().ok()?,
    };
    // 3. If ! ToString(n) is argument, return n.
    if n.is_nan() || n.is_infinite() || format!("{n}") == str {
        return Some(NumericKey::Invalid);
    }
    // 4. Return undefined.
    None
}

fn to_number_lossy(agent: &Agent, value: Value) -> f64 {
    match value {
        Value::Smi(_) | Value::Number(_) => value.to_number(agent).unwrap_or(f64::NAN),
        Value::Boolean(value) => value as u8 as f64,
        Value::Null => 0.0,
        Value::String(name) => name
            .as_str(agent)
            .and_then(|str| str.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN),
        Value::Undefined | Value::Symbol(_) | Value::Object(_) => f64::NAN,
    }
}

/// Keys of all elements, ascending.
pub(crate) fn element_keys(agent: &Agent, object: Object) -> impl Iterator<Item = PropertyKey> {
    (0..typed_array_length(agent, object)).map(PropertyKey::Index)
}
