// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::ecmascript::{
    builtins::{
        ProxyData,
        builtin_function::Behaviour,
        ordinary::{dictionary::NameDictionary, shape::ObjectShape},
    },
    types::{HeapNumber, Value},
};

/// A single property slot of an instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Slot {
    /// Space not covered by the current shape: never read, never aliased.
    Filler,
    /// A field that has not been written yet.
    Uninitialized,
    Tagged(Value),
    /// Unboxed double field, stored as raw bits.
    Double(u64),
    /// Boxed double field. The box is owned by the field and updated in
    /// place; reads copy the value out.
    MutableNumber(HeapNumber),
}

/// Out-of-object property storage of an instance.
#[derive(Debug, Default)]
pub(crate) enum PropertyStorage {
    #[default]
    Empty,
    /// Property array of a fast mode instance, including slack.
    Array(Vec<Slot>),
    /// Dictionary of a dictionary mode instance.
    Dictionary(Box<NameDictionary>),
}

impl PropertyStorage {
    pub(crate) fn array_len(&self) -> u32 {
        match self {
            PropertyStorage::Array(slots) => slots.len() as u32,
            _ => 0,
        }
    }

    pub(crate) fn as_dictionary(&self) -> Option<&NameDictionary> {
        match self {
            PropertyStorage::Dictionary(dictionary) => Some(dictionary),
            _ => None,
        }
    }

    pub(crate) fn as_dictionary_mut(&mut self) -> Option<&mut NameDictionary> {
        match self {
            PropertyStorage::Dictionary(dictionary) => Some(dictionary),
            _ => None,
        }
    }
}

/// Instance type specific internal slots.
#[derive(Debug)]
pub(crate) enum InternalSlots {
    Ordinary,
    Function(Behaviour),
    /// Fixed length numeric elements of a typed array.
    TypedArray(Vec<f64>),
    Proxy(ProxyData),
}

#[derive(Debug)]
pub struct ObjectRecord {
    /// Raw index of the current shape. Written with release semantics
    /// after every storage change; layout decisions must read it with
    /// acquire semantics.
    shape: AtomicU32,
    pub(crate) properties: PropertyStorage,
    /// In-object slots; the length is the allocated instance capacity.
    pub(crate) inobject: Box<[Slot]>,
    pub(crate) internal: InternalSlots,
}

impl ObjectRecord {
    pub(crate) fn new(
        shape: ObjectShape,
        inobject_capacity: u32,
        properties: PropertyStorage,
        internal: InternalSlots,
    ) -> Self {
        Self {
            shape: AtomicU32::new(shape.get_index() as u32),
            properties,
            inobject: vec![Slot::Filler; inobject_capacity as usize].into_boxed_slice(),
            internal,
        }
    }

    /// Read the current shape.
    pub(crate) fn shape(&self) -> ObjectShape {
        ObjectShape::from_index(self.shape.load(Ordering::Acquire) as usize)
    }

    /// Publish a new shape. All storage writes done before this call are
    /// visible to anyone who reads the new shape.
    pub(crate) fn publish_shape(&self, shape: ObjectShape) {
        self.shape
            .store(shape.get_index() as u32, Ordering::Release);
    }
}
