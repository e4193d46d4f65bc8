// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod language;
mod spec;

pub(crate) use language::name;
pub use language::{HeapNumber, Name, Object, ObjectIndex, ObjectRecord, PropertyKey, Value};
pub(crate) use language::{InternalSlots, NameTable, PropertyStorage, Slot};
pub use spec::{
    FieldType, PropertyAttributes, PropertyConstness, PropertyDescriptor, PropertyDetails,
    PropertyKind, PropertyLocation, Representation,
};
