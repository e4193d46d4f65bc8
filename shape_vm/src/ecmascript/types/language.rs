// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub(crate) mod name;
mod object;
mod value;

pub use name::Name;
pub(crate) use name::NameTable;
pub(crate) use object::{InternalSlots, PropertyStorage, Slot};
pub use object::{Object, ObjectIndex, ObjectRecord, PropertyKey};
pub use value::{HeapNumber, Value};
