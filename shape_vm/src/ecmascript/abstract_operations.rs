// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # [7 Abstract Operations](https://tc39.es/ecma262/#sec-abstract-operations)
//!
//! Property resolution and the object-level operations built on it.

pub(crate) mod lookup_iterator;
pub mod operations_on_objects;

pub use operations_on_objects::*;
