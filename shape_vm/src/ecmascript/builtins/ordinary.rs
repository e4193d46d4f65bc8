// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [10.1 Ordinary Object Internal Methods and Internal Slots](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots)
//!
//! Ordinary objects do not carry their own property table. Every object
//! points to an [`ObjectShape`](shape::ObjectShape) that describes the
//! names, attributes and storage locations of its properties; objects
//! built up the same way share one shape. Shapes form a transition tree
//! rooted at a per-constructor root shape, and the storage of an object is
//! either a fixed-layout field area (fast mode) or a name dictionary
//! (dictionary mode).

pub mod descriptor_array;
pub mod dictionary;
pub mod field_access;
pub mod field_index;
pub mod migration;
pub mod normalized_shape_cache;
pub mod property_storage;
pub mod prototype_info;
pub mod shape;
pub mod shape_copy;
pub mod shape_transitions;
pub mod shape_updater;
pub mod transitions;

pub use descriptor_array::DescriptorArrayRecord;
pub use field_access::{FieldAccess, FieldAccessResult, TransitionAccess};
pub use field_index::FieldIndex;
pub use prototype_info::{PrototypeInfo, ValidityCell};
pub use shape::{ElementsKind, InstanceType, NormalizationMode, ObjectShape, StoreOrigin};
pub use transitions::TransitionKey;
