// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hidden class engine for dynamically typed objects.
//!
//! Objects created through an [`Agent`] carry a shape describing the layout
//! of their named properties. Adding properties in the same order from the
//! same root yields the same shape, which lets callers cache the location of
//! a property per shape (see
//! [`FieldAccess`](ecmascript::builtins::ordinary::FieldAccess)). Stores that
//! do not fit the recorded field representation generalize the shape tree in
//! place or deprecate the affected shapes; instances of deprecated shapes are
//! migrated lazily on their next access.
//!
//! ```
//! use shape_vm::{
//!     Agent, DefaultHostHooks, NoopHeapHooks, Object, Options, PropertyKey, ShouldThrow,
//!     Value, ecmascript::abstract_operations::{get, set},
//! };
//!
//! let mut agent = Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks);
//! let a = Object::new(&mut agent);
//! let b = Object::new(&mut agent);
//! let x = PropertyKey::from_str(&mut agent, "x");
//! set(&mut agent, a, x, Value::Smi(1), ShouldThrow::ThrowOnError).unwrap();
//! set(&mut agent, b, x, Value::Smi(2), ShouldThrow::ThrowOnError).unwrap();
//! assert_eq!(a.shape(&agent), b.shape(&agent));
//! assert_eq!(get(&mut agent, b, x).unwrap(), Value::Smi(2));
//! ```

pub mod ecmascript;
pub mod heap;

pub use ecmascript::{
    execution::{
        Agent, DefaultHostHooks, HostHooks, JsError, JsResult, LanguageMode, Options,
        PolicyReason, ShouldThrow,
    },
    types::{Name, Object, PropertyAttributes, PropertyDescriptor, PropertyKey, Value},
};
pub use heap::{HeapHooks, NoopHeapHooks};
