// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [10 Ordinary and Exotic Objects Behaviours](https://tc39.es/ecma262/#sec-ordinary-and-exotic-objects-behaviours)

mod accessor_pair;
pub mod builtin_function;
mod interceptor;
pub mod ordinary;
pub mod proxy;
pub mod typed_array;

pub use accessor_pair::{AccessorComponent, AccessorPair, AccessorPairRecord};
pub(crate) use interceptor::get_interceptor;
pub use interceptor::{InterceptorRecord, NamedInterceptor};
pub use proxy::{ProxyData, ProxyHandler};
