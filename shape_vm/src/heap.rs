// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod heap_gc;
mod heap_hooks;
pub mod indexes;

pub use heap_gc::{HeapReference, sweep_shapes, verify_object_layout, visit_object_pointers};
pub use heap_hooks::{HeapHooks, NoopHeapHooks};

use crate::ecmascript::{
    builtins::{
        AccessorPairRecord, InterceptorRecord,
        ordinary::{
            DescriptorArrayRecord, PrototypeInfo,
            normalized_shape_cache::NormalizedShapeCache,
            shape::{ObjectShapeRecord, PrototypeShapeTable},
            transitions::ObjectShapeTransitionMap,
        },
    },
    types::{NameTable, ObjectRecord},
};

#[derive(Debug)]
pub struct Heap {
    pub(crate) names: NameTable,
    pub(crate) numbers: Vec<f64>,
    pub(crate) objects: Vec<ObjectRecord>,
    pub(crate) object_shapes: Vec<ObjectShapeRecord>,
    pub(crate) object_shape_transitions: Vec<ObjectShapeTransitionMap>,
    /// Descriptor arrays. The first entry is the shared empty array.
    pub(crate) descriptor_arrays: Vec<DescriptorArrayRecord>,
    pub(crate) accessor_pairs: Vec<AccessorPairRecord>,
    pub(crate) prototype_infos: Vec<PrototypeInfo>,
    /// Prototype chain validity cells: `true` while valid.
    pub(crate) validity_cells: Vec<bool>,
    pub(crate) interceptors: Vec<InterceptorRecord>,
    pub(crate) prototype_shapes: PrototypeShapeTable,
    pub(crate) normalized_shape_cache: NormalizedShapeCache,
    /// Transitions are not recorded while set.
    pub(crate) bootstrapping: bool,
    pub(crate) alloc_counter: usize,
}

pub trait CreateHeapData<T, F> {
    /// Creates a handle from the given data. Allocating the data is **not**
    /// guaranteed to be free of side effects: the handle is only valid in
    /// the heap that created it.
    fn create(&mut self, data: T) -> F;
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        let mut descriptor_arrays = Vec::with_capacity(1024);
        descriptor_arrays.push(DescriptorArrayRecord::default());
        Self {
            names: NameTable::default(),
            numbers: Vec::with_capacity(1024),
            objects: Vec::with_capacity(1024),
            object_shapes: Vec::with_capacity(1024),
            object_shape_transitions: Vec::with_capacity(1024),
            descriptor_arrays,
            accessor_pairs: Vec::with_capacity(64),
            prototype_infos: Vec::with_capacity(64),
            validity_cells: Vec::with_capacity(64),
            interceptors: Vec::new(),
            prototype_shapes: PrototypeShapeTable::with_capacity(64),
            normalized_shape_cache: NormalizedShapeCache::default(),
            bootstrapping: false,
            alloc_counter: 0,
        }
    }

    /// Bytes allocated since the heap was created.
    pub fn allocated_bytes(&self) -> usize {
        self.alloc_counter
    }
}
