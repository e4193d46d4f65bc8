// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::{
    builtins::ordinary::shape::{ElementsKind, NormalizationMode, ObjectShape},
    execution::Agent,
};

/// Number of entries in the cache.
pub(crate) const NORMALIZED_SHAPE_CACHE_ENTRIES: usize = 64;

const CACHE_HASH_SEEDS: [u64; 4] = [
    0x1371_9821_27c2_3c6b,
    0x9e37_79b9_7f4a_7c15,
    0xd1b5_4a32_d192_ed03,
    0x8cb9_2ba7_2f3d_8dd7,
];

/// Direct mapped cache of dictionary mode shapes.
///
/// Fast shapes that only differ in their descriptors normalize to the same
/// dictionary mode shape. Entries are held weakly and validated on every
/// hit, so a collision simply misses.
#[derive(Debug)]
pub(crate) struct NormalizedShapeCache {
    entries: [Option<ObjectShape>; NORMALIZED_SHAPE_CACHE_ENTRIES],
    hasher: ahash::RandomState,
}

impl Default for NormalizedShapeCache {
    fn default() -> Self {
        let [k0, k1, k2, k3] = CACHE_HASH_SEEDS;
        Self {
            entries: [None; NORMALIZED_SHAPE_CACHE_ENTRIES],
            hasher: ahash::RandomState::with_seeds(k0, k1, k2, k3),
        }
    }
}

impl NormalizedShapeCache {
    fn index_of(&self, agent: &Agent, fast_shape: ObjectShape) -> usize {
        let record = fast_shape.record(agent);
        let hash = self.hasher.hash_one((
            record.prototype,
            record.constructor,
            record.instance_type,
            record.elements_kind,
        ));
        hash as usize % NORMALIZED_SHAPE_CACHE_ENTRIES
    }

    /// Cached dictionary mode shape that may stand in for the normalized
    /// form of `fast_shape`.
    pub(crate) fn get(
        agent: &Agent,
        fast_shape: ObjectShape,
        elements_kind: ElementsKind,
        mode: NormalizationMode,
    ) -> Option<ObjectShape> {
        let cache = &agent.heap.normalized_shape_cache;
        let cached = cache.entries[cache.index_of(agent, fast_shape)]?;
        fast_shape
            .equivalent_to_for_normalization(agent, cached, elements_kind, mode)
            .then_some(cached)
    }

    pub(crate) fn set(agent: &mut Agent, fast_shape: ObjectShape, normalized_shape: ObjectShape) {
        debug_assert!(normalized_shape.is_dictionary_map(agent));
        let cache = &agent.heap.normalized_shape_cache;
        let index = cache.index_of(agent, fast_shape);
        agent.heap.normalized_shape_cache.entries[index] = Some(normalized_shape);
    }

    /// Drop entries whose shape was collected.
    pub(crate) fn clear_dead(&mut self, is_live: &mut impl FnMut(ObjectShape) -> bool) {
        for entry in &mut self.entries {
            if let Some(shape) = *entry
                && !is_live(shape)
            {
                *entry = None;
            }
        }
    }
}
