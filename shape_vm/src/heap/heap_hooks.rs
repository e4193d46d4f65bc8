// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::fmt::Debug;

use crate::ecmascript::{
    builtins::ordinary::shape::ObjectShape,
    types::{Object, Value},
};

/// Interface to the concurrent marker.
///
/// The engine calls these hooks around every layout change of an instance.
/// All of them default to doing nothing.
pub trait HeapHooks: Debug {
    /// The layout of `object` is about to change. Called before any slot is
    /// rewritten.
    fn notify_object_layout_change(&self, object: Object, new_shape: ObjectShape) {
        let _ = (object, new_shape);
    }

    /// The instance shrank: `size_in_words` words starting at
    /// `offset_in_words` are now dead space.
    fn create_filler(&self, object: Object, offset_in_words: u32, size_in_words: u32) {
        let _ = (object, offset_in_words, size_in_words);
    }

    /// Slots in `[start_in_words, end_in_words)` of `object` no longer hold
    /// tagged values and must be dropped from remembered sets.
    fn clear_recorded_slots(&self, object: Object, start_in_words: u32, end_in_words: u32) {
        let _ = (object, start_in_words, end_in_words);
    }

    /// Write barrier.
    fn record_write(&self, host: Object, value: Value) {
        let _ = (host, value);
    }

    fn notify_shape_deprecated(&self, shape: ObjectShape) {
        let _ = shape;
    }
}

#[derive(Debug)]
pub struct NoopHeapHooks;

impl HeapHooks for NoopHeapHooks {}
