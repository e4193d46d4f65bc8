// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    ecmascript::{execution::Agent, types::Object},
    heap::{CreateHeapData, Heap, indexes::AccessorPairIndex},
};

/// Getter and setter functions of an accessor property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct AccessorPair(pub(crate) AccessorPairIndex);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessorPairRecord {
    pub(crate) getter: Option<Object>,
    pub(crate) setter: Option<Object>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorComponent {
    Getter,
    Setter,
}

impl AccessorPair {
    pub fn new(agent: &mut Agent, getter: Option<Object>, setter: Option<Object>) -> Self {
        agent.heap.create(AccessorPairRecord { getter, setter })
    }

    pub(crate) const fn get_index(self) -> usize {
        self.0.into_index()
    }

    fn record(self, agent: &Agent) -> &AccessorPairRecord {
        &agent.heap.accessor_pairs[self.get_index()]
    }

    pub fn getter(self, agent: &Agent) -> Option<Object> {
        self.record(agent).getter
    }

    pub fn setter(self, agent: &Agent) -> Option<Object> {
        self.record(agent).setter
    }

    pub fn get(self, agent: &Agent, component: AccessorComponent) -> Option<Object> {
        match component {
            AccessorComponent::Getter => self.getter(agent),
            AccessorComponent::Setter => self.setter(agent),
        }
    }

    /// Set one component in place. Only valid on pairs that are not shared
    /// through a descriptor array.
    pub(crate) fn set(
        self,
        agent: &mut Agent,
        component: AccessorComponent,
        value: Option<Object>,
    ) {
        let record = &mut agent.heap.accessor_pairs[self.get_index()];
        match component {
            AccessorComponent::Getter => record.getter = value,
            AccessorComponent::Setter => record.setter = value,
        }
    }

    /// Fresh pair holding the same functions.
    pub(crate) fn copy(self, agent: &mut Agent) -> Self {
        let record = *self.record(agent);
        agent.heap.create(record)
    }

    /// Both components are the given functions.
    pub fn equals(self, agent: &Agent, getter: Option<Object>, setter: Option<Object>) -> bool {
        let record = self.record(agent);
        record.getter == getter && record.setter == setter
    }
}

impl CreateHeapData<AccessorPairRecord, AccessorPair> for Heap {
    fn create(&mut self, data: AccessorPairRecord) -> AccessorPair {
        self.accessor_pairs.push(data);
        self.alloc_counter += core::mem::size_of::<AccessorPairRecord>();
        AccessorPair(AccessorPairIndex::last(&self.accessor_pairs))
    }
}
