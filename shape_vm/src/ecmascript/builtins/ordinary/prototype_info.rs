// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Prototype info
//!
//! Bookkeeping attached to the shapes of objects that are used as
//! prototypes: the validity cell guarding lookups through the prototype
//! chain, the prototype shapes that depend on it, and the root shape of
//! objects created with the prototype.
//!
//! Prototype shapes are never shared between objects. When a prototype
//! object moves to a new shape its info moves along with it.

use ahash::AHashSet;

use crate::{
    ecmascript::{
        builtins::ordinary::{
            migration::{migrate_slow_to_fast, migrate_to_shape, normalize_properties},
            shape::{InstanceType, NormalizationMode, ObjectShape, ShapeFlags},
            shape_copy::copy,
        },
        execution::Agent,
        types::Object,
    },
    heap::{CreateHeapData, Heap, indexes::PrototypeInfoIndex},
};

/// Guard over the layout of a prototype chain.
///
/// A cell is valid when created and is invalidated, never revalidated,
/// when the layout of any object on the chain changes. Asking for the cell
/// of the same chain again afterwards hands out a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidityCell(u32);

impl ValidityCell {
    fn new(agent: &mut Agent) -> Self {
        agent.heap.validity_cells.push(true);
        Self(agent.heap.validity_cells.len() as u32 - 1)
    }

    pub fn is_valid(self, agent: &Agent) -> bool {
        agent.heap.validity_cells[self.0 as usize]
    }

    fn invalidate(self, agent: &mut Agent) {
        agent.heap.validity_cells[self.0 as usize] = false;
    }
}

#[derive(Debug, Default, Clone)]
pub struct PrototypeInfo {
    pub(crate) validity_cell: Option<ValidityCell>,
    /// Shapes of prototypes whose own prototype is the object this info
    /// belongs to. Held weakly.
    pub(crate) users: Vec<ObjectShape>,
    /// The owning shape is listed among the users of its prototype.
    pub(crate) registered: bool,
    pub(crate) should_be_fast: bool,
    /// Root shape of objects created with this prototype. Held weakly.
    pub(crate) object_create_map: Option<ObjectShape>,
}

impl CreateHeapData<PrototypeInfo, PrototypeInfoIndex> for Heap {
    fn create(&mut self, data: PrototypeInfo) -> PrototypeInfoIndex {
        self.prototype_infos.push(data);
        self.alloc_counter += core::mem::size_of::<PrototypeInfo>();
        PrototypeInfoIndex::last(&self.prototype_infos)
    }
}

fn info(agent: &Agent, index: PrototypeInfoIndex) -> &PrototypeInfo {
    &agent.heap.prototype_infos[index.into_index()]
}

fn info_mut(agent: &mut Agent, index: PrototypeInfoIndex) -> &mut PrototypeInfo {
    &mut agent.heap.prototype_infos[index.into_index()]
}

pub(crate) fn get_or_create_prototype_info(
    agent: &mut Agent,
    shape: ObjectShape,
) -> PrototypeInfoIndex {
    if let Some(index) = shape.record(agent).prototype_info {
        return index;
    }
    let index = agent.heap.create(PrototypeInfo::default());
    shape.record_mut(agent).prototype_info = Some(index);
    index
}

pub(crate) fn should_be_fast_prototype_map(agent: &Agent, shape: ObjectShape) -> bool {
    shape
        .record(agent)
        .prototype_info
        .is_some_and(|index| info(agent, index).should_be_fast)
}

/// Prototypes are kept in dictionary mode while they are being set up and
/// turned fast once lookups through them are cached.
fn prototype_benefits_from_normalization(agent: &Agent, object: Object) -> bool {
    if !object.has_fast_properties(agent) || agent.is_bootstrapping() {
        return false;
    }
    let shape = object.shape(agent);
    !shape.is_prototype_map(agent) || !should_be_fast_prototype_map(agent, shape)
}

/// ### OptimizeAsPrototype
///
/// Give `object` a private prototype shape.
pub fn optimize_as_prototype(agent: &mut Agent, object: Object) {
    if object.is_proxy(agent) {
        return;
    }
    if prototype_benefits_from_normalization(agent, object) {
        normalize_properties(
            agent,
            object,
            NormalizationMode::KeepInobjectProperties,
            0,
            "NormalizeAsPrototype",
        );
    }
    let shape = object.shape(agent);
    if shape.is_prototype_map(agent) {
        if should_be_fast_prototype_map(agent, shape) && !object.has_fast_properties(agent) {
            migrate_slow_to_fast(agent, object, 0, "OptimizeAsPrototype");
        }
    } else {
        let new_shape = copy(agent, shape, "CopyAsPrototype");
        new_shape.set_flag(agent, ShapeFlags::IS_PROTOTYPE_MAP, true);
        migrate_to_shape(agent, object, new_shape);
    }
}

/// Turn a prototype that was marked as worth keeping fast back into fast
/// mode after a change forced it into dictionary mode.
pub(crate) fn reoptimize_if_prototype(agent: &mut Agent, object: Object) {
    let shape = object.shape(agent);
    if !shape.is_prototype_map(agent) || !should_be_fast_prototype_map(agent, shape) {
        return;
    }
    optimize_as_prototype(agent, object);
}

/// Mark every prototype shape on the chain starting at `receiver` as one
/// that should stay fast, and make it fast.
pub fn make_prototypes_fast(agent: &mut Agent, receiver: Object) {
    let max_hops = agent.options.max_prototype_chain_length;
    let mut current = Some(receiver);
    let mut hops = 0;
    while let Some(object) = current {
        if object.is_proxy(agent) || hops > max_hops {
            return;
        }
        let shape = object.shape(agent);
        if shape.is_prototype_map(agent) {
            if should_be_fast_prototype_map(agent, shape) {
                // Everything further up was handled when this one was.
                return;
            }
            let index = get_or_create_prototype_info(agent, shape);
            info_mut(agent, index).should_be_fast = true;
            optimize_as_prototype(agent, object);
        }
        current = object.shape(agent).prototype(agent);
        hops += 1;
    }
}

/// Register `user` with its prototype, and the shape of the prototype with
/// its own prototype, up to the first link that is already registered.
pub(crate) fn lazy_register_prototype_user(agent: &mut Agent, user: ObjectShape) {
    let max_hops = agent.options.max_prototype_chain_length;
    let mut current_user = user;
    let mut current_info = get_or_create_prototype_info(agent, user);
    for _ in 0..max_hops {
        if info(agent, current_info).registered {
            break;
        }
        let Some(prototype) = current_user.prototype(agent) else {
            return;
        };
        if prototype.is_proxy(agent) {
            return;
        }
        let prototype_shape = prototype.shape(agent);
        let prototype_info = get_or_create_prototype_info(agent, prototype_shape);
        info_mut(agent, prototype_info).users.push(current_user);
        info_mut(agent, current_info).registered = true;
        log::trace!("Registered {current_user:?} as a user of prototype {prototype:?}");
        current_user = prototype_shape;
        current_info = prototype_info;
    }
}

/// Remove `user` from the users of its prototype. Returns whether it was
/// registered.
fn unregister_prototype_user(agent: &mut Agent, user: ObjectShape) -> bool {
    let Some(index) = user.record(agent).prototype_info else {
        return false;
    };
    if !info(agent, index).registered {
        return false;
    }
    info_mut(agent, index).registered = false;
    let shape = user.prototype(agent).map(|object| object.shape(agent));
    let prototype_info = shape.and_then(|shape| shape.record(agent).prototype_info);
    if let Some(prototype_info) = prototype_info {
        info_mut(agent, prototype_info)
            .users
            .retain(|&registered| registered != user);
    }
    true
}

/// Move the prototype info of a prototype object from its old shape to its
/// new one, re-registering it with its (possibly new) prototype.
fn update_prototype_user_registration(
    agent: &mut Agent,
    old_shape: ObjectShape,
    new_shape: ObjectShape,
) {
    debug_assert!(new_shape.is_prototype_map(agent));
    let was_registered = unregister_prototype_user(agent, old_shape);
    let Some(index) = old_shape.record_mut(agent).prototype_info.take() else {
        return;
    };
    new_shape.record_mut(agent).prototype_info = Some(index);
    if was_registered {
        lazy_register_prototype_user(agent, new_shape);
    }
}

/// Called before an object moves from `old_shape` to `new_shape`.
pub(crate) fn notify_map_change(agent: &mut Agent, old_shape: ObjectShape, new_shape: ObjectShape) {
    if !old_shape.is_prototype_map(agent) {
        return;
    }
    invalidate_prototype_chains(agent, old_shape);
    if new_shape.is_prototype_map(agent) {
        update_prototype_user_registration(agent, old_shape, new_shape);
    }
}

/// ### InvalidatePrototypeChains
///
/// Invalidate the validity cell of the prototype with shape `shape` and of
/// every prototype chain running through it.
pub(crate) fn invalidate_prototype_chains(agent: &mut Agent, shape: ObjectShape) {
    let mut visited = AHashSet::new();
    let mut stack = vec![shape];
    while let Some(shape) = stack.pop() {
        if !visited.insert(shape) {
            continue;
        }
        let Some(index) = shape.record(agent).prototype_info else {
            continue;
        };
        let info = info_mut(agent, index);
        let cell = info.validity_cell.take();
        stack.extend(info.users.iter().copied());
        if let Some(cell) = cell {
            cell.invalidate(agent);
            log::trace!("Invalidated prototype validity cell of {shape:?}");
        }
    }
}

/// ### GetOrCreatePrototypeChainValidityCell
///
/// Validity cell guarding the prototype chain of instances of `shape`.
/// `None` if there is nothing to guard: the shape has no prototype or its
/// prototype is a proxy.
pub fn prototype_chain_validity_cell(
    agent: &mut Agent,
    shape: ObjectShape,
) -> Option<ValidityCell> {
    let prototype = shape.prototype(agent)?;
    if prototype.is_proxy(agent) {
        return None;
    }
    make_prototypes_fast(agent, prototype);
    let prototype_shape = prototype.shape(agent);
    lazy_register_prototype_user(agent, prototype_shape);
    let index = get_or_create_prototype_info(agent, prototype_shape);
    if let Some(cell) = info(agent, index).validity_cell
        && cell.is_valid(agent)
    {
        return Some(cell);
    }
    let cell = ValidityCell::new(agent);
    info_mut(agent, index).validity_cell = Some(cell);
    Some(cell)
}

/// ### GetObjectCreateMap
///
/// Root shape of ordinary objects created with `prototype`.
pub(crate) fn get_object_create_map(agent: &mut Agent, prototype: Option<Object>) -> ObjectShape {
    let inobject_properties = agent.options.default_inobject_properties;
    let Some(prototype) = prototype.filter(|prototype| !prototype.is_proxy(agent)) else {
        return ObjectShape::get_or_create_root(
            agent,
            prototype,
            InstanceType::Ordinary,
            inobject_properties,
        );
    };
    if !prototype.shape(agent).is_prototype_map(agent) {
        optimize_as_prototype(agent, prototype);
    }
    let index = get_or_create_prototype_info(agent, prototype.shape(agent));
    if let Some(shape) = info(agent, index).object_create_map {
        return shape;
    }
    let shape = ObjectShape::get_or_create_root(
        agent,
        Some(prototype),
        InstanceType::Ordinary,
        inobject_properties,
    );
    info_mut(agent, index).object_create_map = Some(shape);
    shape
}

/// Drop weak references to collected shapes.
pub(crate) fn clear_dead_prototype_info(
    info: &mut PrototypeInfo,
    is_live: &mut impl FnMut(ObjectShape) -> bool,
) {
    info.users.retain(|&user| is_live(user));
    if info.object_create_map.is_some_and(|shape| !is_live(shape)) {
        info.object_create_map = None;
    }
}
