// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::builtins::ordinary::shape::ObjectShape;

/// ## Field representation
///
/// Representations form a lattice:
///
/// ```text
///        Tagged
///       /     \
///   Double   HeapObject
///     |        |
///    Smi       |
///       \     /
///        None
/// ```
///
/// A field only ever moves up the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    None,
    Smi,
    Double,
    HeapObject,
    Tagged,
}

impl Representation {
    pub fn is_none(self) -> bool {
        self == Representation::None
    }

    pub fn is_smi(self) -> bool {
        self == Representation::Smi
    }

    pub fn is_double(self) -> bool {
        self == Representation::Double
    }

    pub fn is_heap_object(self) -> bool {
        self == Representation::HeapObject
    }

    pub fn is_tagged(self) -> bool {
        self == Representation::Tagged
    }

    /// Strictly above `other` in the lattice.
    pub fn is_more_general_than(self, other: Self) -> bool {
        match (self, other) {
            (a, b) if a == b => false,
            (_, Representation::None) => true,
            (Representation::Tagged, _) => true,
            (Representation::Double, Representation::Smi) => true,
            _ => false,
        }
    }

    /// `self` is equal to or below `other` in the lattice.
    pub fn fits_into(self, other: Self) -> bool {
        self == other || other.is_more_general_than(self)
    }

    /// Least upper bound of two representations.
    pub fn generalize(self, other: Self) -> Self {
        if self.fits_into(other) {
            other
        } else if other.fits_into(self) {
            self
        } else {
            Representation::Tagged
        }
    }

    /// Whether a field can move from `self` to `other` without changing
    /// the storage of existing instances. Doubles are stored unboxed, so a
    /// move into or out of Double always requires a rewrite.
    pub fn can_be_in_place_changed_to(self, other: Self) -> bool {
        if self == other {
            return true;
        }
        if self.is_none() {
            return !other.is_double();
        }
        other.is_tagged() && !self.is_double()
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Representation::None => "v",
            Representation::Smi => "s",
            Representation::Double => "d",
            Representation::HeapObject => "h",
            Representation::Tagged => "t",
        }
    }
}

/// The type constraint on the values of a field with a heap object
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// No value has been stored yet.
    None,
    /// All values so far were objects with this exact shape.
    Class(ObjectShape),
    /// The class shape was collected; behaves like `Any` when generalized.
    Cleared,
    Any,
}

impl FieldType {
    /// Whether every value admitted by `self` is admitted by `other`.
    pub fn now_is(self, other: Self) -> bool {
        match (self, other) {
            (_, FieldType::Any) => true,
            (FieldType::None, _) => true,
            (FieldType::Class(a), FieldType::Class(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_cleared(self) -> bool {
        self == FieldType::Cleared
    }

    /// Least upper bound of two field types.
    pub fn generalize(self, other: Self) -> Self {
        match (self, other) {
            (FieldType::Cleared, _) | (_, FieldType::Cleared) => FieldType::Any,
            (a, b) if a.now_is(b) => b,
            (a, b) if b.now_is(a) => a,
            _ => FieldType::Any,
        }
    }
}

/// ## Property constness
///
/// A `Const` field has only ever been written once with a single value.
/// Storing a different value makes it `Mutable`, which is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyConstness {
    Const,
    Mutable,
}

impl PropertyConstness {
    pub fn generalize(self, other: Self) -> Self {
        if self == PropertyConstness::Mutable || other == PropertyConstness::Mutable {
            PropertyConstness::Mutable
        } else {
            PropertyConstness::Const
        }
    }

    /// Whether a field with constness `self` may hold a field of constness
    /// `other` without generalization.
    pub fn is_generalizable_to(self, other: Self) -> bool {
        self == PropertyConstness::Const || other == PropertyConstness::Mutable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representation_lattice_joins() {
        use Representation::*;
        assert_eq!(Smi.generalize(Double), Double);
        assert_eq!(Double.generalize(Smi), Double);
        assert_eq!(Smi.generalize(HeapObject), Tagged);
        assert_eq!(Double.generalize(HeapObject), Tagged);
        assert_eq!(None.generalize(Smi), Smi);
        assert_eq!(HeapObject.generalize(None), HeapObject);
        assert_eq!(Tagged.generalize(Smi), Tagged);
    }

    #[test]
    fn representation_order() {
        use Representation::*;
        assert!(Double.is_more_general_than(Smi));
        assert!(Tagged.is_more_general_than(Double));
        assert!(Tagged.is_more_general_than(HeapObject));
        assert!(!HeapObject.is_more_general_than(Smi));
        assert!(!Smi.is_more_general_than(Smi));
        assert!(Smi.fits_into(Smi));
        assert!(!Double.fits_into(Smi));
    }

    #[test]
    fn in_place_changes_avoid_doubles() {
        use Representation::*;
        assert!(Smi.can_be_in_place_changed_to(Tagged));
        assert!(HeapObject.can_be_in_place_changed_to(Tagged));
        assert!(None.can_be_in_place_changed_to(Smi));
        assert!(!None.can_be_in_place_changed_to(Double));
        assert!(!Smi.can_be_in_place_changed_to(Double));
        assert!(!Double.can_be_in_place_changed_to(Tagged));
        assert!(Double.can_be_in_place_changed_to(Double));
    }

    #[test]
    fn constness_is_monotonic() {
        use PropertyConstness::*;
        assert_eq!(Const.generalize(Mutable), Mutable);
        assert_eq!(Const.generalize(Const), Const);
        assert!(Const.is_generalizable_to(Mutable));
        assert!(Mutable.is_generalizable_to(Mutable));
        assert!(!Mutable.is_generalizable_to(Const));
    }

    #[test]
    fn field_type_generalization() {
        use FieldType as F;
        assert_eq!(F::None.generalize(F::Any), F::Any);
        assert_eq!(F::Cleared.generalize(F::None), F::Any);
        assert_eq!(F::None.generalize(F::None), F::None);
        assert!(F::None.now_is(F::Any));
        assert!(!F::Any.now_is(F::None));
    }
}
