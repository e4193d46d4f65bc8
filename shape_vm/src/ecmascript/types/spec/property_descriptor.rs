// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::types::{Object, PropertyAttributes, Value};

/// ### [6.2.6 The Property Descriptor Specification Type](https://tc39.es/ecma262/#sec-property-descriptor-specification-type)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PropertyDescriptor {
    /// \[\[Value]]
    pub value: Option<Value>,

    /// \[\[Writable]]
    pub writable: Option<bool>,

    /// \[\[Get]]
    ///
    /// Note: double-Option because these fields can be set explicitly undefined
    /// to unset them.
    pub get: Option<Option<Object>>,

    /// \[\[Set]]
    ///
    /// Note: double-Option because these fields can be set explicitly undefined
    /// to unset them.
    pub set: Option<Option<Object>>,

    /// \[\[Enumerable]]
    pub enumerable: Option<bool>,

    /// \[\[Configurable]]
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn new_data_descriptor(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            writable: Some(true),
            get: None,
            set: None,
            enumerable: Some(true),
            configurable: Some(true),
        }
    }

    /// Fully populated data descriptor with the given attributes.
    pub fn new_data_with_attributes(value: Value, attributes: PropertyAttributes) -> Self {
        Self {
            value: Some(value),
            writable: Some(!attributes.is_read_only()),
            get: None,
            set: None,
            enumerable: Some(attributes.is_enumerable()),
            configurable: Some(attributes.is_configurable()),
        }
    }

    /// Fully populated accessor descriptor with the given attributes.
    pub fn new_accessor_with_attributes(
        get: Option<Object>,
        set: Option<Object>,
        attributes: PropertyAttributes,
    ) -> Self {
        Self {
            value: None,
            writable: None,
            get: Some(get),
            set: Some(set),
            enumerable: Some(attributes.is_enumerable()),
            configurable: Some(attributes.is_configurable()),
        }
    }

    /// ### [6.2.6.1 IsAccessorDescriptor ( Desc )](https://tc39.es/ecma262/#sec-isaccessordescriptor)
    pub fn is_accessor_descriptor(&self) -> bool {
        // 1. If Desc is undefined, return false.
        match (self.get, self.set) {
            // 2. If Desc has a [[Get]] field, return true.
            (Some(_), _) => true,
            // 3. If Desc has a [[Set]] field, return true.
            (_, Some(_)) => true,
            // 4. Return false.
            _ => false,
        }
    }

    /// ### [6.2.6.2 IsDataDescriptor ( Desc )](https://tc39.es/ecma262/#sec-isdatadescriptor)
    pub fn is_data_descriptor(&self) -> bool {
        // 1. If Desc is undefined, return false.
        match (self.value, self.writable) {
            // 2. If Desc has a [[Value]] field, return true.
            (Some(_), _) => true,
            // 3. If Desc has a [[Writable]] field, return true.
            (_, Some(_)) => true,
            // 4. Return false.
            _ => false,
        }
    }

    /// ### [6.2.6.3 IsGenericDescriptor ( Desc )](https://tc39.es/ecma262/#sec-isgenericdescriptor)
    pub fn is_generic_descriptor(&self) -> bool {
        // 1. If Desc is undefined, return false.
        // 2. If IsAccessorDescriptor(Desc) is true, return false.
        // 3. If IsDataDescriptor(Desc) is true, return false.
        // 4. Return true.
        !self.is_accessor_descriptor() && !self.is_data_descriptor()
    }

    /// ### [6.2.6.6 CompletePropertyDescriptor ( Desc )](https://tc39.es/ecma262/#sec-completepropertydescriptor)
    pub fn complete_property_descriptor(&mut self) {
        // 1. Let like be the Record { [[Value]]: undefined, [[Writable]]: false, [[Get]]: undefined, [[Set]]: undefined, [[Enumerable]]: false, [[Configurable]]: false }.
        // 2. If IsGenericDescriptor(Desc) is true or IsDataDescriptor(Desc) is true, then
        if self.is_generic_descriptor() || self.is_data_descriptor() {
            // a. If Desc does not have a [[Value]] field, set Desc.[[Value]] to like.[[Value]].
            self.value.get_or_insert(Value::Undefined);
            // b. If Desc does not have a [[Writable]] field, set Desc.[[Writable]] to like.[[Writable]].
            self.writable.get_or_insert(false);
        } else {
            // 3. Else,
            // a. If Desc does not have a [[Get]] field, set Desc.[[Get]] to like.[[Get]].
            self.get.get_or_insert(None);
            // b. If Desc does not have a [[Set]] field, set Desc.[[Set]] to like.[[Set]].
            self.set.get_or_insert(None);
        }
        // 4. If Desc does not have an [[Enumerable]] field, set Desc.[[Enumerable]] to like.[[Enumerable]].
        self.enumerable.get_or_insert(false);
        // 5. If Desc does not have a [[Configurable]] field, set Desc.[[Configurable]] to like.[[Configurable]].
        self.configurable.get_or_insert(false);
        // 6. Return unused.
    }

    /// Attributes of the descriptor; absent fields count as `false`.
    pub fn to_attributes(&self) -> PropertyAttributes {
        PropertyAttributes::from_flags(
            self.writable.unwrap_or(false) || self.is_accessor_descriptor(),
            self.enumerable.unwrap_or(false),
            self.configurable.unwrap_or(false),
        )
    }

    /// Attributes of the descriptor; absent fields are taken from
    /// `current`.
    pub fn attributes_over(&self, current: PropertyAttributes) -> PropertyAttributes {
        let mut attributes = current;
        if let Some(enumerable) = self.enumerable {
            attributes.set(PropertyAttributes::DONT_ENUM, !enumerable);
        }
        if let Some(configurable) = self.configurable {
            attributes.set(PropertyAttributes::DONT_DELETE, !configurable);
        }
        if self.is_accessor_descriptor() {
            attributes.remove(PropertyAttributes::READ_ONLY);
        } else if let Some(writable) = self.writable {
            attributes.set(PropertyAttributes::READ_ONLY, !writable);
        }
        attributes
    }

    pub fn has_fields(&self) -> bool {
        let Self {
            value,
            writable,
            get,
            set,
            enumerable,
            configurable,
        } = self;
        value.is_some()
            || writable.is_some()
            || get.is_some()
            || set.is_some()
            || enumerable.is_some()
            || configurable.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_generic_descriptor() {
        let mut descriptor = PropertyDescriptor {
            enumerable: Some(true),
            ..Default::default()
        };
        assert!(descriptor.is_generic_descriptor());
        descriptor.complete_property_descriptor();
        assert_eq!(descriptor.value, Some(Value::Undefined));
        assert_eq!(descriptor.writable, Some(false));
        assert_eq!(descriptor.configurable, Some(false));
        assert!(descriptor.is_data_descriptor());
    }

    #[test]
    fn attributes_over_keeps_absent_fields() {
        let descriptor = PropertyDescriptor {
            writable: Some(false),
            ..Default::default()
        };
        let attributes = descriptor.attributes_over(PropertyAttributes::DONT_ENUM);
        assert!(attributes.is_read_only());
        assert!(!attributes.is_enumerable());
        assert!(attributes.is_configurable());
    }
}
