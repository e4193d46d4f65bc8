// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    ecmascript::{
        execution::Agent,
        types::{FieldType, Name, Object, Representation},
    },
    heap::{CreateHeapData, indexes::HeapNumberIndex},
};

/// A boxed double living in the heap. Values whose numeric value does not
/// fit a small integer are stored this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct HeapNumber(pub(crate) HeapNumberIndex);

impl HeapNumber {
    pub(crate) const fn get_index(self) -> usize {
        self.0.into_index()
    }

    pub fn value(self, agent: &Agent) -> f64 {
        agent.heap.numbers[self.get_index()]
    }
}

/// ### [6.1 ECMAScript Language Types](https://tc39.es/ecma262/#sec-ecmascript-language-types)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Value {
    /// ### [6.1.1 The Undefined Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-undefined-type)
    #[default]
    Undefined,
    /// ### [6.1.2 The Null Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-null-type)
    Null,
    /// ### [6.1.3 The Boolean Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-boolean-type)
    Boolean(bool),
    /// 32-bit signed integer Number, stored unboxed.
    Smi(i32),
    /// Any other Number, stored boxed.
    Number(HeapNumber),
    /// String primitive; strings are always interned.
    String(Name),
    /// ### [6.1.5 The Symbol Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-symbol-type)
    Symbol(Name),
    /// ### [6.1.7 The Object Type](https://tc39.es/ecma262/#sec-object-type)
    Object(Object),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Smi(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Option<Object>> for Value {
    fn from(value: Option<Object>) -> Self {
        value.map_or(Value::Undefined, Value::Object)
    }
}

impl Value {
    /// Create a Number value. Integral values within the small integer range
    /// are stored unboxed, with the exception of negative zero.
    pub fn from_f64(agent: &mut Agent, value: f64) -> Self {
        if value.fract() == 0.0
            && value >= i32::MIN as f64
            && value <= i32::MAX as f64
            && !(value == 0.0 && value.is_sign_negative())
        {
            Value::Smi(value as i32)
        } else {
            Value::Number(agent.heap.create(value))
        }
    }

    pub fn from_str(agent: &mut Agent, str: &str) -> Self {
        Value::String(Name::from_str(agent, str))
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_number(self) -> bool {
        matches!(self, Value::Smi(_) | Value::Number(_))
    }

    pub fn is_object(self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_object(self) -> Option<Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn to_number(self, agent: &Agent) -> Option<f64> {
        match self {
            Value::Smi(value) => Some(value as f64),
            Value::Number(number) => Some(number.value(agent)),
            _ => None,
        }
    }

    pub fn is_callable(self, agent: &Agent) -> bool {
        match self {
            Value::Object(object) => object.is_callable(agent),
            _ => false,
        }
    }

    /// ### [7.2.10 SameValue ( x, y )](https://tc39.es/ecma262/#sec-samevalue)
    pub fn same_value(self, agent: &Agent, other: Value) -> bool {
        // 1. If Type(x) is not Type(y), return false.
        // 2. If x is a Number, then
        if let (Some(x), Some(y)) = (self.to_number(agent), other.to_number(agent)) {
            // a. Return Number::sameValue(x, y).
            if x.is_nan() && y.is_nan() {
                return true;
            }
            return x == y && x.is_sign_negative() == y.is_sign_negative();
        }
        // 3. Return SameValueNonNumber(x, y).
        self == other
    }

    /// The narrowest representation that can hold this value.
    pub(crate) fn optimal_representation(self) -> Representation {
        match self {
            Value::Smi(_) => Representation::Smi,
            Value::Number(_) => Representation::Double,
            Value::Object(_) | Value::String(_) | Value::Symbol(_) => Representation::HeapObject,
            Value::Undefined | Value::Null | Value::Boolean(_) => Representation::HeapObject,
        }
    }

    pub(crate) fn fits_representation(self, representation: Representation) -> bool {
        match representation {
            Representation::None => false,
            Representation::Smi => matches!(self, Value::Smi(_)),
            Representation::Double => self.is_number(),
            Representation::HeapObject => !matches!(self, Value::Smi(_)),
            Representation::Tagged => true,
        }
    }

    /// The field type to record for this value when it is stored with the
    /// given representation. Object values in a heap object field remember
    /// their shape.
    pub(crate) fn optimal_type(self, agent: &Agent, representation: Representation) -> FieldType {
        if !agent.options.track_field_types {
            return FieldType::Any;
        }
        if representation == Representation::HeapObject {
            if let Value::Object(object) = self {
                let shape = object.shape(agent);
                if shape.is_stable(agent) {
                    return FieldType::Class(shape);
                }
            }
        }
        FieldType::Any
    }

    /// Checks if the value is allowed by a field type.
    pub(crate) fn fits_field_type(self, agent: &Agent, field_type: FieldType) -> bool {
        match field_type {
            FieldType::Any => true,
            FieldType::None | FieldType::Cleared => false,
            FieldType::Class(shape) => {
                matches!(self, Value::Object(object) if object.shape(agent) == shape)
            }
        }
    }
}

impl CreateHeapData<f64, HeapNumber> for crate::heap::Heap {
    fn create(&mut self, data: f64) -> HeapNumber {
        self.numbers.push(data);
        HeapNumber(HeapNumberIndex::last(&self.numbers))
    }
}
