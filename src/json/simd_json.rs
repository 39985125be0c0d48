// Copyright 2023 RisingWave Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::*;
use ::simd_json::{
    base::{ValueAsArray, ValueAsObject},
    prelude::ValueAsScalar,
    value::{
        borrowed::Object as BorrowedObject, owned::Object as OwnedObject, BorrowedValue, OwnedValue,
    },
    StaticNode,
};

impl<'a, 'b> JsonRef<'a> for &'a BorrowedValue<'b> {
    type Array = &'a Vec<BorrowedValue<'b>>;
    type Object = &'a BorrowedObject<'b>;

    fn as_bool(self) -> Option<bool> {
        ValueAsScalar::as_bool(self)
    }

    fn as_number(self) -> Option<Number> {
        match self {
            BorrowedValue::Static(StaticNode::I64(v)) => Some(Number::from(*v)),
            BorrowedValue::Static(StaticNode::U64(v)) => Some(Number::from(*v)),
            BorrowedValue::Static(StaticNode::F64(v)) => Number::from_f64(*v),
            _ => None,
        }
    }

    fn as_str(self) -> Option<&'a str> {
        ValueAsScalar::as_str(self)
    }

    fn as_array(self) -> Option<Self::Array> {
        ValueAsArray::as_array(self)
    }

    fn as_object(self) -> Option<Self::Object> {
        ValueAsObject::as_object(self)
    }

    fn is_null(self) -> bool {
        matches!(self, BorrowedValue::Static(StaticNode::Null))
    }
}

impl<'a, 'b> ArrayRef<'a> for &'a Vec<BorrowedValue<'b>> {
    type JsonRef = &'a BorrowedValue<'b>;

    fn len(self) -> usize {
        self.len()
    }

    fn get(self, index: usize) -> Option<Self::JsonRef> {
        (**self).get(index)
    }

    fn identity(self) -> usize {
        self as *const Vec<BorrowedValue<'b>> as usize
    }
}

impl<'a, 'b> ObjectRef<'a> for &'a BorrowedObject<'b> {
    type JsonRef = &'a BorrowedValue<'b>;

    fn get(self, key: &str) -> Option<Self::JsonRef> {
        self.get(key)
    }

    fn entries(self) -> Box<dyn Iterator<Item = (&'a str, Self::JsonRef)> + 'a> {
        Box::new(self.iter().map(|(k, v)| (k.as_ref(), v)))
    }

    fn identity(self) -> usize {
        self as *const BorrowedObject<'b> as usize
    }
}

impl<'a> JsonRef<'a> for &'a OwnedValue {
    type Array = &'a Vec<OwnedValue>;
    type Object = &'a OwnedObject;

    fn as_bool(self) -> Option<bool> {
        ValueAsScalar::as_bool(self)
    }

    fn as_number(self) -> Option<Number> {
        match self {
            OwnedValue::Static(StaticNode::I64(v)) => Some(Number::from(*v)),
            OwnedValue::Static(StaticNode::U64(v)) => Some(Number::from(*v)),
            OwnedValue::Static(StaticNode::F64(v)) => Number::from_f64(*v),
            _ => None,
        }
    }

    fn as_str(self) -> Option<&'a str> {
        ValueAsScalar::as_str(self)
    }

    fn as_array(self) -> Option<Self::Array> {
        ValueAsArray::as_array(self)
    }

    fn as_object(self) -> Option<Self::Object> {
        ValueAsObject::as_object(self)
    }

    fn is_null(self) -> bool {
        matches!(self, OwnedValue::Static(StaticNode::Null))
    }
}

impl<'a> ArrayRef<'a> for &'a Vec<OwnedValue> {
    type JsonRef = &'a OwnedValue;

    fn len(self) -> usize {
        self.len()
    }

    fn get(self, index: usize) -> Option<Self::JsonRef> {
        (**self).get(index)
    }

    fn identity(self) -> usize {
        self as *const Vec<OwnedValue> as usize
    }
}

impl<'a> ObjectRef<'a> for &'a OwnedObject {
    type JsonRef = &'a OwnedValue;

    fn get(self, key: &str) -> Option<Self::JsonRef> {
        self.get(key)
    }

    fn entries(self) -> Box<dyn Iterator<Item = (&'a str, Self::JsonRef)> + 'a> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn identity(self) -> usize {
        self as *const OwnedObject as usize
    }
}
