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
use ::serde_json::{Map, Value};

impl<'a> JsonRef<'a> for &'a Value {
    type Array = &'a Vec<Value>;
    type Object = &'a Map<String, Value>;

    fn as_bool(self) -> Option<bool> {
        self.as_bool()
    }

    fn as_number(self) -> Option<Number> {
        self.as_number().cloned()
    }

    fn as_str(self) -> Option<&'a str> {
        self.as_str()
    }

    fn as_array(self) -> Option<Self::Array> {
        self.as_array()
    }

    fn as_object(self) -> Option<Self::Object> {
        self.as_object()
    }

    fn is_null(self) -> bool {
        self.is_null()
    }

    fn as_f64(self) -> Option<f64> {
        self.as_f64()
    }
}

impl<'a> ArrayRef<'a> for &'a Vec<Value> {
    type JsonRef = &'a Value;

    fn len(self) -> usize {
        self.len()
    }

    fn get(self, index: usize) -> Option<Self::JsonRef> {
        (**self).get(index)
    }

    fn identity(self) -> usize {
        self as *const Vec<Value> as usize
    }
}

impl<'a> ObjectRef<'a> for &'a Map<String, Value> {
    type JsonRef = &'a Value;

    fn get(self, key: &str) -> Option<Self::JsonRef> {
        self.get(key)
    }

    fn entries(self) -> Box<dyn Iterator<Item = (&'a str, Self::JsonRef)> + 'a> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn identity(self) -> usize {
        self as *const Map<String, Value> as usize
    }
}
