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

//! Checks that queries only touch the part of the document they need.

use std::cell::Cell;
use std::fmt::{Debug, Formatter};

use keyed_json_path::json::{ArrayRef, JsonRef, ObjectRef};
use keyed_json_path::{JsonPath, PathSegment};
use serde_json::{json, Map, Number, Value};

/// A document backend that counts array element reads.
#[derive(Clone, Copy)]
struct Counted<'a> {
    value: &'a Value,
    reads: &'a Cell<usize>,
}

#[derive(Clone, Copy)]
struct CountedArray<'a> {
    array: &'a Vec<Value>,
    reads: &'a Cell<usize>,
}

#[derive(Clone, Copy)]
struct CountedObject<'a> {
    object: &'a Map<String, Value>,
    reads: &'a Cell<usize>,
}

impl Debug for Counted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl<'a> JsonRef<'a> for Counted<'a> {
    type Array = CountedArray<'a>;
    type Object = CountedObject<'a>;

    fn as_bool(self) -> Option<bool> {
        self.value.as_bool()
    }

    fn as_number(self) -> Option<Number> {
        self.value.as_number().cloned()
    }

    fn as_str(self) -> Option<&'a str> {
        self.value.as_str()
    }

    fn as_array(self) -> Option<Self::Array> {
        self.value.as_array().map(|array| CountedArray {
            array,
            reads: self.reads,
        })
    }

    fn as_object(self) -> Option<Self::Object> {
        self.value.as_object().map(|object| CountedObject {
            object,
            reads: self.reads,
        })
    }

    fn is_null(self) -> bool {
        self.value.is_null()
    }
}

impl<'a> ArrayRef<'a> for CountedArray<'a> {
    type JsonRef = Counted<'a>;

    fn len(self) -> usize {
        self.array.len()
    }

    fn get(self, index: usize) -> Option<Self::JsonRef> {
        self.reads.set(self.reads.get() + 1);
        self.array.get(index).map(|value| Counted {
            value,
            reads: self.reads,
        })
    }

    fn identity(self) -> usize {
        self.array as *const _ as usize
    }
}

impl<'a> ObjectRef<'a> for CountedObject<'a> {
    type JsonRef = Counted<'a>;

    fn get(self, key: &str) -> Option<Self::JsonRef> {
        self.object.get(key).map(|value| Counted {
            value,
            reads: self.reads,
        })
    }

    fn entries(self) -> Box<dyn Iterator<Item = (&'a str, Self::JsonRef)> + 'a> {
        let reads = self.reads;
        Box::new(
            self.object
                .iter()
                .map(move |(name, value)| (name.as_str(), Counted { value, reads })),
        )
    }

    fn identity(self) -> usize {
        self.object as *const _ as usize
    }
}

fn big_document() -> Value {
    let items: Vec<Value> = (0..1_000_000).map(|i| json!(i)).collect();
    json!({ "items": items })
}

#[test]
fn first_filter_match_reads_one_element() {
    let doc = big_document();
    let reads = Cell::new(0);
    let root = Counted {
        value: &doc,
        reads: &reads,
    };

    let path = JsonPath::new("items[@ == 0]").unwrap();
    let mut matches = path.query(root);
    let first = matches.next().unwrap();
    assert_eq!(first.value.value, &json!(0));
    assert_eq!(first.path, vec!["items".into(), PathSegment::Index(0)]);
    assert_eq!(reads.get(), 1);

    // pulling more reads more
    drop(matches);
    let path = JsonPath::new("items[@ >= 0]").unwrap();
    let taken = path.query(root).take(3).count();
    assert_eq!(taken, 3);
    assert_eq!(reads.get(), 4);
}

#[test]
fn first_of_wildcard_reads_one_element() {
    let doc = big_document();
    let reads = Cell::new(0);
    let root = Counted {
        value: &doc,
        reads: &reads,
    };

    let path = JsonPath::new("items[*]").unwrap();
    assert!(path.exists(root));
    assert_eq!(reads.get(), 1);

    reads.set(0);
    let path = JsonPath::new("..[0]").unwrap();
    assert_eq!(path.query(root).next().unwrap().value.value, &json!(0));
    assert_eq!(reads.get(), 1);
}

#[test]
fn key_lookup_builds_index_once() {
    let items: Vec<Value> = (0..1000)
        .map(|i| json!({"_key": format!("k{i}")}))
        .collect();
    let doc = json!({ "items": items });
    let reads = Cell::new(0);
    let root = Counted {
        value: &doc,
        reads: &reads,
    };

    let cache = keyed_json_path::KeyedIndexCache::new();
    let path = JsonPath::new("items[_key == \"k999\"]").unwrap();
    let found: Vec<_> = path.query_with(root, Vec::new(), &cache).collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].path, vec!["items".into(), PathSegment::key("k999")]);
    // one scan to build the index, one read to fetch the element
    assert_eq!(reads.get(), 1001);

    reads.set(0);
    let path = JsonPath::new("items[_key == \"k10\"]").unwrap();
    assert_eq!(path.query_with(root, Vec::new(), &cache).count(), 1);
    assert_eq!(reads.get(), 1);
}
