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

//! Result locations.

use serde::{Deserialize, Serialize};

/// The location of a matched value, from the document root.
pub type Path = Vec<PathSegment>;

/// One step of a [`Path`].
///
/// Serialized as a plain string, a plain integer, or `{"key": "..."}`:
///
/// ```rust
/// use keyed_json_path::PathSegment;
///
/// let path = vec![
///     PathSegment::from("items"),
///     PathSegment::Index(0),
///     PathSegment::key("b"),
/// ];
/// let json = serde_json::to_string(&path).unwrap();
/// assert_eq!(json, r#"["items",0,{"key":"b"}]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An array element by position.
    Index(usize),
    /// An object member by name.
    Field(String),
    /// An array element by its `_key` field.
    Key { key: String },
}

impl PathSegment {
    /// Creates a keyed reference.
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key { key: key.into() }
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}
