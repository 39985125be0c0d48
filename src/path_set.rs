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

//! A set of result paths, used to suppress duplicate matches.

use std::collections::HashMap;

use crate::path::PathSegment;

/// A prefix tree of paths.
///
/// Each level is keyed by a classified segment, so the field `"0"`, the index
/// `0` and the keyed reference `{key: "0"}` never collide. Lookups and inserts
/// cost O(depth) regardless of the number of stored paths.
///
/// Only exact matches count: the prefix or the extension of a stored path is
/// not contained. The empty path is never stored.
#[derive(Debug, Default)]
pub struct PathSet {
    root: Node,
    len: usize,
}

#[derive(Debug, Default)]
struct Node {
    children: HashMap<SegmentKey, Entry>,
}

#[derive(Debug, Default)]
struct Entry {
    /// A path ending here has been inserted.
    terminal: bool,
    next: Node,
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum SegmentKey {
    Field(String),
    Index(usize),
    Key(String),
}

impl SegmentKey {
    fn of(segment: &PathSegment) -> Self {
        match segment {
            PathSegment::Field(name) => Self::Field(name.clone()),
            PathSegment::Index(i) => Self::Index(*i),
            PathSegment::Key { key } => Self::Key(key.clone()),
        }
    }
}

impl PathSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path to the set.
    ///
    /// Returns whether the path was newly inserted. Inserting the empty path
    /// is a no-op and returns `false`.
    pub fn insert(&mut self, path: &[PathSegment]) -> bool {
        let Some((last, init)) = path.split_last() else {
            return false;
        };
        let mut node = &mut self.root;
        for segment in init {
            node = &mut node.children.entry(SegmentKey::of(segment)).or_default().next;
        }
        let entry = node.children.entry(SegmentKey::of(last)).or_default();
        if entry.terminal {
            return false;
        }
        entry.terminal = true;
        self.len += 1;
        true
    }

    /// Returns `true` if exactly this path was inserted.
    pub fn contains(&self, path: &[PathSegment]) -> bool {
        let Some((last, init)) = path.split_last() else {
            return false;
        };
        let mut node = &self.root;
        for segment in init {
            match node.children.get(&SegmentKey::of(segment)) {
                Some(entry) => node = &entry.next,
                None => return false,
            }
        }
        node.children
            .get(&SegmentKey::of(last))
            .is_some_and(|entry| entry.terminal)
    }

    /// Returns the number of stored paths.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no path is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[PathSegment]) -> Vec<PathSegment> {
        segments.to_vec()
    }

    #[test]
    fn exact_match_only() {
        let mut set = PathSet::new();
        let users_1 = path(&["users".into(), PathSegment::Index(1)]);
        assert!(set.insert(&users_1));
        assert!(!set.insert(&users_1));
        assert!(set.contains(&users_1));

        assert!(!set.contains(&path(&["users".into()])));
        assert!(!set.contains(&path(&["users".into(), PathSegment::Index(1), "name".into()])));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn prefix_and_extension_are_independent() {
        let mut set = PathSet::new();
        let long = path(&["a".into(), "b".into()]);
        let short = path(&["a".into()]);
        assert!(set.insert(&long));
        assert!(!set.contains(&short));
        assert!(set.insert(&short));
        assert!(set.contains(&short));
        assert!(set.contains(&long));
        assert!(set.insert(&path(&["a".into(), "b".into(), "c".into()])));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn segment_kinds_do_not_collide() {
        let mut set = PathSet::new();
        set.insert(&path(&["0".into()]));
        assert!(!set.contains(&path(&[PathSegment::Index(0)])));
        assert!(!set.contains(&path(&[PathSegment::key("0")])));
        set.insert(&path(&[PathSegment::key("0")]));
        assert!(set.contains(&path(&[PathSegment::key("0")])));
        assert!(!set.contains(&path(&[PathSegment::Index(0)])));
    }

    #[test]
    fn empty_path_is_never_stored() {
        let mut set = PathSet::new();
        assert!(!set.insert(&[]));
        assert!(!set.contains(&[]));
        assert!(set.is_empty());
    }
}
