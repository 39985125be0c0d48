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

//! Memoized `_key` lookups for keyed arrays.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::json::{ArrayRef, JsonRef};

type KeyIndex = HashMap<Box<str>, usize>;

/// Maps the `_key` of array elements to their positions.
///
/// The first lookup against an array scans it once and remembers every
/// element's key; later lookups against the same array reuse that map.
///
/// Arrays are identified by [`ArrayRef::identity`], which a later array may
/// reuse once the first one is gone. Every hit is checked against the key of
/// the element it points to, and a miss or a mismatch rebuilds the index of
/// that array, so a reused identity or an array changed in place never yields
/// the wrong element.
///
/// Clones share the same storage and may be used from several threads.
#[derive(Debug, Clone, Default)]
pub struct KeyedIndexCache {
    indices: Arc<RwLock<HashMap<usize, Arc<KeyIndex>>>>,
}

impl KeyedIndexCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the position of the first element whose `_key` is `key`.
    pub fn index_of<'a, A: ArrayRef<'a>>(&self, array: A, key: &str) -> Option<usize> {
        self.lookup(array, key).map(|(i, _)| i)
    }

    /// Returns the first element whose `_key` is `key`, with its position.
    pub fn lookup<'a, A: ArrayRef<'a>>(
        &self,
        array: A,
        key: &str,
    ) -> Option<(usize, A::JsonRef)> {
        let (index, fresh) = self.key_index(array);
        if let Some(found) = find(array, &index, key) {
            return Some(found);
        }
        if fresh {
            return None;
        }
        // the cached index belongs to an older array with the same identity
        let index = self.rebuild(array);
        find(array, &index, key)
    }

    /// Returns the number of arrays indexed so far.
    pub fn len(&self) -> usize {
        self.indices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no array has been indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every index.
    pub fn clear(&self) {
        self.indices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the index of the array, and whether it was built by this call.
    fn key_index<'a, A: ArrayRef<'a>>(&self, array: A) -> (Arc<KeyIndex>, bool) {
        let id = array.identity();
        if let Some(index) = self
            .indices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return (index.clone(), false);
        }
        // build under the write lock so concurrent first lookups index once
        let mut indices = self.indices.write().unwrap_or_else(PoisonError::into_inner);
        let mut fresh = false;
        let index = indices
            .entry(id)
            .or_insert_with(|| {
                fresh = true;
                Arc::new(build_index(array))
            })
            .clone();
        (index, fresh)
    }

    fn rebuild<'a, A: ArrayRef<'a>>(&self, array: A) -> Arc<KeyIndex> {
        let index = Arc::new(build_index(array));
        self.indices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(array.identity(), index.clone());
        index
    }
}

/// Fetches the element the index points to, if it still carries `key`.
fn find<'a, A: ArrayRef<'a>>(
    array: A,
    index: &KeyIndex,
    key: &str,
) -> Option<(usize, A::JsonRef)> {
    let i = *index.get(key)?;
    let item = array.get(i)?;
    (item.item_key() == Some(key)).then_some((i, item))
}

fn build_index<'a, A: ArrayRef<'a>>(array: A) -> KeyIndex {
    let mut index = KeyIndex::with_capacity(array.len());
    for i in 0..array.len() {
        let Some(key) = array.get(i).and_then(|item| item.item_key()) else {
            continue;
        };
        index.entry(key.into()).or_insert(i);
    }
    log::trace!(
        "indexed {} keys of array with {} items",
        index.len(),
        array.len()
    );
    index
}
