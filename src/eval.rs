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

//! Lazy evaluation of path expressions.
//!
//! Every step returns a boxed iterator built from the steps below it, so
//! nothing is computed until the caller pulls the next match.

use std::iter;

use serde::Serialize;

use crate::{
    ast::*,
    json::{ArrayRef, JsonRef, ObjectRef},
    key_cache::KeyedIndexCache,
    path::{Path, PathSegment},
    path_set::PathSet,
};

/// A matched value and its location in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match<J> {
    pub value: J,
    pub path: Path,
}

/// The iterator of matches returned by a query.
///
/// Each location is reported at most once, the first time any branch of the
/// expression reaches it. The iterator cannot be rewound; run the query again
/// to start over.
pub struct Matches<'p, J> {
    items: Items<'p, J>,
    seen: PathSet,
    /// Whether the empty path has been reported. `PathSet` never stores it.
    root_seen: bool,
}

impl<J> Iterator for Matches<'_, J> {
    type Item = Match<J>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Item::Node(value, path) = self.items.next()? else {
                // literals have no location
                continue;
            };
            let fresh = if path.is_empty() {
                !std::mem::replace(&mut self.root_seen, true)
            } else {
                self.seen.insert(&path)
            };
            if fresh {
                return Some(Match { value, path });
            }
        }
    }
}

impl JsonPath {
    /// Evaluate the path against the given document.
    pub fn query<'p, 'a: 'p, J: JsonRef<'a>>(&'p self, document: J) -> Matches<'p, J> {
        evaluate(document, self, Path::new())
    }

    /// Evaluate the path against a value found at `base_path`.
    ///
    /// Reported paths start with `base_path`.
    pub fn query_at<'p, 'a: 'p, J: JsonRef<'a>>(
        &'p self,
        document: J,
        base_path: Path,
    ) -> Matches<'p, J> {
        evaluate(document, self, base_path)
    }

    /// Evaluate the path with a key index cache shared with other queries.
    pub fn query_with<'p, 'a: 'p, J: JsonRef<'a>>(
        &'p self,
        document: J,
        base_path: Path,
        cache: &KeyedIndexCache,
    ) -> Matches<'p, J> {
        Evaluator {
            cache: cache.clone(),
        }
        .matches(&self.expr, document, base_path)
    }

    /// Returns the first match.
    pub fn query_first<'a, J: JsonRef<'a>>(&self, document: J) -> Option<Match<J>> {
        self.query(document).next()
    }

    /// Checks whether the path matches anything in the document.
    pub fn exists<'a, J: JsonRef<'a>>(&self, document: J) -> bool {
        self.query_first(document).is_some()
    }
}

/// Evaluates `path` against `document`, reporting locations relative to `base_path`.
///
/// Uses a fresh [`KeyedIndexCache`].
pub fn evaluate<'p, 'a: 'p, J: JsonRef<'a>>(
    document: J,
    path: &'p JsonPath,
    base_path: Path,
) -> Matches<'p, J> {
    Evaluator {
        cache: KeyedIndexCache::new(),
    }
    .matches(&path.expr, document, base_path)
}

/// Parses `path` and collects all of its matches in `document`.
///
/// The matches outlive the parsed expression, so they are collected eagerly.
/// Parse once and use [`JsonPath::query`] to pull matches lazily.
pub fn evaluate_str<'a, J: JsonRef<'a>>(
    document: J,
    path: &str,
    base_path: Path,
) -> crate::Result<Vec<Match<J>>> {
    let path = JsonPath::new(path)?;
    let matches = evaluate(document, &path, base_path).collect();
    Ok(matches)
}

/// An intermediate result.
///
/// `'p` borrows the expression, `'a` the document.
enum Item<'p, J> {
    /// A value in the document.
    Node(J, Path),
    /// A literal from the expression. It has no location.
    Literal(&'p Expr),
}

type Items<'p, J> = Box<dyn Iterator<Item = Item<'p, J>> + 'p>;

fn empty<'p, J: 'p>() -> Items<'p, J> {
    Box::new(iter::empty())
}

fn once<'p, J: 'p>(value: J, path: Path) -> Items<'p, J> {
    Box::new(iter::once(Item::Node(value, path)))
}

/// Evaluation context shared by all steps of one query.
#[derive(Debug, Clone)]
struct Evaluator {
    cache: KeyedIndexCache,
}

impl Evaluator {
    fn matches<'p, 'a: 'p, J: JsonRef<'a>>(
        self,
        expr: &'p Expr,
        document: J,
        base_path: Path,
    ) -> Matches<'p, J> {
        Matches {
            items: self.eval_expr(expr, document, base_path),
            seen: PathSet::new(),
            root_seen: false,
        }
    }

    /// Evaluates the expression with `value` as the current context.
    fn eval_expr<'p, 'a: 'p, J: JsonRef<'a>>(
        &self,
        expr: &'p Expr,
        value: J,
        path: Path,
    ) -> Items<'p, J> {
        match expr {
            Expr::Path(node) => self.eval_path(node, value, path),
            literal => Box::new(iter::once(Item::Literal(literal))),
        }
    }

    /// Evaluates the base first, then applies the segment to each of its results.
    fn eval_path<'p, 'a: 'p, J: JsonRef<'a>>(
        &self,
        node: &'p PathNode,
        value: J,
        path: Path,
    ) -> Items<'p, J> {
        let Some(base) = &node.base else {
            return self.apply(node, value, path);
        };
        let this = self.clone();
        Box::new(
            self.eval_path(base, value, path)
                .flat_map(move |item| match item {
                    Item::Node(value, path) => this.apply(node, value, path),
                    Item::Literal(_) => empty(),
                }),
        )
    }

    fn apply<'p, 'a: 'p, J: JsonRef<'a>>(
        &self,
        node: &'p PathNode,
        value: J,
        path: Path,
    ) -> Items<'p, J> {
        if node.recursive {
            self.descend(&node.segment, value, path)
        } else {
            self.apply_segment(&node.segment, value, path)
        }
    }

    /// Applies the segment to `value` and then to each of its descendants, in pre-order.
    fn descend<'p, 'a: 'p, J: JsonRef<'a>>(
        &self,
        segment: &'p Segment,
        value: J,
        path: Path,
    ) -> Items<'p, J> {
        let here = self.apply_segment(segment, value, path.clone());
        let this = self.clone();
        let below = children(value, path)
            .flat_map(move |(child, path)| this.descend(segment, child, path));
        Box::new(here.chain(below))
    }

    fn apply_segment<'p, 'a: 'p, J: JsonRef<'a>>(
        &self,
        segment: &'p Segment,
        value: J,
        path: Path,
    ) -> Items<'p, J> {
        match segment {
            Segment::This => once(value, path),
            Segment::Identifier(name) => match value.as_object().and_then(|o| o.get(name)) {
                Some(member) => once(member, child_path(&path, PathSegment::Field(name.clone()))),
                None => empty(),
            },
            Segment::Wildcard => Box::new(children(value, path).map(|(v, p)| Item::Node(v, p))),
            Segment::Subscript(elements) => {
                let this = self.clone();
                Box::new(
                    elements
                        .iter()
                        .flat_map(move |element| this.apply_element(element, value, path.clone())),
                )
            }
        }
    }

    fn apply_element<'p, 'a: 'p, J: JsonRef<'a>>(
        &self,
        element: &'p SubscriptElement,
        value: J,
        path: Path,
    ) -> Items<'p, J> {
        match element {
            SubscriptElement::Slice { start, end } => {
                let Some(array) = value.as_array() else {
                    return empty();
                };
                let len = array.len();
                let start = resolve_bound(*start, 0, len);
                let end = resolve_bound(*end, len, len);
                Box::new(
                    (start..end)
                        .filter_map(move |i| element_at(array, i, &path))
                        .map(|(v, p)| Item::Node(v, p)),
                )
            }
            SubscriptElement::Comparison { left, op, right } => {
                self.filter(left, *op, right, value, path)
            }
            SubscriptElement::Existence(node) => {
                let Some(array) = value.as_array() else {
                    if self.resolves(node, value) {
                        return once(value, path);
                    }
                    return empty();
                };
                let this = self.clone();
                Box::new(
                    array_elements(array, path)
                        .filter(move |(v, _)| this.resolves(node, *v))
                        .map(|(v, p)| Item::Node(v, p)),
                )
            }
            SubscriptElement::Expr(Expr::Number(n)) => {
                let Some(array) = value.as_array() else {
                    return empty();
                };
                match resolve_index(*n, array.len()).and_then(|i| element_at(array, i, &path)) {
                    Some((v, p)) => once(v, p),
                    None => empty(),
                }
            }
            SubscriptElement::Expr(expr) => self.eval_expr(expr, value, path),
        }
    }

    /// Keeps `value` if the comparison holds for it.
    ///
    /// On an array, the comparison is applied to each element instead.
    fn filter<'p, 'a: 'p, J: JsonRef<'a>>(
        &self,
        left: &'p Expr,
        op: CompareOp,
        right: &'p Expr,
        value: J,
        path: Path,
    ) -> Items<'p, J> {
        let Some(array) = value.as_array() else {
            if self.holds(left, op, right, value) {
                return once(value, path);
            }
            return empty();
        };
        if let Some(key) = key_lookup(left, op, right) {
            return match self.cache.lookup(array, key) {
                Some((_, item)) => once(item, child_path(&path, PathSegment::key(key))),
                None => empty(),
            };
        }
        let this = self.clone();
        Box::new(
            array_elements(array, path).flat_map(move |(v, p)| this.filter(left, op, right, v, p)),
        )
    }

    /// Evaluates both operands against `value` and compares their first items.
    fn holds<'p, 'a: 'p, J: JsonRef<'a>>(
        &self,
        left: &'p Expr,
        op: CompareOp,
        right: &'p Expr,
        value: J,
    ) -> bool {
        let Some(left) = self.operand(left, value) else {
            return false;
        };
        let Some(right) = self.operand(right, value) else {
            return false;
        };
        compare(op, &left, &right)
    }

    fn operand<'p, 'a: 'p, J: JsonRef<'a>>(
        &self,
        expr: &'p Expr,
        value: J,
    ) -> Option<Scalar<'p>> {
        // the locations of operands are never reported
        match self.eval_expr(expr, value, Path::new()).next()? {
            Item::Node(value, _) => Some(Scalar::from_json(value)),
            Item::Literal(literal) => Scalar::from_literal(literal),
        }
    }

    /// Returns true if the path produces at least one item from `value`.
    fn resolves<'p, 'a: 'p, J: JsonRef<'a>>(&self, node: &'p PathNode, value: J) -> bool {
        self.eval_path(node, value, Path::new()).next().is_some()
    }
}

/// Returns the string of a `_key == "..."` comparison.
fn key_lookup<'a>(left: &'a Expr, op: CompareOp, right: &'a Expr) -> Option<&'a str> {
    if op != CompareOp::Eq {
        return None;
    }
    match (left, right) {
        (Expr::Path(path), Expr::String(key)) | (Expr::String(key), Expr::Path(path))
            if path.is_key_field() =>
        {
            Some(key.as_str())
        }
        _ => None,
    }
}

/// A comparison operand.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    /// Arrays and objects compare by identity.
    Array(usize),
    Object(usize),
}

impl<'a> Scalar<'a> {
    fn from_json<J: JsonRef<'a>>(value: J) -> Self {
        if value.is_null() {
            Self::Null
        } else if let Some(b) = value.as_bool() {
            Self::Bool(b)
        } else if let Some(n) = value.as_f64() {
            Self::Number(n)
        } else if let Some(s) = value.as_str() {
            Self::String(s)
        } else if let Some(array) = value.as_array() {
            Self::Array(array.identity())
        } else if let Some(object) = value.as_object() {
            Self::Object(object.identity())
        } else {
            // numbers beyond f64
            Self::Null
        }
    }

    fn from_literal(expr: &'a Expr) -> Option<Self> {
        match expr {
            Expr::Number(n) => Some(Self::Number(*n)),
            Expr::String(s) => Some(Self::String(s.as_str())),
            Expr::Boolean(b) => Some(Self::Bool(*b)),
            Expr::Path(_) => None,
        }
    }
}

/// Compares two operands without type coercion.
///
/// Ordering is only defined between numbers.
fn compare(op: CompareOp, left: &Scalar<'_>, right: &Scalar<'_>) -> bool {
    match (op, left, right) {
        (CompareOp::Eq, l, r) => l == r,
        (CompareOp::Ne, l, r) => l != r,
        (CompareOp::Lt, Scalar::Number(l), Scalar::Number(r)) => l < r,
        (CompareOp::Le, Scalar::Number(l), Scalar::Number(r)) => l <= r,
        (CompareOp::Gt, Scalar::Number(l), Scalar::Number(r)) => l > r,
        (CompareOp::Ge, Scalar::Number(l), Scalar::Number(r)) => l >= r,
        _ => false,
    }
}

fn child_path(path: &Path, segment: PathSegment) -> Path {
    let mut path = path.clone();
    path.push(segment);
    path
}

/// Returns the element at `index`, addressed by its `_key` if it has one.
fn element_at<'a, A: ArrayRef<'a>>(
    array: A,
    index: usize,
    path: &Path,
) -> Option<(A::JsonRef, Path)> {
    let value = array.get(index)?;
    let segment = match value.item_key() {
        Some(key) => PathSegment::key(key),
        None => PathSegment::Index(index),
    };
    Some((value, child_path(path, segment)))
}

/// Returns all elements of an array in index order.
fn array_elements<'a, A: ArrayRef<'a>>(
    array: A,
    path: Path,
) -> impl Iterator<Item = (A::JsonRef, Path)> + 'a {
    (0..array.len()).filter_map(move |i| element_at(array, i, &path))
}

/// Returns the array elements or object members of `value`.
fn children<'a, J: JsonRef<'a>>(
    value: J,
    path: Path,
) -> Box<dyn Iterator<Item = (J, Path)> + 'a> {
    if let Some(array) = value.as_array() {
        Box::new(array_elements(array, path))
    } else if let Some(object) = value.as_object() {
        Box::new(object.entries().map(move |(name, member)| {
            (member, child_path(&path, PathSegment::Field(name.to_owned())))
        }))
    } else {
        Box::new(iter::empty())
    }
}

/// Resolves a slice bound: negatives count from the end, then clamp to `[0, len]`.
fn resolve_bound(bound: Option<i64>, default: usize, len: usize) -> usize {
    let Some(bound) = bound else {
        return default;
    };
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let bound = if bound < 0 {
        bound.saturating_add(len)
    } else {
        bound
    };
    // in [0, len], so the conversion back cannot fail
    usize::try_from(bound.clamp(0, len)).unwrap_or_default()
}

/// Resolves an index literal. Non-integral and out of range indices select nothing.
fn resolve_index(n: f64, len: usize) -> Option<usize> {
    if n.fract() != 0.0 || !n.is_finite() {
        return None;
    }
    let len = i64::try_from(len).ok()?;
    // saturating cast
    let index = n as i64;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}
