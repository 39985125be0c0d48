//! Abstraction over JSON documents.
//!
//! This module provides several traits to abstract over borrowed JSON values.
//!
//! - [`JsonRef`]: A trait for borrowed JSON values.
//! - [`ArrayRef`]: A trait for borrowed JSON arrays.
//! - [`ObjectRef`]: A trait for borrowed JSON objects.
//!
//! Matches returned by a query are values of the [`JsonRef`] type, so they
//! always point into the queried document.

use ::serde_json::Number;
use std::fmt::Debug;

mod serde_json;
#[cfg(feature = "simd-json")]
mod simd_json;

/// The field that gives an array element a stable identity.
pub const KEY_FIELD: &str = "_key";

/// A trait for borrowed JSON values.
pub trait JsonRef<'a>: Copy + Debug + 'a {
    /// The type of borrowed JSON arrays.
    type Array: ArrayRef<'a, JsonRef = Self>;

    /// The type of borrowed JSON objects.
    type Object: ObjectRef<'a, JsonRef = Self>;

    /// If the JSON is a boolean, returns the associated bool. Returns `None` otherwise.
    fn as_bool(self) -> Option<bool>;

    /// If the JSON is a number, returns the associated number. Returns `None` otherwise.
    fn as_number(self) -> Option<Number>;

    /// If the JSON is a string, returns the associated string. Returns `None` otherwise.
    fn as_str(self) -> Option<&'a str>;

    /// If the JSON is an array, returns the associated array. Returns `None` otherwise.
    fn as_array(self) -> Option<Self::Array>;

    /// If the JSON is an object, returns the associated object. Returns `None` otherwise.
    fn as_object(self) -> Option<Self::Object>;

    /// Returns `true` if the value is null.
    fn is_null(self) -> bool;

    /// If the JSON is a number, returns it as a double. Returns `None` otherwise.
    fn as_f64(self) -> Option<f64> {
        self.as_number().and_then(|n| n.as_f64())
    }

    /// Returns the string-valued `_key` field of an object.
    fn item_key(self) -> Option<&'a str> {
        self.as_object()?.get(KEY_FIELD)?.as_str()
    }
}

/// A trait for borrowed JSON arrays.
pub trait ArrayRef<'a>: Copy + 'a {
    /// The type of borrowed JSON values.
    type JsonRef: JsonRef<'a>;

    /// Returns the length of the array.
    fn len(self) -> usize;

    /// Returns the value at the given index.
    fn get(self, index: usize) -> Option<Self::JsonRef>;

    /// Returns a value identifying this array within its document.
    ///
    /// Two references to the same array return the same identity.
    fn identity(self) -> usize;
}

/// A trait for borrowed JSON objects.
pub trait ObjectRef<'a>: Copy + 'a {
    /// The type of borrowed JSON values.
    type JsonRef: JsonRef<'a>;

    /// Returns the value associated with the given key.
    fn get(self, key: &str) -> Option<Self::JsonRef>;

    /// Returns all fields in the object's iteration order.
    fn entries(self) -> Box<dyn Iterator<Item = (&'a str, Self::JsonRef)> + 'a>;

    /// Returns a value identifying this object within its document.
    fn identity(self) -> usize;
}
