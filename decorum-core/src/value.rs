//! Type-erased values flowing through decorated methods
//!
//! Raw invocation arguments (a request, a response, a continuation) and the
//! values derived from them are opaque to the engine. They travel as
//! [`Value`], a cheap-to-clone handle over any `Send + Sync` type, and are
//! recovered by downcasting at the edges.
//!
//! ```
//! use decorum_core::value::{Args, Value};
//!
//! let raw = vec![Value::from("alice"), Value::new(42_i64)];
//! assert_eq!(raw[0].downcast_ref::<String>().map(String::as_str), Some("alice"));
//!
//! let mut args = Args::new();
//! args.set(1, Value::new(7_u32));
//! assert!(args.get(0).is_none());
//! assert_eq!(args.arg::<u32>(1).unwrap(), 7);
//! ```

use crate::{Error, Result};
use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An opaque, shareable value.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wrap any value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// The empty value returned by methods with nothing to say.
    pub fn unit() -> Self {
        Self::new(())
    }

    pub fn is_unit(&self) -> bool {
        self.is::<()>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Clone the inner value out, failing with [`Error::TypeMismatch`]
    pub fn downcast<T: Any + Clone>(&self) -> Result<T> {
        self.downcast_ref::<T>()
            .cloned()
            .ok_or(Error::TypeMismatch {
                expected: type_name::<T>(),
                found: self.type_name,
            })
    }

    /// Name of the wrapped type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.downcast_ref::<String>() {
            return f.debug_tuple("Value").field(s).finish();
        }
        if let Some(json) = self.downcast_ref::<serde_json::Value>() {
            return f.debug_tuple("Value").field(json).finish();
        }
        write!(f, "Value(<{}>)", self.type_name)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::new(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::new(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::new(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::new(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::new(value)
    }
}

/// The derived argument list passed to an original method.
///
/// Positions are assigned explicitly and stored sparsely; a position nobody
/// filled is a hole and reads back as `None`.
#[derive(Clone, Debug, Default)]
pub struct Args {
    slots: BTreeMap<usize, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Argument list with one filled slot per raw value
    pub fn from_raw(raw: &[Value]) -> Self {
        Self {
            slots: raw.iter().cloned().enumerate().collect(),
        }
    }

    /// Place `value` at `position`, replacing what was there.
    pub fn set(&mut self, position: usize, value: Value) {
        self.slots.insert(position, value);
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.slots.get(&position)
    }

    /// Downcast the value at `position`
    pub fn arg<T: Any + Clone>(&self, position: usize) -> Result<T> {
        self.get(position)
            .ok_or(Error::MissingArgument(position))?
            .downcast::<T>()
    }

    /// One past the highest filled position, saturating at `usize::MAX`
    pub fn len(&self) -> usize {
        self.slots
            .last_key_value()
            .map_or(0, |(position, _)| position.saturating_add(1))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Filled positions in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.slots.iter().map(|(position, value)| (*position, value))
    }
}
