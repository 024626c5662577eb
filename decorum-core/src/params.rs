//! Parameter annotations
//!
//! A parameter decorator records, for one position of one method, which
//! extraction kind derives that argument and which static arguments (a lookup
//! key, a list of validators) were given at declaration time.
//!
//! # Example
//!
//! ```
//! use decorum_core::params::{body, query_param, ExtractionKind};
//! use decorum_core::ClassDef;
//! use decorum_core::value::Value;
//!
//! struct Users;
//!
//! let class = ClassDef::<Users>::new("Users")
//!     .method("search", |_this, _args| Ok(Value::unit()))
//!     .param("search", 0, query_param("q", vec![])?)?
//!     .param("search", 1, body())?
//!     .build();
//!
//! let map = class.metadata().params().method("search").unwrap();
//! assert_eq!(map.get(0).unwrap().kind(), &ExtractionKind::QueryParam);
//! assert_eq!(map.get(0).unwrap().lookup_key(), Some("q"));
//! # Ok::<(), decorum_core::Error>(())
//! ```

use crate::decorator::{Decorator, Target, expect_parameter};
use crate::logging::debug;
use crate::metadata::ClassMetadata;
use crate::value::Value;
use crate::{Error, Result};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Identifies the strategy that turns raw invocation arguments into one
/// derived parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExtractionKind {
    /// A named request (path) parameter
    RequestParam,
    /// The request body
    RequestBody,
    /// A named query-string parameter
    QueryParam,
    /// The continuation callback
    Next,
    Response,
    Request,
    /// Host-defined kind
    Custom(Cow<'static, str>),
}

impl ExtractionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ExtractionKind::RequestParam => "__requestparam__",
            ExtractionKind::RequestBody => "__body__",
            ExtractionKind::QueryParam => "__queryparam__",
            ExtractionKind::Next => "__next__",
            ExtractionKind::Response => "__response__",
            ExtractionKind::Request => "__request__",
            ExtractionKind::Custom(name) => name,
        }
    }

    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        ExtractionKind::from_tag(name.into())
    }

    fn from_tag(tag: Cow<'static, str>) -> Self {
        match tag.as_ref() {
            "__requestparam__" => ExtractionKind::RequestParam,
            "__body__" => ExtractionKind::RequestBody,
            "__queryparam__" => ExtractionKind::QueryParam,
            "__next__" => ExtractionKind::Next,
            "__response__" => ExtractionKind::Response,
            "__request__" => ExtractionKind::Request,
            _ => ExtractionKind::Custom(tag),
        }
    }
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for ExtractionKind {
    fn from(tag: &'static str) -> Self {
        ExtractionKind::from_tag(Cow::Borrowed(tag))
    }
}

impl From<String> for ExtractionKind {
    fn from(tag: String) -> Self {
        ExtractionKind::from_tag(Cow::Owned(tag))
    }
}

/// Validator attached to a keyed parameter. Carried for the extraction
/// function; the engine never calls it.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>);

impl Validator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// What was declared at one parameter position.
#[derive(Clone, Debug)]
pub struct ParamDescriptor {
    kind: ExtractionKind,
    static_args: Option<Vec<Value>>,
}

impl ParamDescriptor {
    pub fn new(kind: ExtractionKind, static_args: Option<Vec<Value>>) -> Self {
        Self { kind, static_args }
    }

    pub fn kind(&self) -> &ExtractionKind {
        &self.kind
    }

    pub fn static_args(&self) -> Option<&[Value]> {
        self.static_args.as_deref()
    }

    /// Lookup key of a keyed kind (first static argument)
    pub fn lookup_key(&self) -> Option<&str> {
        self.static_args()?
            .first()?
            .downcast_ref::<String>()
            .map(String::as_str)
    }

    /// Validators of a keyed kind (second static argument)
    pub fn validators(&self) -> &[Validator] {
        self.static_args()
            .and_then(|args| args.get(1))
            .and_then(|v| v.downcast_ref::<Vec<Validator>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Descriptors of one method, keyed by parameter position.
#[derive(Clone, Debug, Default)]
pub struct MethodParamMap {
    positions: BTreeMap<usize, ParamDescriptor>,
}

impl MethodParamMap {
    /// Record a descriptor; replaces only what was at `index`.
    pub fn insert(&mut self, index: usize, descriptor: ParamDescriptor) {
        self.positions.insert(index, descriptor);
    }

    pub fn get(&self, index: usize) -> Option<&ParamDescriptor> {
        self.positions.get(&index)
    }

    /// Positions in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ParamDescriptor)> {
        self.positions.iter().map(|(index, d)| (*index, d))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Per-class registry: method name to its parameter map.
#[derive(Clone, Debug, Default)]
pub struct ParamRegistry {
    methods: HashMap<String, MethodParamMap>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one descriptor into `method`'s map, creating it lazily.
    pub fn set(&mut self, method: &str, index: usize, descriptor: ParamDescriptor) {
        self.methods
            .entry(method.to_string())
            .or_default()
            .insert(index, descriptor);
    }

    pub fn method(&self, method: &str) -> Option<&MethodParamMap> {
        self.methods.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A parameter decorator ready to be declared on a method parameter.
#[derive(Clone, Debug)]
pub struct ParamDecorator {
    label: &'static str,
    descriptor: ParamDescriptor,
}

impl ParamDecorator {
    /// Decorator for a host-defined extraction kind.
    pub fn custom(kind: impl Into<ExtractionKind>, static_args: Option<Vec<Value>>) -> Self {
        Self {
            label: "@Custom(...)",
            descriptor: ParamDescriptor::new(kind.into(), static_args),
        }
    }

    pub fn descriptor(&self) -> &ParamDescriptor {
        &self.descriptor
    }

    fn keyed(
        label: &'static str,
        kind: ExtractionKind,
        what: &str,
        key: &str,
        validators: Vec<Validator>,
    ) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::declaration(format!(
                "A name must be defined for the {} parameter",
                what
            )));
        }
        Ok(Self {
            label,
            descriptor: ParamDescriptor::new(
                kind,
                Some(vec![Value::from(key), Value::new(validators)]),
            ),
        })
    }

    fn bare(label: &'static str, kind: ExtractionKind) -> Self {
        Self {
            label,
            descriptor: ParamDescriptor::new(kind, None),
        }
    }
}

impl Decorator for ParamDecorator {
    fn label(&self) -> String {
        self.label.to_string()
    }

    fn apply(self, meta: &mut ClassMetadata, target: Target<'_>) -> Result<()> {
        let (method, index) = expect_parameter(meta, target, self.label)?;
        debug!(
            class = meta.class_name(),
            method,
            index,
            kind = %self.descriptor.kind,
            "Recording parameter decorator"
        );
        meta.params_mut().set(method, index, self.descriptor);
        Ok(())
    }
}

/// Derive the argument from a named request parameter.
pub fn request_param(key: &str, validators: Vec<Validator>) -> Result<ParamDecorator> {
    ParamDecorator::keyed(
        "@RequestParam(...)",
        ExtractionKind::RequestParam,
        "Request",
        key,
        validators,
    )
}

/// Derive the argument from a named query-string parameter.
pub fn query_param(key: &str, validators: Vec<Validator>) -> Result<ParamDecorator> {
    ParamDecorator::keyed(
        "@QueryParam(...)",
        ExtractionKind::QueryParam,
        "Query",
        key,
        validators,
    )
}

pub fn body() -> ParamDecorator {
    ParamDecorator::bare("@Body()", ExtractionKind::RequestBody)
}

pub fn next() -> ParamDecorator {
    ParamDecorator::bare("@Next()", ExtractionKind::Next)
}

pub fn request() -> ParamDecorator {
    ParamDecorator::bare("@Request()", ExtractionKind::Request)
}

pub fn response() -> ParamDecorator {
    ParamDecorator::bare("@Response()", ExtractionKind::Response)
}
