//! Extraction function registry
//!
//! Maps an [`ExtractionKind`] to a factory. A factory receives the static
//! arguments recorded by the parameter decorator and returns an extractor;
//! the extractor receives the raw invocation arguments and returns the
//! derived value for one parameter.
//!
//! Lookups are late-bound: a kind only has to be registered before the first
//! call that needs it, never before the class is declared.
//!
//! # Example
//!
//! ```
//! use decorum_core::extractors::{self, ExtractorRegistry};
//! use decorum_core::params::ExtractionKind;
//! use decorum_core::value::Value;
//!
//! let registry = ExtractorRegistry::new();
//! registry.register(
//!     ExtractionKind::QueryParam,
//!     extractors::factory(|static_args| {
//!         let key = static_args[0].downcast::<String>()?;
//!         Ok(extractors::extractor(move |raw| {
//!             Ok(Value::from(format!("{}={}", key, raw.len())))
//!         }))
//!     }),
//! );
//!
//! let factory = registry.lookup(&ExtractionKind::QueryParam)?;
//! let extractor = factory(&[Value::from("page")])?;
//! let derived = extractor(&[Value::unit(), Value::unit()])?;
//! assert_eq!(derived.downcast::<String>()?, "page=2");
//! # Ok::<(), decorum_core::Error>(())
//! ```

use crate::logging::{debug, trace};
use crate::params::ExtractionKind;
use crate::value::Value;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-call function deriving one value from the raw invocation arguments.
pub type Extractor = Box<dyn Fn(&[Value]) -> Result<Value> + Send>;

/// Builds an [`Extractor`] from a descriptor's static arguments.
pub type Factory = Arc<dyn Fn(&[Value]) -> Result<Extractor> + Send + Sync>;

static GLOBAL: Lazy<ExtractorRegistry> = Lazy::new(ExtractorRegistry::new);

/// Shared table of extraction factories.
///
/// Cloning yields another handle onto the same table.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    factories: Arc<RwLock<HashMap<ExtractionKind, Factory>>>,
}

impl ExtractorRegistry {
    /// A fresh, empty table independent of the global one
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle onto the process-wide table
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// Register `factory` for `kind`, replacing any previous one.
    pub fn register(&self, kind: impl Into<ExtractionKind>, factory: Factory) {
        let kind = kind.into();
        debug!(kind = %kind, "Registering extraction factory");
        self.factories.write().insert(kind, factory);
    }

    /// Drop every registration.
    pub fn reset(&self) {
        let mut factories = self.factories.write();
        let count = factories.len();
        factories.clear();
        debug!(factory_count = count, "Cleared extraction factories");
    }

    pub fn lookup(&self, kind: &ExtractionKind) -> Result<Factory> {
        let found = self.factories.read().get(kind).cloned();
        trace!(kind = %kind, found = found.is_some(), "Looked up extraction factory");
        found.ok_or_else(|| Error::UnresolvedExtraction(kind.to_string()))
    }

    pub fn contains(&self, kind: &ExtractionKind) -> bool {
        self.factories.read().contains_key(kind)
    }

    /// Registered kinds, in no particular order
    pub fn kinds(&self) -> Vec<ExtractionKind> {
        self.factories.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }

    /// Whether both handles share one table.
    pub fn same_table(&self, other: &ExtractorRegistry) -> bool {
        Arc::ptr_eq(&self.factories, &other.factories)
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.kinds().iter().map(ToString::to_string).collect();
        kinds.sort();
        f.debug_struct("ExtractorRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

/// Register a factory in the global table.
pub fn register(kind: impl Into<ExtractionKind>, factory: Factory) {
    GLOBAL.register(kind, factory);
}

/// Clear the global table.
pub fn reset() {
    GLOBAL.reset();
}

/// Wrap a closure as a [`Factory`].
pub fn factory<F>(f: F) -> Factory
where
    F: Fn(&[Value]) -> Result<Extractor> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as an [`Extractor`].
pub fn extractor<F>(f: F) -> Extractor
where
    F: Fn(&[Value]) -> Result<Value> + Send + 'static,
{
    Box::new(f)
}

/// Factory whose extractor ignores its inputs and yields `value`.
pub fn constant(value: Value) -> Factory {
    factory(move |_static_args| {
        let value = value.clone();
        Ok(extractor(move |_raw| Ok(value.clone())))
    })
}

/// Factory whose extractor returns the raw argument at `position`.
pub fn raw_arg(position: usize) -> Factory {
    factory(move |_static_args| {
        Ok(extractor(move |raw| {
            raw.get(position)
                .cloned()
                .ok_or(Error::MissingArgument(position))
        }))
    })
}
