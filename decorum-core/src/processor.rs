//! Method rewriting
//!
//! An [`Instance`] dispatches calls by method name. Freshly constructed, every
//! entry forwards the raw arguments straight to the method body.
//! [`DecoratorProcessor::apply_decorators`] then swaps each method that has
//! parameter decorators for a wrapper which, on every call, derives the
//! argument list through the [`ExtractorRegistry`] and forwards to the
//! original body, returning its result untouched.
//!
//! # Example
//!
//! ```
//! use decorum_core::extractors::{self, ExtractorRegistry};
//! use decorum_core::params::{self, ExtractionKind};
//! use decorum_core::value::Value;
//! use decorum_core::ClassDef;
//!
//! struct Users;
//!
//! let class = ClassDef::<Users>::new("Users")
//!     .method("show", |_this, args| {
//!         let id: String = args.arg(0)?;
//!         Ok(Value::from(format!("user {}", id)))
//!     })
//!     .param("show", 0, params::request_param("id", vec![])?)?
//!     .build();
//!
//! let registry = ExtractorRegistry::new();
//! registry.register(ExtractionKind::RequestParam, extractors::constant(Value::from("42")));
//!
//! let users = class.instantiate_with(Users, registry)?;
//! let out = users.call("show", &[Value::from("raw request")])?;
//! assert_eq!(out.downcast::<String>()?, "user 42");
//! # Ok::<(), decorum_core::Error>(())
//! ```

use crate::class::{ClassDef, MethodFn};
use crate::extractors::{ExtractorRegistry, Factory};
use crate::logging::{debug, trace};
use crate::params::{ExtractionKind, MethodParamMap};
use crate::routes::RouteDescriptor;
use crate::value::{Args, Value};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A callable bound to one instance, taking the raw invocation arguments.
pub type BoundMethod = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Derive the argument list for one call.
///
/// Positions are visited in ascending order; each is resolved through its
/// kind's factory and the resulting extractor sees the whole raw list.
/// Positions without a descriptor stay empty.
pub fn derive_args(
    params: &MethodParamMap,
    registry: &ExtractorRegistry,
    raw: &[Value],
) -> Result<Args> {
    let mut args = Args::new();
    for (index, descriptor) in params.iter() {
        let factory = registry.lookup(descriptor.kind())?;
        let extractor = factory(descriptor.static_args().unwrap_or(&[]))?;
        let value = extractor(raw)?;
        trace!(
            index,
            kind = %descriptor.kind(),
            value_type = value.type_name(),
            "Derived argument"
        );
        args.set(index, value);
    }
    Ok(args)
}

/// An object built from a [`ClassDef`].
pub struct Instance<T> {
    class: Arc<ClassDef<T>>,
    inner: Arc<T>,
    registry: ExtractorRegistry,
    dispatch: HashMap<String, BoundMethod>,
    decorated: bool,
}

impl<T: Send + Sync + 'static> Instance<T> {
    /// Construct without decorating, resolving extractors globally.
    pub fn new(class: Arc<ClassDef<T>>, inner: T) -> Self {
        Self::with_registry(class, inner, ExtractorRegistry::global())
    }

    /// Construct without decorating, resolving extractors in `registry`.
    pub fn with_registry(class: Arc<ClassDef<T>>, inner: T, registry: ExtractorRegistry) -> Self {
        let inner = Arc::new(inner);
        let dispatch = class
            .metadata()
            .method_names()
            .filter_map(|name| {
                let body = class.method_fn(name)?.clone();
                Some((name.to_string(), bind_plain(&inner, body)))
            })
            .collect();

        Self {
            class,
            inner,
            registry,
            dispatch,
            decorated: false,
        }
    }

    /// Invoke `name` with raw invocation arguments.
    pub fn call(&self, name: &str, raw: &[Value]) -> Result<Value> {
        let method = self
            .dispatch
            .get(name)
            .ok_or_else(|| Error::MethodNotFound(format!("{}::{}", self.class.name(), name)))?;
        method(raw)
    }

    /// The callable currently installed under `name`.
    pub fn method(&self, name: &str) -> Option<BoundMethod> {
        self.dispatch.get(name).cloned()
    }

    pub fn class(&self) -> &Arc<ClassDef<T>> {
        &self.class
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn is_decorated(&self) -> bool {
        self.decorated
    }

    /// The class route list, `None` unless controller-annotated
    pub fn routes(&self) -> Option<&[RouteDescriptor]> {
        self.class.routes()
    }
}

impl<T> Deref for Instance<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("decorated", &self.decorated)
            .finish()
    }
}

fn bind_plain<T: Send + Sync + 'static>(inner: &Arc<T>, body: MethodFn<T>) -> BoundMethod {
    let inner = Arc::clone(inner);
    Arc::new(move |raw: &[Value]| body(&inner, Args::from_raw(raw)))
}

fn bind_decorated<T: Send + Sync + 'static>(
    inner: &Arc<T>,
    body: MethodFn<T>,
    params: MethodParamMap,
    registry: ExtractorRegistry,
) -> BoundMethod {
    let inner = Arc::clone(inner);
    Arc::new(move |raw: &[Value]| {
        let args = derive_args(&params, &registry, raw)?;
        body(&inner, args)
    })
}

/// Installs argument-deriving wrappers on instances.
pub struct DecoratorProcessor;

impl DecoratorProcessor {
    /// Wrap every method of `instance` that carries parameter decorators.
    ///
    /// Must run once per instance, before annotated methods are called;
    /// a second run fails with [`Error::AlreadyDecorated`].
    pub fn apply_decorators<T: Send + Sync + 'static>(instance: &mut Instance<T>) -> Result<()> {
        if instance.decorated {
            return Err(Error::AlreadyDecorated(instance.class.name().to_string()));
        }

        let class = Arc::clone(&instance.class);
        let params = class.metadata().params();
        for name in params.method_names() {
            let (Some(map), Some(body)) = (params.method(name), class.method_fn(name)) else {
                continue;
            };
            debug!(
                class = class.name(),
                method = name,
                params = map.len(),
                "Installing decorated method"
            );
            let wrapper = bind_decorated(
                &instance.inner,
                body.clone(),
                map.clone(),
                instance.registry.clone(),
            );
            instance.dispatch.insert(name.to_string(), wrapper);
        }

        instance.decorated = true;
        Ok(())
    }

    /// Register a factory in the global extractor table.
    pub fn register_processor_function(kind: impl Into<ExtractionKind>, factory: Factory) {
        ExtractorRegistry::global().register(kind, factory);
    }

    /// Clear the global extractor table.
    pub fn reset() {
        ExtractorRegistry::global().reset();
    }
}

impl<T: Send + Sync + 'static> ClassDef<T> {
    /// Construct an instance and decorate it, using the global registry.
    pub fn instantiate(self: &Arc<Self>, inner: T) -> Result<Instance<T>> {
        self.instantiate_with(inner, ExtractorRegistry::global())
    }

    /// Construct an instance and decorate it, using `registry`.
    pub fn instantiate_with(
        self: &Arc<Self>,
        inner: T,
        registry: ExtractorRegistry,
    ) -> Result<Instance<T>> {
        let mut instance = Instance::with_registry(Arc::clone(self), inner, registry);
        DecoratorProcessor::apply_decorators(&mut instance)?;
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{constant, extractor, factory, raw_arg};
    use crate::params::{body, next, query_param, request, request_param};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
    }

    fn echo_args(this: &Recorder, args: Args) -> Result<Value> {
        this.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Value::new(args))
    }

    #[test]
    fn test_undecorated_methods_receive_raw_args() {
        let class = ClassDef::<Recorder>::new("Recorder")
            .method("plain", echo_args)
            .build();
        let instance = class.instantiate_with(Recorder::default(), ExtractorRegistry::new()).unwrap();

        let out = instance.call("plain", &[Value::from("a"), Value::from("b")]).unwrap();
        let args = out.downcast_ref::<Args>().unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args.arg::<String>(1).unwrap(), "b");
    }

    #[test]
    fn test_positions_keep_their_kinds() {
        let class = ClassDef::<Recorder>::new("Recorder")
            .method("handle", echo_args)
            .param("handle", 2, body())
            .unwrap()
            .param("handle", 0, next())
            .unwrap()
            .param("handle", 1, request())
            .unwrap()
            .build();

        let registry = ExtractorRegistry::new();
        registry.register(ExtractionKind::Next, constant(Value::from("next")));
        registry.register(ExtractionKind::Request, constant(Value::from("req")));
        registry.register(ExtractionKind::RequestBody, constant(Value::from("body")));

        let instance = class.instantiate_with(Recorder::default(), registry).unwrap();
        let out = instance.call("handle", &[]).unwrap();
        let args = out.downcast_ref::<Args>().unwrap();
        assert_eq!(args.arg::<String>(0).unwrap(), "next");
        assert_eq!(args.arg::<String>(1).unwrap(), "req");
        assert_eq!(args.arg::<String>(2).unwrap(), "body");
    }

    #[test]
    fn test_unannotated_position_is_a_hole() {
        let class = ClassDef::<Recorder>::new("Recorder")
            .method("handle", echo_args)
            .param("handle", 1, body())
            .unwrap()
            .build();
        let registry = ExtractorRegistry::new();
        registry.register(ExtractionKind::RequestBody, raw_arg(0));

        let instance = class.instantiate_with(Recorder::default(), registry).unwrap();
        let out = instance.call("handle", &[Value::from("raw0"), Value::from("raw1")]).unwrap();
        let args = out.downcast_ref::<Args>().unwrap();
        assert_eq!(args.len(), 2);
        assert!(args.get(0).is_none());
        assert_eq!(args.arg::<String>(1).unwrap(), "raw0");
    }

    #[test]
    fn test_static_args_reach_the_factory_and_raw_args_the_extractor() {
        let class = ClassDef::<Recorder>::new("Recorder")
            .method("search", echo_args)
            .param("search", 0, query_param("q", vec![]).unwrap())
            .unwrap()
            .build();

        let registry = ExtractorRegistry::new();
        registry.register(
            ExtractionKind::QueryParam,
            factory(|static_args| {
                let key = static_args[0].downcast::<String>()?;
                Ok(extractor(move |raw| {
                    let query = raw[0].downcast_ref::<HashMap<String, String>>().ok_or_else(
                        || Error::Extraction("request is not a query map".into()),
                    )?;
                    Ok(Value::new(query.get(&key).cloned()))
                }))
            }),
        );

        let query: HashMap<String, String> = [("q".to_string(), "rust".to_string())].into();
        let instance = class.instantiate_with(Recorder::default(), registry).unwrap();
        let out = instance.call("search", &[Value::new(query)]).unwrap();
        let args = out.downcast_ref::<Args>().unwrap();
        assert_eq!(args.arg::<Option<String>>(0).unwrap(), Some("rust".to_string()));
    }

    #[test]
    fn test_missing_factory_fails_at_call_time() {
        let class = ClassDef::<Recorder>::new("Recorder")
            .method("show", echo_args)
            .param("show", 0, request_param("id", vec![]).unwrap())
            .unwrap()
            .build();

        // declaring and instantiating succeed with an empty registry
        let instance = class.instantiate_with(Recorder::default(), ExtractorRegistry::new()).unwrap();
        let err = instance.call("show", &[]).unwrap_err();
        assert_eq!(err, Error::UnresolvedExtraction("__requestparam__".into()));
        assert_eq!(instance.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registration_after_instantiation_is_seen() {
        let class = ClassDef::<Recorder>::new("Recorder")
            .method("show", echo_args)
            .param("show", 0, body())
            .unwrap()
            .build();
        let registry = ExtractorRegistry::new();
        let instance = class.instantiate_with(Recorder::default(), registry.clone()).unwrap();

        assert!(instance.call("show", &[]).unwrap_err().is_unresolved());
        registry.register(ExtractionKind::RequestBody, constant(Value::from(true)));
        assert!(instance.call("show", &[]).is_ok());
    }

    #[test]
    fn test_errors_pass_through_untouched() {
        let class = ClassDef::<Recorder>::new("Recorder")
            .method("fails", |_, _| Err(Error::Application("boom".into())))
            .param("fails", 0, body())
            .unwrap()
            .method("bad_extract", echo_args)
            .param("bad_extract", 0, next())
            .unwrap()
            .build();

        let registry = ExtractorRegistry::new();
        registry.register(ExtractionKind::RequestBody, constant(Value::unit()));
        registry.register(
            ExtractionKind::Next,
            factory(|_| Err(Error::Validation("factory refused".into()))),
        );

        let instance = class.instantiate_with(Recorder::default(), registry).unwrap();
        assert_eq!(
            instance.call("fails", &[]).unwrap_err(),
            Error::Application("boom".into())
        );
        assert_eq!(
            instance.call("bad_extract", &[]).unwrap_err(),
            Error::Validation("factory refused".into())
        );
    }

    #[test]
    fn test_second_application_fails_fast() {
        let class = ClassDef::<Recorder>::new("Recorder")
            .method("show", echo_args)
            .param("show", 0, body())
            .unwrap()
            .build();
        let mut instance = class.instantiate_with(Recorder::default(), ExtractorRegistry::new()).unwrap();
        assert!(instance.is_decorated());

        let err = DecoratorProcessor::apply_decorators(&mut instance).unwrap_err();
        assert_eq!(err, Error::AlreadyDecorated("Recorder".into()));

        // the installed wrapper survives the rejected second pass
        assert!(instance.is_decorated());
        instance.registry().register(ExtractionKind::RequestBody, constant(Value::from("b")));
        let out = instance.call("show", &[Value::from("raw")]).unwrap();
        let args = out.downcast_ref::<Args>().unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args.arg::<String>(0).unwrap(), "b");
        assert_eq!(instance.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_method() {
        let class = ClassDef::<Recorder>::new("Recorder").build();
        let instance = Instance::with_registry(class, Recorder::default(), ExtractorRegistry::new());
        assert_eq!(
            instance.call("nope", &[]).unwrap_err(),
            Error::MethodNotFound("Recorder::nope".into())
        );
        assert!(!instance.is_decorated());
    }

    #[test]
    fn test_wrapper_is_bound_to_its_instance() {
        let class = ClassDef::<Recorder>::new("Recorder")
            .method("show", echo_args)
            .param("show", 0, body())
            .unwrap()
            .build();
        let registry = ExtractorRegistry::new();
        registry.register(ExtractionKind::RequestBody, constant(Value::unit()));

        let first = class.instantiate_with(Recorder::default(), registry.clone()).unwrap();
        let second = class.instantiate_with(Recorder::default(), registry).unwrap();
        let detached = first.method("show").unwrap();
        detached(&[]).unwrap();
        detached(&[]).unwrap();

        assert_eq!(first.calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }
}
