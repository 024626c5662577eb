//! Class definitions
//!
//! A [`ClassDef`] stands in for a decorated class: it owns the method bodies
//! in declaration order and the [`ClassMetadata`] side table decorators
//! write into. Decorators are applied right after the methods they target
//! are declared, and any declaration error aborts the definition.
//!
//! ```
//! use decorum_core::{params, routes, route_args, ClassDef, Target};
//! use decorum_core::value::Value;
//!
//! #[derive(Default)]
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let class = ClassDef::<Greeter>::new("Greeter")
//!     .method("greet", |this, args| {
//!         let name: String = args.arg(0)?;
//!         Ok(Value::from(format!("{}, {}", this.greeting, name)))
//!     })
//!     .decorate(Target::Parameter { method: "greet", index: 0 }, params::query_param("name", vec![])?)?
//!     .route("greet", routes::get(route_args!["/greet"])?)?
//!     .controller(routes::controller(route_args![])?)?
//!     .build();
//!
//! assert_eq!(class.name(), "Greeter");
//! assert_eq!(class.routes().unwrap()[0].url, "/greet");
//! # Ok::<(), decorum_core::Error>(())
//! ```

use crate::decorator::{Decorator, Target};
use crate::logging::debug;
use crate::metadata::ClassMetadata;
use crate::params::ParamDecorator;
use crate::routes::{ControllerDecorator, RouteDecorator, RouteDescriptor};
use crate::value::{Args, Value};
use crate::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Body of a declared method: receives the instance and its arguments.
pub type MethodFn<T> = Arc<dyn Fn(&T, Args) -> Result<Value> + Send + Sync>;

/// A class: method bodies plus decorator metadata.
pub struct ClassDef<T> {
    meta: ClassMetadata,
    methods: HashMap<String, MethodFn<T>>,
}

impl<T: 'static> ClassDef<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ClassMetadata::new(name),
            methods: HashMap::new(),
        }
    }

    /// Declare a method. Redeclaring a name replaces its body but keeps its
    /// place in declaration order.
    pub fn method<F>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(&T, Args) -> Result<Value> + Send + Sync + 'static,
    {
        debug!(class = self.meta.class_name(), method = name, "Declaring method");
        self.meta.declare_method(name);
        self.methods.insert(name.to_string(), Arc::new(body));
        self
    }

    /// Apply any decorator to `target`.
    pub fn decorate<D: Decorator>(mut self, target: Target<'_>, decorator: D) -> Result<Self> {
        decorator.apply(&mut self.meta, target)?;
        Ok(self)
    }

    /// Declare a parameter decorator on position `index` of `method`.
    pub fn param(self, method: &str, index: usize, decorator: ParamDecorator) -> Result<Self> {
        self.decorate(Target::Parameter { method, index }, decorator)
    }

    /// Declare a route decorator on `method`.
    pub fn route(self, method: &str, decorator: RouteDecorator) -> Result<Self> {
        self.decorate(Target::Method(method), decorator)
    }

    /// Declare the class-level controller decorator.
    pub fn controller(self, decorator: ControllerDecorator) -> Result<Self> {
        self.decorate(Target::Class, decorator)
    }

    /// Freeze the definition so instances can share it.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl<T> ClassDef<T> {
    pub fn name(&self) -> &str {
        self.meta.class_name()
    }

    pub fn metadata(&self) -> &ClassMetadata {
        &self.meta
    }

    /// Original, undecorated body of `name`
    pub fn method_fn(&self, name: &str) -> Option<&MethodFn<T>> {
        self.methods.get(name)
    }

    /// The class route list, `None` unless controller-annotated
    pub fn routes(&self) -> Option<&[RouteDescriptor]> {
        self.meta.routes()
    }
}

impl<T> fmt::Debug for ClassDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.meta.class_name())
            .field("methods", &self.meta.method_names().collect::<Vec<_>>())
            .finish()
    }
}
