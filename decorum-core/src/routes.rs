//! Route annotations
//!
//! Method-level decorators (`route`, `get`, `post`, ...) park the raw verb,
//! path and middleware of a method in a per-method slot. Nothing is published
//! until the class-level [`controller`] decorator harvests every slot, joins
//! it with the class prefix and middleware, and assigns the class route list.
//!
//! Arguments follow one rule at both levels: a leading path string is
//! optional, everything after it must be middleware.
//!
//! ```
//! use decorum_core::routes::{self, HttpMethod, Middleware};
//! use decorum_core::{route_args, ClassDef};
//! use decorum_core::value::Value;
//!
//! struct Users;
//!
//! let auth = Middleware::named("auth", |_raw| Ok(()));
//!
//! let class = ClassDef::<Users>::new("Users")
//!     .method("list", |_this, _args| Ok(Value::unit()))
//!     .route("list", routes::get(route_args!["/list"])?)?
//!     .controller(routes::controller(route_args!["/users", auth.clone()])?)?
//!     .build();
//!
//! let routes = class.routes().unwrap();
//! assert_eq!(routes[0].method, HttpMethod::Get);
//! assert_eq!(routes[0].url, "/users/list");
//! assert_eq!(routes[0].middleware, vec![auth]);
//! assert_eq!(routes[0].fn_name, "list");
//! # Ok::<(), decorum_core::Error>(())
//! ```

use crate::decorator::{Decorator, Target, expect_class, expect_method};
use crate::logging::debug;
use crate::metadata::ClassMetadata;
use crate::value::Value;
use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Verb token accepted by the route decorators.
///
/// `Del` and `Delete` are distinct inputs that publish the same method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Head,
    Options,
    Get,
    Post,
    Put,
    Patch,
    Del,
    Delete,
    All,
}

impl Verb {
    /// Parse a verb token, case-insensitively
    pub fn parse(token: &str) -> Result<Self> {
        match token.to_lowercase().as_str() {
            "head" => Ok(Verb::Head),
            "options" => Ok(Verb::Options),
            "get" => Ok(Verb::Get),
            "post" => Ok(Verb::Post),
            "put" => Ok(Verb::Put),
            "patch" => Ok(Verb::Patch),
            "del" => Ok(Verb::Del),
            "delete" => Ok(Verb::Delete),
            "all" => Ok(Verb::All),
            _ => Err(Error::declaration(format!(
                "The first argument must be an HTTP method, got: \"{}\"",
                token
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Head => "head",
            Verb::Options => "options",
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Patch => "patch",
            Verb::Del => "del",
            Verb::Delete => "delete",
            Verb::All => "all",
        }
    }

    pub fn normalize(self) -> HttpMethod {
        match self {
            Verb::Head => HttpMethod::Head,
            Verb::Options => HttpMethod::Options,
            Verb::Get => HttpMethod::Get,
            Verb::Post => HttpMethod::Post,
            Verb::Put => HttpMethod::Put,
            Verb::Patch => HttpMethod::Patch,
            Verb::Del | Verb::Delete => HttpMethod::Delete,
            Verb::All => HttpMethod::All,
        }
    }
}

/// Published HTTP method of a route. `All` matches every verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Head,
    Options,
    Get,
    Post,
    Put,
    Patch,
    Delete,
    All,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::All => "all",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Middleware handed through to the dispatcher. The engine never runs it.
///
/// Two handles are equal only if they share the same function.
#[derive(Clone)]
pub struct Middleware {
    name: Option<Cow<'static, str>>,
    func: Arc<dyn Fn(&[Value]) -> Result<()> + Send + Sync>,
}

impl Middleware {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: None,
            func: Arc::new(func),
        }
    }

    pub fn named<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }

    /// Run the middleware against raw invocation arguments
    pub fn call(&self, raw: &[Value]) -> Result<()> {
        (self.func)(raw)
    }
}

impl PartialEq for Middleware {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Middleware({})", self.name())
    }
}

/// One argument given to a route or controller decorator.
#[derive(Clone, Debug)]
pub enum RouteArg {
    Path(String),
    Middleware(Middleware),
    /// Any other value; always rejected by [`split_route_args`]
    Opaque(Value),
}

impl From<&str> for RouteArg {
    fn from(path: &str) -> Self {
        RouteArg::Path(path.to_string())
    }
}

impl From<String> for RouteArg {
    fn from(path: String) -> Self {
        RouteArg::Path(path)
    }
}

impl From<Middleware> for RouteArg {
    fn from(middleware: Middleware) -> Self {
        RouteArg::Middleware(middleware)
    }
}

impl From<Value> for RouteArg {
    fn from(value: Value) -> Self {
        RouteArg::Opaque(value)
    }
}

/// Build a `Vec<RouteArg>` from paths, middleware and values.
#[macro_export]
macro_rules! route_args {
    () => {
        ::std::vec::Vec::<$crate::routes::RouteArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        vec![$($crate::routes::RouteArg::from($arg)),+]
    };
}

/// Split decorator arguments into an optional leading path and middleware.
pub fn split_route_args(args: Vec<RouteArg>) -> Result<(String, Vec<Middleware>)> {
    let mut args = args.into_iter().peekable();
    let path = match args.next_if(|arg| matches!(arg, RouteArg::Path(_))) {
        Some(RouteArg::Path(path)) => path,
        _ => String::new(),
    };

    let middleware = args
        .map(|arg| match arg {
            RouteArg::Middleware(m) => Ok(m),
            _ => Err(Error::declaration("Middleware must be function")),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((path, middleware))
}

/// Raw route data parked on a method until the class is harvested.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteMeta {
    pub verb: Verb,
    pub path: String,
    pub middleware: Vec<Middleware>,
}

/// Fully resolved route of one method.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteDescriptor {
    pub method: HttpMethod,
    pub url: String,
    #[serde(serialize_with = "serialize_middleware_names")]
    pub middleware: Vec<Middleware>,
    #[serde(rename = "fnName")]
    pub fn_name: String,
}

fn serialize_middleware_names<S: Serializer>(
    middleware: &[Middleware],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(middleware.iter().map(Middleware::name))
}

/// Route slots of one class, plus the harvested list once published.
#[derive(Clone, Debug, Default)]
pub struct RouteRegistry {
    slots: HashMap<String, RouteMeta>,
    published: Option<Vec<RouteDescriptor>>,
}

impl RouteRegistry {
    pub fn slot(&self, method: &str) -> Option<&RouteMeta> {
        self.slots.get(method)
    }

    pub fn set_slot(&mut self, method: &str, meta: RouteMeta) {
        self.slots.insert(method.to_string(), meta);
    }

    /// The published route list; `None` until a controller decorator ran
    pub fn published(&self) -> Option<&[RouteDescriptor]> {
        self.published.as_deref()
    }

    /// Combine every slot with the class prefix and middleware, following
    /// `order` (the class's method declaration order).
    pub fn harvest<'a>(
        &mut self,
        order: impl IntoIterator<Item = &'a str>,
        prefix: &str,
        class_middleware: &[Middleware],
    ) -> &[RouteDescriptor] {
        let routes = order
            .into_iter()
            .filter_map(|name| self.slots.get(name).map(|slot| (name, slot)))
            .map(|(name, slot)| RouteDescriptor {
                method: slot.verb.normalize(),
                url: format!("{}{}", prefix, slot.path),
                middleware: class_middleware
                    .iter()
                    .chain(slot.middleware.iter())
                    .cloned()
                    .collect(),
                fn_name: name.to_string(),
            })
            .collect();
        self.published.insert(routes)
    }
}

/// Method-level route decorator.
#[derive(Clone, Debug)]
pub struct RouteDecorator {
    meta: RouteMeta,
}

impl RouteDecorator {
    pub fn meta(&self) -> &RouteMeta {
        &self.meta
    }
}

impl Decorator for RouteDecorator {
    fn label(&self) -> String {
        format!("@Route(\"{}\")", self.meta.verb.as_str())
    }

    fn apply(self, meta: &mut ClassMetadata, target: Target<'_>) -> Result<()> {
        let method = expect_method(meta, target, &self.label())?;
        debug!(
            class = meta.class_name(),
            method,
            verb = self.meta.verb.as_str(),
            path = %self.meta.path,
            "Recording route decorator"
        );
        meta.routes_mut().set_slot(method, self.meta);
        Ok(())
    }
}

/// `route(verb, [path], middleware...)`
pub fn route(verb: &str, args: Vec<RouteArg>) -> Result<RouteDecorator> {
    let verb = Verb::parse(verb)?;
    let (path, middleware) = split_route_args(args)?;
    Ok(RouteDecorator {
        meta: RouteMeta {
            verb,
            path,
            middleware,
        },
    })
}

pub fn head(args: Vec<RouteArg>) -> Result<RouteDecorator> {
    route("head", args)
}

pub fn options(args: Vec<RouteArg>) -> Result<RouteDecorator> {
    route("options", args)
}

pub fn get(args: Vec<RouteArg>) -> Result<RouteDecorator> {
    route("get", args)
}

pub fn post(args: Vec<RouteArg>) -> Result<RouteDecorator> {
    route("post", args)
}

pub fn put(args: Vec<RouteArg>) -> Result<RouteDecorator> {
    route("put", args)
}

pub fn patch(args: Vec<RouteArg>) -> Result<RouteDecorator> {
    route("patch", args)
}

pub fn del(args: Vec<RouteArg>) -> Result<RouteDecorator> {
    route("del", args)
}

pub fn delete(args: Vec<RouteArg>) -> Result<RouteDecorator> {
    route("delete", args)
}

pub fn all(args: Vec<RouteArg>) -> Result<RouteDecorator> {
    route("all", args)
}

/// Class-level decorator that publishes the class route list.
#[derive(Clone, Debug)]
pub struct ControllerDecorator {
    path: String,
    middleware: Vec<Middleware>,
}

impl ControllerDecorator {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn middleware(&self) -> &[Middleware] {
        &self.middleware
    }
}

impl Decorator for ControllerDecorator {
    fn label(&self) -> String {
        "@Controller(...)".to_string()
    }

    fn apply(self, meta: &mut ClassMetadata, target: Target<'_>) -> Result<()> {
        expect_class(target, &self.label())?;
        let class = meta.class_name().to_string();
        let (order, routes) = meta.methods_and_routes_mut();
        let published = routes.harvest(order, &self.path, &self.middleware);
        debug!(
            class = %class,
            prefix = %self.path,
            routes = published.len(),
            "Published controller routes"
        );
        Ok(())
    }
}

/// `controller([path], middleware...)`
pub fn controller(args: Vec<RouteArg>) -> Result<ControllerDecorator> {
    let (path, middleware) = split_route_args(args)?;
    Ok(ControllerDecorator { path, middleware })
}
