// Core library for Decorum
// Parameter and route decorators for controller classes, plus the processor
// that rewrites decorated methods into argument-deriving wrappers.

pub mod class;
pub mod decorator;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod metadata;
pub mod params;
pub mod processor;
pub mod routes;
pub mod value;

// Re-export commonly used types
pub use class::{ClassDef, MethodFn};
pub use decorator::{Decorator, Target};
pub use error::*;
pub use extractors::{Extractor, ExtractorRegistry, Factory};
pub use metadata::ClassMetadata;
pub use params::{ExtractionKind, ParamDecorator, ParamDescriptor, Validator};
pub use processor::{BoundMethod, DecoratorProcessor, Instance, derive_args};
pub use routes::{HttpMethod, Middleware, RouteArg, RouteDescriptor, Verb};
pub use value::{Args, Value};
