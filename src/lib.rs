// Decorum - decorator-style metadata for controller classes
//
// Declare per-parameter extraction and per-method routes on a class, then let
// the processor rewrite decorated methods into argument-deriving wrappers.

// Re-export core functionality
pub use decorum_core::*;

// Re-export serde_json for building request stand-ins and route dumps
pub use serde_json;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Args,
        ClassDef,
        DecoratorProcessor,
        Error,
        ExtractionKind,
        ExtractorRegistry,
        HttpMethod,
        Instance,
        Middleware,
        Result,
        RouteDescriptor,
        Target,
        Validator,
        Value,
        extractors,
        params,
        route_args,
        routes,
    };
}
