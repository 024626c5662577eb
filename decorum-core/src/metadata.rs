// Per-class side table holding everything decorators record

use crate::params::ParamRegistry;
use crate::routes::{RouteDescriptor, RouteRegistry};

/// Metadata owned by one class definition.
///
/// Kept apart from instance state: instances only ever read it.
#[derive(Clone, Debug, Default)]
pub struct ClassMetadata {
    class_name: String,
    methods: Vec<String>,
    params: ParamRegistry,
    routes: RouteRegistry,
}

impl ClassMetadata {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Record a method name; a redeclared name keeps its original position.
    pub fn declare_method(&mut self, name: &str) {
        if !self.has_method(name) {
            self.methods.push(name.to_string());
        }
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m == name)
    }

    /// Method names in declaration order
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }

    pub fn params(&self) -> &ParamRegistry {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut ParamRegistry {
        &mut self.params
    }

    pub fn route_registry(&self) -> &RouteRegistry {
        &self.routes
    }

    pub(crate) fn routes_mut(&mut self) -> &mut RouteRegistry {
        &mut self.routes
    }

    pub(crate) fn methods_and_routes_mut(
        &mut self,
    ) -> (impl Iterator<Item = &str>, &mut RouteRegistry) {
        (self.methods.iter().map(String::as_str), &mut self.routes)
    }

    /// Published routes, `None` if the class was never controller-annotated
    pub fn routes(&self) -> Option<&[RouteDescriptor]> {
        self.routes.published()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_is_stable() {
        let mut meta = ClassMetadata::new("Ctrl");
        meta.declare_method("b");
        meta.declare_method("a");
        meta.declare_method("b");

        assert_eq!(meta.method_names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(meta.has_method("a"));
        assert!(!meta.has_method("c"));
        assert!(meta.routes().is_none());
    }
}
