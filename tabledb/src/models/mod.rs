use crate::database::connection::Connection;
use indexmap::IndexMap;
use std::sync::Arc;

pub mod model;

pub use model::{Model, ModelHooks, NoHooks, Selection};

/// Models by table basename
pub struct ModelRegistry {
    models: IndexMap<String, Arc<Model>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            models: IndexMap::new(),
        }
    }

    /// One hook-less model per schema registered on `connection`
    pub fn from_connection(connection: &Connection) -> Self {
        let mut registry = Self::new();
        for schema in connection.schemas() {
            registry.register(Model::new(schema.clone()));
        }
        registry
    }

    /// Register a model, replacing any previous model of the same table
    pub fn register(&mut self, model: Model) -> Arc<Model> {
        let model = Arc::new(model);
        self.models
            .insert(model.basename().to_string(), model.clone());
        model
    }

    pub fn get(&self, basename: &str) -> Option<Arc<Model>> {
        self.models.get(basename).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn register_and_get() {
        let mut registry = ModelRegistry::new();
        let schema = Schema::builder("users").column("id", "int").build().unwrap();
        registry.register(Model::new(schema));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("users").is_some());
        assert!(registry.get("posts").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["users"]);
    }
}
