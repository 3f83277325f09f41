//! Registry of named connections
//!
//! Applications that talk to several databases keep their connections here
//! instead of in global state. Each connection is shared behind a
//! `tokio::sync::Mutex` since every query mutates its state.

use crate::database::config::DatabasesConfig;
use crate::database::connection::Connection;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared handle to a registered connection
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Registry for managing multiple database connections
pub struct DatabaseRegistry {
    connections: Arc<RwLock<IndexMap<String, SharedConnection>>>,
    default: Arc<RwLock<Option<String>>>,
}

impl DatabaseRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(IndexMap::new())),
            default: Arc::new(RwLock::new(None)),
        }
    }

    /// Connect every configured database
    ///
    /// The entry marked `is_default` (or the first one) becomes the default.
    pub async fn from_config(config: &DatabasesConfig) -> Result<Self> {
        let registry = Self::new();
        let default_name = config.get_default().map(|(name, _)| name.clone());

        for (name, db_config) in &config.databases {
            let connection = Connection::connect(name.clone(), db_config.clone())
                .await
                .map_err(|e| e.with_context(format!("Failed to connect database '{}'", name)))?;
            let is_default = default_name.as_deref() == Some(name.as_str());
            registry.register(name.clone(), connection, is_default).await;
        }

        log::info!("Connected {} database(s)", config.len());
        Ok(registry)
    }

    /// Register a connection
    ///
    /// The first registered connection becomes the default unless another
    /// one asks for it.
    pub async fn register(
        &self,
        name: impl Into<String>,
        connection: Connection,
        set_as_default: bool,
    ) -> SharedConnection {
        let name = name.into();
        let shared = Arc::new(Mutex::new(connection));

        let mut connections = self.connections.write().await;
        connections.insert(name.clone(), shared.clone());

        if set_as_default || connections.len() == 1 {
            *self.default.write().await = Some(name);
        }
        shared
    }

    /// Get a connection by name
    pub async fn get(&self, name: &str) -> Option<SharedConnection> {
        self.connections.read().await.get(name).cloned()
    }

    /// Get the default connection
    pub async fn get_default(&self) -> Result<SharedConnection> {
        let default = self.default.read().await.clone();
        match default {
            Some(name) => self.get(&name).await.ok_or_else(|| {
                Error::config(format!("Default database '{}' not found in registry", name))
            }),
            None => Err(Error::config("No default database configured")),
        }
    }

    /// Make an already registered connection the default
    pub async fn set_default(&self, name: &str) -> Result<()> {
        if !self.has_database(name).await {
            return Err(Error::config(format!(
                "Database '{}' not found in registry",
                name
            )));
        }
        *self.default.write().await = Some(name.to_string());
        Ok(())
    }

    pub async fn default_name(&self) -> Option<String> {
        self.default.read().await.clone()
    }

    /// Registered names, in registration order
    pub async fn list_databases(&self) -> Vec<String> {
        self.connections.read().await.keys().cloned().collect()
    }

    pub async fn has_database(&self, name: &str) -> bool {
        self.connections.read().await.contains_key(name)
    }

    /// Remove a connection; the default cannot be removed
    pub async fn remove(&self, name: &str) -> Result<SharedConnection> {
        if self.default.read().await.as_deref() == Some(name) {
            return Err(Error::config(
                "Cannot remove the default database. Set a different default first.",
            ));
        }
        self.connections
            .write()
            .await
            .shift_remove(name)
            .ok_or_else(|| Error::config(format!("Database '{}' not found", name)))
    }
}

impl Default for DatabaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_registry() {
        let registry = DatabaseRegistry::new();
        assert!(registry.list_databases().await.is_empty());
        assert!(!registry.has_database("main").await);
        assert!(registry.get_default().await.is_err());
        assert!(registry.set_default("main").await.is_err());
    }
}
