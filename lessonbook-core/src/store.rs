//! The document store and its collection registry.
//!
//! [`DocumentStore`] owns the backend and a closed [`CollectionRegistry`]. Binding a collection
//! by name is a capability lookup: only registered names yield a [`Collection`], everything
//! else is rejected with [`DocumentStoreError::UnknownCollection`] before the backend is ever
//! consulted.
//!
//! ```ignore
//! use std::sync::Arc;
//! use lessonbook::{memory::InMemoryStore, store::{CollectionRegistry, DocumentStore}};
//!
//! let store = Arc::new(DocumentStore::new(InMemoryStore::new(), CollectionRegistry::default()));
//! let lessons = store.bind("lessons")?;
//! assert!(store.bind("system.users").is_err());
//! ```

use std::{collections::BTreeMap, sync::Arc};

use serde::Deserialize;

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::Collection,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// How the gateway treats inserts into a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Plain documents: inserts are stored as sent.
    Catalog,
    /// Orders: inserts run the booking workflow against the lessons collection.
    Orders,
}

/// Registration of a collection the gateway may expose.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionSpec {
    /// Collection name, as used in the URL and in the store.
    pub name: String,
    /// Insert behaviour.
    pub kind: CollectionKind,
    /// Text fields consulted by free-text search.
    #[serde(default)]
    pub searchable_fields: Vec<String>,
    /// For orders collections, the catalog collection whose seats an order takes.
    #[serde(default)]
    pub stock: Option<String>,
}

impl CollectionSpec {
    pub fn catalog(name: impl Into<String>, searchable_fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: CollectionKind::Catalog,
            searchable_fields: searchable_fields
                .iter()
                .map(|field| field.to_string())
                .collect(),
            stock: None,
        }
    }

    pub fn orders(name: impl Into<String>, stock: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CollectionKind::Orders,
            searchable_fields: Vec::new(),
            stock: Some(stock.into()),
        }
    }
}

/// The closed set of collections exposed by a store.
#[derive(Debug, Clone)]
pub struct CollectionRegistry {
    specs: BTreeMap<String, CollectionSpec>,
}

impl CollectionRegistry {
    /// Creates a registry from explicit registrations. Later duplicates replace earlier ones.
    pub fn new(specs: impl IntoIterator<Item = CollectionSpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (spec.name.clone(), spec))
                .collect(),
        }
    }

    /// Looks up a registration by name.
    pub fn get(&self, name: &str) -> Option<&CollectionSpec> {
        self.specs.get(name)
    }

    /// Checks that every orders collection names a registered catalog collection as its stock.
    pub fn validate(&self) -> DocumentStoreResult<()> {
        for spec in self.iter().filter(|spec| spec.kind == CollectionKind::Orders) {
            self.stock_of(spec)?;
        }

        Ok(())
    }

    /// Resolves the catalog collection an orders collection books against.
    pub fn stock_of(&self, spec: &CollectionSpec) -> DocumentStoreResult<&CollectionSpec> {
        let name = spec.stock.as_deref().ok_or_else(|| {
            DocumentStoreError::Initialization(format!("collection {} names no stock collection", spec.name))
        })?;

        match self.get(name) {
            Some(stock) if stock.kind == CollectionKind::Catalog => Ok(stock),
            _ => Err(DocumentStoreError::Initialization(format!(
                "collection {} books against {name}, which is not a registered catalog collection",
                spec.name
            ))),
        }
    }

    /// Iterates over all registrations in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CollectionSpec> {
        self.specs.values()
    }
}

impl Default for CollectionRegistry {
    /// `lessons` (searchable by subject and location) and `orders`.
    fn default() -> Self {
        Self::new([
            CollectionSpec::catalog("lessons", &["subject", "location"]),
            CollectionSpec::orders("orders", "lessons"),
        ])
    }
}

/// A document store bound to a backend chosen at runtime.
#[derive(Debug)]
pub struct DocumentStore {
    backend: Box<dyn DynStoreBackend>,
    registry: CollectionRegistry,
}

impl DocumentStore {
    /// Creates a new document store with the given backend and registry.
    pub fn new<B: StoreBackend + 'static>(backend: B, registry: CollectionRegistry) -> Self {
        Self {
            backend: Box::new(backend),
            registry,
        }
    }

    pub(crate) fn backend(&self) -> &dyn DynStoreBackend {
        self.backend.as_ref()
    }

    /// Returns the collection registry.
    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Resolves `name` to a collection handle.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnknownCollection`] if `name` is not registered.
    pub fn bind(self: &Arc<Self>, name: &str) -> DocumentStoreResult<Collection> {
        self.registry
            .get(name)
            .cloned()
            .map(|spec| Collection::new(spec, Arc::clone(self)))
            .ok_or_else(|| DocumentStoreError::UnknownCollection(name.to_string()))
    }

    /// Binds the catalog collection that orders placed in `orders` take seats from.
    pub fn bind_stock(self: &Arc<Self>, orders: &CollectionSpec) -> DocumentStoreResult<Collection> {
        self.registry
            .stock_of(orders)
            .cloned()
            .map(|spec| Collection::new(spec, Arc::clone(self)))
    }

    /// Verifies the backend is reachable.
    pub async fn ping(&self) -> DocumentStoreResult<()> {
        self.backend.ping().await
    }

    /// Creates every registered collection that does not exist yet.
    pub async fn ensure_collections(&self) -> DocumentStoreResult<()> {
        let existing = self.backend.list_collections().await?;

        for spec in self.registry.iter() {
            if !existing.contains(&spec.name) {
                tracing::info!(collection = %spec.name, "creating collection");
                self.backend.create_collection(&spec.name).await?;
            }
        }

        Ok(())
    }

    /// Shuts down the backend.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown_boxed().await
    }
}
