//! Storage backend abstraction for the document store.
//!
//! This module defines the traits that abstract over storage implementations, allowing the
//! gateway to run against MongoDB in production and an in-memory store in tests.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use lessonbook::backend::StoreBackend;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//! let id = backend.insert_document(doc! { "subject": "Math", "space": 5 }, "lessons").await?;
//! backend.update_document(id, doc! { "space": 4 }, "lessons").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use crate::{
    document::DocumentId,
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
};

/// Outcome of a single-document partial update.
///
/// A miss is not an error: callers must check `matched` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    /// Whether a document with the given identifier existed.
    pub matched: bool,
    /// Whether the stored document actually changed.
    pub modified: bool,
}

impl UpdateResult {
    pub const MISSED: UpdateResult = UpdateResult { matched: false, modified: false };
}

/// One line of a counter reservation: take `quantity` units from document `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveLine {
    pub id: DocumentId,
    pub quantity: i64,
}

/// Rejects reservation lines asking for zero or fewer units.
pub fn check_quantities(lines: &[ReserveLine]) -> DocumentStoreResult<()> {
    match lines.iter().find(|line| line.quantity < 1) {
        Some(line) => Err(DocumentStoreError::InvalidDocument(format!(
            "invalid quantity {} for {}",
            line.quantity, line.id
        ))),
        None => Ok(()),
    }
}

/// Outcome of an all-or-nothing reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Every line was applied.
    Reserved,
    /// The first line that could not be satisfied; nothing was applied.
    Insufficient(DocumentId),
}

/// Abstract interface for document storage backends.
///
/// Implementations must be thread-safe and support concurrent access from multiple async
/// tasks. Collections are addressed by name; reads of a collection the backend has never seen
/// return no documents rather than failing.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Verifies that the backend is reachable.
    ///
    /// Called once at startup so an unreachable store aborts the process instead of serving
    /// requests against a dead handle.
    async fn ping(&self) -> DocumentStoreResult<()>;

    /// Returns every document of `collection` matching `query`, in store-native order.
    async fn find_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<bson::Document>>;

    /// Inserts a single document and returns its identifier.
    ///
    /// If the document carries no `_id` the backend assigns one. The write is all or nothing.
    async fn insert_document(
        &self,
        document: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<DocumentId>;

    /// Merges `fields` into the document identified by `id`.
    ///
    /// Only the named fields change; every other field is left untouched.
    async fn update_document(
        &self,
        id: DocumentId,
        fields: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult>;

    /// Atomically decrements the integer `field` of every line's document by its quantity.
    ///
    /// A line can only be applied when the current value is at least the requested quantity.
    /// If any line cannot be applied no counter changes and the offending document is reported.
    async fn reserve(
        &self,
        lines: &[ReserveLine],
        field: &str,
        collection: &str,
    ) -> DocumentStoreResult<ReserveOutcome>;

    /// Adds every line's quantity back to `field`, undoing an earlier [`reserve`](Self::reserve).
    async fn release(
        &self,
        lines: &[ReserveLine],
        field: &str,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Creates an empty collection if it does not exist yet.
    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Cleanly shuts down the backend, releasing all resources.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Object-safe mirror of [`StoreBackend`], implemented for every backend.
#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn ping(&self) -> DocumentStoreResult<()>;
    async fn find_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<bson::Document>>;
    async fn insert_document(
        &self,
        document: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<DocumentId>;
    async fn update_document(
        &self,
        id: DocumentId,
        fields: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult>;
    async fn reserve(
        &self,
        lines: &[ReserveLine],
        field: &str,
        collection: &str,
    ) -> DocumentStoreResult<ReserveOutcome>;
    async fn release(
        &self,
        lines: &[ReserveLine],
        field: &str,
        collection: &str,
    ) -> DocumentStoreResult<()>;
    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;
}

#[async_trait]
impl<B: StoreBackend + Send + Sync + 'static> DynStoreBackend for B {
    async fn ping(&self) -> DocumentStoreResult<()> {
        StoreBackend::ping(self).await
    }

    async fn find_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<bson::Document>> {
        StoreBackend::find_documents(self, query, collection)
            .await
    }

    async fn insert_document(
        &self,
        document: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<DocumentId> {
        StoreBackend::insert_document(self, document, collection)
            .await
    }

    async fn update_document(
        &self,
        id: DocumentId,
        fields: bson::Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        StoreBackend::update_document(self, id, fields, collection)
            .await
    }

    async fn reserve(
        &self,
        lines: &[ReserveLine],
        field: &str,
        collection: &str,
    ) -> DocumentStoreResult<ReserveOutcome> {
        StoreBackend::reserve(self, lines, field, collection)
            .await
    }

    async fn release(
        &self,
        lines: &[ReserveLine],
        field: &str,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        StoreBackend::release(self, lines, field, collection)
            .await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::create_collection(self, name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_collections(self).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(*self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
