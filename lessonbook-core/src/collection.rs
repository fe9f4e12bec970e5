//! Bound collection handles.
//!
//! A [`Collection`] is what the resource binder hands to the gateway for the rest of a request:
//! the registered [`CollectionSpec`] plus a shared reference to the store. Every operation is
//! JSON in, JSON out, so the HTTP layer never touches BSON.
//!
//! ```ignore
//! let lessons = store.bind("lessons")?;
//! let all = lessons.list_all().await?;
//! let hits = lessons.search("mat").await?;
//! let outcome = lessons.update_one("65f1c0ffee0ddba11ca7f00d", json!({ "space": 4 })).await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use bson::Bson;

use crate::{
    backend::{ReserveLine, ReserveOutcome, UpdateResult},
    booking::SPACE_FIELD,
    document::{DocumentId, ID_FIELD, document_to_json, json_to_document, validate_partial_update},
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
    store::{CollectionKind, CollectionSpec, DocumentStore},
};

/// Outcome of [`Collection::insert_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsertResult {
    pub id: DocumentId,
}

/// Seat counters written through the gateway must be non-negative integers.
fn validate_seat_counter(fields: &bson::Document) -> DocumentStoreResult<()> {
    match fields.get(SPACE_FIELD) {
        None => Ok(()),
        Some(Bson::Int32(value)) if *value >= 0 => Ok(()),
        Some(Bson::Int64(value)) if *value >= 0 => Ok(()),
        Some(other) => Err(DocumentStoreError::InvalidDocument(format!(
            "{SPACE_FIELD} must be a non-negative integer, got {other}"
        ))),
    }
}

/// A handle on one registered collection.
#[derive(Debug, Clone)]
pub struct Collection {
    spec: CollectionSpec,
    store: Arc<DocumentStore>,
}

impl Collection {
    pub(crate) fn new(spec: CollectionSpec, store: Arc<DocumentStore>) -> Self {
        Self { spec, store }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Returns the registration this handle was bound from.
    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    /// Returns every document in the collection.
    ///
    /// An empty collection yields an empty vector, never an error.
    pub async fn list_all(&self) -> DocumentStoreResult<Vec<Value>> {
        self.query(Query::all()).await
    }

    /// Returns the documents whose searchable fields contain `term`, ignoring case.
    pub async fn search(&self, term: &str) -> DocumentStoreResult<Vec<Value>> {
        self.query(Query::search(&self.spec.searchable_fields, term))
            .await
    }

    /// Runs `query` and converts the matches to client JSON.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<Value>> {
        tracing::debug!(collection = %self.name(), filtered = query.filter.is_some(), "querying collection");

        self.store
            .backend()
            .find_documents(query, self.name())
            .await?
            .into_iter()
            .map(document_to_json)
            .collect()
    }

    /// Persists a client supplied JSON object as a new document.
    ///
    /// No schema is enforced beyond the value being an object with plain field names and, in
    /// catalog collections, a non-negative integer seat counter. The identifier is always
    /// assigned by the store.
    pub async fn insert_one(&self, fields: Value) -> DocumentStoreResult<InsertResult> {
        let document = json_to_document(fields)?;

        if self.spec.kind == CollectionKind::Catalog {
            validate_seat_counter(&document)?;
        }

        if document.contains_key(ID_FIELD) {
            return Err(DocumentStoreError::InvalidDocument(
                "the _id field is assigned by the store".to_string(),
            ));
        }

        self.insert_document(document).await
    }

    /// Persists an already converted document.
    pub async fn insert_document(&self, document: bson::Document) -> DocumentStoreResult<InsertResult> {
        let id = self.store
            .backend()
            .insert_document(document, self.name())
            .await?;

        Ok(InsertResult { id })
    }

    /// Applies a partial update to the document identified by `id`.
    ///
    /// `id` must be a hex document identifier; `fields` must be a JSON object that does not
    /// name `_id`. Only the named fields change. Orders are immutable once placed and reject
    /// every update with [`DocumentStoreError::ReadOnly`].
    pub async fn update_one(&self, id: &str, fields: Value) -> DocumentStoreResult<UpdateResult> {
        if self.spec.kind == CollectionKind::Orders {
            return Err(DocumentStoreError::ReadOnly(self.name().to_string()));
        }

        let id: DocumentId = id.parse()?;
        let fields = json_to_document(fields)?;
        validate_partial_update(&fields)?;
        validate_seat_counter(&fields)?;

        self.store
            .backend()
            .update_document(id, fields, self.name())
            .await
    }

    /// Reserves `lines` against the integer counter `field`, all or nothing.
    pub async fn reserve(&self, lines: &[ReserveLine], field: &str) -> DocumentStoreResult<ReserveOutcome> {
        self.store
            .backend()
            .reserve(lines, field, self.name())
            .await
    }

    /// Returns previously reserved units to `field`.
    pub async fn release(&self, lines: &[ReserveLine], field: &str) -> DocumentStoreResult<()> {
        self.store
            .backend()
            .release(lines, field, self.name())
            .await
    }
}
