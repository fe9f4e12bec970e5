//! In-memory storage implementation for document stores.
//!
//! Documents are kept per collection in insertion order behind a single async-aware
//! read-write lock. Counter reservations hold the write lock across the check and the
//! decrement, so concurrent checkouts can never drive a counter below zero.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document};

use lessonbook_core::{
    backend::{ReserveLine, check_quantities, ReserveOutcome, StoreBackend, StoreBackendBuilder, UpdateResult},
    document::{DocumentId, ID_FIELD},
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
};

use crate::evaluator::DocumentEvaluator;

type CollectionMap = Vec<Document>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state. Multiple clones of
/// the same instance share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use lessonbook_memory::InMemoryStore;
/// use lessonbook::backend::StoreBackend;
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///     store.insert_document(doc! { "subject": "Math", "space": 5 }, "lessons").await?;
///     assert_eq!(store.find_documents(Default::default(), "lessons").await?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn document_id(doc: &Document) -> Option<DocumentId> {
    match doc.get(ID_FIELD) {
        Some(Bson::ObjectId(oid)) => Some(DocumentId::from(*oid)),
        _ => None,
    }
}

fn find_mut(documents: &mut [Document], id: DocumentId) -> Option<&mut Document> {
    documents
        .iter_mut()
        .find(|doc| document_id(doc) == Some(id))
}

/// Reads an integer counter. Doubles are accepted when they hold a whole number.
fn counter(doc: &Document, field: &str) -> Option<i64> {
    match doc.get(field)? {
        Bson::Int32(value) => Some(i64::from(*value)),
        Bson::Int64(value) => Some(*value),
        Bson::Double(value) if value.fract() == 0.0 => Some(*value as i64),
        _ => None,
    }
}

/// Adds `delta` to a counter, keeping its stored numeric type.
///
/// Returns `None` and leaves the document untouched when the counter is missing or the sum
/// does not fit.
fn adjust_counter(doc: &mut Document, field: &str, delta: i64) -> Option<()> {
    let adjusted = match doc.get(field)? {
        Bson::Int32(value) => {
            let sum = i64::from(*value).checked_add(delta)?;
            match i32::try_from(sum) {
                Ok(value) => Bson::Int32(value),
                Err(_) => Bson::Int64(sum),
            }
        }
        Bson::Int64(value) => Bson::Int64(value.checked_add(delta)?),
        Bson::Double(value) => Bson::Double(value + delta as f64),
        _ => return None,
    };

    doc.insert(field, adjusted);
    Some(())
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        Ok(())
    }

    async fn find_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        match &query.filter {
            Some(filter) => DocumentEvaluator::filter_documents(documents.iter(), filter),
            None => Ok(documents.clone()),
        }
    }

    async fn insert_document(&self, mut document: Document, collection: &str) -> DocumentStoreResult<DocumentId> {
        let id = match document.get(ID_FIELD) {
            Some(Bson::ObjectId(oid)) => DocumentId::from(*oid),
            Some(_) => {
                return Err(DocumentStoreError::InvalidDocument(
                    "_id must be an ObjectId".to_string(),
                ));
            }
            None => {
                let id = DocumentId::new();
                document.insert(ID_FIELD, id);
                id
            }
        };

        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();

        if documents.iter().any(|doc| document_id(doc) == Some(id)) {
            return Err(DocumentStoreError::Backend(format!(
                "Document {id} already exists in collection {collection}"
            )));
        }

        documents.push(document);

        Ok(id)
    }

    async fn update_document(&self, id: DocumentId, fields: Document, collection: &str) -> DocumentStoreResult<UpdateResult> {
        let mut store = self.store.write().await;
        let Some(doc) = store
            .get_mut(collection)
            .and_then(|documents| find_mut(documents, id))
        else {
            return Ok(UpdateResult::MISSED);
        };

        let mut modified = false;

        for (key, value) in fields {
            if doc.get(&key) != Some(&value) {
                modified = true;
                doc.insert(key, value);
            }
        }

        Ok(UpdateResult { matched: true, modified })
    }

    async fn reserve(&self, lines: &[ReserveLine], field: &str, collection: &str) -> DocumentStoreResult<ReserveOutcome> {
        check_quantities(lines)?;

        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(match lines.first() {
                Some(line) => ReserveOutcome::Insufficient(line.id),
                None => ReserveOutcome::Reserved,
            });
        };

        // Lines are applied to a copy; the live documents change only once every line fits.
        let mut staged = documents.clone();

        for line in lines {
            let taken = find_mut(&mut staged, line.id).and_then(|doc| {
                let available = counter(doc, field)?;
                if available < line.quantity {
                    return None;
                }
                adjust_counter(doc, field, -line.quantity)
            });

            if taken.is_none() {
                tracing::debug!(id = %line.id, requested = line.quantity, "reservation refused");
                return Ok(ReserveOutcome::Insufficient(line.id));
            }
        }

        *documents = staged;

        Ok(ReserveOutcome::Reserved)
    }

    async fn release(&self, lines: &[ReserveLine], field: &str, collection: &str) -> DocumentStoreResult<()> {
        check_quantities(lines)?;

        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(());
        };

        let mut staged = documents.clone();

        for line in lines {
            if let Some(doc) = find_mut(&mut staged, line.id) {
                adjust_counter(doc, field, line.quantity).ok_or_else(|| {
                    DocumentStoreError::Backend(format!("cannot return {} units to {}", line.quantity, line.id))
                })?;
            }
        }

        *documents = staged;

        Ok(())
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.store
                .read()
                .await
                .keys()
                .cloned()
                .collect()
        )
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use lessonbook_core::query::Filter;

    async fn seeded(space: i32) -> (InMemoryStore, DocumentId) {
        let store = InMemoryStore::new();
        let id = store
            .insert_document(doc! { "subject": "Math", "location": "London", "price": 10, "space": space }, "lessons")
            .await
            .unwrap();
        (store, id)
    }

    async fn space_of(store: &InMemoryStore, id: DocumentId) -> i64 {
        let docs = store
            .find_documents(Query::filtered(Filter::eq(ID_FIELD, id)), "lessons")
            .await
            .unwrap();
        counter(&docs[0], "space").unwrap()
    }

    #[tokio::test]
    async fn unknown_collections_read_as_empty() {
        let store = InMemoryStore::new();
        assert!(store.find_documents(Query::all(), "lessons").await.unwrap().is_empty());

        store.create_collection("lessons").await.unwrap();
        assert!(store.find_documents(Query::all(), "lessons").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insertion_order_is_preserved() {
        let store = InMemoryStore::new();
        for subject in ["c", "a", "b"] {
            store.insert_document(doc! { "subject": subject }, "lessons").await.unwrap();
        }

        let subjects: Vec<String> = store
            .find_documents(Query::all(), "lessons")
            .await
            .unwrap()
            .iter()
            .map(|doc| doc.get_str("subject").unwrap().to_string())
            .collect();
        assert_eq!(subjects, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn update_merges_named_fields_only() {
        let (store, id) = seeded(5).await;

        let result = store.update_document(id, doc! { "space": 4 }, "lessons").await.unwrap();
        assert_eq!(result, UpdateResult { matched: true, modified: true });

        let docs = store.find_documents(Query::all(), "lessons").await.unwrap();
        assert_eq!(docs[0].get_str("subject").unwrap(), "Math");
        assert_eq!(counter(&docs[0], "space"), Some(4));

        let again = store.update_document(id, doc! { "space": 4 }, "lessons").await.unwrap();
        assert_eq!(again, UpdateResult { matched: true, modified: false });
    }

    #[tokio::test]
    async fn update_of_missing_document_is_a_miss() {
        let (store, _) = seeded(5).await;
        let result = store.update_document(DocumentId::new(), doc! { "space": 1 }, "lessons").await.unwrap();
        assert_eq!(result, UpdateResult::MISSED);
    }

    #[tokio::test]
    async fn reserve_is_all_or_nothing() {
        let (store, plenty) = seeded(5).await;
        let scarce = store
            .insert_document(doc! { "subject": "Art", "space": 1 }, "lessons")
            .await
            .unwrap();

        let outcome = store
            .reserve(
                &[ReserveLine { id: plenty, quantity: 2 }, ReserveLine { id: scarce, quantity: 2 }],
                "space",
                "lessons",
            )
            .await
            .unwrap();

        assert_eq!(outcome, ReserveOutcome::Insufficient(scarce));
        assert_eq!(space_of(&store, plenty).await, 5);
        assert_eq!(space_of(&store, scarce).await, 1);
    }

    #[tokio::test]
    async fn reserve_and_release_round_trip() {
        let (store, id) = seeded(3).await;
        let lines = [ReserveLine { id, quantity: 3 }];

        assert_eq!(store.reserve(&lines, "space", "lessons").await.unwrap(), ReserveOutcome::Reserved);
        assert_eq!(space_of(&store, id).await, 0);

        store.release(&lines, "space", "lessons").await.unwrap();
        assert_eq!(space_of(&store, id).await, 3);
    }

    #[tokio::test]
    async fn concurrent_reservations_for_last_seat() {
        let (store, id) = seeded(1).await;
        let lines = [ReserveLine { id, quantity: 1 }];

        let (a, b) = tokio::join!(
            store.reserve(&lines, "space", "lessons"),
            store.reserve(&lines, "space", "lessons"),
        );
        let outcomes = [a.unwrap(), b.unwrap()];

        assert_eq!(outcomes.iter().filter(|o| **o == ReserveOutcome::Reserved).count(), 1);
        assert_eq!(space_of(&store, id).await, 0);
    }

    #[tokio::test]
    async fn repeated_lines_share_one_counter() {
        let (store, id) = seeded(3).await;

        let outcome = store
            .reserve(&[ReserveLine { id, quantity: 2 }, ReserveLine { id, quantity: 2 }], "space", "lessons")
            .await
            .unwrap();

        assert_eq!(outcome, ReserveOutcome::Insufficient(id));
        assert_eq!(space_of(&store, id).await, 3);
    }

    #[tokio::test]
    async fn non_positive_quantities_are_refused() {
        let (store, id) = seeded(1).await;

        for quantity in [0, -2, i64::MIN] {
            let err = store.reserve(&[ReserveLine { id, quantity }], "space", "lessons").await.unwrap_err();
            assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
        }
        assert_eq!(space_of(&store, id).await, 1);
    }

    #[tokio::test]
    async fn release_does_not_overflow() {
        let store = InMemoryStore::new();
        let id = store
            .insert_document(doc! { "subject": "Art", "space": i64::MAX - 1 }, "lessons")
            .await
            .unwrap();

        let err = store.release(&[ReserveLine { id, quantity: 5 }], "space", "lessons").await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::Backend(_)));
        assert_eq!(space_of(&store, id).await, i64::MAX - 1);
    }

    #[tokio::test]
    async fn reserve_refuses_documents_without_counter() {
        let store = InMemoryStore::new();
        let id = store.insert_document(doc! { "subject": "Art" }, "lessons").await.unwrap();

        let outcome = store.reserve(&[ReserveLine { id, quantity: 1 }], "space", "lessons").await.unwrap();
        assert_eq!(outcome, ReserveOutcome::Insufficient(id));
    }
}
