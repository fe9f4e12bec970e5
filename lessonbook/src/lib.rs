//! Main lessonbook crate providing a unified interface to the collection store and the
//! booking workflow.
//!
//! This crate is the primary entry point for users of the lessonbook workspace. It re-exports
//! the core types and functionality from the sub-crates and provides access to the storage
//! backends.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use lessonbook::{prelude::*, memory::InMemoryStore, booking::{place_order, OrderRequest}};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(DocumentStore::new(InMemoryStore::new(), CollectionRegistry::default()));
//!     let lessons = store.bind("lessons").unwrap();
//!     let orders = store.bind("orders").unwrap();
//!
//!     let math = lessons
//!         .insert_one(json!({ "subject": "Math", "location": "London", "price": 10, "space": 5 }))
//!         .await
//!         .unwrap();
//!
//!     let request = OrderRequest::from_json(json!({
//!         "name": "Ada",
//!         "phone": "0123456789",
//!         "lessons": [{ "lesson_id": math.id, "quantity": 2 }],
//!     }))
//!     .unwrap();
//!
//!     place_order(&lessons, &orders, request).await.unwrap();
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use lessonbook_core::{backend, booking, cart, catalog, collection, document, error, query, sort, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use lessonbook_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use lessonbook_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
