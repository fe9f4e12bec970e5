//! Core of the lessonbook gateway: a schema-less collection store and the seat-booking
//! workflow built on it.
//!
//! This crate provides:
//!
//! - **Error handling** ([`error`]) - Store error types and result types
//! - **Documents** ([`document`]) - Identifiers and JSON/BSON conversion
//! - **Queries** ([`query`]) - Filter expressions and the free-text search builder
//! - **Store backend abstraction** ([`backend`]) - Traits implemented by storage backends
//! - **Document store** ([`store`]) - The store handle and its closed collection registry
//! - **Collections** ([`collection`]) - Bound collection handles used by the gateway
//! - **Booking** ([`booking`]) - Atomic server-side checkout
//! - **Client model** ([`catalog`], [`cart`], [`sort`]) - Lessons, cart and local sorting
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lessonbook::{memory::InMemoryStore, prelude::*};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = Arc::new(DocumentStore::new(InMemoryStore::new(), CollectionRegistry::default()));
//!     let lessons = store.bind("lessons")?;
//!
//!     lessons.insert_one(json!({ "subject": "Math", "location": "London", "price": 10, "space": 5 })).await?;
//!     let hits = lessons.search("mat").await?;
//!     assert_eq!(hits.len(), 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as lessonbook_core;

pub mod error;
pub mod document;
pub mod query;
pub mod backend;
pub mod collection;
pub mod store;
pub mod booking;
pub mod catalog;
pub mod cart;
pub mod sort;
