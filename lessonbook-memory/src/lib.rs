//! In-memory document storage backend for lessonbook.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and backs the test suites and
//! local development runs of the gateway.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Schema-less storage** - Stores documents as BSON in insertion order
//! - **Full query support** - Evaluates the same filter expressions as the MongoDB backend
//! - **Atomic reservations** - Check-and-decrement of counters under one write lock
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use lessonbook::{memory::InMemoryStore, store::{CollectionRegistry, DocumentStore}};
//!
//! let store = Arc::new(DocumentStore::new(InMemoryStore::new(), CollectionRegistry::default()));
//! ```

#[allow(unused_extern_crates)]
extern crate self as lessonbook_memory;

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
