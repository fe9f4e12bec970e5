//! MongoDB backend implementation for lessonbook.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! lessonbook = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Collections live in a MongoDB database
//! - **Literal search** - Free-text terms are regex-escaped before reaching `$regex`
//! - **Conditional updates** - Seat reservations use `$gte`-guarded `$inc` updates
//! - **Fail-fast connection** - The builder pings the deployment before returning
//!
//! # Example
//!
//! ```ignore
//! use lessonbook::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "coach")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as lessonbook_mongodb;

pub mod store;
pub mod query;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
