//! Convenient re-exports of commonly used types from lessonbook.
//!
//! ```ignore
//! use lessonbook::prelude::*;
//! ```

pub use lessonbook_core::{
    backend::{StoreBackend, DynStoreBackend, StoreBackendBuilder, UpdateResult, ReserveLine, ReserveOutcome},
    collection::{Collection, InsertResult},
    store::{DocumentStore, CollectionRegistry, CollectionSpec, CollectionKind},
    document::DocumentId,
    query::{Query, QueryVisitor, Expr, FieldOp, Filter},
    booking::{BookingError, OrderRequest, PlacedOrder},
    error::{DocumentStoreError, DocumentStoreResult},
};
