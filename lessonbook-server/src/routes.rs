//! The collection gateway.
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/` | usage hint |
//! | GET | `/collection/{name}` | every document |
//! | GET | `/collection/{name}/{search}` | documents whose searchable fields contain the term |
//! | POST | `/collection/{name}` | insert, or place an order for an orders collection |
//! | PUT | `/collection/{name}/{id}` | partial update of one document; orders are read-only |

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use lessonbook::{
    booking::{OrderRequest, place_order},
    error::DocumentStoreError,
    store::CollectionKind,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    extract::{BoundCollection, JsonBody},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/collection/{name}", get(list).post(insert))
        // An empty search box produces a trailing slash.
        .route("/collection/{name}/", get(list))
        // GET searches, PUT updates by id: both share the second segment.
        .route("/collection/{name}/{key}", get(search).put(update))
}

async fn index() -> &'static str {
    "Select a collection, e.g., /collection/lessons"
}

async fn list(
    State(state): State<AppState>,
    BoundCollection(collection): BoundCollection,
) -> Result<Json<Vec<Value>>, AppError> {
    Ok(Json(state.bounded(collection.list_all()).await?))
}

async fn search(
    State(state): State<AppState>,
    BoundCollection(collection): BoundCollection,
    Path((_, term)): Path<(String, String)>,
) -> Result<Json<Vec<Value>>, AppError> {
    Ok(Json(state.bounded(collection.search(&term)).await?))
}

async fn insert(
    State(state): State<AppState>,
    BoundCollection(collection): BoundCollection,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, AppError> {
    match collection.spec().kind {
        CollectionKind::Catalog => {
            let result = state.bounded(collection.insert_one(body)).await?;

            Ok(Json(json!({
                "success": true,
                "message": "Document added successfully",
                "id": result.id,
            })))
        }
        CollectionKind::Orders => {
            let lessons = state.store.bind_stock(collection.spec())?;
            let request = OrderRequest::from_json(body)?;

            // Detached so a timed-out response never cancels between reserve and insert.
            let checkout = tokio::spawn(async move { place_order(&lessons, &collection, request).await });
            let placed = state
                .bounded(async move {
                    match checkout.await {
                        Ok(outcome) => outcome.map_err(AppError::from),
                        Err(e) => Err(AppError::Store(DocumentStoreError::Backend(e.to_string()))),
                    }
                })
                .await?;

            Ok(Json(json!({
                "success": true,
                "message": "Order added successfully",
                "id": placed.id,
            })))
        }
    }
}

async fn update(
    State(state): State<AppState>,
    BoundCollection(collection): BoundCollection,
    Path((_, id)): Path<(String, String)>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, AppError> {
    let result = state.bounded(collection.update_one(&id, body)).await?;

    Ok(Json(json!({
        "success": result.modified,
        "matched": result.matched,
    })))
}
