use std::collections::HashMap;

use axum::{
    extract::{FromRequest, FromRequestParts, Path},
    http::request::Parts,
};
use lessonbook::collection::Collection;

use crate::{error::AppError, state::AppState};

/// The collection named by the `{name}` path segment, resolved against the registry.
///
/// Unregistered names are rejected before any handler runs.
pub struct BoundCollection(pub Collection);

impl FromRequestParts<AppState> for BoundCollection {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state).await?;

        let name = params
            .get("name")
            .ok_or_else(|| AppError::Payload("missing collection name".to_string()))?;

        Ok(BoundCollection(state.store.bind(name)?))
    }
}

/// `Json` with rejections reported through [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
