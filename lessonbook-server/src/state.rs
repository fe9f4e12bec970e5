use std::{future::Future, sync::Arc, time::Duration};

use lessonbook::{error::DocumentStoreError, store::DocumentStore};

use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    /// Upper bound on any single store operation.
    pub timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Runs a store operation, failing with [`DocumentStoreError::Timeout`] once the
    /// configured bound elapses.
    pub async fn bounded<T, E, F>(&self, operation: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<AppError>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(DocumentStoreError::Timeout(self.timeout.as_millis() as u64).into()),
        }
    }
}
