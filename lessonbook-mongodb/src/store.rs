use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, Bson, doc, oid::ObjectId};
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind},
    options::ClientOptions,
};
use lessonbook_core::{
    backend::{ReserveLine, check_quantities, ReserveOutcome, StoreBackend, StoreBackendBuilder, UpdateResult},
    document::{DocumentId, ID_FIELD},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Query, QueryVisitor},
};

use crate::query::MongoQueryTranslator;


fn store_error(err: MongoError) -> DocumentStoreError {
    match *err.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => DocumentStoreError::Unavailable(err.to_string()),
        _ => DocumentStoreError::Backend(err.to_string()),
    }
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    /// Conditionally decrements one counter. Returns whether the document had enough left.
    async fn take(&self, line: &ReserveLine, field: &str, collection: &str) -> DocumentStoreResult<bool> {
        let result = self.get_collection(collection)
            .update_one(
                doc! { ID_FIELD: line.id.oid(), field: { "$gte": line.quantity } },
                doc! { "$inc": { field: -line.quantity } },
            )
            .await
            .map_err(store_error)?;

        Ok(result.matched_count == 1)
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn find_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        self.get_collection(collection)
            .find(
                if let Some(expr) = &query.filter {
                    MongoQueryTranslator.visit_expr(expr)?
                } else {
                    doc! {}
                },
            )
            .await
            .map_err(store_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(store_error)
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
                let oid = ObjectId::new();
                document.insert(ID_FIELD, oid);
                DocumentId::from(oid)
            }
        };

        self.get_collection(collection)
            .insert_one(document)
            .await
            .map_err(store_error)?;

        Ok(id)
    }

    async fn update_document(&self, id: DocumentId, fields: Document, collection: &str) -> DocumentStoreResult<UpdateResult> {
        let result = self.get_collection(collection)
            .update_one(
                doc! { ID_FIELD: id.oid() },
                doc! { "$set": fields },
            )
            .await
            .map_err(store_error)?;

        Ok(UpdateResult {
            matched: result.matched_count == 1,
            modified: result.modified_count == 1,
        })
    }

    async fn reserve(&self, lines: &[ReserveLine], field: &str, collection: &str) -> DocumentStoreResult<ReserveOutcome> {
        check_quantities(lines)?;

        // Each decrement is atomic on its own document. Lines already taken are given back
        // when a later one fails, so the reservation as a whole is all or nothing.
        for (taken, line) in lines.iter().enumerate() {
            let outcome = self.take(line, field, collection).await;

            match outcome {
                Ok(true) => continue,
                Ok(false) => {
                    self.release(&lines[..taken], field, collection).await?;
                    return Ok(ReserveOutcome::Insufficient(line.id));
                }
                Err(e) => {
                    if let Err(release_err) = self.release(&lines[..taken], field, collection).await {
                        tracing::warn!(error = %release_err, "failed to give back seats after reservation error");
                    }
                    return Err(e);
                }
            }
        }

        Ok(ReserveOutcome::Reserved)
    }

    async fn release(&self, lines: &[ReserveLine], field: &str, collection: &str) -> DocumentStoreResult<()> {
        check_quantities(lines)?;

        for line in lines {
            self.get_collection(collection)
                .update_one(
                    doc! { ID_FIELD: line.id.oid() },
                    doc! { "$inc": { field: line.quantity } },
                )
                .await
                .map_err(store_error)?;
        }

        Ok(())
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .create_collection(name)
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(store_error)
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shutdown().await
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
    timeout: Option<Duration>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            timeout: None,
        }
    }

    /// Bounds connection setup and server selection.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    /// Connects and pings the deployment; an unreachable store fails the build.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        if let Some(timeout) = self.timeout {
            options.connect_timeout = Some(timeout);
            options.server_selection_timeout = Some(timeout);
        }

        let store = MongoDbStore::new(
            Client::with_options(options)
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        );

        StoreBackend::ping(&store)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        tracing::info!(database = %store.database, "connected to MongoDB");

        Ok(store)
    }
}
