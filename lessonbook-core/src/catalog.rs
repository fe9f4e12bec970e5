//! Lessons as fetched and displayed by a client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    document::DocumentId,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// A bookable lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub subject: String,
    pub location: String,
    pub price: f64,
    pub space: i64,
}

/// The list of lessons currently shown to the user, with locally tracked seat counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    lessons: Vec<Lesson>,
}

impl Catalog {
    pub fn new(lessons: Vec<Lesson>) -> Self {
        Self { lessons }
    }

    /// Builds a catalog from the documents returned by the gateway.
    pub fn from_documents(documents: Vec<Value>) -> DocumentStoreResult<Self> {
        documents
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc)
                    .map_err(|e| DocumentStoreError::InvalidDocument(e.to_string()))
            })
            .collect::<DocumentStoreResult<Vec<Lesson>>>()
            .map(Self::new)
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn get(&self, id: DocumentId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: DocumentId) -> Option<&mut Lesson> {
        self.lessons.iter_mut().find(|lesson| lesson.id == id)
    }

    /// Replaces the displayed lessons, e.g. after a search.
    pub fn replace(&mut self, lessons: Vec<Lesson>) {
        self.lessons = lessons;
    }
}
