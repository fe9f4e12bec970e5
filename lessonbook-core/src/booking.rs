//! Server-side checkout.
//!
//! Placing an order is a single operation: every requested lesson is reserved with a
//! check-and-decrement on its `space` counter, and only when all lines are reserved is the
//! order document written. If any line cannot be reserved nothing changes and the whole order
//! is rejected with [`BookingError::SoldOut`]. If the order write fails after the seats were
//! taken, the seats are released again.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    backend::{ReserveLine, ReserveOutcome},
    collection::Collection,
    document::{DocumentId, to_document},
    error::DocumentStoreError,
};

/// Counter field holding a lesson's remaining seats.
pub const SPACE_FIELD: &str = "space";

#[derive(Error, Debug)]
pub enum BookingError {
    /// The order has no lines.
    #[error("An order must contain at least one lesson")]
    EmptyOrder,
    /// A line asked for zero or fewer seats.
    #[error("Invalid quantity {quantity} for lesson {lesson_id}")]
    InvalidQuantity { lesson_id: DocumentId, quantity: i64 },
    /// Not enough seats remain for a lesson; nothing was booked.
    #[error("Lesson {lesson_id} does not have enough space left")]
    SoldOut { lesson_id: DocumentId },
    /// The store failed or the payload was malformed.
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
}

/// One requested lesson in an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub lesson_id: DocumentId,
    pub quantity: i64,
    /// Remaining space as the client saw it when submitting. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<i64>,
}

/// Checkout payload sent by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderRequest {
    pub name: String,
    pub phone: String,
    pub lessons: Vec<OrderLine>,
}

/// The persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub name: String,
    pub phone: String,
    pub lessons: Vec<OrderLine>,
    pub placed_at: String,
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub id: DocumentId,
    pub order: Order,
}

impl OrderRequest {
    /// Parses a checkout payload.
    pub fn from_json(value: Value) -> Result<Self, BookingError> {
        serde_json::from_value(value)
            .map_err(|e| BookingError::Store(DocumentStoreError::InvalidDocument(e.to_string())))
    }

    /// Validates the lines and merges repeated lessons into one reservation line each.
    pub fn reserve_lines(&self) -> Result<Vec<ReserveLine>, BookingError> {
        if self.lessons.is_empty() {
            return Err(BookingError::EmptyOrder);
        }

        let mut lines: Vec<ReserveLine> = Vec::with_capacity(self.lessons.len());

        for line in &self.lessons {
            if line.quantity < 1 {
                return Err(BookingError::InvalidQuantity {
                    lesson_id: line.lesson_id,
                    quantity: line.quantity,
                });
            }

            match lines.iter_mut().find(|l| l.id == line.lesson_id) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(line.quantity)
                        .ok_or(BookingError::InvalidQuantity {
                            lesson_id: line.lesson_id,
                            quantity: line.quantity,
                        })?;
                }
                None => lines.push(ReserveLine { id: line.lesson_id, quantity: line.quantity }),
            }
        }

        Ok(lines)
    }
}

/// Reserves every line of `request` in `lessons` and records the order in `orders`.
pub async fn place_order(
    lessons: &Collection,
    orders: &Collection,
    request: OrderRequest,
) -> Result<PlacedOrder, BookingError> {
    let lines = request.reserve_lines()?;

    if let ReserveOutcome::Insufficient(lesson_id) = lessons.reserve(&lines, SPACE_FIELD).await? {
        tracing::warn!(%lesson_id, "checkout rejected, lesson sold out");
        return Err(BookingError::SoldOut { lesson_id });
    }

    let order = Order {
        name: request.name,
        phone: request.phone,
        lessons: request.lessons,
        placed_at: Utc::now().to_rfc3339(),
    };

    let inserted = match to_document(&order) {
        Ok(document) => orders.insert_document(document).await,
        Err(e) => Err(e),
    };

    match inserted {
        Ok(result) => {
            tracing::info!(order_id = %result.id, lines = lines.len(), "order placed");
            Ok(PlacedOrder { id: result.id, order })
        }
        Err(e) => {
            if let Err(release_err) = lessons.release(&lines, SPACE_FIELD).await {
                tracing::warn!(error = %release_err, "failed to release seats after order write failure");
            }
            Err(e.into())
        }
    }
}
