//! Client-side cart and checkout flow.
//!
//! The cart lives entirely on the client. Adding a lesson takes one seat off the displayed
//! catalog so the user cannot add more seats than they can see; removing an entry gives the
//! seats back. The server only ever sees the [`OrderRequest`] derived from the cart, and it
//! re-checks every seat when the order is placed.

use serde::Serialize;
use thiserror::Error;

use crate::{
    booking::{OrderLine, OrderRequest},
    catalog::{Catalog, Lesson},
    document::DocumentId,
    sort::sort_lessons,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CartError {
    #[error("Lesson {0} has no space left")]
    SoldOut(DocumentId),
    #[error("Lesson {0} is not in the catalog")]
    UnknownLesson(DocumentId),
    #[error("Lesson {0} is not in the cart")]
    NotInCart(DocumentId),
    #[error("Invalid checkout details: {0}")]
    InvalidForm(&'static str),
    #[error("The cart is empty")]
    Empty,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartEntry {
    pub lesson_id: DocumentId,
    pub unit_price: f64,
    /// Accumulated price of all seats in this entry.
    pub price: f64,
    pub quantity: i64,
    /// Seats left for this lesson after this entry.
    pub space: i64,
}

/// Ordered cart, one entry per lesson.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether another seat of `lesson` can be added.
    pub fn can_add(lesson: &Lesson) -> bool {
        lesson.space > 0
    }

    /// Total number of seats in the cart.
    pub fn item_count(&self) -> i64 {
        self.entries.iter().map(|entry| entry.quantity).sum()
    }

    /// Total price of the cart.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.price).sum()
    }

    /// Adds one seat of lesson `id`, taking it from the displayed catalog.
    ///
    /// # Errors
    ///
    /// [`CartError::SoldOut`] when the displayed lesson has no space left; the catalog and
    /// cart are left unchanged.
    pub fn add(&mut self, catalog: &mut Catalog, id: DocumentId) -> Result<&CartEntry, CartError> {
        let lesson = catalog.get_mut(id).ok_or(CartError::UnknownLesson(id))?;

        if !Cart::can_add(lesson) {
            return Err(CartError::SoldOut(id));
        }

        lesson.space -= 1;
        let (unit_price, space) = (lesson.price, lesson.space);

        let index = match self.entries.iter().position(|entry| entry.lesson_id == id) {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.quantity += 1;
                entry.space -= 1;
                entry.price += unit_price;
                index
            }
            None => {
                self.entries.push(CartEntry {
                    lesson_id: id,
                    unit_price,
                    price: unit_price,
                    quantity: 1,
                    space,
                });
                self.entries.len() - 1
            }
        };

        Ok(&self.entries[index])
    }

    /// Removes the entry for lesson `id` and returns its seats to the displayed catalog.
    pub fn remove(&mut self, catalog: &mut Catalog, id: DocumentId) -> Result<CartEntry, CartError> {
        let index = self.entries
            .iter()
            .position(|entry| entry.lesson_id == id)
            .ok_or(CartError::NotInCart(id))?;
        let entry = self.entries.remove(index);

        // The lesson may have dropped out of view after a search.
        if let Some(lesson) = catalog.get_mut(id) {
            lesson.space += entry.quantity;
        }

        Ok(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Derives the checkout payload.
    pub fn to_order(&self, name: &str, phone: &str) -> OrderRequest {
        OrderRequest {
            name: name.to_string(),
            phone: phone.to_string(),
            lessons: self.entries
                .iter()
                .map(|entry| OrderLine {
                    lesson_id: entry.lesson_id,
                    quantity: entry.quantity,
                    space: Some(entry.space),
                })
                .collect(),
        }
    }
}

/// Contact details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutForm {
    pub name: String,
    pub phone: String,
}

impl CheckoutForm {
    /// Name must be letters and spaces, phone exactly ten digits.
    pub fn validate(&self) -> Result<(), CartError> {
        let name = self.name.trim();

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace()) {
            return Err(CartError::InvalidForm("name must contain only letters and spaces"));
        }
        if self.phone.len() != 10 || !self.phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(CartError::InvalidForm("phone must be exactly 10 digits"));
        }

        Ok(())
    }
}

/// Search and sort state of the lesson list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub sort_by: String,
    pub sort_direction: String,
    pub search_input: String,
}

impl ViewState {
    pub fn reset(&mut self) {
        *self = ViewState::default();
    }

    /// Applies the current sort to `lessons`.
    pub fn apply(&self, lessons: &[Lesson]) -> Vec<Lesson> {
        sort_lessons(lessons, &self.sort_by, &self.sort_direction)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Browsing,
    CartBuilding,
    Submitting,
    Confirmed,
    Failed(String),
}

/// One user's browsing session: catalog, cart, view state and checkout progress.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub catalog: Catalog,
    pub cart: Cart,
    pub view: ViewState,
    pub form: CheckoutForm,
    state: CheckoutState,
}

impl CheckoutSession {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            cart: Cart::new(),
            view: ViewState::default(),
            form: CheckoutForm::default(),
            state: CheckoutState::Browsing,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn add(&mut self, id: DocumentId) -> Result<(), CartError> {
        self.cart.add(&mut self.catalog, id)?;
        self.state = CheckoutState::CartBuilding;
        Ok(())
    }

    pub fn remove(&mut self, id: DocumentId) -> Result<(), CartError> {
        self.cart.remove(&mut self.catalog, id)?;
        if self.cart.is_empty() {
            self.state = CheckoutState::Browsing;
        }
        Ok(())
    }

    /// Validates the form and moves to `Submitting`, returning the payload to send.
    pub fn submit(&mut self) -> Result<OrderRequest, CartError> {
        if self.cart.is_empty() {
            return Err(CartError::Empty);
        }
        self.form.validate()?;

        self.state = CheckoutState::Submitting;
        Ok(self.cart.to_order(self.form.name.trim(), &self.form.phone))
    }

    /// The order was recorded: clear the cart and reset the view.
    pub fn confirm(&mut self) {
        self.cart.clear();
        self.view.reset();
        self.form = CheckoutForm::default();
        self.state = CheckoutState::Confirmed;
    }

    /// The submission failed. The cart is kept so the user can retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = CheckoutState::Failed(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(subject: &str, price: f64, space: i64) -> Lesson {
        Lesson {
            id: DocumentId::new(),
            subject: subject.to_string(),
            location: "London".to_string(),
            price,
            space,
        }
    }

    #[test]
    fn repeated_adds_accumulate() {
        let math = lesson("Math", 10.0, 3);
        let mut catalog = Catalog::new(vec![math.clone()]);
        let mut cart = Cart::new();

        cart.add(&mut catalog, math.id).unwrap();
        let entry = cart.add(&mut catalog, math.id).unwrap().clone();

        assert_eq!(entry.quantity, 2);
        assert_eq!(entry.price, 20.0);
        assert_eq!(entry.space, 1);
        assert_eq!(catalog.get(math.id).unwrap().space, 1);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.entries().len(), 1);
    }

    #[test]
    fn sold_out_lessons_are_rejected() {
        let full = lesson("Art", 5.0, 0);
        let mut catalog = Catalog::new(vec![full.clone()]);
        let mut cart = Cart::new();

        assert_eq!(cart.add(&mut catalog, full.id).unwrap_err(), CartError::SoldOut(full.id));
        assert!(cart.is_empty());
        assert_eq!(catalog.get(full.id).unwrap().space, 0);
    }

    #[test]
    fn cannot_add_past_zero() {
        let last = lesson("Art", 5.0, 1);
        let mut catalog = Catalog::new(vec![last.clone()]);
        let mut cart = Cart::new();

        cart.add(&mut catalog, last.id).unwrap();
        assert!(matches!(cart.add(&mut catalog, last.id), Err(CartError::SoldOut(_))));
        assert_eq!(catalog.get(last.id).unwrap().space, 0);
    }

    #[test]
    fn add_then_remove_restores_space() {
        let math = lesson("Math", 10.0, 5);
        let mut catalog = Catalog::new(vec![math.clone()]);
        let mut cart = Cart::new();

        cart.add(&mut catalog, math.id).unwrap();
        cart.remove(&mut catalog, math.id).unwrap();

        assert_eq!(catalog.get(math.id).unwrap().space, 5);
        assert!(cart.entries().iter().all(|entry| entry.lesson_id != math.id));
    }

    #[test]
    fn removing_unknown_entry_fails() {
        let mut catalog = Catalog::default();
        let mut cart = Cart::new();
        let id = DocumentId::new();

        assert_eq!(cart.remove(&mut catalog, id).unwrap_err(), CartError::NotInCart(id));
    }

    #[test]
    fn order_payload_mirrors_cart() {
        let math = lesson("Math", 10.0, 5);
        let mut catalog = Catalog::new(vec![math.clone()]);
        let mut cart = Cart::new();
        cart.add(&mut catalog, math.id).unwrap();
        cart.add(&mut catalog, math.id).unwrap();

        let order = cart.to_order("Ada", "0123456789");
        assert_eq!(order.lessons, vec![OrderLine { lesson_id: math.id, quantity: 2, space: Some(3) }]);
    }

    #[test]
    fn form_validation() {
        let ok = CheckoutForm { name: "Ada Lovelace".into(), phone: "0123456789".into() };
        assert!(ok.validate().is_ok());

        let digits_in_name = CheckoutForm { name: "R2D2".into(), ..ok.clone() };
        assert!(digits_in_name.validate().is_err());

        let short_phone = CheckoutForm { phone: "12345".into(), ..ok.clone() };
        assert!(short_phone.validate().is_err());

        let blank = CheckoutForm { name: "  ".into(), ..ok };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn session_walks_the_checkout_states() {
        let math = lesson("Math", 10.0, 2);
        let mut session = CheckoutSession::new(Catalog::new(vec![math.clone()]));
        assert_eq!(session.state(), &CheckoutState::Browsing);

        assert_eq!(session.submit().unwrap_err(), CartError::Empty);

        session.add(math.id).unwrap();
        assert_eq!(session.state(), &CheckoutState::CartBuilding);

        session.view.sort_by = "price".into();
        session.view.search_input = "ma".into();
        session.form = CheckoutForm { name: "Ada".into(), phone: "0123456789".into() };

        let order = session.submit().unwrap();
        assert_eq!(order.lessons.len(), 1);
        assert_eq!(session.state(), &CheckoutState::Submitting);

        session.confirm();
        assert_eq!(session.state(), &CheckoutState::Confirmed);
        assert!(session.cart.is_empty());
        assert_eq!(session.view, ViewState::default());
    }

    #[test]
    fn failed_submission_keeps_the_cart() {
        let math = lesson("Math", 10.0, 2);
        let mut session = CheckoutSession::new(Catalog::new(vec![math.clone()]));
        session.add(math.id).unwrap();
        session.form = CheckoutForm { name: "Ada".into(), phone: "0123456789".into() };
        session.submit().unwrap();

        session.fail("Lesson sold out");
        assert_eq!(session.state(), &CheckoutState::Failed("Lesson sold out".into()));
        assert_eq!(session.cart.item_count(), 1);
    }
}
