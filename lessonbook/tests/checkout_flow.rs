use std::sync::Arc;

use lessonbook::{
    booking::place_order,
    cart::{CartError, CheckoutSession, CheckoutState},
    catalog::Catalog,
    memory::InMemoryStore,
    prelude::*,
};
use serde_json::json;

#[tokio::test]
async fn browse_add_and_check_out() {
    let store = Arc::new(DocumentStore::new(InMemoryStore::new(), CollectionRegistry::default()));
    let lessons = store.bind("lessons").unwrap();
    let orders = store.bind("orders").unwrap();

    let math = lessons
        .insert_one(json!({ "subject": "Mathematics", "location": "London", "price": 100, "space": 2 }))
        .await
        .unwrap()
        .id;
    lessons
        .insert_one(json!({ "subject": "Music", "location": "Bristol", "price": 80, "space": 5 }))
        .await
        .unwrap();

    let mut session = CheckoutSession::new(Catalog::from_documents(lessons.list_all().await.unwrap()).unwrap());
    session.view.sort_by = "price".to_string();
    session.view.sort_direction = "ascending".to_string();
    assert_eq!(session.view.apply(session.catalog.lessons())[0].subject, "Music");

    session.add(math).unwrap();
    session.add(math).unwrap();
    assert_eq!(session.add(math), Err(CartError::SoldOut(math)));
    assert_eq!(session.cart.total(), 200.0);

    session.form.name = "Ada Lovelace".to_string();
    session.form.phone = "0123456789".to_string();
    let request = session.submit().unwrap();
    assert_eq!(session.state(), &CheckoutState::Submitting);

    place_order(&lessons, &orders, request).await.unwrap();
    session.confirm();

    assert!(session.cart.is_empty());
    assert_eq!(session.view.sort_by, "");
    assert_eq!(session.state(), &CheckoutState::Confirmed);

    let refreshed = Catalog::from_documents(lessons.search("math").await.unwrap()).unwrap();
    assert_eq!(refreshed.get(math).unwrap().space, 0);
}

#[tokio::test]
async fn stale_cart_is_refused_by_the_server() {
    let store = Arc::new(DocumentStore::new(InMemoryStore::new(), CollectionRegistry::default()));
    let lessons = store.bind("lessons").unwrap();
    let orders = store.bind("orders").unwrap();

    let math = lessons
        .insert_one(json!({ "subject": "Mathematics", "location": "London", "price": 100, "space": 1 }))
        .await
        .unwrap()
        .id;

    let documents = lessons.list_all().await.unwrap();
    let mut first = CheckoutSession::new(Catalog::from_documents(documents.clone()).unwrap());
    let mut second = CheckoutSession::new(Catalog::from_documents(documents).unwrap());

    for session in [&mut first, &mut second] {
        session.add(math).unwrap();
        session.form.name = "Ada".to_string();
        session.form.phone = "0123456789".to_string();
    }

    place_order(&lessons, &orders, first.submit().unwrap()).await.unwrap();

    let err = place_order(&lessons, &orders, second.submit().unwrap()).await.unwrap_err();
    assert!(matches!(err, BookingError::SoldOut { lesson_id } if lesson_id == math));
    second.fail(err.to_string());

    assert!(matches!(second.state(), CheckoutState::Failed(_)));
    assert_eq!(second.cart.item_count(), 1);
}
