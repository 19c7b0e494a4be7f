mod common;

use http::StatusCode;
use serde_json::json;

use billing_hooks::db::Store;
use billing_hooks::stripe::sign_payload;
use common::{TestApp, WEBHOOK_SECRET, event, now, subscription_object};
use shared::billing::CustomerMapping;

fn product_event(id: &str, name: &str, active: bool) -> serde_json::Value {
    event(
        id,
        "product.updated",
        json!({"id": "prod_1", "object": "product", "active": active, "name": name, "description": null}),
    )
}

async fn app_with_customer() -> TestApp {
    let app = TestApp::new();
    app.user("user_1");
    app.store
        .insert_customer(CustomerMapping::new("user_1", "cus_1"))
        .await
        .unwrap();
    app
}

#[tokio::test]
async fn test_product_updated_twice_is_idempotent() {
    let app = TestApp::new();

    let (status, body) = app.webhook(&product_event("evt_1", "Basic", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "data was received");

    let (status, _) = app.webhook(&product_event("evt_2", "Pro", false)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.store.product_count(), 1);
    let product = app.store.find_product("prod_1").await.unwrap().unwrap();
    assert_eq!(product.name, "Pro");
    assert!(!product.active);
    assert_eq!(product.description, "");
}

#[tokio::test]
async fn test_redelivered_event_is_acknowledged_once() {
    let app = TestApp::new();
    let delivery = product_event("evt_1", "Basic", true);

    assert_eq!(app.webhook(&delivery).await.0, StatusCode::OK);
    assert_eq!(app.webhook(&delivery).await.0, StatusCode::OK);
    assert_eq!(app.store.processed_event_count(), 1);
    assert_eq!(app.store.product_count(), 1);
}

#[tokio::test]
async fn test_invalid_signature_never_mutates() {
    let app = app_with_customer().await;
    let deliveries = [
        product_event("evt_1", "Basic", true),
        event(
            "evt_2",
            "customer.subscription.created",
            subscription_object("sub_1", "cus_1", "active"),
        ),
        event("evt_3", "invoice.paid", json!({"id": "in_1"})),
    ];

    for delivery in deliveries {
        let payload = delivery.to_string();
        let wrong_secret = sign_payload(payload.as_bytes(), "whsec_wrong", now());
        let stale = sign_payload(payload.as_bytes(), WEBHOOK_SECRET, now() - 3600);
        let tampered = sign_payload(b"{}", WEBHOOK_SECRET, now());

        for signature in [Some(wrong_secret), Some(stale), Some(tampered), None] {
            let (status, body) = app.webhook_raw(payload.clone(), signature).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["kind"], "signature");
        }
    }

    assert_eq!(app.store.product_count(), 0);
    assert_eq!(app.store.subscription_count(), 0);
    assert_eq!(app.store.processed_event_count(), 0);
    let user = app.store.find_user("user_1").await.unwrap().unwrap();
    assert!(user.billing_address.is_none());
}

#[tokio::test]
async fn test_unknown_event_type_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .webhook(&event("evt_1", "invoice.paid", json!({"id": "in_1"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["failure"], "didn't receive a valid event");
    assert_eq!(body["kind"], "unsupported_event");
    assert_eq!(app.store.processed_event_count(), 0);
}

#[tokio::test]
async fn test_unparseable_body_is_rejected() {
    let app = TestApp::new();
    let payload = "not json".to_string();
    let sig = sign_payload(payload.as_bytes(), WEBHOOK_SECRET, now());
    let (status, body) = app.webhook_raw(payload, Some(sig)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_subscription_without_mapping_fails_and_writes_nothing() {
    let app = TestApp::new();
    app.user("user_1");

    let (status, body) = app
        .webhook(&event(
            "evt_1",
            "customer.subscription.created",
            subscription_object("sub_1", "cus_unknown", "active"),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["failure"], "no customer");
    assert_eq!(body["kind"], "not_found");
    assert_eq!(app.store.subscription_count(), 0);
    // Not recorded, so a redelivery after the mapping exists will apply
    assert_eq!(app.store.processed_event_count(), 0);
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let app = app_with_customer().await;

    let (status, _) = app
        .webhook(&event(
            "evt_1",
            "customer.subscription.created",
            subscription_object("sub_1", "cus_1", "active"),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let user = app.store.find_user("user_1").await.unwrap().unwrap();
    assert_eq!(user.address().unwrap().city.as_deref(), Some("Austin"));
    assert_eq!(user.payment_method.as_deref(), Some("card"));

    let (status, _) = app
        .webhook(&event(
            "evt_2",
            "customer.subscription.deleted",
            subscription_object("sub_1", "cus_1", "canceled"),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.store.subscription_count(), 1);
    let sub = app.store.find_subscription("sub_1").await.unwrap().unwrap();
    assert_eq!(sub.status, "canceled");
    assert_eq!(sub.user_id, "user_1");
    assert_eq!(sub.price_id.as_deref(), Some("price_pro"));
}

#[tokio::test]
async fn test_checkout_completed_subscription_mode_updates_both() {
    let app = app_with_customer().await;
    let mut subscription = subscription_object("sub_1", "cus_1", "active");
    subscription["default_payment_method"] = serde_json::Value::Null;

    let (status, _) = app
        .webhook(&event(
            "evt_1",
            "checkout.session.completed",
            json!({
                "id": "cs_1",
                "object": "checkout.session",
                "mode": "subscription",
                "customer": "cus_1",
                "subscription": subscription,
                "payment_method_types": ["card"],
                "customer_details": {"address": {"city": "Toronto", "country": "CA"}}
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let sub = app.store.find_subscription("sub_1").await.unwrap().unwrap();
    assert_eq!(sub.status, "active");
    assert_eq!(sub.user_id, "user_1");

    let user = app.store.find_user("user_1").await.unwrap().unwrap();
    assert_eq!(user.address().unwrap().city.as_deref(), Some("Toronto"));
    assert_eq!(user.payment_method.as_deref(), Some("card"));
}

#[tokio::test]
async fn test_checkout_completed_payment_mode_updates_neither() {
    let app = app_with_customer().await;

    let (status, body) = app
        .webhook(&event(
            "evt_1",
            "checkout.session.completed",
            json!({
                "id": "cs_2",
                "object": "checkout.session",
                "mode": "payment",
                "customer": "cus_1",
                "subscription": null,
                "payment_method_types": ["card"],
                "customer_details": {"address": {"city": "Toronto"}}
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "data was received");

    assert_eq!(app.store.subscription_count(), 0);
    let user = app.store.find_user("user_1").await.unwrap().unwrap();
    assert!(user.billing_address.is_none());
    assert!(user.payment_method.is_none());
}

#[tokio::test]
async fn test_storage_failure_is_retryable_persistence_error() {
    let app = app_with_customer().await;
    app.store.set_unavailable(true);

    let (status, body) = app.webhook(&product_event("evt_1", "Basic", true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "persistence");

    // Once storage recovers the redelivery applies
    app.store.set_unavailable(false);
    let (status, _) = app.webhook(&product_event("evt_1", "Basic", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.product_count(), 1);
}

#[tokio::test]
async fn test_price_events_mirror_recurring_fields() {
    let app = TestApp::new();
    let (status, _) = app
        .webhook(&event(
            "evt_1",
            "price.created",
            json!({
                "id": "price_pro",
                "object": "price",
                "product": "prod_1",
                "active": true,
                "currency": "usd",
                "nickname": null,
                "type": "recurring",
                "unit_amount": 2500,
                "recurring": {"interval": "year", "interval_count": 1, "trial_period_days": null}
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let price = app.store.find_price("price_pro").await.unwrap().unwrap();
    assert_eq!(price.product_id, "prod_1");
    assert_eq!(price.interval.as_deref(), Some("year"));
    assert_eq!(price.unit_amount, Some(2500));
    assert_eq!(price.trial_period_days, None);
    assert_eq!(app.store.price_count(), 1);
}
