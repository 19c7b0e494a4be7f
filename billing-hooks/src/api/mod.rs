//! API routes for billing-hooks

pub mod checkout;
pub mod customer;
pub mod health;
pub mod portal;
pub mod stripe_webhook;

use axum::routing::{get, post};
use axum::{Router, middleware};
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::user_auth_middleware;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Browser-facing endpoints (platform token authenticated)
    let user = Router::new()
        .route(
            "/create-checkout-session",
            post(checkout::create_checkout_session),
        )
        .route(
            "/create-portal-link",
            post(portal::create_portal_link).get(portal::create_portal_link),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ))
        .layer(CorsLayer::permissive());

    // Stripe webhook (signature-verified, raw body)
    let webhook = Router::new().route("/stripe", post(stripe_webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(user)
        .merge(webhook)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .with_state(state)
}
