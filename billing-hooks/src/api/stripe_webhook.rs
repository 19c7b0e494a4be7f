//! Stripe webhook handler
//!
//! POST /stripe: applies Stripe events to the local mirror records (raw
//! body for signature verification)

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{Value, json};
use shared::error::AppError;

use crate::error::ServiceResult;
use crate::reconcile::Reconciler;
use crate::state::AppState;
use crate::stripe::types::{RawEvent, WebhookEvent};
use crate::stripe::{SignatureError, verify_webhook_signature};

fn received() -> Json<Value> {
    Json(json!({ "success": "data was received" }))
}

/// Handle incoming Stripe webhook events
///
/// Failures answer 400 without recording the event, so Stripe redelivers.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ServiceResult<Json<Value>> {
    // 1. Signature, before touching the payload
    let sig_header = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::Missing);
    if let Err(e) = sig_header.and_then(|sig| {
        verify_webhook_signature(
            &body,
            sig,
            &state.stripe.webhook_secret,
            state.stripe.webhook_tolerance_secs,
            chrono::Utc::now().timestamp(),
        )
    }) {
        tracing::warn!(error = %e, "Webhook signature verification failed");
        return Err(AppError::from(e).into());
    }

    // 2. Envelope
    let raw: RawEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(%e, "Failed to parse webhook JSON");
        AppError::malformed_event(format!("failed to parse the stripe event: {e}"))
    })?;
    let event_id = raw.id.clone();
    let event_type = raw.event_type.clone();
    tracing::info!(event_id = %event_id, event_type = %event_type, "Received Stripe webhook");

    // 3. Idempotency
    if state.store.is_event_processed(&event_id).await? {
        tracing::info!(event_id = %event_id, "Duplicate webhook event, skipping");
        return Ok(received());
    }

    // 4. Typed event and reconciliation
    let event = WebhookEvent::try_from(raw).inspect_err(|e| {
        tracing::warn!(event_id = %event_id, event_type = %event_type, error = %e, "Rejected webhook event");
    })?;
    let result = Reconciler::new(state.store.clone())
        .reconcile(&event)
        .await
        .inspect_err(|e| {
            tracing::warn!(event_id = %event_id, event_type = %event_type, error = %e, "Webhook reconciliation failed");
        })?;

    state
        .store
        .mark_event_processed(&event_id, &event_type)
        .await?;

    tracing::info!(
        event_id = %event_id,
        kind = ?result.kind,
        external_id = %result.external_id,
        outcome = ?result.outcome,
        "Webhook event applied"
    );
    Ok(received())
}
