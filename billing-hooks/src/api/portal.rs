//! Billing portal endpoint
//!
//! POST|GET /create-portal-link

use axum::Json;
use axum::extract::{Extension, State};
use serde_json::Value;
use shared::error::ErrorCode;

use super::customer::{find_or_create_customer, load_user};
use crate::auth::UserIdentity;
use crate::error::ServiceResult;
use crate::state::AppState;

pub async fn create_portal_link(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ServiceResult<Json<Value>> {
    let user = load_user(&state, &identity).await?;
    let customer = find_or_create_customer(&state, &user).await?;

    let session = state
        .payments
        .create_portal_session(&customer.stripe_customer_id, &state.stripe.portal_return_url)
        .await
        .map_err(|e| e.into_app_error(ErrorCode::PortalSessionFailed))?;

    tracing::info!(user_id = %user.id, "Billing portal session created");
    Ok(Json(session))
}
