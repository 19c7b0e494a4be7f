//! Customer resolution shared by the checkout and portal endpoints

use shared::billing::{CustomerMapping, User};
use shared::error::{AppError, ErrorCode};

use crate::auth::UserIdentity;
use crate::error::ServiceResult;
use crate::state::AppState;

/// Load the authenticated user's record
pub async fn load_user(state: &AppState, identity: &UserIdentity) -> ServiceResult<User> {
    match state.store.find_user(&identity.user_id).await? {
        Some(user) => Ok(user),
        None => {
            tracing::warn!(user_id = %identity.user_id, "Token for unknown user");
            Err(AppError::new(ErrorCode::UserNotFound).into())
        }
    }
}

/// Return the user's customer mapping, creating the processor customer on first use.
///
/// Concurrent first calls may each create a processor customer; the store
/// keeps the first mapping and the other customer is left unused.
pub async fn find_or_create_customer(
    state: &AppState,
    user: &User,
) -> ServiceResult<CustomerMapping> {
    if let Some(mapping) = state.store.find_customer_by_user(&user.id).await? {
        return Ok(mapping);
    }

    let customer_id = state
        .payments
        .create_customer(user)
        .await
        .map_err(|e| e.into_app_error(ErrorCode::CustomerCreateFailed))?;

    let mapping = state
        .store
        .insert_customer(CustomerMapping::new(user.id.as_str(), customer_id.as_str()))
        .await?;

    if mapping.stripe_customer_id == customer_id {
        tracing::info!(user_id = %user.id, stripe_customer_id = %customer_id, "Customer created");
    } else {
        tracing::warn!(
            user_id = %user.id,
            orphaned = %customer_id,
            stripe_customer_id = %mapping.stripe_customer_id,
            "Concurrent customer creation; keeping existing mapping"
        );
    }
    Ok(mapping)
}
