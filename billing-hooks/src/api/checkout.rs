//! Checkout session endpoint
//!
//! POST /create-checkout-session: body `{price: {id, type}, quantity?}`

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::Value;
use shared::billing::PriceType;
use shared::error::{AppError, ErrorCode};

use super::customer::{find_or_create_customer, load_user};
use crate::auth::UserIdentity;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::stripe::{CheckoutMode, CheckoutParams};

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub price: PriceRef,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PriceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub price_type: String,
}

impl CheckoutRequest {
    /// Validate into `(price id, mode, quantity)`
    fn validate(&self) -> Result<(&str, CheckoutMode, u32), AppError> {
        if self.price.id.trim().is_empty() {
            return Err(AppError::new(ErrorCode::RequiredField).with_detail("field", "price.id"));
        }
        let price_type = PriceType::from_db(&self.price.price_type).ok_or_else(|| {
            AppError::new(ErrorCode::InvalidPriceType)
                .with_detail("price_type", self.price.price_type.as_str())
        })?;
        let quantity = match self.quantity {
            None => 1,
            Some(q) => u32::try_from(q)
                .ok()
                .filter(|q| *q >= 1)
                .ok_or_else(|| AppError::new(ErrorCode::InvalidQuantity).with_detail("quantity", q))?,
        };
        Ok((self.price.id.as_str(), CheckoutMode::from(price_type), quantity))
    }
}

pub async fn create_checkout_session(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    body: Bytes,
) -> ServiceResult<Json<Value>> {
    let user = load_user(&state, &identity).await?;

    // Parsed whatever the Content-Type; browsers posting a string send text/plain
    let req: CheckoutRequest = serde_json::from_slice(&body).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidRequest, "Could not create new session")
            .with_detail("reason", e.to_string())
    })?;
    let (price_id, mode, quantity) = req.validate()?;

    let customer = find_or_create_customer(&state, &user).await?;

    let params = CheckoutParams {
        customer_id: customer.stripe_customer_id,
        price_id: price_id.to_string(),
        quantity,
        mode,
        success_url: state.stripe.success_url.clone(),
        cancel_url: state.stripe.cancel_url.clone(),
    };
    let session = state
        .payments
        .create_checkout_session(&params)
        .await
        .map_err(|e| e.into_app_error(ErrorCode::CheckoutSessionFailed))?;

    tracing::info!(
        user_id = %user.id,
        price_id = %params.price_id,
        mode = params.mode.as_str(),
        "Checkout session created"
    );
    Ok(Json(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(price_type: &str, quantity: Option<i64>) -> CheckoutRequest {
        CheckoutRequest {
            price: PriceRef {
                id: "price_123".into(),
                price_type: price_type.into(),
            },
            quantity,
        }
    }

    #[test]
    fn test_mode_selection() {
        let req = request("recurring", None);
        assert_eq!(
            req.validate().unwrap(),
            ("price_123", CheckoutMode::Subscription, 1)
        );
        let req = request("one_time", Some(2));
        assert_eq!(req.validate().unwrap(), ("price_123", CheckoutMode::Payment, 2));
    }

    #[test]
    fn test_unknown_price_type() {
        let err = request("metered", None).validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPriceType);
    }

    #[test]
    fn test_quantity_must_be_positive() {
        for q in [0, -1, i64::MAX] {
            let err = request("one_time", Some(q)).validate().unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidQuantity);
        }
    }
}
