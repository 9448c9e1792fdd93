//! Donation API endpoints.

use axum::{extract::State, Json};
use chrono::Utc;

use super::{success, ApiResult};
use crate::donation::validate_json_amount;
use crate::errors::AppError;
use crate::models::{
    CreatePaymentIntentRequest, DonationRecord, PaymentIntentResponse, ANONYMOUS_DONOR,
};
use crate::stripe::PaymentIntentParams;
use crate::AppState;

/// POST /api/donations/create-payment-intent - Create a payment intent for a donation.
///
/// Responds with the bare `{client_secret}` body the card form expects.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, AppError> {
    let amount_cents = validate_json_amount(&request.amount, state.config.donation_bounds)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let currency = request
        .currency
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| state.config.currency.clone());
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation(format!(
            "Unsupported currency: {}",
            currency
        )));
    }

    let mut metadata = request.metadata.unwrap_or_default();
    metadata.donor_name = metadata.donor_name.trim().to_string();
    if metadata.donor_name.is_empty() {
        metadata.donor_name = ANONYMOUS_DONOR.to_string();
    }
    metadata.donor_email = metadata.donor_email.trim().to_string();

    let params = PaymentIntentParams {
        amount_cents,
        currency: currency.clone(),
        metadata: metadata.clone(),
    };
    let intent = state.stripe.create_payment_intent(&params).await?;
    let client_secret = intent.client_secret.clone().ok_or_else(|| {
        AppError::PaymentProvider("Payment intent has no client secret".to_string())
    })?;

    let record = DonationRecord {
        id: uuid::Uuid::new_v4().to_string(),
        payment_intent_id: intent.id.clone(),
        amount_cents,
        currency,
        donor_name: metadata.donor_name,
        donor_email: Some(metadata.donor_email).filter(|e| !e.is_empty()),
        donation_type: metadata.donation_type,
        is_emergency: metadata.is_emergency,
        status: intent.status.clone(),
        created_at: Utc::now().to_rfc3339(),
    };
    state.repo.create_donation(&record).await?;

    tracing::info!(
        "Payment intent {} created for {} cents",
        intent.id,
        amount_cents
    );

    Ok(Json(PaymentIntentResponse { client_secret }))
}

/// GET /api/admin/donations - List recorded donations.
pub async fn list_donations(State(state): State<AppState>) -> ApiResult<Vec<DonationRecord>> {
    success(state.repo.list_donations().await?)
}
