//! Stripe REST gateway.
//!
//! Only the two calls the donation flow needs are modelled: creating a
//! payment intent with the secret key (server side) and the publishable-key
//! calls used by the card confirmer (see `client::confirm`). Requests are
//! form-encoded as the Stripe API expects.

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};

use crate::errors::AppError;
use crate::models::{DonationMetadata, DonationType};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// A payment intent as returned by Stripe.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub latest_charge: Option<String>,
    #[serde(default)]
    pub last_payment_error: Option<StripeErrorBody>,
}

/// A payment method as returned by Stripe.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentMethod {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// A non-2xx answer from Stripe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub status: u16,
    /// Stripe's human-readable message, when it sent one
    pub message: Option<String>,
}

/// Decode a Stripe response, turning error bodies into [`ProviderError`].
pub async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ProviderError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|_| ProviderError {
        status: status.as_u16(),
        message: None,
    })?;

    if !status.is_success() {
        let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .and_then(|e| e.error.message);
        return Err(ProviderError {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Unexpected Stripe response body: {}", e);
        ProviderError {
            status: status.as_u16(),
            message: None,
        }
    })
}

/// Parameters of a donation payment intent.
#[derive(Debug, Clone)]
pub struct PaymentIntentParams {
    pub amount_cents: i64,
    pub currency: String,
    pub metadata: DonationMetadata,
}

impl PaymentIntentParams {
    /// Form fields sent to `POST /v1/payment_intents`.
    ///
    /// The donor's email goes into metadata only. `receipt_email` is never
    /// set: receipts are sent by the shelter, not by Stripe.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let meta = &self.metadata;
        let mut description = match meta.donation_type {
            DonationType::OneTime => "One-time donation".to_string(),
            DonationType::Monthly => "Monthly donation".to_string(),
        };
        if meta.is_emergency {
            description.push_str(" (emergency fund)");
        }

        let mut fields = vec![
            ("amount".to_string(), self.amount_cents.to_string()),
            ("currency".to_string(), self.currency.clone()),
            ("payment_method_types[]".to_string(), "card".to_string()),
            ("description".to_string(), description),
            ("metadata[donor_name]".to_string(), meta.donor_name.clone()),
            ("metadata[donor_email]".to_string(), meta.donor_email.clone()),
            (
                "metadata[donation_type]".to_string(),
                meta.donation_type.as_str().to_string(),
            ),
            (
                "metadata[is_emergency]".to_string(),
                meta.is_emergency.to_string(),
            ),
        ];
        if meta.donation_type == DonationType::Monthly {
            fields.push(("setup_future_usage".to_string(), "off_session".to_string()));
        }
        fields
    }
}

/// Server-side Stripe client authenticated with the secret key.
#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    api_base: String,
    secret_key: Option<String>,
}

impl StripeClient {
    pub fn new(http: Client, api_base: impl Into<String>, secret_key: Option<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Create a payment intent and return it with its client secret.
    pub async fn create_payment_intent(
        &self,
        params: &PaymentIntentParams,
    ) -> Result<StripePaymentIntent, AppError> {
        let secret_key = self.secret_key.as_deref().ok_or_else(|| {
            AppError::NotConfigured("Payment processing is not configured".to_string())
        })?;

        tracing::info!(
            "Creating payment intent: {} {} ({})",
            params.amount_cents,
            params.currency,
            params.metadata.donation_type.as_str()
        );

        let resp = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(secret_key)
            .form(&params.form_fields())
            .send()
            .await?;

        let intent: StripePaymentIntent = decode(resp).await.map_err(|e| {
            tracing::warn!("Stripe rejected payment intent ({}): {:?}", e.status, e.message);
            AppError::PaymentProvider(
                e.message
                    .unwrap_or_else(|| "The payment provider rejected the request".to_string()),
            )
        })?;

        if intent.client_secret.is_none() {
            return Err(AppError::PaymentProvider(
                "Payment intent has no client secret".to_string(),
            ));
        }
        Ok(intent)
    }
}

/// Payment intent id embedded in a client secret (`pi_123_secret_abc` -> `pi_123`).
pub fn intent_id_from_secret(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id)
        .filter(|id| id.starts_with("pi_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(donation_type: DonationType, is_emergency: bool) -> PaymentIntentParams {
        PaymentIntentParams {
            amount_cents: 2500,
            currency: "usd".to_string(),
            metadata: DonationMetadata {
                donor_name: "Anonymous".to_string(),
                donor_email: "donor@example.org".to_string(),
                donation_type,
                is_emergency,
            },
        }
    }

    fn field<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_form_fields_send_cents_and_no_receipt_email() {
        let fields = params(DonationType::OneTime, false).form_fields();

        assert_eq!(field(&fields, "amount"), Some("2500"));
        assert_eq!(field(&fields, "currency"), Some("usd"));
        assert_eq!(field(&fields, "metadata[donor_email]"), Some("donor@example.org"));
        assert_eq!(field(&fields, "description"), Some("One-time donation"));
        assert_eq!(field(&fields, "receipt_email"), None);
        assert_eq!(field(&fields, "setup_future_usage"), None);
    }

    #[test]
    fn test_monthly_emergency_fields() {
        let fields = params(DonationType::Monthly, true).form_fields();

        assert_eq!(field(&fields, "setup_future_usage"), Some("off_session"));
        assert_eq!(
            field(&fields, "description"),
            Some("Monthly donation (emergency fund)")
        );
        assert_eq!(field(&fields, "metadata[is_emergency]"), Some("true"));
    }

    #[test]
    fn test_intent_id_from_secret() {
        assert_eq!(intent_id_from_secret("pi_123_secret_abc"), Some("pi_123"));
        assert_eq!(intent_id_from_secret("seti_1_secret_x"), None);
        assert_eq!(intent_id_from_secret("garbage"), None);
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let client = StripeClient::new(Client::new(), DEFAULT_API_BASE, None);
        assert!(!client.is_configured());

        let err = client
            .create_payment_intent(&params(DonationType::OneTime, false))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotConfigured(_)));
    }
}
