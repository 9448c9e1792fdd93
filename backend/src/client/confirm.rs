//! Card payment confirmation against the payment provider.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use super::ClientError;
use crate::stripe::{self, intent_id_from_secret, StripePaymentIntent, StripePaymentMethod};

/// Tokenized card input, as produced by the provider's card widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardElement {
    pub token: String,
}

impl CardElement {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// Billing details handed to the provider.
///
/// There is deliberately no email field: an email here makes the provider
/// send its own receipt on top of the shelter's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingDetails {
    pub name: String,
}

/// A completed charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
    pub id: String,
    pub payment_intent_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
}

/// Finalizes a payment authorized by a client secret.
#[async_trait]
pub trait CardConfirmer: Send + Sync {
    async fn confirm_card_payment(
        &self,
        card: &CardElement,
        client_secret: &str,
        billing: &BillingDetails,
    ) -> Result<Charge, ClientError>;
}

#[async_trait]
impl<T: CardConfirmer + ?Sized> CardConfirmer for Arc<T> {
    async fn confirm_card_payment(
        &self,
        card: &CardElement,
        client_secret: &str,
        billing: &BillingDetails,
    ) -> Result<Charge, ClientError> {
        (**self)
            .confirm_card_payment(card, client_secret, billing)
            .await
    }
}

/// Confirmer speaking to the Stripe API with a publishable key.
#[derive(Clone)]
pub struct StripeCardConfirmer {
    http: Client,
    api_base: String,
    publishable_key: String,
}

impl StripeCardConfirmer {
    pub fn new(
        http: Client,
        api_base: impl Into<String>,
        publishable_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            publishable_key: publishable_key.into(),
        }
    }
}

fn payment_method_fields(card: &CardElement, billing: &BillingDetails) -> Vec<(String, String)> {
    vec![
        ("type".to_string(), "card".to_string()),
        ("card[token]".to_string(), card.token.clone()),
        ("billing_details[name]".to_string(), billing.name.clone()),
    ]
}

fn provider_failure(err: stripe::ProviderError) -> ClientError {
    tracing::warn!("Payment provider refused ({}): {:?}", err.status, err.message);
    ClientError::Payment(err.message)
}

#[async_trait]
impl CardConfirmer for StripeCardConfirmer {
    async fn confirm_card_payment(
        &self,
        card: &CardElement,
        client_secret: &str,
        billing: &BillingDetails,
    ) -> Result<Charge, ClientError> {
        let intent_id = intent_id_from_secret(client_secret).ok_or_else(|| {
            ClientError::Payment(Some("Invalid payment authorization".to_string()))
        })?;

        let resp = self
            .http
            .post(format!("{}/v1/payment_methods", self.api_base))
            .bearer_auth(&self.publishable_key)
            .form(&payment_method_fields(card, billing))
            .send()
            .await?;
        let method: StripePaymentMethod = stripe::decode(resp).await.map_err(provider_failure)?;

        let resp = self
            .http
            .post(format!(
                "{}/v1/payment_intents/{}/confirm",
                self.api_base, intent_id
            ))
            .bearer_auth(&self.publishable_key)
            .form(&[
                ("client_secret", client_secret),
                ("payment_method", method.id.as_str()),
            ])
            .send()
            .await?;
        let intent: StripePaymentIntent = stripe::decode(resp).await.map_err(provider_failure)?;

        let status = intent.status.clone();
        match status.as_str() {
            "succeeded" | "processing" => Ok(Charge {
                id: intent.latest_charge.clone().unwrap_or_else(|| intent.id.clone()),
                payment_intent_id: intent.id,
                amount_cents: intent.amount,
                currency: intent.currency,
                status: intent.status,
            }),
            "requires_action" => Err(ClientError::Payment(Some(
                "Additional authentication is required to complete this payment".to_string(),
            ))),
            other => {
                tracing::warn!("Payment intent {} ended in status {}", intent.id, other);
                Err(ClientError::Payment(
                    intent.last_payment_error.and_then(|e| e.message),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_fields_never_carry_email() {
        let fields = payment_method_fields(
            &CardElement::new("tok_visa"),
            &BillingDetails {
                name: "Sam Rivera".to_string(),
            },
        );

        assert!(fields.iter().all(|(k, _)| !k.contains("email")));
        assert!(fields
            .iter()
            .any(|(k, v)| k == "billing_details[name]" && v == "Sam Rivera"));
    }

    #[tokio::test]
    async fn test_malformed_client_secret_is_payment_error() {
        let confirmer = StripeCardConfirmer::new(Client::new(), "http://127.0.0.1:9", "pk_test");
        let err = confirmer
            .confirm_card_payment(
                &CardElement::new("tok_visa"),
                "not-a-secret",
                &BillingDetails {
                    name: "Anonymous".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ClientError::Payment(Some("Invalid payment authorization".to_string()))
        );
    }

    async fn confirm_with<C: CardConfirmer>(confirmer: &C) -> Result<Charge, ClientError> {
        confirmer
            .confirm_card_payment(
                &CardElement::new("tok_visa"),
                "not-a-secret",
                &BillingDetails {
                    name: "Anonymous".to_string(),
                },
            )
            .await
    }

    #[tokio::test]
    async fn test_shared_confirmer_delegates() {
        let shared = Arc::new(StripeCardConfirmer::new(
            Client::new(),
            "http://127.0.0.1:9",
            "pk_test",
        ));
        let as_dyn: Arc<dyn CardConfirmer> = shared.clone();

        let expected = Err(ClientError::Payment(Some(
            "Invalid payment authorization".to_string(),
        )));
        assert_eq!(confirm_with(&shared).await, expected);
        assert_eq!(confirm_with(&as_dyn).await, expected);
    }
}
