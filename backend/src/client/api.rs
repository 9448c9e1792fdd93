//! Site API client: payment intents and blog likes.
//!
//! Failures are reported once, without retry. Resubmitting is up to the user.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use super::ClientError;
use crate::errors::ErrorResponse;
use crate::models::{
    CreatePaymentIntentRequest, DonationMetadata, LikeResponse, PaymentIntentResponse,
};

/// Obtains a client secret for a payment from the trusted backend.
#[async_trait]
pub trait PaymentIntentClient: Send + Sync {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &DonationMetadata,
    ) -> Result<String, ClientError>;
}

/// Persists a like toggle and reports the authoritative count.
#[async_trait]
pub trait LikeClient: Send + Sync {
    async fn toggle_like(&self, post_id: &str) -> Result<LikeResponse, ClientError>;
}

#[async_trait]
impl<T: PaymentIntentClient + ?Sized> PaymentIntentClient for Arc<T> {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &DonationMetadata,
    ) -> Result<String, ClientError> {
        (**self).create_intent(amount_cents, currency, metadata).await
    }
}

#[async_trait]
impl<T: LikeClient + ?Sized> LikeClient for Arc<T> {
    async fn toggle_like(&self, post_id: &str) -> Result<LikeResponse, ClientError> {
        (**self).toggle_like(post_id).await
    }
}

/// HTTP client for the site's `/api` surface.
#[derive(Clone)]
pub struct ShelterApiClient {
    http: Client,
    base_url: Url,
}

impl ShelterApiClient {
    /// `base_url` is the API root, e.g. `https://shelter.example/api`.
    pub fn new(http: Client, base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::Validation(format!("Invalid API base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Validation(
                "Invalid API base URL: not a base".to_string(),
            ));
        }
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Decode a 2xx body, or turn the error envelope into [`ClientError::Server`].
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let message = resp
        .json::<ErrorResponse>()
        .await
        .ok()
        .map(|body| body.error.message)
        .filter(|m| !m.is_empty());
    tracing::warn!("API request failed with {}: {:?}", status, message);

    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PaymentIntentClient for ShelterApiClient {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &DonationMetadata,
    ) -> Result<String, ClientError> {
        let body = CreatePaymentIntentRequest {
            amount: amount_cents.into(),
            currency: Some(currency.to_string()),
            metadata: Some(metadata.clone()),
        };

        let resp = self
            .http
            .post(self.endpoint(&["donations", "create-payment-intent"]))
            .json(&body)
            .send()
            .await?;

        let intent: PaymentIntentResponse = read_json(resp).await?;
        Ok(intent.client_secret)
    }
}

#[async_trait]
impl LikeClient for ShelterApiClient {
    async fn toggle_like(&self, post_id: &str) -> Result<LikeResponse, ClientError> {
        let resp = self
            .http
            .post(self.endpoint(&["blog", post_id, "like"]))
            .send()
            .await?;

        read_json(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_and_escapes_segments() {
        let client = ShelterApiClient::new(Client::new(), "http://localhost:8080/api/").unwrap();

        assert_eq!(
            client
                .endpoint(&["donations", "create-payment-intent"])
                .as_str(),
            "http://localhost:8080/api/donations/create-payment-intent"
        );
        assert_eq!(
            client.endpoint(&["blog", "a b/c", "like"]).as_str(),
            "http://localhost:8080/api/blog/a%20b%2Fc/like"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            ShelterApiClient::new(Client::new(), "not a url"),
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let client = ShelterApiClient::new(Client::new(), "http://127.0.0.1:9/api").unwrap();
        let err = client
            .create_intent(2500, "usd", &DonationMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Network(_)), "{err:?}");
    }
}
