//! Settings of the client flows.

use std::env;

use reqwest::Client;

use super::{ClientError, DonationOptions, ShelterApiClient, StripeCardConfirmer};
use crate::donation::AmountBounds;
use crate::models::DonationType;
use crate::stripe::DEFAULT_API_BASE;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root of the site backend, e.g. `https://shelter.example/api`
    pub api_base_url: String,
    pub stripe_api_base: String,
    /// Stripe publishable key used by the card confirmer
    pub stripe_publishable_key: String,
    pub currency: String,
    pub bounds: AmountBounds,
}

impl ClientConfig {
    pub fn new(
        api_base_url: impl Into<String>,
        stripe_publishable_key: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            stripe_api_base: DEFAULT_API_BASE.to_string(),
            stripe_publishable_key: stripe_publishable_key.into(),
            currency: "usd".to_string(),
            bounds: AmountBounds::default(),
        }
    }

    /// Load from `SHELTER_API_URL`, `STRIPE_PUBLISHABLE_KEY` and
    /// `STRIPE_API_BASE`.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("SHELTER_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080/api".to_string());
        let publishable_key = env::var("STRIPE_PUBLISHABLE_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ClientError::NotReady)?;

        let mut config = Self::new(api_base_url, publishable_key);
        if let Ok(base) = env::var("STRIPE_API_BASE") {
            config.stripe_api_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(currency) = env::var("SHELTER_CURRENCY") {
            config.currency = currency.to_lowercase();
        }
        Ok(config)
    }

    pub fn api_client(&self, http: Client) -> Result<ShelterApiClient, ClientError> {
        ShelterApiClient::new(http, &self.api_base_url)
    }

    pub fn card_confirmer(&self, http: Client) -> StripeCardConfirmer {
        StripeCardConfirmer::new(
            http,
            self.stripe_api_base.clone(),
            self.stripe_publishable_key.clone(),
        )
    }

    pub fn donation_options(
        &self,
        donation_type: DonationType,
        is_emergency: bool,
    ) -> DonationOptions {
        DonationOptions {
            currency: self.currency.clone(),
            donation_type,
            is_emergency,
            bounds: self.bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donation_options_carry_settings() {
        let mut config = ClientConfig::new("http://localhost:8080/api", "pk_test");
        config.currency = "cad".to_string();

        let options = config.donation_options(DonationType::Monthly, true);
        assert_eq!(options.currency, "cad");
        assert_eq!(options.donation_type, DonationType::Monthly);
        assert!(options.is_emergency);
        assert_eq!(options.bounds, AmountBounds::default());
        assert_eq!(config.stripe_api_base, "https://api.stripe.com");
    }

    #[test]
    fn test_bad_api_url_is_rejected() {
        let config = ClientConfig::new("not a url", "pk_test");
        assert!(matches!(
            config.api_client(Client::new()),
            Err(ClientError::Validation(_))
        ));
    }
}
