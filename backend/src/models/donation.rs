//! Donation models: payment intent requests and the success handoff record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name recorded when the donor leaves the name field blank.
pub const ANONYMOUS_DONOR: &str = "Anonymous";

/// One-off gift or recurring monthly gift.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DonationType {
    #[default]
    #[serde(rename = "one-time")]
    OneTime,
    #[serde(rename = "monthly")]
    Monthly,
}

impl DonationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationType::OneTime => "one-time",
            DonationType::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one-time" => Some(DonationType::OneTime),
            "monthly" => Some(DonationType::Monthly),
            _ => None,
        }
    }
}

/// Donor-supplied context forwarded with a payment intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DonationMetadata {
    #[serde(default)]
    pub donor_name: String,
    #[serde(default)]
    pub donor_email: String,
    #[serde(default)]
    pub donation_type: DonationType,
    #[serde(default)]
    pub is_emergency: bool,
}

/// A single submission attempt from the donation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationIntent {
    /// Amount in cents
    pub amount: i64,
    pub currency: String,
    pub donor_name: String,
    pub donor_email: String,
    pub donation_type: DonationType,
    pub is_emergency: bool,
}

impl DonationIntent {
    pub fn metadata(&self) -> DonationMetadata {
        DonationMetadata {
            donor_name: self.donor_name.clone(),
            donor_email: self.donor_email.clone(),
            donation_type: self.donation_type,
            is_emergency: self.is_emergency,
        }
    }
}

/// Request body for `POST /api/donations/create-payment-intent`.
///
/// `amount` stays untyped so non-numeric input reaches the amount validator
/// instead of failing JSON extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub amount: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DonationMetadata>,
}

impl From<&DonationIntent> for CreatePaymentIntentRequest {
    fn from(intent: &DonationIntent) -> Self {
        Self {
            amount: Value::from(intent.amount),
            currency: Some(intent.currency.clone()),
            metadata: Some(intent.metadata()),
        }
    }
}

/// Response body of `POST /api/donations/create-payment-intent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Outcome of a successful donation, handed to the confirmation page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DonationResult {
    pub charge_id: String,
    pub amount_cents: i64,
    pub donation_type: DonationType,
    pub is_emergency: bool,
}

/// A donation as recorded by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub id: String,
    pub payment_intent_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub donor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_email: Option<String>,
    pub donation_type: DonationType,
    pub is_emergency: bool,
    pub status: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_donation_type_wire_names() {
        assert_eq!(json!(DonationType::OneTime), json!("one-time"));
        assert_eq!(json!(DonationType::Monthly), json!("monthly"));
        assert_eq!(DonationType::parse("monthly"), Some(DonationType::Monthly));
        assert_eq!(DonationType::parse("weekly"), None);
    }

    #[test]
    fn test_intent_request_carries_cents() {
        let intent = DonationIntent {
            amount: 2500,
            currency: "usd".into(),
            donor_name: "Anonymous".into(),
            donor_email: "donor@example.org".into(),
            donation_type: DonationType::Monthly,
            is_emergency: true,
        };

        let body = serde_json::to_value(CreatePaymentIntentRequest::from(&intent)).unwrap();
        assert_eq!(body["amount"], 2500);
        assert_eq!(body["currency"], "usd");
        assert_eq!(body["metadata"]["donorName"], "Anonymous");
        assert_eq!(body["metadata"]["donationType"], "monthly");
        assert_eq!(body["metadata"]["isEmergency"], true);
    }

    #[test]
    fn test_donation_result_field_names() {
        let result: DonationResult = serde_json::from_value(json!({
            "chargeId": "ch_1",
            "amountCents": 100000,
            "donationType": "one-time",
            "isEmergency": false
        }))
        .unwrap();
        assert_eq!(result.amount_cents, 100_000);
        assert_eq!(result.donation_type, DonationType::OneTime);
    }
}
