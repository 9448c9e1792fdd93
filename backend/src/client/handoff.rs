//! Handoff of a completed donation to the confirmation page.
//!
//! Session storage carries the result so the confirmation URL stays clean.
//! When the slot is empty (reload, direct link) the page falls back to the
//! `amount`, `type` and `emergency` query parameters.

use reqwest::Url;

use super::{ClientError, DonationSuccess, KeyValueStore, Mailbox};
use crate::donation::format_dollars;
use crate::models::{DonationResult, DonationType};

/// Session storage key of the pending donation result.
pub const DONATION_HANDOFF_KEY: &str = "donationSuccessData";

/// Route of the confirmation page.
pub const CONFIRMATION_ROUTE: &str = "/donation-success";

pub fn handoff_mailbox<S: KeyValueStore>(session: S) -> Mailbox<DonationResult, S> {
    Mailbox::new(session, DONATION_HANDOFF_KEY)
}

/// Store the result of `success` and return the route to navigate to.
pub fn stash_success<S: KeyValueStore>(
    mailbox: &Mailbox<DonationResult, S>,
    success: &DonationSuccess,
) -> Result<&'static str, ClientError> {
    mailbox.put(&success.result())?;
    Ok(CONFIRMATION_ROUTE)
}

/// Degraded confirmation URL carrying the result in query parameters.
pub fn fallback_location(result: &DonationResult) -> String {
    format!(
        "{}?amount={}&type={}&emergency={}",
        CONFIRMATION_ROUTE,
        result.amount_cents,
        result.donation_type.as_str(),
        result.is_emergency
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffSource {
    Session,
    Query,
}

/// What the confirmation page renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationView {
    pub amount_cents: i64,
    /// Dollars with two decimals, e.g. `"25.00"`
    pub amount_display: String,
    pub donation_type: DonationType,
    pub is_emergency: bool,
    pub charge_id: Option<String>,
    pub source: HandoffSource,
}

impl ConfirmationView {
    fn from_result(result: DonationResult) -> Self {
        Self {
            amount_display: format_dollars(result.amount_cents),
            amount_cents: result.amount_cents,
            donation_type: result.donation_type,
            is_emergency: result.is_emergency,
            charge_id: Some(result.charge_id),
            source: HandoffSource::Session,
        }
    }

    fn from_location(location: &str) -> Self {
        let mut amount_cents = 0;
        let mut donation_type = DonationType::OneTime;
        let mut is_emergency = false;

        let parsed = Url::parse("http://localhost").and_then(|base| base.join(location));
        match parsed {
            Ok(url) => {
                for (key, value) in url.query_pairs() {
                    match key.as_ref() {
                        "amount" => amount_cents = value.trim().parse().unwrap_or(0),
                        "type" => donation_type = DonationType::parse(&value).unwrap_or_default(),
                        "emergency" => is_emergency = value == "true",
                        _ => {}
                    }
                }
            }
            Err(e) => tracing::warn!("Unparseable confirmation location {:?}: {}", location, e),
        }

        Self {
            amount_cents,
            amount_display: format_dollars(amount_cents),
            donation_type,
            is_emergency,
            charge_id: None,
            source: HandoffSource::Query,
        }
    }
}

/// One mounted instance of the confirmation page.
#[derive(Debug, Default)]
pub struct ConfirmationPage {
    has_read: bool,
}

impl ConfirmationPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the handoff for this page instance.
    ///
    /// Only the first call reads anything; repeated mounts of the same
    /// instance return `None` and leave the rendered view as it was.
    pub fn mount<S: KeyValueStore>(
        &mut self,
        mailbox: &Mailbox<DonationResult, S>,
        location: &str,
    ) -> Option<ConfirmationView> {
        if self.has_read {
            tracing::debug!("Confirmation page already read its handoff");
            return None;
        }
        self.has_read = true;

        match mailbox.take_once() {
            Ok(Some(result)) => Some(ConfirmationView::from_result(result)),
            Ok(None) => Some(ConfirmationView::from_location(location)),
            Err(e) => {
                tracing::warn!("Could not read donation handoff: {}", e);
                Some(ConfirmationView::from_location(location))
            }
        }
    }
}
