//! Donation form controller.
//!
//! A submission walks `Idle -> Validating -> CreatingIntent -> Confirming`
//! and ends in `Succeeded` or `Failed`. Every state change goes through
//! [`transition`]; the current state is published on a watch channel so the
//! submit button can render disabled for the whole busy span.

use thiserror::Error;
use tokio::sync::watch;

use super::{
    BillingDetails, CardConfirmer, CardElement, Charge, ClientError, ControlAttrs,
    PaymentIntentClient,
};
use crate::donation::{validate_cents, AmountBounds};
use crate::models::{DonationIntent, DonationResult, DonationType, ANONYMOUS_DONOR};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Validating,
    CreatingIntent,
    Confirming,
    Succeeded(DonationResult),
    /// Holds the message shown to the donor.
    Failed(String),
}

impl FormState {
    fn name(&self) -> &'static str {
        match self {
            FormState::Idle => "Idle",
            FormState::Validating => "Validating",
            FormState::CreatingIntent => "CreatingIntent",
            FormState::Confirming => "Confirming",
            FormState::Succeeded(_) => "Succeeded",
            FormState::Failed(_) => "Failed",
        }
    }

    /// A submission is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            FormState::Validating | FormState::CreatingIntent | FormState::Confirming
        )
    }

    /// Attributes of the submit button in this state.
    pub fn control(&self) -> ControlAttrs {
        let busy = self.is_busy();
        ControlAttrs {
            disabled: busy,
            aria_busy: busy,
            aria_pressed: false,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            FormState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Submit,
    AmountAccepted,
    IntentCreated,
    Confirmed(DonationResult),
    Failed(String),
    Reset,
}

impl FormEvent {
    fn name(&self) -> &'static str {
        match self {
            FormEvent::Submit => "Submit",
            FormEvent::AmountAccepted => "AmountAccepted",
            FormEvent::IntentCreated => "IntentCreated",
            FormEvent::Confirmed(_) => "Confirmed",
            FormEvent::Failed(_) => "Failed",
            FormEvent::Reset => "Reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot apply {event} in state {from}")]
pub struct IllegalTransition {
    pub from: &'static str,
    pub event: &'static str,
}

/// The form's transition function.
///
/// `Failed` from `Idle` covers submissions blocked before validation
/// (card SDK not loaded, no amount entered).
pub fn transition(state: &FormState, event: FormEvent) -> Result<FormState, IllegalTransition> {
    use FormEvent as E;
    use FormState as S;

    match (state, event) {
        (S::Idle | S::Failed(_), E::Submit) => Ok(S::Validating),
        (S::Validating, E::AmountAccepted) => Ok(S::CreatingIntent),
        (S::CreatingIntent, E::IntentCreated) => Ok(S::Confirming),
        (S::Confirming, E::Confirmed(result)) => Ok(S::Succeeded(result)),
        (
            S::Idle | S::Failed(_) | S::Validating | S::CreatingIntent | S::Confirming,
            E::Failed(msg),
        ) => Ok(S::Failed(msg)),
        (S::Failed(_) | S::Succeeded(_), E::Reset) => Ok(S::Idle),
        (from, event) => Err(IllegalTransition {
            from: from.name(),
            event: event.name(),
        }),
    }
}

/// Donor fields of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorInfo {
    pub name: String,
    pub email: String,
}

/// Fixed settings of one form instance.
#[derive(Debug, Clone)]
pub struct DonationOptions {
    pub currency: String,
    pub donation_type: DonationType,
    pub is_emergency: bool,
    pub bounds: AmountBounds,
}

impl Default for DonationOptions {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            donation_type: DonationType::OneTime,
            is_emergency: false,
            bounds: AmountBounds::default(),
        }
    }
}

/// Everything the success callback receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationSuccess {
    pub charge: Charge,
    pub donor_info: DonorInfo,
    pub amount_cents: i64,
    pub donation_type: DonationType,
    pub is_emergency: bool,
}

impl DonationSuccess {
    /// The record handed to the confirmation page.
    pub fn result(&self) -> DonationResult {
        DonationResult {
            charge_id: self.charge.id.clone(),
            amount_cents: self.amount_cents,
            donation_type: self.donation_type,
            is_emergency: self.is_emergency,
        }
    }
}

pub struct DonationFormController<P, C> {
    intents: P,
    confirmer: Option<C>,
    card: Option<CardElement>,
    donor: DonorInfo,
    options: DonationOptions,
    state: watch::Sender<FormState>,
}

impl<P, C> DonationFormController<P, C>
where
    P: PaymentIntentClient,
    C: CardConfirmer,
{
    /// A form whose card SDK has not loaded yet.
    pub fn new(intents: P, options: DonationOptions) -> Self {
        let (state, _) = watch::channel(FormState::Idle);
        Self {
            intents,
            confirmer: None,
            card: None,
            donor: DonorInfo::default(),
            options,
            state,
        }
    }

    pub fn sdk_loaded(&mut self, confirmer: C) {
        self.confirmer = Some(confirmer);
    }

    pub fn card_mounted(&mut self, card: CardElement) {
        self.card = Some(card);
    }

    pub fn set_donor(&mut self, donor: DonorInfo) {
        self.donor = donor;
    }

    pub fn state(&self) -> FormState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.state.subscribe()
    }

    /// Whether the submit button renders disabled.
    pub fn submit_disabled(&self) -> bool {
        self.state.borrow().is_busy()
    }

    pub fn control(&self) -> ControlAttrs {
        self.state.borrow().control()
    }

    /// Clear a finished or failed submission back to `Idle`.
    pub fn reset(&mut self) -> Result<(), IllegalTransition> {
        self.apply(FormEvent::Reset)
    }

    fn apply(&self, event: FormEvent) -> Result<(), IllegalTransition> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| match transition(state, event) {
            Ok(next) => {
                tracing::debug!("Donation form: {} -> {}", state.name(), next.name());
                *state = next;
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }

    fn fail(&self, err: ClientError) -> ClientError {
        if let Err(e) = self.apply(FormEvent::Failed(err.user_message())) {
            tracing::error!("Donation form could not record failure: {}", e);
        }
        err
    }

    fn advance(&self, event: FormEvent) -> Result<(), ClientError> {
        self.apply(event).map_err(|e| {
            tracing::warn!("Donation form rejected event: {}", e);
            ClientError::Busy
        })
    }

    /// Run one submission with `amount_cents` as entered.
    pub async fn submit(
        &mut self,
        amount_cents: Option<i64>,
    ) -> Result<DonationSuccess, ClientError> {
        match &*self.state.borrow() {
            state if state.is_busy() => return Err(ClientError::Busy),
            FormState::Succeeded(_) => {
                return Err(ClientError::Validation(
                    "This donation has already been completed".to_string(),
                ))
            }
            _ => {}
        }

        let (Some(confirmer), Some(card)) = (&self.confirmer, &self.card) else {
            return Err(self.fail(ClientError::NotReady));
        };
        let amount_cents = match amount_cents {
            Some(cents) if cents > 0 => cents,
            _ => {
                return Err(self.fail(ClientError::Validation(
                    "Please enter a donation amount".to_string(),
                )))
            }
        };

        self.advance(FormEvent::Submit)?;

        let email = self.donor.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(self.fail(ClientError::Validation(
                "Please enter a valid email address".to_string(),
            )));
        }
        if let Err(e) = validate_cents(amount_cents, self.options.bounds) {
            return Err(self.fail(ClientError::Validation(e.to_string())));
        }

        let name = self.donor.name.trim();
        let intent = DonationIntent {
            amount: amount_cents,
            currency: self.options.currency.clone(),
            donor_name: if name.is_empty() {
                ANONYMOUS_DONOR.to_string()
            } else {
                name.to_string()
            },
            donor_email: email,
            donation_type: self.options.donation_type,
            is_emergency: self.options.is_emergency,
        };

        self.advance(FormEvent::AmountAccepted)?;
        let client_secret = match self
            .intents
            .create_intent(intent.amount, &intent.currency, &intent.metadata())
            .await
        {
            Ok(secret) => secret,
            Err(e) => return Err(self.fail(e)),
        };

        self.advance(FormEvent::IntentCreated)?;
        let billing = BillingDetails {
            name: intent.donor_name.clone(),
        };
        let charge = match confirmer
            .confirm_card_payment(card, &client_secret, &billing)
            .await
        {
            Ok(charge) => charge,
            Err(e) => return Err(self.fail(e)),
        };

        let success = DonationSuccess {
            charge,
            donor_info: self.donor.clone(),
            amount_cents: intent.amount,
            donation_type: intent.donation_type,
            is_emergency: intent.is_emergency,
        };
        self.advance(FormEvent::Confirmed(success.result()))?;
        tracing::info!("Donation of {} cents confirmed", success.amount_cents);

        Ok(success)
    }
}
