//! Donation rules shared by the payment endpoint and the donation form.

mod amount;

pub use amount::*;
