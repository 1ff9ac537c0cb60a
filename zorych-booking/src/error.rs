use crate::attempt::{SchedulingStatus, Step};
use zorych_core::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("No service selected")]
    NoServiceSelected,

    #[error("Invalid step transition from {from:?} to {to:?}")]
    InvalidTransition { from: Step, to: Step },

    /// Reaching PAY without a confirmed slot is a programming error, not a
    /// user-recoverable condition.
    #[error("Payment step entered without a confirmed booking (scheduling status {status:?})")]
    PreconditionViolated { status: SchedulingStatus },

    #[error("Checkout is already in progress")]
    CheckoutInFlight,

    #[error("Checkout is not configured: {0}")]
    Config(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Redirect failed: {0}")]
    Redirect(String),

    #[error("Invalid flow plan: {0}")]
    InvalidPlan(String),
}
