pub mod attempt;
pub mod bridge;
pub mod error;
pub mod landing;
pub mod orchestrator;
pub mod plan;
pub mod redirect;

pub use attempt::{BookingAttempt, PaymentStatus, SchedulingStatus, Step};
pub use bridge::{Classification, ConfirmationRule, SchedulerBridge, SchedulerEvent};
pub use error::BookingError;
pub use landing::{take_payment_outcome, PaymentOutcome};
pub use orchestrator::{BookingFlow, FlowConfig};
pub use plan::FlowPlan;
pub use redirect::{Navigator, PaymentSdk, RedirectTarget, SdkHandle};
