use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zorych_catalog::Service;

/// Steps a booking flow can be parked at. Which of them a given flow visits,
/// and in what order, is defined by its `FlowPlan`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    SelectService,
    Schedule,
    Pay,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulingStatus {
    NotStarted,
    AwaitingConfirmation,
    Confirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Idle,
    InFlight,
    Failed(String),
    Redirected,
}

/// The single mutable entity of one run through the flow. Owned exclusively
/// by the orchestrator; discarded when the flow closes, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingAttempt {
    pub id: Uuid,
    pub service: Option<Service>,
    pub scheduling: SchedulingStatus,
    pub payment: PaymentStatus,
    pub step: Step,
    pub created_at: DateTime<Utc>,
}

impl BookingAttempt {
    pub fn new(initial_step: Step) -> Self {
        Self {
            id: Uuid::new_v4(),
            service: None,
            scheduling: SchedulingStatus::NotStarted,
            payment: PaymentStatus::Idle,
            step: initial_step,
            created_at: Utc::now(),
        }
    }

    /// Back to initial values, keeping the attempt id.
    pub fn reset(&mut self, initial_step: Step) {
        self.service = None;
        self.scheduling = SchedulingStatus::NotStarted;
        self.payment = PaymentStatus::Idle;
        self.step = initial_step;
    }
}
