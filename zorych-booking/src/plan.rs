use crate::attempt::Step;
use crate::error::BookingError;
use serde::{Deserialize, Serialize};
use zorych_catalog::ServiceCategory;

/// Ordered step list for one booking category. The same state machine runs
/// every category; what differs between consultation, insurance and
/// laboratory flows is only this data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowPlan {
    steps: Vec<Step>,
}

impl FlowPlan {
    pub fn new(steps: Vec<Step>) -> Result<Self, BookingError> {
        if steps.first() != Some(&Step::SelectService) {
            return Err(BookingError::InvalidPlan(
                "A flow must start at SELECT_SERVICE".to_string(),
            ));
        }
        if steps.last() != Some(&Step::Pay) {
            return Err(BookingError::InvalidPlan(
                "A flow must end at PAY".to_string(),
            ));
        }
        for window in steps.windows(2) {
            if window[0] == window[1] {
                return Err(BookingError::InvalidPlan(
                    "A flow must not repeat a step".to_string(),
                ));
            }
        }
        Ok(Self { steps })
    }

    pub fn for_category(category: ServiceCategory) -> Self {
        let steps = match category {
            // Insurance products have no slot to reserve; the flow goes
            // straight from selection to payment.
            ServiceCategory::Insurance => vec![Step::SelectService, Step::Pay],
            ServiceCategory::Consultation | ServiceCategory::Laboratory => {
                vec![Step::SelectService, Step::Schedule, Step::Pay]
            }
        };
        Self { steps }
    }

    pub fn first(&self) -> Step {
        self.steps[0]
    }

    pub fn next_after(&self, step: Step) -> Option<Step> {
        let idx = self.steps.iter().position(|&s| s == step)?;
        self.steps.get(idx + 1).copied()
    }

    pub fn prev_before(&self, step: Step) -> Option<Step> {
        let idx = self.steps.iter().position(|&s| s == step)?;
        idx.checked_sub(1).map(|i| self.steps[i])
    }

    pub fn contains(&self, step: Step) -> bool {
        self.steps.contains(&step)
    }

    /// Whether this flow ever hands control to the scheduler. Plans without a
    /// SCHEDULE step waive the scheduling-confirmed precondition for PAY.
    pub fn requires_scheduling(&self) -> bool {
        self.contains(Step::Schedule)
    }
}

impl Default for FlowPlan {
    fn default() -> Self {
        Self::for_category(ServiceCategory::Consultation)
    }
}
