use serde_json::Value;
use url::Url;

/// Scheduling-provider hosts we trust messages from. Matched exactly or as a
/// domain suffix (`*.cal.com`); anything else is dropped before its payload
/// is even looked at.
const ALLOWED_HOSTS: &[&str] = &["cal.com", "app.cal.com"];

/// Payload tags the provider documents for a completed booking.
const SUCCESS_TAGS: &[&str] = &["CAL:bookingSuccessful", "bookingSuccessful"];

/// Loose fallback vocabulary for free-text payloads. See
/// `ConfirmationRule::Heuristic`.
const CONFIRMATION_HINTS: &[&str] = &["booking", "success", "confirmed"];

/// One inbound cross-origin message. Untrusted, consumed once, never stored.
#[derive(Debug, Clone)]
pub struct SchedulerEvent {
    pub origin: String,
    pub payload: Value,
}

impl SchedulerEvent {
    pub fn new(origin: &str, payload: Value) -> Self {
        Self {
            origin: origin.to_string(),
            payload,
        }
    }
}

/// Which rule classified a payload as a confirmed booking. Ordered by trust:
/// `Heuristic` is a deliberately loose net for vendor payload drift and must
/// not be treated as authoritative by anything that can afford not to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationRule {
    /// Object payload carrying a documented success tag.
    StructuredTag,
    /// Bare string equal to a documented success tag.
    Sentinel,
    /// Free-text string containing a confirmation substring.
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Confirmed(ConfirmationRule),
    Unrecognized,
}

/// True when `origin` is an allow-listed scheduling-provider origin. This is
/// the hard security boundary: payload shape checks alone are worthless since
/// any embedded frame can post arbitrary messages.
pub fn origin_allowed(origin: &str) -> bool {
    let Ok(parsed) = Url::parse(origin) else {
        return false;
    };
    if parsed.scheme() != "https" {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    ALLOWED_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
}

/// Classify a payload with the ordered rule set: structured tag, then bare
/// sentinel, then the heuristic substring net. Returns which rule fired so
/// callers can gate on rule strength.
pub fn classify(payload: &Value) -> Classification {
    match payload {
        Value::Object(map) => {
            let tagged = map
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| SUCCESS_TAGS.contains(&t))
                || map
                    .get("event")
                    .and_then(Value::as_str)
                    .is_some_and(|e| e == "bookingSuccessful")
                || map
                    .get("status")
                    .and_then(Value::as_str)
                    .is_some_and(|s| s == "confirmed");
            if tagged {
                Classification::Confirmed(ConfirmationRule::StructuredTag)
            } else {
                Classification::Unrecognized
            }
        }
        Value::String(s) => {
            if SUCCESS_TAGS.contains(&s.as_str()) {
                Classification::Confirmed(ConfirmationRule::Sentinel)
            } else if CONFIRMATION_HINTS.iter().any(|hint| s.contains(hint)) {
                Classification::Confirmed(ConfirmationRule::Heuristic)
            } else {
                Classification::Unrecognized
            }
        }
        _ => Classification::Unrecognized,
    }
}

/// Turns the scheduler iframe's message noise into at most one trustworthy
/// "booking confirmed" signal per attempt. Never errors: messages that fail
/// the origin check or classify as noise are expected traffic, not faults.
#[derive(Debug, Default)]
pub struct SchedulerBridge {
    fired: bool,
}

impl SchedulerBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one inbound message. Returns `Some(rule)` exactly once per
    /// bridge, on the first confirming message from a trusted origin.
    pub fn observe(&mut self, event: &SchedulerEvent) -> Option<ConfirmationRule> {
        if !origin_allowed(&event.origin) {
            tracing::debug!(origin = %event.origin, "Dropping message from untrusted origin");
            return None;
        }

        match classify(&event.payload) {
            Classification::Confirmed(rule) => {
                if self.fired {
                    tracing::debug!(?rule, "Ignoring repeated confirmation");
                    return None;
                }
                self.fired = true;
                tracing::info!(?rule, "Scheduler confirmed a booking");
                Some(rule)
            }
            Classification::Unrecognized => {
                tracing::debug!("Ignoring unclassifiable scheduler message");
                None
            }
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
