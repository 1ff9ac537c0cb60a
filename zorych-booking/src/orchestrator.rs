use crate::attempt::{BookingAttempt, PaymentStatus, SchedulingStatus, Step};
use crate::bridge::{ConfirmationRule, SchedulerBridge, SchedulerEvent};
use crate::error::BookingError;
use crate::plan::FlowPlan;
use crate::redirect::{self, Navigator, RedirectTarget, SdkHandle};
use std::sync::Arc;
use zorych_catalog::Service;
use zorych_core::{CheckoutGateway, CheckoutRequest};

/// Flow-level configuration, resolved from the environment at startup.
#[derive(Debug, Clone, Default)]
pub struct FlowConfig {
    /// Advance SCHEDULE -> PAY automatically when the scheduler confirms.
    pub auto_advance: bool,
    /// Price reference used for services that carry none of their own.
    pub default_price_id: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// The authoritative state machine for one booking flow. Sole owner and
/// mutator of the `BookingAttempt`; the bridge, the session gateway and the
/// redirect seams only ever feed it inputs.
pub struct BookingFlow {
    attempt: BookingAttempt,
    plan: FlowPlan,
    bridge: SchedulerBridge,
    sessions: Arc<dyn CheckoutGateway>,
    sdk: Option<SdkHandle>,
    navigator: Arc<dyn Navigator>,
    config: FlowConfig,
}

impl BookingFlow {
    pub fn new(
        plan: FlowPlan,
        sessions: Arc<dyn CheckoutGateway>,
        navigator: Arc<dyn Navigator>,
        sdk: Option<SdkHandle>,
        config: FlowConfig,
    ) -> Self {
        let attempt = BookingAttempt::new(plan.first());
        Self {
            attempt,
            plan,
            bridge: SchedulerBridge::new(),
            sessions,
            sdk,
            navigator,
            config,
        }
    }

    pub fn attempt(&self) -> &BookingAttempt {
        &self.attempt
    }

    pub fn plan(&self) -> &FlowPlan {
        &self.plan
    }

    /// Pick a service and move to the plan's next step. Resets scheduling and
    /// payment state: a new selection is a new booking.
    pub fn select_service(&mut self, service: Service) -> Result<(), BookingError> {
        if self.attempt.step != Step::SelectService {
            return Err(BookingError::InvalidTransition {
                from: self.attempt.step,
                to: Step::SelectService,
            });
        }

        self.attempt.service = Some(service);
        self.attempt.scheduling = SchedulingStatus::NotStarted;
        self.attempt.payment = PaymentStatus::Idle;
        self.bridge = SchedulerBridge::new();

        let next = self
            .plan
            .next_after(Step::SelectService)
            .ok_or_else(|| BookingError::InvalidPlan("No step after SELECT_SERVICE".to_string()))?;

        match next {
            Step::Schedule => {
                self.attempt.scheduling = SchedulingStatus::AwaitingConfirmation;
                self.attempt.step = Step::Schedule;
                Ok(())
            }
            Step::Pay => self.enter_pay(),
            Step::SelectService => Err(BookingError::InvalidPlan(
                "SELECT_SERVICE cannot follow itself".to_string(),
            )),
        }
    }

    /// Feed one cross-origin scheduler message. Only meaningful while parked
    /// at SCHEDULE; everything else is ignored noise, including repeats after
    /// the transition already happened.
    pub fn handle_scheduler_event(
        &mut self,
        event: &SchedulerEvent,
    ) -> Result<Option<ConfirmationRule>, BookingError> {
        if self.attempt.step != Step::Schedule {
            tracing::debug!(step = ?self.attempt.step, "Scheduler message outside SCHEDULE ignored");
            return Ok(None);
        }

        let Some(rule) = self.bridge.observe(event) else {
            return Ok(None);
        };

        self.attempt.scheduling = SchedulingStatus::Confirmed;
        if self.config.auto_advance {
            self.advance_to_payment()?;
        }
        Ok(Some(rule))
    }

    /// The user's manual "I've booked my slot" action. Exists because the
    /// bridge's signal is heuristic and the vendor's messages may never
    /// arrive. Races freely with the bridge: whichever input lands first
    /// performs the transition, the other becomes a no-op.
    pub fn confirm_scheduling(&mut self) -> Result<(), BookingError> {
        if self.attempt.step == Step::Pay {
            return Ok(());
        }
        if self.attempt.step != Step::Schedule {
            return Err(BookingError::InvalidTransition {
                from: self.attempt.step,
                to: Step::Pay,
            });
        }
        self.attempt.scheduling = SchedulingStatus::Confirmed;
        self.advance_to_payment()
    }

    /// SCHEDULE -> PAY. Idempotent once PAY is entered.
    pub fn advance_to_payment(&mut self) -> Result<(), BookingError> {
        if self.attempt.step == Step::Pay {
            return Ok(());
        }
        if self.attempt.step != Step::Schedule {
            return Err(BookingError::InvalidTransition {
                from: self.attempt.step,
                to: Step::Pay,
            });
        }
        self.enter_pay()
    }

    fn enter_pay(&mut self) -> Result<(), BookingError> {
        if self.attempt.service.is_none() {
            return Err(BookingError::NoServiceSelected);
        }
        if self.plan.requires_scheduling() && self.attempt.scheduling != SchedulingStatus::Confirmed
        {
            return Err(BookingError::PreconditionViolated {
                status: self.attempt.scheduling,
            });
        }
        self.attempt.step = Step::Pay;
        self.attempt.payment = PaymentStatus::Idle;
        Ok(())
    }

    /// Go back one step in the plan. Returning to SELECT_SERVICE resets the
    /// whole attempt; returning to SCHEDULE keeps the service and the
    /// confirmed slot, only payment state is cleared.
    pub fn back(&mut self) -> Result<(), BookingError> {
        let Some(prev) = self.plan.prev_before(self.attempt.step) else {
            return Ok(());
        };

        if prev == Step::SelectService {
            self.attempt.reset(self.plan.first());
            self.bridge = SchedulerBridge::new();
        } else {
            self.attempt.step = prev;
            self.attempt.payment = PaymentStatus::Idle;
        }
        Ok(())
    }

    /// Drive checkout: resolve the redirect path, minting a fresh checkout
    /// session when one is needed, and navigate. Every failure lands in
    /// `PaymentStatus::Failed` with the underlying message; the state stays
    /// retriable and a retry requests a brand-new session.
    pub async fn checkout(&mut self) -> Result<RedirectTarget, BookingError> {
        if self.attempt.step != Step::Pay {
            return Err(BookingError::InvalidTransition {
                from: self.attempt.step,
                to: Step::Pay,
            });
        }
        // Reentrancy guard: one session per click, double-clicks included.
        if self.attempt.payment == PaymentStatus::InFlight {
            return Err(BookingError::CheckoutInFlight);
        }
        let service = self
            .attempt
            .service
            .clone()
            .ok_or(BookingError::NoServiceSelected)?;

        // Static payment links need no session at all.
        if let Some(link) = service.payment_link.as_deref() {
            let target = RedirectTarget::PaymentLink(link.to_string());
            return self.navigate(target);
        }

        let Some(price_id) = service.price_ref(self.config.default_price_id.as_deref()) else {
            let message = format!(
                "No payment price reference configured for service {}",
                service.id
            );
            self.attempt.payment = PaymentStatus::Failed(message.clone());
            return Err(BookingError::Config(message));
        };

        let request = CheckoutRequest {
            price_id: price_id.to_string(),
            success_url: self.config.success_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
        };

        self.attempt.payment = PaymentStatus::InFlight;
        let session = match self.sessions.create_session(&request).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "Checkout session creation failed");
                self.attempt.payment = PaymentStatus::Failed(err.to_string());
                return Err(err.into());
            }
        };

        let target = match redirect::resolve(None, Some(&session)) {
            Ok(target) => target,
            Err(err) => {
                self.attempt.payment = PaymentStatus::Failed(err.to_string());
                return Err(err);
            }
        };

        match target {
            RedirectTarget::SdkSession(session_id) => self.redirect_via_sdk(session_id).await,
            other => self.navigate(other),
        }
    }

    fn navigate(&mut self, target: RedirectTarget) -> Result<RedirectTarget, BookingError> {
        let url = match &target {
            RedirectTarget::PaymentLink(url) | RedirectTarget::HostedUrl(url) => url.clone(),
            RedirectTarget::SdkSession(_) => {
                return Err(BookingError::Redirect(
                    "SDK sessions are not navigated directly".to_string(),
                ))
            }
        };
        match self.navigator.navigate(&url) {
            Ok(()) => {
                tracing::info!(%url, "Redirecting to hosted checkout");
                self.attempt.payment = PaymentStatus::Redirected;
                Ok(target)
            }
            Err(err) => {
                self.attempt.payment = PaymentStatus::Failed(err.to_string());
                Err(err)
            }
        }
    }

    async fn redirect_via_sdk(&mut self, session_id: String) -> Result<RedirectTarget, BookingError> {
        let Some(sdk) = self.sdk.clone() else {
            let message =
                "Session has no direct URL and no payment SDK is initialized".to_string();
            self.attempt.payment = PaymentStatus::Failed(message.clone());
            return Err(BookingError::Config(message));
        };
        match sdk.redirect_to_checkout(&session_id).await {
            Ok(()) => {
                self.attempt.payment = PaymentStatus::Redirected;
                Ok(RedirectTarget::SdkSession(session_id))
            }
            Err(err) => {
                self.attempt.payment = PaymentStatus::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Discard the attempt and start over with a fresh one. Detaches the old
    /// bridge so a stale confirmation can never leak into the new attempt.
    pub fn reset(&mut self) {
        self.attempt = BookingAttempt::new(self.plan.first());
        self.bridge = SchedulerBridge::new();
    }

    /// Tear the flow down. Dropping is sufficient; this only makes the
    /// cancellation point explicit at call sites.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::redirect::PaymentSdk;
    use serde_json::json;
    use std::sync::Mutex;
    use zorych_catalog::{Price, ServiceCategory};
    use zorych_core::{GatewayError, MockGateway};

    const CAL_ORIGIN: &str = "https://app.cal.com";

    struct RecordingNavigator {
        targets: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                targets: Mutex::new(Vec::new()),
            })
        }

        fn visited(&self) -> Vec<String> {
            self.targets.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, url: &str) -> Result<(), BookingError> {
            self.targets.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct RecordingSdk {
        sessions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PaymentSdk for RecordingSdk {
        async fn redirect_to_checkout(&self, session_id: &str) -> Result<(), BookingError> {
            self.sessions.lock().unwrap().push(session_id.to_string());
            Ok(())
        }
    }

    fn consultation(price_id: &str) -> Service {
        Service {
            id: "1".to_string(),
            name: "General consultation".to_string(),
            description: "Initial appointment".to_string(),
            duration: "30 min".to_string(),
            price: Price::new(30000, "CZK"),
            icon: None,
            category: ServiceCategory::Consultation,
            cal_link: Some("zorych-clinic/30min".to_string()),
            stripe_price_id: Some(price_id.to_string()),
            payment_link: None,
        }
    }

    fn flow(
        gateway: Arc<MockGateway>,
        navigator: Arc<RecordingNavigator>,
        auto_advance: bool,
    ) -> BookingFlow {
        BookingFlow::new(
            FlowPlan::for_category(ServiceCategory::Consultation),
            gateway,
            navigator,
            None,
            FlowConfig {
                auto_advance,
                ..FlowConfig::default()
            },
        )
    }

    fn confirmation() -> SchedulerEvent {
        SchedulerEvent::new(CAL_ORIGIN, json!({"type": "CAL:bookingSuccessful"}))
    }

    #[tokio::test]
    async fn test_full_flow_to_hosted_checkout() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway.clone(), navigator.clone(), false);

        flow.select_service(consultation("price_general")).unwrap();
        assert_eq!(flow.attempt().step, Step::Schedule);
        assert_eq!(flow.attempt().scheduling, SchedulingStatus::AwaitingConfirmation);

        let rule = flow.handle_scheduler_event(&confirmation()).unwrap();
        assert_eq!(rule, Some(ConfirmationRule::StructuredTag));
        assert_eq!(flow.attempt().scheduling, SchedulingStatus::Confirmed);
        // No auto-advance: still at SCHEDULE until the user acts.
        assert_eq!(flow.attempt().step, Step::Schedule);

        flow.advance_to_payment().unwrap();
        assert_eq!(flow.attempt().step, Step::Pay);
        assert_eq!(flow.attempt().payment, PaymentStatus::Idle);

        let target = flow.checkout().await.unwrap();
        assert!(matches!(target, RedirectTarget::HostedUrl(_)));
        assert_eq!(flow.attempt().payment, PaymentStatus::Redirected);
        assert_eq!(gateway.calls(), 1);
        assert!(navigator.visited()[0].starts_with("https://pay.example/"));
    }

    #[tokio::test]
    async fn test_auto_advance_and_repeated_confirmation() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway.clone(), navigator, true);

        flow.select_service(consultation("price_general")).unwrap();
        assert_eq!(
            flow.handle_scheduler_event(&confirmation()).unwrap(),
            Some(ConfirmationRule::StructuredTag)
        );
        assert_eq!(flow.attempt().step, Step::Pay);

        // The same message again must not re-trigger anything.
        assert_eq!(flow.handle_scheduler_event(&confirmation()).unwrap(), None);
        assert_eq!(flow.attempt().step, Step::Pay);
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_manual_override_races_with_bridge() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway, navigator, true);

        flow.select_service(consultation("price_general")).unwrap();
        // Manual action wins the race...
        flow.confirm_scheduling().unwrap();
        assert_eq!(flow.attempt().step, Step::Pay);
        // ...and the late bridge signal is a no-op.
        assert_eq!(flow.handle_scheduler_event(&confirmation()).unwrap(), None);
        assert_eq!(flow.attempt().step, Step::Pay);
    }

    #[test]
    fn test_untrusted_origin_cannot_confirm() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway, navigator, true);

        flow.select_service(consultation("price_general")).unwrap();
        let forged = SchedulerEvent::new(
            "https://evil.example",
            json!({"type": "CAL:bookingSuccessful"}),
        );
        assert_eq!(flow.handle_scheduler_event(&forged).unwrap(), None);
        assert_eq!(flow.attempt().scheduling, SchedulingStatus::AwaitingConfirmation);
        assert_eq!(flow.attempt().step, Step::Schedule);
    }

    #[test]
    fn test_noise_keeps_flow_at_schedule() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway, navigator, true);

        flow.select_service(consultation("price_general")).unwrap();
        let noise = SchedulerEvent::new(CAL_ORIGIN, json!("random noise"));
        assert_eq!(flow.handle_scheduler_event(&noise).unwrap(), None);
        assert_eq!(flow.attempt().step, Step::Schedule);
    }

    #[test]
    fn test_pay_precondition_fails_fast() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway, navigator, false);

        flow.select_service(consultation("price_general")).unwrap();
        let err = flow.advance_to_payment().unwrap_err();
        assert!(matches!(
            err,
            BookingError::PreconditionViolated {
                status: SchedulingStatus::AwaitingConfirmation
            }
        ));

        // A missing service is equally fatal.
        flow.attempt.scheduling = SchedulingStatus::Confirmed;
        flow.attempt.service = None;
        assert!(matches!(
            flow.advance_to_payment().unwrap_err(),
            BookingError::NoServiceSelected
        ));
    }

    #[tokio::test]
    async fn test_reentrancy_guard_blocks_double_checkout() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway.clone(), navigator, false);

        flow.select_service(consultation("price_general")).unwrap();
        flow.confirm_scheduling().unwrap();

        flow.attempt.payment = PaymentStatus::InFlight;
        let err = flow.checkout().await.unwrap_err();
        assert!(matches!(err, BookingError::CheckoutInFlight));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_rejection_is_visible_and_retriable() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway.clone(), navigator, false);

        flow.select_service(consultation("price_missing")).unwrap();
        flow.confirm_scheduling().unwrap();

        let err = flow.checkout().await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Gateway(GatewayError::Provider { status: 400, .. })
        ));
        assert_eq!(
            flow.attempt().payment,
            PaymentStatus::Failed("no such price".to_string())
        );

        // Retrying requests a brand-new session rather than reusing anything.
        let _ = flow.checkout().await.unwrap_err();
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_marked_failed() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway, navigator, false);

        flow.select_service(consultation("price_unreachable")).unwrap();
        flow.confirm_scheduling().unwrap();

        let err = flow.checkout().await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Gateway(GatewayError::Transport(_))
        ));
        assert!(matches!(flow.attempt().payment, PaymentStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_static_payment_link_bypasses_sessions() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut service = consultation("price_general");
        service.category = ServiceCategory::Insurance;
        service.cal_link = None;
        service.payment_link = Some("https://buy.example/insurance-basic".to_string());

        let mut flow = BookingFlow::new(
            FlowPlan::for_category(ServiceCategory::Insurance),
            gateway.clone(),
            navigator.clone(),
            None,
            FlowConfig::default(),
        );

        // Insurance plan has no SCHEDULE step: selection lands at PAY.
        flow.select_service(service).unwrap();
        assert_eq!(flow.attempt().step, Step::Pay);

        let target = flow.checkout().await.unwrap();
        assert_eq!(
            target,
            RedirectTarget::PaymentLink("https://buy.example/insurance-basic".to_string())
        );
        assert_eq!(gateway.calls(), 0);
        assert_eq!(navigator.visited(), vec!["https://buy.example/insurance-basic"]);
    }

    #[tokio::test]
    async fn test_sdk_fallback_for_session_only_response() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let sdk = Arc::new(RecordingSdk {
            sessions: Mutex::new(Vec::new()),
        });
        let mut flow = BookingFlow::new(
            FlowPlan::for_category(ServiceCategory::Consultation),
            gateway,
            navigator.clone(),
            Some(SdkHandle::init("pk_test_123", sdk.clone()).unwrap()),
            FlowConfig::default(),
        );

        flow.select_service(consultation("price_sdk_only")).unwrap();
        flow.confirm_scheduling().unwrap();

        let target = flow.checkout().await.unwrap();
        assert!(matches!(target, RedirectTarget::SdkSession(_)));
        assert_eq!(flow.attempt().payment, PaymentStatus::Redirected);
        assert_eq!(sdk.sessions.lock().unwrap().len(), 1);
        assert!(navigator.visited().is_empty());
    }

    #[tokio::test]
    async fn test_session_only_response_without_sdk_is_config_error() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway, navigator, false);

        flow.select_service(consultation("price_sdk_only")).unwrap();
        flow.confirm_scheduling().unwrap();

        let err = flow.checkout().await.unwrap_err();
        assert!(matches!(err, BookingError::Config(_)));
        assert!(matches!(flow.attempt().payment, PaymentStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_missing_price_ref_is_config_error() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway.clone(), navigator, false);

        let mut service = consultation("unused");
        service.stripe_price_id = None;
        flow.select_service(service).unwrap();
        flow.confirm_scheduling().unwrap();

        let err = flow.checkout().await.unwrap_err();
        assert!(matches!(err, BookingError::Config(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[test]
    fn test_back_navigation() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway, navigator, false);

        flow.select_service(consultation("price_general")).unwrap();
        flow.confirm_scheduling().unwrap();
        assert_eq!(flow.attempt().step, Step::Pay);

        // PAY -> SCHEDULE keeps the service and the confirmed slot.
        flow.back().unwrap();
        assert_eq!(flow.attempt().step, Step::Schedule);
        assert!(flow.attempt().service.is_some());
        assert_eq!(flow.attempt().scheduling, SchedulingStatus::Confirmed);
        assert_eq!(flow.attempt().payment, PaymentStatus::Idle);

        // SCHEDULE -> SELECT_SERVICE clears everything.
        flow.back().unwrap();
        assert_eq!(flow.attempt().step, Step::SelectService);
        assert!(flow.attempt().service.is_none());
        assert_eq!(flow.attempt().scheduling, SchedulingStatus::NotStarted);

        // Back at the first step is a no-op.
        flow.back().unwrap();
        assert_eq!(flow.attempt().step, Step::SelectService);
    }

    #[test]
    fn test_reset_detaches_stale_bridge() {
        let gateway = Arc::new(MockGateway::new());
        let navigator = RecordingNavigator::new();
        let mut flow = flow(gateway, navigator, false);

        flow.select_service(consultation("price_general")).unwrap();
        flow.handle_scheduler_event(&confirmation()).unwrap();
        assert_eq!(flow.attempt().scheduling, SchedulingStatus::Confirmed);

        let old_id = flow.attempt().id;
        flow.reset();
        assert_ne!(flow.attempt().id, old_id);
        assert_eq!(flow.attempt().step, Step::SelectService);

        // A fresh attempt starts with a fresh bridge: the old confirmation
        // does not leak in.
        flow.select_service(consultation("price_general")).unwrap();
        assert_eq!(flow.attempt().scheduling, SchedulingStatus::AwaitingConfirmation);
        assert_eq!(
            flow.handle_scheduler_event(&confirmation()).unwrap(),
            Some(ConfirmationRule::StructuredTag)
        );
    }
}
