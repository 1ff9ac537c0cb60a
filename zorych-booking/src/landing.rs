use url::Url;

/// Query parameter the checkout redirect targets carry back to the host page.
pub const MARKER_PARAM: &str = "payment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Cancelled,
}

/// Read the round-trip payment marker from a landing URL, once. Returns the
/// outcome (if a known marker was present) and the URL with the marker
/// stripped — the stripped form is what belongs in the address bar and
/// history, so a reload never re-shows the notification.
pub fn take_payment_outcome(url: &Url) -> (Option<PaymentOutcome>, Url) {
    let mut outcome = None;
    let mut kept: Vec<(String, String)> = Vec::new();

    for (key, value) in url.query_pairs() {
        if key == MARKER_PARAM {
            // Unknown marker values are dropped from the URL as well; they
            // just produce no notification.
            outcome = outcome.or(match value.as_ref() {
                "success" => Some(PaymentOutcome::Success),
                "cancelled" => Some(PaymentOutcome::Cancelled),
                _ => None,
            });
        } else {
            kept.push((key.into_owned(), value.into_owned()));
        }
    }

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    (outcome, stripped)
}
