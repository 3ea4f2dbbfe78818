use crate::models::RedirectOutcome;

const PENDING_STATUSES: &[&str] = &["pending", "in_process", "in_mediation"];
const FAILURE_STATUSES: &[&str] = &["rejected", "cancelled", "refunded"];

/// Decide the outcome of a checkout redirect.
///
/// The path wins over the `status` parameter: MercadoPago is configured with
/// distinct `back_urls` per outcome, so `/pending` and `/failure` are
/// authoritative. Path matching is a substring test on the lower-cased path,
/// and `pending` is checked before `failure`. Unrecognised or missing
/// statuses default to success.
pub fn classify_outcome(path: &str, status: Option<&str>) -> RedirectOutcome {
    let path = path.to_lowercase();

    if path.contains("pending") {
        return RedirectOutcome::Pending;
    }
    if path.contains("failure") {
        return RedirectOutcome::Failure;
    }

    let Some(status) = status.filter(|s| !s.is_empty()) else {
        return RedirectOutcome::Success;
    };

    let status = status.to_lowercase();
    if status == "approved" {
        RedirectOutcome::Success
    } else if PENDING_STATUSES.contains(&status.as_str()) {
        RedirectOutcome::Pending
    } else if FAILURE_STATUSES.contains(&status.as_str()) {
        RedirectOutcome::Failure
    } else {
        RedirectOutcome::Success
    }
}
