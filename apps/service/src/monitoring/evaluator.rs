use super::types::{Check, CheckState, Outcome};

/// Result of evaluating one probe against its check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The check with its new state and probe time applied
    pub updated: Check,
    pub state: CheckState,
    /// Whether the owner should be alerted about this probe
    pub alert_worthy: bool,
}

/// Up iff the probe got a response whose code is one of the check's success codes
pub fn derive_state(check: &Check, outcome: &Outcome) -> CheckState {
    match outcome.response_code() {
        Some(code) if check.success_codes.contains(&i64::from(code)) => CheckState::Up,
        _ => CheckState::Down,
    }
}

/// Derive the new state for `check` and decide whether it warrants an alert.
///
/// A check that has never been probed never alerts; otherwise an alert is
/// due whenever the state changes.
pub fn evaluate(check: &Check, outcome: &Outcome, checked_at: i64) -> Evaluation {
    let state = derive_state(check, outcome);
    let alert_worthy = check.has_been_checked() && state != check.state;

    Evaluation { updated: check.record_probe(state, checked_at), state, alert_worthy }
}
