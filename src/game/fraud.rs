use chrono::{DateTime, Utc};

use crate::constants::MAX_FLAGGED_ACTIONS;

/// What the anti-fraud gate demands before a save may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudGate {
    Clear,
    CaptchaRequired,
    Blacklist,
}

/// Flag escalation: past the threshold the farm is blacklisted outright;
/// past `verify_at` a CAPTCHA must be solved first; otherwise the save
/// proceeds.
pub fn evaluate(flagged_count: i32, verify_at: DateTime<Utc>, now: DateTime<Utc>) -> FraudGate {
    if exceeds_blacklist_threshold(flagged_count) {
        return FraudGate::Blacklist;
    }
    if now >= verify_at {
        return FraudGate::CaptchaRequired;
    }
    FraudGate::Clear
}

pub fn exceeds_blacklist_threshold(flagged_count: i32) -> bool {
    flagged_count > MAX_FLAGGED_ACTIONS
}
