use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;

// ============== Timestamp Helpers ==============

/// RFC3339 timestamp in UTC (status snapshots, logs).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

// ============== Phone Numbers ==============

/// Canonical phone form: `+` followed by the digits of `raw`, nothing else.
///
/// Idempotent: `canonicalize_phone(&canonicalize_phone(x)) == canonicalize_phone(x)`.
pub fn canonicalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+{digits}")
}

// ============== Send Interval ==============

/// `90` -> `"1m 30s"`, `30` -> `"30s"`.
pub fn format_interval(seconds: u32) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    if mins > 0 {
        return format!("{mins}m {secs}s");
    }
    format!("{secs}s")
}

// ============== Remote Message Heuristics ==============

fn expiry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)expir").expect("static regex"))
}

/// Whether a remote message reads like "session expired".
///
/// Fallback only: a structured `code` on the reply takes precedence.
pub fn mentions_expiry(message: &str) -> bool {
    expiry_re().is_match(message)
}
