//! Classification of received HTTP responses against the expected patterns.

use std::time::Duration;

use regex::Regex;

use crate::probe::result::ProbeOutcome;

/// Something that can be searched for in a piece of text.
pub trait Pattern {
    /// The pattern as written in the configuration.
    fn as_str(&self) -> &str;

    /// True when the pattern matches anywhere in `haystack`.
    fn is_match(&self, haystack: &str) -> bool;
}

impl Pattern for Regex {
    fn as_str(&self) -> &str {
        Regex::as_str(self)
    }

    fn is_match(&self, haystack: &str) -> bool {
        Regex::is_match(self, haystack)
    }
}

/// Decide availability for a received response.
///
/// The status code is checked first; the body is only searched when the code
/// matched. The response time is recorded in every case.
pub fn classify<P: Pattern + ?Sized>(
    status: u16,
    body: &str,
    elapsed: Duration,
    expected_code: &P,
    expected_body: &P,
) -> ProbeOutcome {
    let response_time_ms = Some(elapsed.as_nanos() as f64 / 1_000_000.0);
    let code = status.to_string();

    if !expected_code.is_match(&code) {
        return ProbeOutcome::unavailable(
            format!(
                "HTTP response code {code} does not match code regex: {}.",
                expected_code.as_str()
            ),
            response_time_ms,
        );
    }

    if !expected_body.is_match(body) {
        return ProbeOutcome::unavailable(
            format!(
                "Response body regex {} does not match response's body.\n{body}",
                expected_body.as_str()
            ),
            response_time_ms,
        );
    }

    ProbeOutcome::available(response_time_ms)
}
