//! Thread correlation: does an inbound email continue an existing ticket?
//!
//! An email belongs to a thread when a ticket identifier appears in its
//! subject or body. The subject is searched first and always wins — a body
//! can quote an entire history blob and thereby mention ids from unrelated
//! tickets, while the subject carries the id we put there ourselves when the
//! ticket was created.
//!
//! Canonical identifier format: `TK-` + six digits (YYMMDD) + `-` + three
//! digits. The legacy `TCK-<n>` format from early drafts of this service is
//! deliberately not matched; see DESIGN.md.

use regex::Regex;

/// Canonical ticket identifier pattern, e.g. `TK-240115-482`.
pub const TICKET_ID_PATTERN: &str = r"TK-\d{6}-\d{3}";

#[derive(Debug, Clone)]
pub struct ThreadCorrelator {
    pattern: Regex,
}

impl Default for ThreadCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadCorrelator {
    pub fn new() -> Self {
        // The pattern is a compile-time literal; it cannot fail to compile.
        let pattern = Regex::new(TICKET_ID_PATTERN).expect("valid ticket id pattern");
        Self { pattern }
    }

    /// Return the ticket id referenced by the message, if any.
    ///
    /// A returned id is only a *claim* that a thread exists — the caller must
    /// still look it up and fall back to new-ticket creation when no record
    /// matches.
    pub fn correlate(&self, subject: &str, body: &str) -> Option<String> {
        if let Some(m) = self.pattern.find(subject) {
            return Some(m.as_str().to_string());
        }
        self.pattern.find(body).map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_id_in_subject() {
        let c = ThreadCorrelator::new();
        let found = c.correlate("[TK-240115-482] RE: Problema impresora", "Gracias, ya se resolvió");
        assert_eq!(found.as_deref(), Some("TK-240115-482"));
    }

    #[test]
    fn subject_wins_over_body() {
        let c = ThreadCorrelator::new();
        let body = "quoting old thread TK-230901-007 here";
        let found = c.correlate("RE: [TK-240115-482] impresora", body);
        assert_eq!(found.as_deref(), Some("TK-240115-482"));
    }

    #[test]
    fn falls_back_to_body_when_subject_is_clean() {
        let c = ThreadCorrelator::new();
        let found = c.correlate("RE: impresora", "como comenté en TK-240115-482, sigue igual");
        assert_eq!(found.as_deref(), Some("TK-240115-482"));
    }

    #[test]
    fn no_id_anywhere_means_new_conversation() {
        let c = ThreadCorrelator::new();
        assert_eq!(c.correlate("Problema impresora", "No imprime la factura"), None);
    }

    #[test]
    fn malformed_ids_do_not_match() {
        let c = ThreadCorrelator::new();
        assert_eq!(c.correlate("TK-12345-678", ""), None, "five-digit date");
        assert_eq!(c.correlate("", "ticket TK-240115-42"), None, "two-digit suffix");
    }

    #[test]
    fn legacy_tck_format_is_not_correlated() {
        let c = ThreadCorrelator::new();
        assert_eq!(c.correlate("RE: TCK-9", "see TCK-1234"), None);
    }

    #[test]
    fn id_buried_in_a_long_quoted_history_still_matches() {
        let c = ThreadCorrelator::new();
        let mut body = "lorem ipsum\n".repeat(200);
        body.push_str("========\nTICKET: TK-240115-482\n========\n");
        assert_eq!(c.correlate("RE: impresora", &body).as_deref(), Some("TK-240115-482"));
    }
}
