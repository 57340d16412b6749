//! The persisted ticket record and identifier allocation.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

/// Lifecycle labels. Stored as free text in the row; these constants are the
/// only values this service writes.
pub const STATUS_AWAITING_CUSTOMER: &str = "Awaiting Customer";
pub const STATUS_IN_REVIEW: &str = "In Review";
pub const STATUS_ESCALATED: &str = "Escalated";
pub const STATUS_CLOSED: &str = "Closed";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub ticket_id: String,
    pub customer: String,
    pub subject: String,
    pub description: String,
    pub summary: String,
    pub category: String,
    pub priority: String,
    pub is_valid: bool,
    pub status: String,
    pub intent: String,
    pub missing_info: String,
    pub history: String,
    pub attachments: String,
    pub last_reply: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Suffix sequence is seeded randomly once per process and incremented per
// allocation, so two tickets created back to back never share an id.
// Across processes uniqueness stays probabilistic (date + 1000 suffixes).
static SUFFIX_SEQ: OnceLock<AtomicU32> = OnceLock::new();

/// Allocate a ticket identifier in the canonical `TK-YYMMDD-NNN` format.
///
/// The format must round-trip through [`crate::ThreadCorrelator`]: an id
/// echoed in a reply subject is how a follow-up email finds its thread.
pub fn generate_ticket_id(now: DateTime<Utc>) -> String {
    let seq = SUFFIX_SEQ.get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..1000)));
    let suffix = seq.fetch_add(1, Ordering::Relaxed) % 1000;
    format!("TK-{}-{:03}", now.format("%y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::ThreadCorrelator;

    #[test]
    fn consecutive_ids_are_distinct() {
        let now = Utc::now();
        let a = generate_ticket_id(now);
        let b = generate_ticket_id(now);
        assert_ne!(a, b, "same-instant allocations must not collide");
    }

    #[test]
    fn generated_id_round_trips_through_the_correlator() {
        let id = generate_ticket_id(Utc::now());
        let correlator = ThreadCorrelator::new();
        let subject = format!("[{}] RE: Problema impresora", id);
        assert_eq!(correlator.correlate(&subject, ""), Some(id));
    }

    #[test]
    fn id_embeds_the_allocation_date() {
        let now = Utc::now();
        let id = generate_ticket_id(now);
        let expected_prefix = format!("TK-{}-", now.format("%y%m%d"));
        assert!(id.starts_with(&expected_prefix), "got {id}");
        assert_eq!(id.len(), expected_prefix.len() + 3);
    }
}
