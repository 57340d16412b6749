//! Composition of the append-only per-ticket history log.
//!
//! The history column is a plain text blob read by support staff, so the
//! builders here aim for a stable, scannable layout. Appending is strictly
//! additive: a new exchange is concatenated after the existing text and
//! nothing is ever rewritten.

use crate::models::classification::TicketAnalysis;
use chrono::{DateTime, Utc};

/// Stored in the attachments column when a ticket has none.
pub const NO_ATTACHMENTS: &str = "No attachments";

const RULE: &str = "========================================";
const THIN_RULE: &str = "----------------------------------------";

/// History written when a ticket is first created.
pub fn initial_block(
    ticket_id: &str,
    customer: &str,
    message: &str,
    analysis: &TicketAnalysis,
    reply: &str,
) -> String {
    format!(
        "{RULE}\n\
         TICKET CREATED: {ticket_id}\n\
         CUSTOMER: {customer}\n\
         ORIGINAL MESSAGE:\n{message}\n\
         {THIN_RULE}\n\
         TRIAGE:\n\
         - Category: {}\n\
         - Priority: {}\n\
         - Intent: {}\n\
         {THIN_RULE}\n\
         REPLY SENT:\n{reply}",
        analysis.category, analysis.priority, analysis.intent,
    )
}

/// Delta appended when a follow-up arrives on an existing thread.
pub fn update_block(
    at: DateTime<Utc>,
    customer: &str,
    message: &str,
    attachments: Option<&str>,
    reply: &str,
) -> String {
    let mut block = format!(
        "\n\n{RULE}\n\
         UPDATE: {}\n\
         CUSTOMER ({customer}):\n{message}\n",
        at.format("%Y-%m-%d %H:%M UTC"),
    );
    if let Some(urls) = attachments {
        block.push_str(&format!("[ATTACHMENT: {urls}]\n"));
    }
    block.push_str(&format!("{THIN_RULE}\nAUTOMATED REPLY:\n{reply}"));
    block
}

/// Append a delta to the existing history. Prior content is preserved
/// verbatim as a prefix of the result.
pub fn append_history(previous: &str, block: &str) -> String {
    let mut merged = String::with_capacity(previous.len() + block.len());
    merged.push_str(previous);
    merged.push_str(block);
    merged
}

/// Merge newly received attachment URLs into the stored comma-joined list.
/// The list only grows; duplicates are tolerated.
pub fn merge_attachments(previous: &str, new: &str) -> String {
    if previous.is_empty() || previous == NO_ATTACHMENTS {
        new.to_string()
    } else {
        format!("{previous}, {new}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> TicketAnalysis {
        TicketAnalysis::fallback()
    }

    #[test]
    fn initial_block_names_ticket_customer_and_reply() {
        let block = initial_block(
            "TK-240115-482",
            "Acme",
            "No imprime la factura",
            &analysis(),
            "Hemos registrado su caso.",
        );
        assert!(block.contains("TICKET CREATED: TK-240115-482"));
        assert!(block.contains("CUSTOMER: Acme"));
        assert!(block.contains("No imprime la factura"));
        assert!(block.contains("Hemos registrado su caso."));
    }

    #[test]
    fn append_preserves_prior_history_as_prefix() {
        let prev = initial_block("TK-240115-482", "Acme", "fallo", &analysis(), "ok");
        let block = update_block(Utc::now(), "Acme", "sigue igual", None, "revisando");
        let merged = append_history(&prev, &block);
        assert!(merged.starts_with(&prev), "history must never be truncated or reordered");
        assert!(merged.len() > prev.len());
        assert!(merged.contains("sigue igual"));
    }

    #[test]
    fn update_block_includes_attachments_only_when_present() {
        let with = update_block(Utc::now(), "Acme", "captura", Some("https://f/x.png"), "gracias");
        assert!(with.contains("[ATTACHMENT: https://f/x.png]"));

        let without = update_block(Utc::now(), "Acme", "captura", None, "gracias");
        assert!(!without.contains("[ATTACHMENT"));
    }

    #[test]
    fn attachments_merge_appends_never_replaces() {
        assert_eq!(merge_attachments("", "a.png"), "a.png");
        assert_eq!(merge_attachments(NO_ATTACHMENTS, "a.png"), "a.png");
        assert_eq!(merge_attachments("a.png", "b.pdf"), "a.png, b.pdf");
        // Duplicates are tolerated, not deduplicated.
        assert_eq!(merge_attachments("a.png", "a.png"), "a.png, a.png");
    }
}
