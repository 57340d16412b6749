//! Ticket state manager — the decision core of the webhook.
//!
//! Given an inbound email, decide whether it continues an existing ticket or
//! starts a new one, and compute the resulting record mutation:
//!
//! inbound email → correlate → classify → (append | insert) → outcome
//!
//! Oracle failures never abort a request: classification degrades to
//! [`TicketAnalysis::fallback`] and reply drafting to the fixed default
//! text. Only datastore write failures propagate to the caller.

use chrono::Utc;
use mesa_core::history::{
    append_history, initial_block, merge_attachments, update_block, NO_ATTACHMENTS,
};
use mesa_core::models::ticket::{
    generate_ticket_id, STATUS_AWAITING_CUSTOMER, STATUS_CLOSED, STATUS_ESCALATED,
    STATUS_IN_REVIEW,
};
use mesa_core::prompt::{default_reply, ReplyContext};
use mesa_core::{InboundEmail, Intent, MesaError, OracleBackend, ThreadCorrelator, TicketAnalysis};
use serde::Serialize;
use sqlx::PgPool;

use crate::subsystems::store::{self, NewTicket, TicketThread, TicketUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriageKind {
    #[serde(rename = "NEW")]
    New,
    #[serde(rename = "UPDATE")]
    Update,
}

/// What the webhook hands back to the email-automation caller.
#[derive(Debug, Clone, Serialize)]
pub struct TriageOutcome {
    pub kind: TriageKind,
    pub ticket_id: String,
    /// Subject line the automation should reply with. For new tickets this
    /// carries the bracketed id so the next reply correlates.
    pub reply_subject: String,
    pub reply_body: String,
}

/// Lifecycle label implied by the message analysis. The same mapping covers
/// first contact and follow-ups.
pub fn next_status(analysis: &TicketAnalysis) -> &'static str {
    match analysis.intent {
        Intent::Acknowledgement => STATUS_CLOSED,
        Intent::Contribution => STATUS_IN_REVIEW,
        Intent::Report if analysis.is_complete_report() => STATUS_ESCALATED,
        Intent::Report => STATUS_AWAITING_CUSTOMER,
    }
}

/// Process one inbound email end to end. `oracle` is `None` when the client
/// could not be built (no API key) — triage then runs on fallbacks alone.
pub async fn process_email(
    email: &InboundEmail,
    pool: &PgPool,
    oracle: Option<&dyn OracleBackend>,
) -> Result<TriageOutcome, MesaError> {
    let analysis = classify_or_fallback(email, oracle).await;

    let correlator = ThreadCorrelator::new();
    if let Some(ticket_id) = correlator.correlate(&email.subject, &email.message) {
        match store::fetch_ticket_thread(pool, &ticket_id).await {
            Ok(Some(thread)) => {
                return append_existing(email, pool, oracle, &analysis, ticket_id, thread).await;
            }
            Ok(None) => {
                tracing::warn!(
                    ticket_id = %ticket_id,
                    "Message references a ticket with no record, opening a new one"
                );
            }
            Err(e) => {
                tracing::warn!(
                    ticket_id = %ticket_id,
                    error = %e,
                    "Ticket lookup failed, opening a new one"
                );
            }
        }
    }

    insert_new(email, pool, oracle, &analysis).await
}

async fn classify_or_fallback(
    email: &InboundEmail,
    oracle: Option<&dyn OracleBackend>,
) -> TicketAnalysis {
    let Some(oracle) = oracle else {
        tracing::debug!("No oracle configured, using fallback analysis");
        return TicketAnalysis::fallback();
    };

    match oracle.classify(&email.message).await {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::warn!(
                backend = oracle.name(),
                error = %e,
                "Classification failed, using fallback analysis"
            );
            TicketAnalysis::fallback()
        }
    }
}

async fn draft_reply_or_default(oracle: Option<&dyn OracleBackend>, ctx: &ReplyContext) -> String {
    if let Some(oracle) = oracle {
        match oracle.draft_reply(ctx).await {
            Ok(reply) if !reply.trim().is_empty() => return reply,
            Ok(_) => tracing::warn!("Oracle drafted an empty reply, using default"),
            Err(e) => {
                tracing::warn!(
                    backend = oracle.name(),
                    error = %e,
                    "Reply drafting failed, using default"
                );
            }
        }
    }
    default_reply(&ctx.customer, &ctx.ticket_id)
}

async fn append_existing(
    email: &InboundEmail,
    pool: &PgPool,
    oracle: Option<&dyn OracleBackend>,
    analysis: &TicketAnalysis,
    ticket_id: String,
    thread: TicketThread,
) -> Result<TriageOutcome, MesaError> {
    tracing::info!(ticket_id = %ticket_id, intent = %analysis.intent, "Updating ticket thread");

    let ctx = ReplyContext {
        customer: email.customer.clone(),
        ticket_id: ticket_id.clone(),
        category: analysis.category.clone(),
        missing_info: analysis.missing_info.clone(),
        intent: analysis.intent,
    };
    let reply = draft_reply_or_default(oracle, &ctx).await;

    let block = update_block(
        Utc::now(),
        &email.customer,
        &email.message,
        email.attachments.as_deref(),
        &reply,
    );

    let attachments = match &email.attachments {
        Some(new) => merge_attachments(&thread.attachments, new),
        None => thread.attachments.clone(),
    };

    let update = TicketUpdate {
        history: append_history(&thread.history, &block),
        status: next_status(analysis).to_string(),
        attachments,
        last_reply: reply.clone(),
    };
    store::append_ticket(pool, &ticket_id, &update).await?;

    Ok(TriageOutcome {
        kind: TriageKind::Update,
        ticket_id,
        // Keep the caller's subject so the mail thread (RE: chain) survives.
        reply_subject: email.subject.clone(),
        reply_body: reply,
    })
}

async fn insert_new(
    email: &InboundEmail,
    pool: &PgPool,
    oracle: Option<&dyn OracleBackend>,
    analysis: &TicketAnalysis,
) -> Result<TriageOutcome, MesaError> {
    let ticket_id = generate_ticket_id(Utc::now());
    tracing::info!(ticket_id = %ticket_id, intent = %analysis.intent, "Creating ticket");

    let ctx = ReplyContext {
        customer: email.customer.clone(),
        ticket_id: ticket_id.clone(),
        category: analysis.category.clone(),
        missing_info: analysis.missing_info.clone(),
        intent: analysis.intent,
    };
    let reply = draft_reply_or_default(oracle, &ctx).await;

    let ticket = NewTicket {
        ticket_id: ticket_id.clone(),
        customer: email.customer.clone(),
        subject: email.subject.clone(),
        description: email.message.clone(),
        summary: analysis.summary.clone(),
        category: analysis.category.clone(),
        priority: analysis.priority.to_string(),
        is_valid: analysis.is_valid,
        status: next_status(analysis).to_string(),
        intent: analysis.intent.to_string(),
        missing_info: analysis.missing_info.clone(),
        history: initial_block(&ticket_id, &email.customer, &email.message, analysis, &reply),
        attachments: email
            .attachments
            .clone()
            .unwrap_or_else(|| NO_ATTACHMENTS.to_string()),
        last_reply: reply.clone(),
    };
    store::insert_ticket(pool, &ticket).await?;

    Ok(TriageOutcome {
        kind: TriageKind::New,
        reply_subject: format!("[{}] {}", ticket_id, email.subject),
        ticket_id,
        reply_body: reply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesa_core::models::classification::Priority;

    fn analysis(intent: Intent, missing: &str) -> TicketAnalysis {
        TicketAnalysis {
            is_valid: true,
            category: "Printing".to_string(),
            priority: Priority::Medium,
            summary: "x".to_string(),
            missing_info: missing.to_string(),
            intent,
            detected_module: String::new(),
            rationale: String::new(),
        }
    }

    #[test]
    fn acknowledgement_closes_the_ticket() {
        assert_eq!(next_status(&analysis(Intent::Acknowledgement, "None")), STATUS_CLOSED);
    }

    #[test]
    fn contribution_goes_to_review() {
        assert_eq!(next_status(&analysis(Intent::Contribution, "None")), STATUS_IN_REVIEW);
    }

    #[test]
    fn complete_report_escalates() {
        assert_eq!(next_status(&analysis(Intent::Report, "None")), STATUS_ESCALATED);
    }

    #[test]
    fn incomplete_report_awaits_the_customer() {
        assert_eq!(
            next_status(&analysis(Intent::Report, "printer model")),
            STATUS_AWAITING_CUSTOMER
        );
    }

    #[test]
    fn fallback_analysis_always_awaits_manual_review_input() {
        // The fallback marks missing_info non-empty, so an oracle outage
        // never silently escalates a ticket.
        assert_eq!(
            next_status(&TicketAnalysis::fallback()),
            STATUS_AWAITING_CUSTOMER
        );
    }
}
