//! Prompt construction and reply policy.
//!
//! The oracle writes the actual prose, but *what* the reply should achieve
//! is decided here, from the detected intent and the missing-information
//! report. Getting this wrong is how an automated desk thanks a customer
//! for attaching logs by asking them to attach logs.

use crate::models::classification::{Intent, TicketAnalysis};
use serde::{Deserialize, Serialize};

/// What the outbound reply must accomplish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyObjective {
    /// Acknowledgement: close politely, request nothing.
    ClosePolitely,
    /// Contribution: confirm the material was received and filed.
    ConfirmReceipt,
    /// Complete report: confirm completeness, state escalation and an SLA.
    ConfirmAndEscalate,
    /// Incomplete report: itemize and request exactly the missing items.
    RequestMissingItems,
}

impl ReplyObjective {
    pub fn for_message(analysis: &TicketAnalysis) -> Self {
        match analysis.intent {
            Intent::Acknowledgement => ReplyObjective::ClosePolitely,
            Intent::Contribution => ReplyObjective::ConfirmReceipt,
            Intent::Report if analysis.is_complete_report() => ReplyObjective::ConfirmAndEscalate,
            Intent::Report => ReplyObjective::RequestMissingItems,
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            ReplyObjective::ClosePolitely => {
                "The customer is confirming their issue is resolved. Thank them, \
                 confirm the ticket will be closed, and do not request any data."
            }
            ReplyObjective::ConfirmReceipt => {
                "The customer sent supplementary material for an open case. Confirm \
                 receipt and state that it has been filed against their ticket. Do \
                 not ask for information already provided."
            }
            ReplyObjective::ConfirmAndEscalate => {
                "The report is complete. Confirm that no further information is \
                 needed, state that the case has been escalated to the support team, \
                 and give an expectation of a response within one business day."
            }
            ReplyObjective::RequestMissingItems => {
                "The report is missing information. Briefly explain why it is \
                 needed, list exactly the missing items as bullet points, and ask \
                 the customer to reply with them. Do not say the case was escalated."
            }
        }
    }
}

/// Everything the oracle needs to draft one customer-facing reply.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    pub customer: String,
    pub ticket_id: String,
    pub category: String,
    pub missing_info: String,
    pub intent: Intent,
}

/// Classification prompt. Demands a single JSON object matching
/// [`TicketAnalysis`]; the oracle client enforces the schema on parse.
pub fn build_classification_prompt(message: &str) -> String {
    format!(
        "You triage inbound support emails for an ERP help desk. Analyze the \
         email below and answer with a single JSON object, no prose, with \
         exactly these fields:\n\
         - \"is_valid\": boolean, true if this is a real support issue\n\
         - \"category\": short free-text label (e.g. \"Billing\", \"Printing\")\n\
         - \"priority\": one of \"Low\", \"Medium\", \"High\", \"Critical\"\n\
         - \"summary\": one sentence\n\
         - \"missing_info\": what the customer must still provide, or \"None\"\n\
         - \"intent\": one of \"Report\", \"Contribution\", \"Acknowledgement\"\n\
         - \"detected_module\": affected product module, or \"\"\n\
         - \"rationale\": one-line justification\n\
         \n\
         EMAIL:\n{message}"
    )
}

/// Reply-drafting prompt, shaped by the selected [`ReplyObjective`].
pub fn build_reply_prompt(ctx: &ReplyContext) -> String {
    let objective = ReplyObjective::for_message(&TicketAnalysis {
        intent: ctx.intent,
        missing_info: ctx.missing_info.clone(),
        ..TicketAnalysis::fallback()
    });

    let mut prompt = format!(
        "Write a short, professional support reply in the customer's language.\n\
         Customer: {}\n\
         Ticket: {}\n\
         Category: {}\n\
         Objective: {}\n",
        ctx.customer,
        ctx.ticket_id,
        ctx.category,
        objective.instruction(),
    );
    if objective == ReplyObjective::RequestMissingItems {
        prompt.push_str(&format!("Missing items: {}\n", ctx.missing_info));
    }
    prompt.push_str(
        "Reference the ticket number once. Plain text only, no subject line, \
         no placeholders.",
    );
    prompt
}

/// Fixed reply used whenever the oracle cannot produce one. The upstream
/// automation always gets a usable body to send back to the customer.
pub fn default_reply(customer: &str, ticket_id: &str) -> String {
    format!(
        "Hello {customer},\n\n\
         We have received your message and registered it under ticket \
         {ticket_id}. A member of our support team will review it and get \
         back to you shortly.\n\n\
         Best regards,\n\
         Support Team"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classification::Priority;

    fn analysis(intent: Intent, missing: &str) -> TicketAnalysis {
        TicketAnalysis {
            is_valid: true,
            category: "Printing".to_string(),
            priority: Priority::Medium,
            summary: "printer issue".to_string(),
            missing_info: missing.to_string(),
            intent,
            detected_module: String::new(),
            rationale: String::new(),
        }
    }

    #[test]
    fn acknowledgement_closes_politely() {
        let a = analysis(Intent::Acknowledgement, "None");
        assert_eq!(ReplyObjective::for_message(&a), ReplyObjective::ClosePolitely);
    }

    #[test]
    fn contribution_confirms_receipt() {
        let a = analysis(Intent::Contribution, "None");
        assert_eq!(ReplyObjective::for_message(&a), ReplyObjective::ConfirmReceipt);
    }

    #[test]
    fn complete_report_escalates() {
        let a = analysis(Intent::Report, "None");
        assert_eq!(ReplyObjective::for_message(&a), ReplyObjective::ConfirmAndEscalate);
    }

    #[test]
    fn incomplete_report_requests_missing_items() {
        let a = analysis(Intent::Report, "printer model and error code");
        assert_eq!(ReplyObjective::for_message(&a), ReplyObjective::RequestMissingItems);
    }

    #[test]
    fn reply_prompt_lists_missing_items_only_for_incomplete_reports() {
        let ctx = ReplyContext {
            customer: "Acme".to_string(),
            ticket_id: "TK-240115-482".to_string(),
            category: "Printing".to_string(),
            missing_info: "printer model".to_string(),
            intent: Intent::Report,
        };
        assert!(build_reply_prompt(&ctx).contains("Missing items: printer model"));

        let ctx = ReplyContext {
            missing_info: "None".to_string(),
            intent: Intent::Acknowledgement,
            ..ctx
        };
        assert!(!build_reply_prompt(&ctx).contains("Missing items"));
    }

    #[test]
    fn default_reply_is_nonempty_and_references_the_ticket() {
        let reply = default_reply("Acme", "TK-240115-482");
        assert!(!reply.trim().is_empty());
        assert!(reply.contains("TK-240115-482"));
        assert!(reply.contains("Acme"));
    }

    #[test]
    fn classification_prompt_embeds_the_email() {
        let p = build_classification_prompt("No imprime la factura");
        assert!(p.contains("No imprime la factura"));
        assert!(p.contains("\"intent\""));
    }
}
