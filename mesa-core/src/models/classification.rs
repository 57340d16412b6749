//! Structured output of the triage oracle.
//!
//! The model's output schema drifted across earlier drafts of this service
//! (fields came and went). Here there is exactly one shape: every field is
//! always present, with `"None"` / empty-string sentinels for absent data.
//! Anything the oracle returns that does not parse into this shape is
//! discarded in favor of [`TicketAnalysis::fallback`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel used when the oracle reports nothing is missing.
pub const NO_MISSING_INFO: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// What the inbound message is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// A new (or continued) problem report.
    Report,
    /// Supplementary material for an open case: logs, screenshots, details.
    Contribution,
    /// "Thanks, solved" — nothing further requested.
    Acknowledgement,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::Report => "Report",
            Intent::Contribution => "Contribution",
            Intent::Acknowledgement => "Acknowledgement",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketAnalysis {
    /// Whether the message is an actual support issue rather than noise.
    pub is_valid: bool,
    pub category: String,
    pub priority: Priority,
    pub summary: String,
    /// Free text describing what the customer still has to provide,
    /// or [`NO_MISSING_INFO`] when the report is complete.
    pub missing_info: String,
    pub intent: Intent,
    /// Product module the oracle believes is affected, empty if unknown.
    #[serde(default)]
    pub detected_module: String,
    /// Model's own one-line justification, empty if not provided.
    #[serde(default)]
    pub rationale: String,
}

impl TicketAnalysis {
    /// Fixed defaults used whenever the oracle fails or returns garbage.
    /// The ticket is still created and routed to a human.
    pub fn fallback() -> Self {
        Self {
            is_valid: true,
            category: "General".to_string(),
            priority: Priority::Medium,
            summary: "manual review".to_string(),
            missing_info: "manual review required".to_string(),
            intent: Intent::Report,
            detected_module: String::new(),
            rationale: String::new(),
        }
    }

    pub fn is_complete_report(&self) -> bool {
        self.missing_info.trim() == NO_MISSING_INFO || self.missing_info.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_oracle_output() {
        let raw = r#"{
            "is_valid": true,
            "category": "Billing",
            "priority": "High",
            "summary": "Invoice module down",
            "missing_info": "None",
            "intent": "Report",
            "detected_module": "invoicing",
            "rationale": "customer cannot issue invoices"
        }"#;
        let a: TicketAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(a.priority, Priority::High);
        assert_eq!(a.intent, Intent::Report);
        assert!(a.is_complete_report());
    }

    #[test]
    fn drifting_fields_default_to_empty() {
        // Older drafts of the oracle prompt did not ask for module/rationale.
        let raw = r#"{
            "is_valid": false,
            "category": "Spam",
            "priority": "Low",
            "summary": "newsletter",
            "missing_info": "None",
            "intent": "Report"
        }"#;
        let a: TicketAnalysis = serde_json::from_str(raw).unwrap();
        assert!(a.detected_module.is_empty());
        assert!(a.rationale.is_empty());
    }

    #[test]
    fn missing_core_field_is_a_parse_error() {
        let raw = r#"{"is_valid": true, "category": "General"}"#;
        assert!(serde_json::from_str::<TicketAnalysis>(raw).is_err());
    }

    #[test]
    fn unknown_priority_label_is_a_parse_error() {
        let raw = r#"{
            "is_valid": true,
            "category": "General",
            "priority": "Urgent",
            "summary": "x",
            "missing_info": "None",
            "intent": "Report"
        }"#;
        assert!(serde_json::from_str::<TicketAnalysis>(raw).is_err());
    }

    #[test]
    fn fallback_is_a_valid_medium_report() {
        let a = TicketAnalysis::fallback();
        assert!(a.is_valid);
        assert_eq!(a.category, "General");
        assert_eq!(a.priority, Priority::Medium);
        assert_eq!(a.intent, Intent::Report);
        assert!(!a.is_complete_report());
    }
}
