pub mod oracle;
pub mod store;
pub mod triage;
