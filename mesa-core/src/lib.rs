pub mod config;
pub mod correlate;
pub mod db;
pub mod error;
pub mod history;
pub mod models;
pub mod oracle;
pub mod prompt;

pub use config::MesaConfig;
pub use correlate::ThreadCorrelator;
pub use error::MesaError;
pub use models::classification::{Intent, Priority, TicketAnalysis};
pub use models::email::InboundEmail;
pub use models::ticket::{generate_ticket_id, Ticket};
pub use oracle::{GeminiOracleClient, OracleBackend, OracleClientConfig, OracleError};
pub use prompt::{ReplyContext, ReplyObjective};
