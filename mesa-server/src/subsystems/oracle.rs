//! Oracle factory — builds the Gemini client from application config.

use mesa_core::oracle::{GeminiOracleClient, OracleClientConfig, OracleError};
use mesa_core::MesaConfig;

/// Create the triage oracle from the application config.
///
/// The API key is read from `GOOGLE_API_KEY`. A missing key is an
/// [`OracleError::MissingApiKey`], which callers downgrade to fallback-only
/// operation — the webhook keeps answering either way.
pub fn create_oracle_from_config(config: &MesaConfig) -> Result<GeminiOracleClient, OracleError> {
    let mut client_config = OracleClientConfig::new(None, config.oracle.model.clone());
    client_config.max_retries = config.oracle.max_retries as usize;
    client_config.retry_delay_ms = config.oracle.retry_delay_ms;

    GeminiOracleClient::new(client_config)
}
