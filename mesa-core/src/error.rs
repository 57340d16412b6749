use thiserror::Error;

#[derive(Error, Debug)]
pub enum MesaError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] crate::oracle::OracleError),

    #[error("Other error: {0}")]
    Other(String),
}
