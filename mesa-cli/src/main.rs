//! mesa-cli — operator frontend for the Mesa triage webhook
//!
//! Sends a simulated inbound-email payload to a running mesa-server and
//! prints the triage response, which is the quickest way to smoke-test a
//! deployment without wiring up the email automation.
//!
//! # Subcommands
//! - `send [--message ..] [--customer ..] [--subject ..] [--attachments ..]`
//! - `status` — show server health

use clap::{Parser, Subcommand};
use serde::Serialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8750";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "mesa-cli",
    version,
    about = "Mesa support-ticket triage — webhook smoke-test CLI"
)]
struct Cli {
    /// Mesa HTTP server URL (overrides MESA_SERVER_URL env var)
    #[arg(long, env = "MESA_SERVER_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a simulated inbound email through the triage pipeline
    Send {
        /// Email body
        #[arg(
            long,
            default_value = "URGENTE: Soy de SolarTech. El módulo de facturación se colgó y no podemos emitir facturas. Necesito ayuda ya."
        )]
        message: String,

        /// Customer name or email
        #[arg(long, default_value = "SolarTech")]
        customer: String,

        /// Subject line (include a [TK-YYMMDD-NNN] tag to exercise the update path)
        #[arg(long, default_value = "Fallo módulo facturación")]
        subject: String,

        /// Comma-delimited attachment URLs
        #[arg(long)]
        attachments: Option<String>,
    },

    /// Show Mesa server status
    Status,
}

// ============================================================================
// Wire payload
// ============================================================================

#[derive(Debug, Serialize)]
struct EmailPayload {
    mensaje: String,
    cliente: String,
    asunto: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    archivos_adjuntos: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::blocking::Client::new();

    match cli.command {
        Commands::Send {
            message,
            customer,
            subject,
            attachments,
        } => {
            let payload = EmailPayload {
                mensaje: message,
                cliente: customer,
                asunto: subject,
                archivos_adjuntos: attachments,
            };

            let url = format!("{}/procesar_email", cli.server);
            println!("Sending email payload to {}...", url);

            let resp = client.post(&url).json(&payload).send()?;
            let status = resp.status();
            let body: serde_json::Value = resp.json()?;

            println!("HTTP {}", status);
            println!("{}", serde_json::to_string_pretty(&body)?);

            if !status.is_success() {
                anyhow::bail!("server returned an error status");
            }
        }
        Commands::Status => {
            let url = format!("{}/health", cli.server);
            let resp = client.get(&url).send()?;
            let status = resp.status();
            let body: serde_json::Value = resp.json()?;

            println!("HTTP {}", status);
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
