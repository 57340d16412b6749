use serde::{Deserialize, Serialize};

/// Inbound webhook payload, one per email received by the automation layer.
///
/// Field names on the wire are the Spanish ones the email-automation caller
/// has always sent; renaming them would break the existing integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEmail {
    #[serde(rename = "mensaje")]
    pub message: String,
    #[serde(rename = "cliente")]
    pub customer: String,
    #[serde(rename = "asunto")]
    pub subject: String,
    /// Comma-delimited attachment URLs uploaded by the automation layer.
    #[serde(rename = "archivos_adjuntos", default)]
    pub attachments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_field_names() {
        let raw = r#"{
            "mensaje": "No imprime la factura",
            "cliente": "Acme",
            "asunto": "Problema impresora"
        }"#;
        let email: InboundEmail = serde_json::from_str(raw).unwrap();
        assert_eq!(email.customer, "Acme");
        assert_eq!(email.subject, "Problema impresora");
        assert!(email.attachments.is_none());
    }

    #[test]
    fn attachments_are_optional_but_accepted() {
        let raw = r#"{
            "mensaje": "adjunto captura",
            "cliente": "Acme",
            "asunto": "RE: error",
            "archivos_adjuntos": "https://files.example/cap1.png"
        }"#;
        let email: InboundEmail = serde_json::from_str(raw).unwrap();
        assert_eq!(
            email.attachments.as_deref(),
            Some("https://files.example/cap1.png")
        );
    }
}
