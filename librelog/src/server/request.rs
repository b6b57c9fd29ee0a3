//! HTTP request types for the librelog server.

use bytes::Bytes;
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::Error;
use crate::export::ExportFormat;

/// One ingest message: `{"log_set": "<id>", "data": <any JSON>}`.
///
/// `data` is kept as raw JSON text and stored byte for byte.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub log_set: String,
    pub data: Box<RawValue>,
}

impl Envelope {
    /// Parses and validates an envelope from a message body.
    pub fn parse(body: &[u8]) -> Result<Self, Error> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| Error::InvalidInput(format!("invalid envelope: {}", e)))?;
        if envelope.log_set.is_empty() {
            return Err(Error::InvalidInput("log_set must not be empty".to_string()));
        }
        Ok(envelope)
    }

    /// The payload to store.
    pub fn payload(&self) -> Bytes {
        Bytes::copy_from_slice(self.data.get().as_bytes())
    }
}

/// Query parameters for export requests.
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

impl ExportParams {
    pub fn format(&self) -> ExportFormat {
        self.format
            .as_deref()
            .and_then(|f| f.parse().ok())
            .unwrap_or_default()
    }
}

/// Query parameters accepted on the streaming handshake.
#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    pub token: Option<String>,
}

/// Body of `POST /api/v1/logsets`.
#[derive(Debug, Deserialize)]
pub struct CreateLogsetRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `PUT /api/v1/logsets/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLogsetRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Body of `POST /api/v1/tokens`.
#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_data_verbatim() {
        // given
        let body = br#"{"log_set":"app","data":{"b": 1.50, "a":[1, 2]}}"#;

        // when
        let envelope = Envelope::parse(body).unwrap();

        // then
        assert_eq!(envelope.log_set, "app");
        assert_eq!(envelope.payload(), Bytes::from(r#"{"b": 1.50, "a":[1, 2]}"#));
    }

    #[test]
    fn should_accept_scalar_data() {
        let envelope = Envelope::parse(br#"{"log_set":"app","data":"hello"}"#).unwrap();
        assert_eq!(envelope.payload(), Bytes::from(r#""hello""#));
    }

    #[test]
    fn should_reject_malformed_envelopes() {
        for body in [
            &b"not json"[..],
            br#"{"data":{}}"#,
            br#"{"log_set":"app"}"#,
            br#"{"log_set":"","data":{}}"#,
            br#"{"log_set":7,"data":{}}"#,
        ] {
            assert!(matches!(
                Envelope::parse(body),
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn should_select_export_format() {
        let csv = ExportParams {
            format: Some("csv".to_string()),
        };
        assert_eq!(csv.format(), ExportFormat::Csv);
        assert_eq!(ExportParams::default().format(), ExportFormat::Json);
    }
}
