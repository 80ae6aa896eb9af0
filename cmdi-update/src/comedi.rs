//! Replacing records through the COMEDI metadata editor API.
use cmdi_modifiers::pipeline::{UploadError, Uploader};
use cmdi_modifiers::short_identifier;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Authenticated COMEDI session.
pub struct ComediClient {
    client: reqwest::blocking::Client,
    api_url: String,
    session_id: String,
}

/// What COMEDI answers with. Fields missing from the answer, and an `error`
/// of `null`, are taken as not reporting a problem.
#[derive(Debug, Default, Deserialize)]
struct ComediResponse {
    #[serde(default)]
    success: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl ComediResponse {
    fn problem(&self) -> Option<String> {
        match &self.error {
            Some(Value::String(message)) => return Some(message.clone()),
            Some(Value::Null) | None => {}
            Some(other) => return Some(other.to_string()),
        }
        match &self.success {
            Some(Value::Bool(true)) | Some(Value::Null) | None => None,
            Some(other) => Some(format!("success: {other}")),
        }
    }
}

impl ComediClient {
    pub fn new(api_url: &str, session_id: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            session_id: session_id.to_string(),
        }
    }

    fn delete(&self, identifier: &str) -> Result<(), UploadError> {
        let response = self
            .client
            .get(format!("{}/rest", self.api_url))
            .query(&[
                ("command", "delete-record"),
                ("identifier", identifier),
                ("session-id", self.session_id.as_str()),
            ])
            .send()
            .map_err(transport)?;
        let status = response.status().as_u16();
        check_response(status, &response.text().map_err(transport)?)
    }

    fn upload(&self, record: &str) -> Result<(), UploadError> {
        let response = self
            .client
            .post(format!("{}/upload", self.api_url))
            .query(&[("session-id", self.session_id.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(record.to_string())
            .send()
            .map_err(transport)?;
        let status = response.status().as_u16();
        check_response(status, &response.text().map_err(transport)?)
    }
}

impl Uploader for ComediClient {
    fn replace_record(&self, pid: &str, record: &str) -> Result<(), UploadError> {
        let identifier = short_identifier(pid)?;
        debug!(pid, identifier, "deleting record before upload");
        self.delete(identifier)?;
        self.upload(record)
    }
}

fn transport(err: reqwest::Error) -> UploadError {
    UploadError::Transport(Box::new(err))
}

/// Decide whether a COMEDI answer reports success.
///
/// A body that is not JSON is accepted when the status is a success.
fn check_response(status: u16, body: &str) -> Result<(), UploadError> {
    if !(200..300).contains(&status) {
        return Err(UploadError::Status {
            status,
            body: body.to_string(),
        });
    }
    // only a JSON object can carry the fields
    let response: ComediResponse = serde_json::from_str(body).unwrap_or_default();
    match response.problem() {
        Some(problem) => Err(UploadError::Rejected(problem)),
        None => Ok(()),
    }
}
