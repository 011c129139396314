use std::time::Duration;

use reqwest::blocking::{Client, Response, multipart};
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::XVError;
use crate::record::Record;
use crate::upload::SpreadsheetFile;

// Best effort on quit, never worth the full request timeout.
const SESSION_CLEAR_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct UploadReceipt {
    pub rows_processed: usize,
}

/// The remote owner of the dataset. The rest of the program only reads
/// what these calls return.
pub trait DataStore: Send {
    fn fetch_all(&self) -> Result<Vec<Record>, XVError>;
    fn upload_file(&self, file: &SpreadsheetFile) -> Result<UploadReceipt, XVError>;
    fn clear_all(&self) -> Result<(), XVError>;
    fn clear_session(&self) -> Result<(), XVError>;
}

#[derive(Deserialize)]
struct DataBody {
    #[serde(default)]
    data: Option<Vec<Record>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

pub struct HttpStore {
    base_url: String,
    client: Client,
}

impl HttpStore {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, XVError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-success response into an error, using the server's
    /// `detail` when it sent a readable one.
    fn check(response: Response) -> Result<Response, XVError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        debug!("Request failed with HTTP {}: {}", status, body);
        Err(error_from_body(status.as_u16(), &body))
    }
}

pub(crate) fn error_from_body(status: u16, body: &str) -> XVError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);
    match detail {
        Some(serde_json::Value::String(detail)) => XVError::Validation(detail),
        _ => XVError::Network(format!("HTTP {status}")),
    }
}

impl DataStore for HttpStore {
    fn fetch_all(&self) -> Result<Vec<Record>, XVError> {
        let response = Self::check(self.client.get(self.url("/data")).send()?)?;
        let body: DataBody = serde_json::from_str(&response.text()?)?;
        let records = body.data.unwrap_or_default();
        info!("Fetched {} records", records.len());
        Ok(records)
    }

    fn upload_file(&self, file: &SpreadsheetFile) -> Result<UploadReceipt, XVError> {
        let part = multipart::Part::bytes(file.content.clone())
            .file_name(file.file_name.clone())
            .mime_str(file.file_type.mime())?;
        let form = multipart::Form::new().part("file", part);

        let response = Self::check(
            self.client
                .post(self.url("/upload-excel"))
                .multipart(form)
                .send()?,
        )?;
        let receipt: UploadReceipt = serde_json::from_str(&response.text()?)?;
        info!("Uploaded {}, {} rows processed", file.file_name, receipt.rows_processed);
        Ok(receipt)
    }

    fn clear_all(&self) -> Result<(), XVError> {
        Self::check(self.client.delete(self.url("/data")).send()?)?;
        info!("Cleared all data");
        Ok(())
    }

    fn clear_session(&self) -> Result<(), XVError> {
        Self::check(
            self.client
                .post(self.url("/session/clear"))
                .timeout(SESSION_CLEAR_TIMEOUT)
                .send()?,
        )?;
        debug!("Cleared session");
        Ok(())
    }
}
