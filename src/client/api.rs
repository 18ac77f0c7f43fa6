//! The HTTP client for the record API.

use async_trait::async_trait;
use reqwest::{StatusCode, header::CONTENT_DISPOSITION};
use serde::Deserialize;

use crate::{
    ErrorKind, ErrorResponse,
    client::Filter,
    endpoints,
    record::{CreatedRecord, DeletedRecord, NewRecord, RecordId, RecordList},
};

/// The errors that may occur when talking to the record API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server could not be reached or the response could not be read.
    #[error("could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server refused the request.
    #[error("{message}")]
    Rejected {
        /// The class of failure reported by the server.
        kind: ErrorKind,
        /// A message that is safe to show to the user.
        message: String,
    },

    /// The server sent a response that is not part of the API.
    #[error("unexpected response from the server: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// The class of failure if the server refused the request.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Rejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A CSV export downloaded from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    /// The file name suggested by the server.
    pub file_name: String,
    /// The CSV text, including the header row.
    pub contents: String,
}

/// The operations the client controller needs from the record API.
#[async_trait]
pub trait RecordsApi {
    /// Get every record and the summary statistics.
    async fn list(&self) -> Result<RecordList, ApiError>;

    /// Create a record, returning its ID.
    async fn create(&self, record: &NewRecord) -> Result<RecordId, ApiError>;

    /// Delete the record with `id`.
    async fn delete(&self, id: RecordId) -> Result<(), ApiError>;

    /// Download the records matching `filter` as CSV.
    async fn export_csv(&self, filter: Filter) -> Result<CsvExport, ApiError>;
}

/// Talks to the record API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRecordsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordsApi {
    /// Create a client for the server at `base_url`, e.g. "http://127.0.0.1:3000".
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("finance_tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

/// Read a JSON body of type `T` from a successful response, or the error body otherwise.
async fn read_json<T>(response: reqwest::Response) -> Result<T, ApiError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&body)
            .map_err(|error| ApiError::UnexpectedResponse(error.to_string()));
    }

    Err(read_error(status, &body))
}

fn read_error(status: StatusCode, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(error) => ApiError::Rejected {
            kind: error.error,
            message: error.message,
        },
        Err(_) => ApiError::UnexpectedResponse(format!("status {status}")),
    }
}

/// Pull the file name out of a header like `attachment; filename="records.csv"`.
fn parse_file_name(content_disposition: &str) -> Option<String> {
    content_disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_owned())
}

#[async_trait]
impl RecordsApi for HttpRecordsApi {
    async fn list(&self) -> Result<RecordList, ApiError> {
        let response = self.client.get(self.url(endpoints::RECORDS)).send().await?;

        read_json(response).await
    }

    async fn create(&self, record: &NewRecord) -> Result<RecordId, ApiError> {
        let response = self
            .client
            .post(self.url(endpoints::RECORDS))
            .json(record)
            .send()
            .await?;

        read_json::<CreatedRecord>(response)
            .await
            .map(|created| created.id)
    }

    async fn delete(&self, id: RecordId) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(endpoints::RECORDS))
            .json(&serde_json::json!({ "id": id }))
            .send()
            .await?;

        read_json::<DeletedRecord>(response).await.map(|_| ())
    }

    async fn export_csv(&self, filter: Filter) -> Result<CsvExport, ApiError> {
        let mut request = self.client.get(self.url(endpoints::RECORDS_EXPORT));

        if let Some(record_type) = filter.record_type() {
            request = request.query(&[("record_type", record_type.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(read_error(status, &body));
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_file_name)
            .unwrap_or_else(|| "records.csv".to_owned());
        let contents = response.text().await?;

        Ok(CsvExport {
            file_name,
            contents,
        })
    }
}
