use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::record::model::{ResponseRecord, Row};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct QueriesReply {
    #[serde(default)]
    result: Vec<Row>,
}

/// Blocking client for the ex-nihilo backend. One instance lives for the
/// whole session; requests wait as long as the model takes, the client never
/// gives up on its own.
pub struct Backend {
    client: Client,
    base_url: String,
    debug: bool,
}

impl Backend {
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url =
            std::env::var("NIHILO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(None).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let debug = std::env::var("NIHILO_DEBUG").map(|v| v == "1").unwrap_or(false);
        if debug {
            let _ = std::fs::create_dir_all("debug_out");
        }
        Ok(Self { client, base_url, debug })
    }

    /// Sends one natural-language message and returns the answer record.
    pub fn universal(&self, message: &str, api_key: &str) -> Result<ResponseRecord, ApiError> {
        let payload = json!({ "message": message, "api_key": api_key });
        let response = self
            .client
            .post(self.endpoint("universal"))
            .json(&payload)
            .send()?;
        let body = check_status(response)?.text()?;
        self.dump("universal", &body);
        Ok(serde_json::from_str(&body)?)
    }

    /// Re-runs a record's stored queries and returns fresh rows.
    pub fn run_queries(&self, queries: &[String]) -> Result<Vec<Row>, ApiError> {
        let payload = json!({ "queries": queries });
        let response = self
            .client
            .post(self.endpoint("sql"))
            .json(&payload)
            .send()?;
        let body = check_status(response)?.text()?;
        self.dump("sql", &body);
        let reply: QueriesReply = serde_json::from_str(&body)?;
        Ok(reply.result)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Raw response bodies land in debug_out/ when NIHILO_DEBUG=1.
    fn dump(&self, tag: &str, body: &str) {
        if !self.debug {
            return;
        }
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let _ = std::fs::write(format!("debug_out/{tag}_{millis}.json"), body);
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().unwrap_or_default();
    Err(ApiError::Status { status, body })
}
