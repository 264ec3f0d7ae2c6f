use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::{AppError, Result};

const MISSING_PHRASE: &str = "No phrase returned";

/// What the phrase page shows after a successful backend call.
#[derive(Debug, Clone, Serialize)]
pub struct PhraseData {
    pub phrase: String,
    /// Reported by the backend as-is; usually seconds as a float.
    pub selection_time: Option<serde_json::Value>,
    /// Round trip measured here, in seconds.
    pub total_time: f64,
}

/// HTTP client for the phrase backend.
#[derive(Clone)]
pub struct PhraseClient {
    http: reqwest::Client,
    url: String,
}

impl PhraseClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch one phrase. Transport errors, non-2xx statuses and bodies that
    /// are not a JSON object all come back as `Err`.
    pub async fn fetch_phrase(&self) -> Result<PhraseData> {
        let start = Instant::now();

        let response = self.http.get(&self.url).send().await?.error_for_status()?;
        let payload: serde_json::Value = response.json().await?;

        let mut data = parse_payload(payload)?;
        data.total_time = round_seconds(start.elapsed().as_secs_f64());
        Ok(data)
    }
}

fn parse_payload(payload: serde_json::Value) -> Result<PhraseData> {
    let serde_json::Value::Object(mut fields) = payload else {
        return Err(AppError::Backend(
            "Expected a JSON object from the phrase backend".to_string(),
        ));
    };

    let phrase = match fields.remove("phrase") {
        None => MISSING_PHRASE.to_string(),
        Some(serde_json::Value::String(text)) => text,
        Some(other) => other.to_string(),
    };

    Ok(PhraseData {
        phrase,
        selection_time: fields.remove("selection_time"),
        total_time: 0.0,
    })
}

fn round_seconds(seconds: f64) -> f64 {
    (seconds * 10_000.0).round() / 10_000.0
}
