use std::future::Future;

use reqwest::Url;
use tracing::debug;

use super::contract::{interpret_response, PredictionResult, PREDICT_PATH};
use crate::form::PropertyFormRecord;

/// Why a prediction call did not produce a result. `Display` is the text shown
/// to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictionClientError {
    /// The service answered with a failure status or an `error` payload.
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },
    #[error("invalid prediction response: {0}")]
    Malformed(String),
    /// Connection refused, DNS failure, timeout, or a broken body stream.
    #[error("{0}")]
    Transport(String),
}

/// Transport seam for the remote prediction endpoint.
pub trait PredictionClient: Send + Sync {
    fn predict(
        &self,
        record: &PropertyFormRecord,
    ) -> impl Future<Output = Result<PredictionResult, PredictionClientError>> + Send;
}

/// `POST {origin}/predict` over reqwest. No timeout is configured beyond the
/// transport's own defaults.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpPredictionClient {
    pub fn new(base_url: &Url) -> Result<Self, PredictionClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| PredictionClientError::Transport(err.to_string()))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &Url) -> Self {
        Self {
            http,
            endpoint: predict_endpoint(base_url),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl PredictionClient for HttpPredictionClient {
    async fn predict(
        &self,
        record: &PropertyFormRecord,
    ) -> Result<PredictionResult, PredictionClientError> {
        debug!(endpoint = %self.endpoint, "posting prediction request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(record)
            .send()
            .await
            .map_err(|err| PredictionClientError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PredictionClientError::Transport(err.to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "prediction response received");
        interpret_response(status.as_u16(), &body)
    }
}

fn predict_endpoint(base_url: &Url) -> Url {
    let mut endpoint = base_url.clone();
    let path = format!("{}/{}", base_url.path().trim_end_matches('/'), PREDICT_PATH);
    endpoint.set_path(&path);
    endpoint.set_query(None);
    endpoint
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_predict_to_origin() {
        let base = Url::parse("http://127.0.0.1:5000").expect("valid url");
        assert_eq!(
            predict_endpoint(&base).as_str(),
            "http://127.0.0.1:5000/predict"
        );
    }

    #[test]
    fn endpoint_keeps_mounted_prefix() {
        let base = Url::parse("https://models.example/harpro/").expect("valid url");
        assert_eq!(
            predict_endpoint(&base).as_str(),
            "https://models.example/harpro/predict"
        );

        let base = Url::parse("https://models.example/harpro?v=1").expect("valid url");
        assert_eq!(
            predict_endpoint(&base).as_str(),
            "https://models.example/harpro/predict"
        );
    }

    #[test]
    fn rejected_errors_display_server_text() {
        let err = PredictionClientError::Rejected {
            status: Some(500),
            message: "model unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "model unavailable");
    }
}
