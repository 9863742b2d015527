use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::PredictionClientError;

/// Path appended to the configured origin.
pub const PREDICT_PATH: &str = "predict";

/// Shown when the service fails without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "Terjadi kesalahan";

/// Local precondition failure for non-positive areas.
pub const AREA_VALIDATION_MESSAGE: &str = "Luas tanah dan bangunan harus lebih dari 0";

/// Parsed success body. Fields other than `predicted_price` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_price: f64,
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl PredictionResult {
    pub fn new(predicted_price: f64) -> Self {
        Self {
            predicted_price,
            extras: BTreeMap::new(),
        }
    }
}

/// Map a status code and raw body onto a result or a user-facing failure.
///
/// Any non-2xx status fails, using the body's `error` text when present. A 2xx
/// body that carries `error` is also a failure. A 2xx body without a numeric
/// `predicted_price` is malformed.
pub fn interpret_response(status: u16, body: &[u8]) -> Result<PredictionResult, PredictionClientError> {
    let success = (200..300).contains(&status);
    let parsed = serde_json::from_slice::<Value>(body);

    let value = match parsed {
        Ok(value) => value,
        Err(_) if !success => {
            return Err(PredictionClientError::Rejected {
                status: Some(status),
                message: GENERIC_FAILURE_MESSAGE.to_string(),
            })
        }
        Err(err) => return Err(PredictionClientError::Malformed(err.to_string())),
    };

    if let Some(message) = error_text(&value) {
        return Err(PredictionClientError::Rejected {
            status: Some(status),
            message,
        });
    }

    if !success {
        return Err(PredictionClientError::Rejected {
            status: Some(status),
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        });
    }

    serde_json::from_value::<PredictionResult>(value)
        .map_err(|err| PredictionClientError::Malformed(err.to_string()))
}

fn error_text(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_keeps_auxiliary_fields() {
        let body = br#"{"predicted_price": 850000000, "model": "random_forest"}"#;
        let result = interpret_response(200, body).expect("success body");
        assert_eq!(result.predicted_price, 850_000_000.0);
        assert_eq!(result.extras.get("model"), Some(&json!("random_forest")));
    }

    #[test]
    fn server_error_text_wins() {
        let err = interpret_response(500, br#"{"error":"model unavailable"}"#)
            .expect_err("500 fails");
        assert_eq!(err.to_string(), "model unavailable");
    }

    #[test]
    fn non_success_without_error_uses_generic_message() {
        let err = interpret_response(502, b"<html>bad gateway</html>").expect_err("502 fails");
        assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);

        let err = interpret_response(404, br#"{"detail":"nope"}"#).expect_err("404 fails");
        assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn success_status_with_error_payload_fails() {
        let err = interpret_response(200, br#"{"error":"kota tidak dikenal"}"#)
            .expect_err("error payload");
        assert_eq!(err.to_string(), "kota tidak dikenal");
    }

    #[test]
    fn success_without_price_is_malformed() {
        let err = interpret_response(200, br#"{"price": 1}"#).expect_err("missing price");
        assert!(matches!(err, PredictionClientError::Malformed(_)));

        let err = interpret_response(200, b"not json").expect_err("garbage");
        assert!(matches!(err, PredictionClientError::Malformed(_)));
    }
}
