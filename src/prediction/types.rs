//! Prediction snapshots and their wire representation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::identifier::ModelIdentifier;
use crate::api::PredictionError;

/// Remote status of a prediction.
///
/// Statuses the client does not know are kept verbatim and treated as pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Other(String),
}

impl PredictionStatus {
    /// Whether polling stops at this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    /// The status string as the remote service spells it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PredictionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "starting" => Self::Starting,
            "processing" => Self::Processing,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            _ => Self::Other(s),
        }
    }
}

impl From<PredictionStatus> for String {
    fn from(status: PredictionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One snapshot of a remote inference job.
///
/// Snapshots are never mutated locally; a fresh one is produced by every
/// fetch from the remote service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Remote-assigned identifier.
    pub id: String,
    /// Path of the invoked model, without leading slash.
    pub model_path: String,
    /// Version of the invoked model.
    pub model_version: String,
    pub status: PredictionStatus,
    /// Caller-supplied inputs, echoed back by the remote service.
    pub input: Value,
    /// Present once the prediction has succeeded.
    pub output: Option<Value>,
    /// Present once the prediction has failed.
    pub error: Option<String>,
}

impl Prediction {
    /// A reference to an existing prediction whose state has not been fetched.
    ///
    /// Carries just enough to build its status URL; the status is `unknown`,
    /// which counts as pending.
    pub fn reference(id: impl Into<String>, model: &ModelIdentifier) -> Self {
        Self {
            id: id.into(),
            model_path: model.path.clone(),
            model_version: model.version.clone(),
            status: PredictionStatus::Other("unknown".to_string()),
            input: Value::Null,
            output: None,
            error: None,
        }
    }

    /// The model identifier this prediction was created from.
    pub fn model(&self) -> ModelIdentifier {
        ModelIdentifier::new(&self.model_path, &self.model_version)
    }

    /// Whether the prediction has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Parse a create/get/cancel response body.
    ///
    /// The body is either `{"prediction": {...}}` or the prediction object
    /// itself. `fallback` fills in the model path and version when the
    /// response does not carry them.
    pub fn from_response(body: &str, fallback: &ModelIdentifier) -> Result<Self, PredictionError> {
        let mut value: Value = serde_json::from_str(body)
            .map_err(|e| PredictionError::ParseError(format!("invalid JSON: {}", e)))?;

        if let Some(inner) = value.get_mut("prediction").map(Value::take) {
            value = inner;
        }

        let wire: WirePrediction = serde_json::from_value(value)
            .map_err(|e| PredictionError::ParseError(e.to_string()))?;

        Ok(wire.into_prediction(fallback))
    }
}

#[derive(Debug, Deserialize)]
struct WirePrediction {
    #[serde(alias = "id")]
    uuid: String,
    #[serde(default)]
    version_id: Option<String>,
    status: PredictionStatus,
    #[serde(default, alias = "inputs")]
    input: Value,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    version: Option<WireVersion>,
}

#[derive(Debug, Deserialize)]
struct WireVersion {
    #[serde(default)]
    model: Option<WireModel>,
}

#[derive(Debug, Deserialize)]
struct WireModel {
    #[serde(default)]
    absolute_url: Option<String>,
}

impl WirePrediction {
    fn into_prediction(self, fallback: &ModelIdentifier) -> Prediction {
        let model_path = self
            .version
            .and_then(|v| v.model)
            .and_then(|m| m.absolute_url)
            .map(|url| url.trim_matches('/').to_string())
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| fallback.path.clone());

        let error = match self.error {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        Prediction {
            id: self.uuid,
            model_path,
            model_version: self
                .version_id
                .unwrap_or_else(|| fallback.version.clone()),
            status: self.status,
            input: self.input,
            output: self.output.filter(|v| !v.is_null()),
            error,
        }
    }
}
