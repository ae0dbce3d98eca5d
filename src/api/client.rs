//! Prediction client: create, fetch, cancel and run remote predictions.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::sleep;

use super::config::ClientConfig;
use super::error::PredictionError;
use super::poller::PredictionPoller;
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::prediction::{ModelIdentifier, Prediction, PredictionStatus};

/// Which call a retried request belongs to, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Create,
    Fetch,
    Cancel,
}

impl Operation {
    fn failure(self, status: u16, body: String) -> PredictionError {
        match self {
            Self::Create => PredictionError::CreateFailed { status, body },
            Self::Fetch => PredictionError::FetchFailed { status, body },
            Self::Cancel => PredictionError::CancelFailed { status, body },
        }
    }
}

/// Client for a remote prediction API.
///
/// The client holds only immutable configuration and a shared transport, so
/// it can be cloned freely and used from many tasks at once.
///
/// # Example
/// ```rust,no_run
/// use prediction_client::{ClientConfig, PredictionClient};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = PredictionClient::new(ClientConfig::default().with_api_token("r8_..."));
///     let output = client
///         .run("stability-ai/sdxl:39ed52f2", json!({"prompt": "an astronaut"}))
///         .await?;
///     println!("{:?}", output);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct PredictionClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl PredictionClient {
    /// Create a client that talks HTTP through reqwest.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Create a client with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ClientConfig::default())
    }

    /// Create a client with a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    /// Start a prediction for `model` (`"<path>:<version>"`) with `inputs`.
    ///
    /// Returns the freshly created prediction, normally in a pending status.
    pub async fn create(&self, model: &str, inputs: Value) -> Result<Prediction, PredictionError> {
        let model = ModelIdentifier::parse(model)?;
        self.create_for(&model, inputs).await
    }

    pub(crate) async fn create_for(
        &self,
        model: &ModelIdentifier,
        inputs: Value,
    ) -> Result<Prediction, PredictionError> {
        let url = self.create_url(model);
        let body = json!({ "inputs": inputs }).to_string();

        let response = self
            .send_with_retry(HttpRequest::post(url, Some(body)), Operation::Create)
            .await?;
        let prediction = Prediction::from_response(&response.body, model)?;

        tracing::info!(
            "Created prediction {} for {} ({})",
            prediction.id,
            model,
            prediction.status
        );
        Ok(prediction)
    }

    /// Fetch the current state of `prediction`.
    pub async fn get(&self, prediction: &Prediction) -> Result<Prediction, PredictionError> {
        let url = self.prediction_url(prediction);
        let response = self
            .send_with_retry(HttpRequest::get(url), Operation::Fetch)
            .await?;
        Prediction::from_response(&response.body, &prediction.model())
    }

    /// Ask the remote service to cancel `prediction`.
    pub async fn cancel_prediction(
        &self,
        prediction: &Prediction,
    ) -> Result<Prediction, PredictionError> {
        let url = format!("{}/cancel", self.prediction_url(prediction));
        let response = self
            .send_with_retry(HttpRequest::post(url, None), Operation::Cancel)
            .await?;
        let canceled = Prediction::from_response(&response.body, &prediction.model())?;

        tracing::info!("Cancel requested for prediction {} ({})", canceled.id, canceled.status);
        Ok(canceled)
    }

    /// Current remote status of `prediction`.
    pub async fn check_status(
        &self,
        prediction: &Prediction,
    ) -> Result<PredictionStatus, PredictionError> {
        Ok(self.get(prediction).await?.status)
    }

    /// Create a prediction and poll it until it reaches a terminal status.
    ///
    /// Returns the output on `succeeded`, and whatever output is present on
    /// `canceled` (`None` when there is none). A `failed` prediction becomes
    /// [`PredictionError::PredictionFailed`].
    ///
    /// There is no overall deadline: a prediction that never finishes is
    /// polled forever. Wrap the future in `tokio::time::timeout` to bound it.
    pub async fn run(&self, model: &str, inputs: Value) -> Result<Option<Value>, PredictionError> {
        let prediction = self.stream(model, inputs)?.finish().await?;

        match prediction.status {
            PredictionStatus::Failed => Err(PredictionError::PredictionFailed(
                prediction
                    .error
                    .unwrap_or_else(|| "unknown error".to_string()),
            )),
            PredictionStatus::Canceled => {
                if prediction.output.is_none() {
                    tracing::warn!("Prediction {} was canceled without output", prediction.id);
                }
                Ok(prediction.output)
            }
            _ => {
                if prediction.output.is_none() {
                    tracing::warn!("Prediction {} succeeded without output", prediction.id);
                }
                Ok(prediction.output)
            }
        }
    }

    /// Create a prediction and return the sequence of its snapshots.
    ///
    /// Fails with [`PredictionError::MalformedIdentifier`] immediately,
    /// before any request is sent.
    pub fn stream(&self, model: &str, inputs: Value) -> Result<PredictionPoller<'_>, PredictionError> {
        let model = ModelIdentifier::parse(model)?;
        Ok(PredictionPoller::create(self, model, inputs))
    }

    /// Snapshots of an existing prediction until it is terminal.
    pub fn poll(&self, prediction: Prediction) -> PredictionPoller<'_> {
        PredictionPoller::resume(self, prediction)
    }

    /// Poll an existing prediction until it is terminal and return it.
    pub async fn wait(&self, prediction: Prediction) -> Result<Prediction, PredictionError> {
        self.poll(prediction).finish().await
    }

    /// List models (`GET {base}`).
    pub async fn list_models(&self) -> Result<Value, PredictionError> {
        let url = self.config.base_url.clone();
        self.get_json(url).await
    }

    /// Fetch model metadata (`GET {base}/{path}`).
    pub async fn get_model(&self, path: &str) -> Result<Value, PredictionError> {
        let url = format!("{}/{}", self.config.base_url, path.trim_matches('/'));
        self.get_json(url).await
    }

    async fn get_json(&self, url: String) -> Result<Value, PredictionError> {
        let response = self
            .send_with_retry(HttpRequest::get(url), Operation::Fetch)
            .await?;
        serde_json::from_str(&response.body)
            .map_err(|e| PredictionError::ParseError(e.to_string()))
    }

    /// Send `request` with the client's headers and retry policy.
    ///
    /// A final non-2xx response becomes [`PredictionError::FetchFailed`].
    pub async fn fetch_with_retry(&self, request: HttpRequest) -> Result<HttpResponse, PredictionError> {
        self.send_with_retry(request, Operation::Fetch).await
    }

    async fn send_with_retry(
        &self,
        request: HttpRequest,
        operation: Operation,
    ) -> Result<HttpResponse, PredictionError> {
        let request = self.authorize(request);
        let max_attempts = self.config.max_retries;
        let mut last_failure: Option<PredictionError> = None;

        for attempt in 1..=max_attempts {
            tracing::debug!(
                "{:?} {} (attempt {}/{})",
                request.method,
                request.url,
                attempt,
                max_attempts
            );

            let failure = match self.transport.send(request.clone()).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => operation.failure(response.status, response.body),
                Err(e) => PredictionError::Transport(e),
            };

            if attempt < max_attempts {
                tracing::warn!(
                    "Request failed (attempt {}/{}): {}; retrying in {}ms",
                    attempt,
                    max_attempts,
                    failure,
                    self.config.poll_interval_ms
                );
                sleep(self.poll_interval()).await;
            }
            last_failure = Some(failure);
        }

        Err(last_failure.unwrap_or(PredictionError::RetriesExhausted(max_attempts)))
    }

    fn authorize(&self, request: HttpRequest) -> HttpRequest {
        let request = request.with_header("Content-Type", "application/json");
        match &self.config.api_token {
            Some(token) => request.with_header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    fn create_url(&self, model: &ModelIdentifier) -> String {
        format!(
            "{}/{}/versions/{}/predictions",
            self.config.base_url, model.path, model.version
        )
    }

    fn prediction_url(&self, prediction: &Prediction) -> String {
        format!(
            "{}/{}/versions/{}/predictions/{}",
            self.config.base_url, prediction.model_path, prediction.model_version, prediction.id
        )
    }
}
