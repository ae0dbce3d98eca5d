// Copyright 2025 ModerRAS
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Prediction Client
//!
//! Async client for remote model prediction APIs.
//!
//! A prediction is a remote inference job: it is created with a model
//! identifier (`"<path>:<version>"`) and a map of inputs, then moves through
//! `starting` and `processing` until it ends as `succeeded`, `failed` or
//! `canceled`. This crate turns that job into a single awaited result, with
//! every HTTP call wrapped in a bounded, fixed-interval retry.
//!
//! ## Run Example
//!
//! ```rust,no_run
//! use prediction_client::{ClientConfig, PredictionClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::default()
//!         .with_api_token("r8_...")
//!         .with_poll_interval(500);
//!     let client = PredictionClient::new(config);
//!
//!     let output = client
//!         .run("stability-ai/sdxl:39ed52f2", json!({"prompt": "a lighthouse"}))
//!         .await?;
//!
//!     println!("Output: {:?}", output);
//!     Ok(())
//! }
//! ```
//!
//! ## Progress Example
//!
//! ```rust,no_run
//! use prediction_client::PredictionClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PredictionClient::with_defaults();
//!     let mut poller = client.stream("owner/model:v1", json!({"text": "hello"}))?;
//!
//!     while let Some(snapshot) = poller.next().await {
//!         let prediction = snapshot?;
//!         println!("{}: {}", prediction.id, prediction.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod prediction;
pub mod settings;

pub use api::{
    ClientConfig, FnTransport, HttpRequest, HttpResponse, PredictionClient, PredictionError,
    PredictionPoller, ReqwestTransport, Transport, TransportError,
};
pub use prediction::{ModelIdentifier, Prediction, PredictionStatus};
pub use settings::AppSettings;
