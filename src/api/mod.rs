//! Prediction API client with retrying transport and status polling.

mod client;
mod config;
mod error;
mod poller;
#[cfg(test)]
mod stub;
mod transport;

pub use client::PredictionClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL_MS};
pub use error::{PredictionError, TransportError};
pub use poller::PredictionPoller;
pub use transport::{FnTransport, HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
