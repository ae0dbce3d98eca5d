//! Prediction data model and model identifiers.

mod identifier;
mod types;

pub use identifier::ModelIdentifier;
pub use types::{Prediction, PredictionStatus};
