//! Lazy sequence of prediction snapshots.

use serde_json::Value;
use tokio::time::sleep;

use super::client::PredictionClient;
use super::error::PredictionError;
use crate::prediction::{ModelIdentifier, Prediction};

enum PollState {
    /// Create the prediction on the next step.
    Create { model: ModelIdentifier, inputs: Value },
    /// Yield this snapshot as-is on the next step.
    Yield(Prediction),
    /// Wait one interval, then refetch this prediction.
    Poll(Prediction),
    Done,
}

/// Snapshots of one prediction, ending at the first terminal status.
///
/// Nothing happens until [`next`](Self::next) is awaited. Each step after the
/// first waits the client's poll interval before fetching. The sequence ends
/// after yielding a terminal snapshot or an error. Dropping the poller stops
/// polling locally; the remote prediction keeps running.
///
/// # Example
/// ```rust,no_run
/// # use prediction_client::PredictionClient;
/// # use serde_json::json;
/// # async fn demo(client: PredictionClient) -> Result<(), prediction_client::PredictionError> {
/// let mut poller = client.stream("owner/model:v1", json!({"prompt": "hi"}))?;
/// while let Some(snapshot) = poller.next().await {
///     let prediction = snapshot?;
///     println!("{} {}", prediction.id, prediction.status);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PredictionPoller<'a> {
    client: &'a PredictionClient,
    state: PollState,
    polls: u64,
}

impl<'a> PredictionPoller<'a> {
    pub(crate) fn create(client: &'a PredictionClient, model: ModelIdentifier, inputs: Value) -> Self {
        Self {
            client,
            state: PollState::Create { model, inputs },
            polls: 0,
        }
    }

    pub(crate) fn resume(client: &'a PredictionClient, prediction: Prediction) -> Self {
        let state = if prediction.is_terminal() {
            PollState::Yield(prediction)
        } else {
            PollState::Poll(prediction)
        };
        Self {
            client,
            state,
            polls: 0,
        }
    }

    /// Number of poll intervals waited so far.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Whether the sequence has ended.
    pub fn is_done(&self) -> bool {
        matches!(self.state, PollState::Done)
    }

    /// Produce the next snapshot, or `None` once the sequence has ended.
    ///
    /// Cancel-safe: if this future is dropped before it completes, the
    /// poller keeps its position and the next call redoes the same step.
    /// A dropped create step may already have created a prediction remotely.
    pub async fn next(&mut self) -> Option<Result<Prediction, PredictionError>> {
        let result = match &self.state {
            PollState::Done => return None,
            PollState::Create { model, inputs } => {
                let (model, inputs) = (model.clone(), inputs.clone());
                self.client.create_for(&model, inputs).await
            }
            PollState::Yield(prediction) => Ok(prediction.clone()),
            PollState::Poll(prediction) => {
                let prediction = prediction.clone();
                sleep(self.client.poll_interval()).await;
                self.polls = self.polls.saturating_add(1);
                tracing::debug!("Polling prediction {} (poll {})", prediction.id, self.polls);
                self.client.get(&prediction).await
            }
        };

        match result {
            Ok(prediction) => {
                if prediction.is_terminal() {
                    tracing::info!(
                        "Prediction {} finished: {} after {} polls",
                        prediction.id,
                        prediction.status,
                        self.polls
                    );
                    self.state = PollState::Done;
                } else {
                    self.state = PollState::Poll(prediction.clone());
                }
                Some(Ok(prediction))
            }
            Err(e) => {
                self.state = PollState::Done;
                Some(Err(e))
            }
        }
    }

    /// Drive the sequence to its end and return the terminal snapshot.
    pub async fn finish(mut self) -> Result<Prediction, PredictionError> {
        let mut last = None;
        while let Some(snapshot) = self.next().await {
            last = Some(snapshot?);
        }
        // Every path to Done either yields a snapshot or returns an error above.
        last.ok_or_else(|| PredictionError::ParseError("no prediction snapshot".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::ClientConfig;
    use crate::api::stub::{prediction_json, Script};
    use crate::prediction::PredictionStatus;
    use serde_json::json;
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig::default()
            .with_base_url("http://api.test/models")
            .with_poll_interval(50)
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_yields_each_snapshot() {
        let script = Script::new()
            .reply(201, prediction_json("p1", "starting"))
            .reply(200, prediction_json("p1", "processing"))
            .reply(200, json!({"uuid": "p1", "status": "succeeded", "output": 1}));
        let client = script.client(config());

        let mut poller = client.stream("owner/model:v1", json!({})).unwrap();
        assert_eq!(script.calls(), 0);

        let mut statuses = Vec::new();
        while let Some(snapshot) = poller.next().await {
            statuses.push(snapshot.unwrap().status);
        }
        assert_eq!(
            statuses,
            vec![
                PredictionStatus::Starting,
                PredictionStatus::Processing,
                PredictionStatus::Succeeded,
            ]
        );
        assert_eq!(poller.polls(), 2);
        assert!(poller.is_done());
        assert!(poller.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_after_error() {
        let script = Script::new()
            .reply(201, prediction_json("p1", "starting"))
            .fail("down")
            .fail("down")
            .fail("down");
        let client = script.client(config());

        let mut poller = client.stream("owner/model:v1", json!({})).unwrap();
        assert!(poller.next().await.unwrap().is_ok());
        assert!(poller.next().await.unwrap().is_err());
        assert!(poller.next().await.is_none());
        assert_eq!(script.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_on_pending_prediction() {
        let script = Script::new()
            .reply(200, prediction_json("p1", "processing"))
            .reply(200, json!({"uuid": "p1", "status": "failed", "error": "oom"}));
        let client = script.client(config());

        let pending = Prediction::from_response(
            &prediction_json("p1", "starting").to_string(),
            &ModelIdentifier::new("owner/model", "v1"),
        )
        .unwrap();
        let done = client.wait(pending).await.unwrap();
        assert_eq!(done.status, PredictionStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("oom"));
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_resumes_after_timeout() {
        let script = Script::new()
            .reply(201, prediction_json("p1", "starting"))
            .reply(200, json!({"uuid": "p1", "status": "succeeded", "output": "done"}));
        let client = script.client(config());

        let mut poller = client.stream("owner/model:v1", json!({})).unwrap();
        let first = poller.next().await.unwrap().unwrap();
        assert_eq!(first.status, PredictionStatus::Starting);

        // Give up halfway through the poll interval.
        let timed_out = tokio::time::timeout(Duration::from_millis(10), poller.next()).await;
        assert!(timed_out.is_err());
        assert!(!poller.is_done());
        assert_eq!(script.calls(), 1);

        let last = poller.next().await.unwrap().unwrap();
        assert_eq!(last.status, PredictionStatus::Succeeded);
        assert_eq!(last.output, Some(json!("done")));
        assert!(poller.next().await.is_none());
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_counter_saturates() {
        let script = Script::new().reply(200, prediction_json("p1", "processing"));
        let client = script.client(config().with_poll_interval(0));

        let pending = Prediction::reference("p1", &ModelIdentifier::new("owner/model", "v1"));
        let mut poller = client.poll(pending);
        poller.polls = u64::MAX;

        let snapshot = poller.next().await.unwrap().unwrap();
        assert_eq!(snapshot.status, PredictionStatus::Processing);
        assert_eq!(poller.polls(), u64::MAX);
    }

    #[tokio::test]
    async fn test_poll_terminal_prediction_sends_nothing() {
        let script = Script::new();
        let client = script.client(config());

        let done = Prediction::from_response(
            &prediction_json("p1", "succeeded").to_string(),
            &ModelIdentifier::new("owner/model", "v1"),
        )
        .unwrap();
        let mut poller = client.poll(done.clone());
        assert_eq!(poller.next().await.unwrap().unwrap(), done);
        assert!(poller.next().await.is_none());
        assert_eq!(script.calls(), 0);
    }
}
