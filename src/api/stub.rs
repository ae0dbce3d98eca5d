//! Scripted transports for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use super::client::PredictionClient;
use super::config::ClientConfig;
use super::error::TransportError;
use super::transport::{FnTransport, HttpRequest, HttpResponse};

type Reply = Result<HttpResponse, TransportError>;

#[derive(Default)]
struct ScriptState {
    replies: VecDeque<Reply>,
    requests: Vec<HttpRequest>,
}

/// Replies to requests in order and records every request it sees.
#[derive(Clone, Default)]
pub(crate) struct Script {
    state: Arc<Mutex<ScriptState>>,
}

impl Script {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, status: u16, body: Value) -> Self {
        self.push(Ok(HttpResponse::new(status, body.to_string())))
    }

    pub(crate) fn fail(self, message: &str) -> Self {
        self.push(Err(TransportError::Other(message.to_string())))
    }

    fn push(self, reply: Reply) -> Self {
        self.state.lock().unwrap().replies.push_back(reply);
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub(crate) fn client(&self, config: ClientConfig) -> PredictionClient {
        let state = Arc::clone(&self.state);
        let transport = FnTransport::new(move |req: &HttpRequest| {
            let mut state = state.lock().unwrap();
            state.requests.push(req.clone());
            state
                .replies
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("no scripted reply".to_string())))
        });
        PredictionClient::with_transport(config, Arc::new(transport))
    }
}

/// Minimal prediction body with no output or error.
pub(crate) fn prediction_json(id: &str, status: &str) -> Value {
    json!({
        "uuid": id,
        "status": status,
        "input": {},
        "output": null,
        "error": null,
    })
}

/// Client whose server tracks each prediction separately: a model at
/// `owner/<name>` creates prediction `<name>-1`, which reports `processing`
/// on its first fetch and `succeeded` with output `"<name>-done"` after.
pub(crate) fn routed_client(config: ClientConfig) -> PredictionClient {
    let fetches: Mutex<HashMap<String, u32>> = Mutex::new(HashMap::new());

    let transport = FnTransport::new(move |req: &HttpRequest| {
        let rest = req
            .url
            .split("/owner/")
            .nth(1)
            .ok_or_else(|| TransportError::Other(format!("unexpected url {}", req.url)))?;
        let name = rest.split('/').next().unwrap_or_default().to_string();
        let id = format!("{}-1", name);

        if req.url.ends_with("/predictions") {
            let body = prediction_json(&id, "starting");
            return Ok(HttpResponse::new(201, body.to_string()));
        }

        let mut fetches = fetches.lock().unwrap();
        let count = fetches.entry(id.clone()).or_insert(0);
        *count += 1;
        let body = if *count < 2 {
            prediction_json(&id, "processing")
        } else {
            json!({"uuid": id, "status": "succeeded", "output": format!("{}-done", name)})
        };
        Ok(HttpResponse::new(200, body.to_string()))
    });

    PredictionClient::with_transport(config, Arc::new(transport))
}
