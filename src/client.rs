// Transport to the game server
//
// Any failure is reported as `None`; the tick loop retries the exact same request
// after a fixed backoff until a response arrives.

use log::{error, warn};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ApiConfig, TimingConfig};
use crate::types::MoveRequest;

/// Submits a move request and returns the next game state, or `None` on any failure
pub trait Transport: Send + Sync {
    fn submit_move(&self, request: &MoveRequest) -> Option<Value>;
}

/// JSON-over-HTTP transport authenticated with `X-Auth-Token`
pub struct HttpTransport {
    agent: ureq::Agent,
    url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(api: &ApiConfig, timing: &TimingConfig, token: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(timing.request_timeout_ms))
            .build();
        HttpTransport {
            agent,
            url: api.move_url().to_string(),
            token,
        }
    }
}

impl Transport for HttpTransport {
    fn submit_move(&self, request: &MoveRequest) -> Option<Value> {
        let response = self
            .agent
            .post(&self.url)
            .set("X-Auth-Token", &self.token)
            .send_json(request);

        match response {
            Ok(resp) => match resp.into_json::<Value>() {
                Ok(value) => Some(value),
                Err(e) => {
                    error!("Failed to read response body: {}", e);
                    None
                }
            },
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                error!("ERR {}: {}", code, body);
                None
            }
            Err(e) => {
                error!("Request to {} failed: {}", self.url, e);
                None
            }
        }
    }
}

/// Offline transport that answers every request with a recorded response
pub struct FileTransport {
    path: PathBuf,
}

impl FileTransport {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileTransport { path: path.into() }
    }
}

impl Transport for FileTransport {
    fn submit_move(&self, _request: &MoveRequest) -> Option<Value> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                error!("Failed to read mock response '{}': {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Failed to parse mock response '{}': {}", self.path.display(), e);
                None
            }
        }
    }
}

/// Sends `request` until the server answers, sleeping `backoff` between attempts
///
/// The payload is never rebuilt between attempts.
pub async fn submit_with_retry(
    transport: Arc<dyn Transport>,
    request: &MoveRequest,
    backoff: Duration,
) -> Value {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        let transport = transport.clone();
        let payload = request.clone();

        match tokio::task::spawn_blocking(move || transport.submit_move(&payload)).await {
            Ok(Some(value)) => return value,
            Ok(None) => warn!(
                "Move request failed (attempt {}), retrying in {}ms",
                attempt,
                backoff.as_millis()
            ),
            Err(e) => error!("Transport task panicked (attempt {}): {}", attempt, e),
        }

        tokio::time::sleep(backoff).await;
    }
}
