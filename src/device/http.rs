//! HTTP access to the device's web server.
//!
//! Components never talk to `ureq` directly. They receive a
//! [`SharedClient`] so that tests (and the CLI's simulator mode) can swap
//! in a different transport. The production implementation is
//! [`UreqClient`], a blocking client with a per-request timeout.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use super::stats::ParseError;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("request to device failed: {0}")]
    Transport(String),
    #[error("device answered {code} for {path}")]
    Status { path: String, code: u16 },
    #[error("unreadable response body: {0}")]
    Body(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Minimal request surface the dashboard needs from an HTTP stack.
///
/// Paths are absolute (`/GetTXData`); the implementation owns the base URL.
pub trait HttpClient: Send + Sync {
    /// Issue a GET and return the response body.
    fn get(&self, path: &str) -> Result<String, DeviceError>;

    /// Issue a body-less POST and return the response body.
    fn post(&self, path: &str) -> Result<String, DeviceError>;
}

/// Client handle shared between components and scheduled tasks.
pub type SharedClient = Arc<dyn HttpClient>;

// ---------------------------------------------------------------------------
// ureq implementation
// ---------------------------------------------------------------------------

/// Blocking client backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqClient {
    base_url: String,
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // "localhost" may resolve to ::1 first while the simulator binds IPv4 only.
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { base_url, agent }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn read(path: &str, result: Result<ureq::Response, ureq::Error>) -> Result<String, DeviceError> {
        match result {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| DeviceError::Body(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(DeviceError::Status {
                path: path.to_string(),
                code,
            }),
            Err(ureq::Error::Transport(t)) => Err(DeviceError::Transport(t.to_string())),
        }
    }
}

impl HttpClient for UreqClient {
    fn get(&self, path: &str) -> Result<String, DeviceError> {
        Self::read(path, self.agent.get(&self.url(path)).call())
    }

    fn post(&self, path: &str) -> Result<String, DeviceError> {
        Self::read(path, self.agent.post(&self.url(path)).send_string(""))
    }
}

// ---------------------------------------------------------------------------
// In-memory client
// ---------------------------------------------------------------------------

/// A recorded request: method and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: &'static str,
    pub path: String,
}

/// Canned-response client that records every request it sees.
///
/// Paths without a canned body answer with a transport error, mirroring an
/// unreachable device.
#[derive(Debug, Default)]
pub struct RecordingClient {
    responses: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<Request>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the body returned for `path`.
    pub fn respond(&self, path: &str, body: &str) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(path.to_string(), body.to_string());
        }
    }

    /// Snapshot of all requests issued so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of requests issued with the given method and path.
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn handle(&self, method: &'static str, path: &str) -> Result<String, DeviceError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(Request {
                method,
                path: path.to_string(),
            });
        }
        self.responses
            .lock()
            .ok()
            .and_then(|r| r.get(path).cloned())
            .ok_or_else(|| DeviceError::Transport(format!("no route to {path}")))
    }
}

impl HttpClient for RecordingClient {
    fn get(&self, path: &str) -> Result<String, DeviceError> {
        self.handle("GET", path)
    }

    fn post(&self, path: &str) -> Result<String, DeviceError> {
        self.handle("POST", path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash() {
        let client = UreqClient::new("http://192.168.1.10/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://192.168.1.10");
        assert_eq!(client.url("/GetTXData"), "http://192.168.1.10/GetTXData");
    }

    #[test]
    fn client_rewrites_localhost() {
        let client = UreqClient::new("http://localhost:8080", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn recording_client_returns_canned_body_and_records() {
        let client = RecordingClient::new();
        client.respond("/GetTXData", "1,2,3,4");

        assert_eq!(client.get("/GetTXData").unwrap(), "1,2,3,4");
        assert!(client.post("/LedOn").is_err());

        assert_eq!(
            client.requests(),
            vec![
                Request {
                    method: "GET",
                    path: "/GetTXData".to_string()
                },
                Request {
                    method: "POST",
                    path: "/LedOn".to_string()
                },
            ]
        );
        assert_eq!(client.count("POST", "/LedOn"), 1);
    }

    #[test]
    fn parse_error_converts_into_device_error() {
        let err: DeviceError = ParseError::Empty.into();
        assert!(matches!(err, DeviceError::Parse(ParseError::Empty)));
        assert_eq!(err.to_string(), "empty response body");
    }
}
