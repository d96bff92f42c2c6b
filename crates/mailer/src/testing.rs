//! Test doubles for code built on this crate
//!
//! Compiled for this crate's own tests and behind the `testing` feature.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// In-memory [`HttpClient`] that replays queued outcomes
///
/// Every request is recorded. When the queue runs dry the client fails with
/// a connection-refused I/O error.
#[derive(Default)]
pub struct ScriptedHttpClient {
    outcomes: Mutex<VecDeque<Result<HttpResponse, std::io::ErrorKind>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a transport failure
    pub fn fail(self, kind: std::io::ErrorKind) -> Self {
        self.push(Err(kind));
        self
    }

    fn push(&self, outcome: Result<HttpResponse, std::io::ErrorKind>) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(outcome);
        }
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let outcome = self
            .outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front())
            .unwrap_or(Err(std::io::ErrorKind::ConnectionRefused));

        outcome.map_err(|kind| HttpError::Io {
            url: request.url.clone(),
            source: std::io::Error::new(kind, "scripted failure"),
        })
    }
}
