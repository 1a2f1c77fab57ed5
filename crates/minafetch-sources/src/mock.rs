//! Scripted `HttpFetch` for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use minafetch_core::{FetchError, HttpFetch};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
}

/// Replays queued responses in order and records every call.
#[derive(Default)]
pub(crate) struct ScriptedFetch {
    responses: Mutex<VecDeque<Result<Value, FetchError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedFetch {
    pub fn new(responses: impl IntoIterator<Item = Result<Value, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, call: Call) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Other("no scripted response".into())))
    }
}

#[async_trait]
impl HttpFetch for ScriptedFetch {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.next(Call { method: "GET", url: url.to_string(), body: None })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, FetchError> {
        self.next(Call { method: "POST", url: url.to_string(), body: Some(body.clone()) })
    }
}
