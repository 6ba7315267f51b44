use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value as JSValue;

use crate::errors::*;

/// A request to a remote backend that can be sent several times.
pub trait RemoteRequest {
    fn execute(&mut self) -> BackendResult<JSValue>;
}

impl<F> RemoteRequest for F
where
    F: FnMut() -> BackendResult<JSValue>,
{
    fn execute(&mut self) -> BackendResult<JSValue> {
        self()
    }
}

/// How many times a request is attempted, and how long to wait in between.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_time: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_POLICY: RetryPolicy = RetryPolicy {
        max_retries: 5,
        retry_time: Duration::from_secs(1),
    };

    pub fn run<R: RemoteRequest + ?Sized>(&self, request: &mut R) -> BackendResult<JSValue> {
        try_request_n_retries(request, self.max_retries, self.retry_time)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::DEFAULT_POLICY
    }
}

/// Sends the request up to `times` times, until it succeeds.
///
/// A response that carries an `error` payload is turned into a
/// [`BackendError::RemoteScript`]. Connectivity and remote-script failures are
/// retried after sleeping `retry_time`; once the attempts are used up, the last
/// failure is returned. Any other error is returned right away.
pub fn try_request_n_retries<R: RemoteRequest + ?Sized>(
    request: &mut R,
    times: u32,
    retry_time: Duration,
) -> BackendResult<JSValue> {
    let times = times.max(1);
    let mut attempt = 1;
    loop {
        match request.execute().and_then(check_script_error) {
            Ok(result) => {
                debug!("try_request_n_retries: success after {} attempt(s)", attempt);
                return Ok(result);
            }
            Err(e) if e.is_transient() && attempt < times => {
                warn!(
                    "try_request_n_retries: attempt {}/{} failed: {}",
                    attempt, times, e
                );
                thread::sleep(retry_time);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// Remote functions report failures inside an otherwise successful response:
// {"error": {"details": [{"errorMessage": "...", ...}]}}
fn check_script_error(result: JSValue) -> BackendResult<JSValue> {
    match result.get("error") {
        None => Ok(result),
        Some(error) => {
            let details = match error.pointer("/details/0") {
                Some(JSValue::String(s)) => s.clone(),
                Some(d) => d
                    .get("errorMessage")
                    .and_then(|m| m.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| d.to_string()),
                None => error.to_string(),
            };
            RemoteScriptSnafu { details }.fail()
        }
    }
}
