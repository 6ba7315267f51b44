use crate::club::*;

use book_club::range::DEFAULT_FETCH_NUMBER;
use book_club::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::club::docs_adapter::AdapterSettings;

pub const DEFAULT_STORE_PATH: &str = "bookclub.json";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_SERVICE_EMAIL: &str = "bookclub@example.com";
pub const DEFAULT_POLL_OPTIONS: usize = 4;
pub const DEFAULT_SETTLE_TIME_MS: u64 = 1000;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClubConfig {
    #[serde(rename = "storePath")]
    pub store_path: Option<String>,
    #[serde(rename = "adminEmail")]
    pub admin_email: Option<String>,
    #[serde(rename = "serviceEmail")]
    pub service_email: Option<String>,
    #[serde(rename = "maxRetries")]
    pub max_retries: Option<u32>,
    #[serde(rename = "retryTimeMs")]
    pub retry_time_ms: Option<u64>,
    #[serde(rename = "fetchNumber")]
    pub fetch_number: Option<usize>,
    #[serde(rename = "pollOptions")]
    pub poll_options: Option<usize>,
    #[serde(rename = "strictSelection")]
    pub strict_selection: Option<bool>,
    #[serde(rename = "settleTimeMs")]
    pub settle_time_ms: Option<u64>,
}

impl ClubConfig {
    pub fn store_path(&self) -> String {
        self.store_path
            .clone()
            .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string())
    }

    pub fn admin_email(&self) -> String {
        self.admin_email
            .clone()
            .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string())
    }

    pub fn service_email(&self) -> String {
        self.service_email
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVICE_EMAIL.to_string())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let default = RetryPolicy::DEFAULT_POLICY;
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(default.max_retries),
            retry_time: self
                .retry_time_ms
                .map(millis)
                .unwrap_or(default.retry_time),
        }
    }

    pub fn fetch_number(&self) -> usize {
        match self.fetch_number {
            Some(x) if x > 0 => x,
            _ => DEFAULT_FETCH_NUMBER,
        }
    }

    pub fn poll_options(&self) -> usize {
        self.poll_options.unwrap_or(DEFAULT_POLL_OPTIONS)
    }

    pub fn strict_selection(&self) -> bool {
        self.strict_selection.unwrap_or(true)
    }

    pub fn settle_time(&self) -> Duration {
        millis(self.settle_time_ms.unwrap_or(DEFAULT_SETTLE_TIME_MS))
    }

    pub fn adapter_settings(&self) -> AdapterSettings {
        AdapterSettings {
            retry: self.retry_policy(),
            fetch_number: self.fetch_number(),
            service_email: self.service_email(),
        }
    }
}

pub fn read_config(path: &str) -> ClubResult<ClubConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ClubConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}
