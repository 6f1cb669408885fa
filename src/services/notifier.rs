// src/services/notifier.rs

//! Outbound push delivery.
//!
//! Delivery is best effort: every key is tried once, failures are logged,
//! and nothing is reported back to the caller.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;
use crate::utils::http;

const PUSH_TIMEOUT_SECS: u64 = 15;

/// Sink for rendered messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str, send_keys: &[String]);
}

/// Reply body of the ServerChan push API.
#[derive(Debug, Deserialize)]
struct PushReply {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Pushes through ServerChan, one request per send key.
pub struct ServerChanNotifier {
    client: reqwest::Client,
    pacing: Duration,
    endpoint: Option<String>,
}

impl ServerChanNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_push_client(Duration::from_secs(PUSH_TIMEOUT_SECS))?,
            pacing: Duration::from_millis(config.pacing_ms),
            endpoint: config.endpoint.clone(),
        })
    }

    /// Push URL for `key`.
    ///
    /// `sctp<N>t...` keys go to the per-user host `N.push.ft07.com`,
    /// everything else to the classic `sctapi.ftqq.com`.
    pub fn push_url(&self, key: &str) -> String {
        if let Some(template) = &self.endpoint {
            return template.replace("{key}", key);
        }
        match sctp_host_id(key) {
            Some(id) => format!("https://{id}.push.ft07.com/send/{key}.send"),
            None => format!("https://sctapi.ftqq.com/{key}.send"),
        }
    }

    async fn send_one(&self, key: &str, title: &str, message: &str) -> Result<String> {
        let response = self
            .client
            .post(self.push_url(key))
            .form(&[("title", title), ("desp", message)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::notify(format!("HTTP {status}: {body}")));
        }

        let reply: PushReply = serde_json::from_str(&body)?;
        if reply.code != 0 {
            return Err(AppError::notify(format!(
                "code {}: {}",
                reply.code, reply.message
            )));
        }
        Ok(reply.message)
    }
}

fn sctp_host_id(key: &str) -> Option<String> {
    let pattern = regex::Regex::new(r"^sctp(\d+)t").ok()?;
    pattern
        .captures(key)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Shortened key for log lines.
fn mask(key: &str) -> String {
    let prefix: String = key.chars().take(6).collect();
    format!("{prefix}***")
}

#[async_trait]
impl Notifier for ServerChanNotifier {
    async fn notify(&self, title: &str, message: &str, send_keys: &[String]) {
        if send_keys.is_empty() {
            log::warn!("No send keys configured, message not pushed");
            return;
        }

        for key in send_keys {
            match self.send_one(key, title, message).await {
                Ok(reply) => log::info!("Pushed to {}: {}", mask(key), reply),
                Err(e) => log::error!("Push to {} failed: {}", mask(key), e),
            }
            tokio::time::sleep(self.pacing).await;
        }
    }
}

/// Writes the message to the log instead of pushing it.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, message: &str, send_keys: &[String]) {
        log::info!(
            "[dry-run] would push \"{}\" to {} key(s):\n{}",
            title,
            send_keys.len(),
            message
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Remembers every message it was handed.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String, Vec<String>)>>,
    }

    impl RecordingNotifier {
        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, title: &str, message: &str, send_keys: &[String]) {
            self.sent.lock().unwrap().push((
                title.to_string(),
                message.to_string(),
                send_keys.to_vec(),
            ));
        }
    }
}
