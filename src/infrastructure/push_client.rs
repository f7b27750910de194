use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::PushConfig;
use crate::error::{PnlError, Result};
use crate::infrastructure::Notifier;

const ACCESS_TOKEN_HEADER: &str = "Access-Token";
const MAX_ERROR_BODY_CHARS: usize = 100;

#[derive(Debug, Serialize)]
struct PushNote<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'a str,
    body: &'a str,
}

/// Sends notes through the Pushbullet pushes API.
pub struct PushClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl PushClient {
    pub fn new(config: &PushConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PnlError::Config(format!("Failed to build push HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Notifier for PushClient {
    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        debug!("Pushing note {:?} to {}", title, self.endpoint);

        let note = PushNote {
            kind: "note",
            title,
            body,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(ACCESS_TOKEN_HEADER, &self.api_key)
            .json(&note)
            .send()
            .await
            .map_err(|e| PnlError::DeliveryFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let excerpt: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(PnlError::DeliveryFailure(format!("{} - {}", status, excerpt)));
        }

        info!("Notification {:?} delivered", title);
        Ok(())
    }
}
