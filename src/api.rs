//! REST client for the stream directory backend.
//!
//! Failures never reach the caller: they are logged and the call degrades
//! to an empty list, `None` or `false`.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::common::{Category, Stream};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct StreamApi {
    client: reqwest::Client,
    base_url: String,
}

impl StreamApi {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_live_streams(&self) -> Vec<Stream> {
        log::debug!("Fetching live streams");
        match self.get_json::<Vec<Stream>>("streams/live").await {
            Ok(streams) => {
                log::info!("Fetched {} live streams", streams.len());
                streams
            }
            Err(err) => {
                log::error!("Error fetching live streams: {err}");
                Vec::new()
            }
        }
    }

    pub async fn get_stream_by_id(&self, stream_id: &str) -> Option<Stream> {
        log::debug!("Fetching stream {stream_id}");
        match self.get_json::<Stream>(&format!("streams/{stream_id}")).await {
            Ok(stream) => Some(stream),
            Err(err) => {
                log::error!("Error fetching stream {stream_id}: {err}");
                None
            }
        }
    }

    pub async fn get_categories(&self) -> Vec<Category> {
        match self.get_json::<Vec<Category>>("categories").await {
            Ok(categories) => categories,
            Err(err) => {
                log::error!("Error fetching categories: {err}");
                Vec::new()
            }
        }
    }

    pub async fn check_health(&self) -> bool {
        let result = self
            .client
            .get(self.endpoint("health"))
            .send()
            .await
            .and_then(|response| response.error_for_status());
        match result {
            Ok(_) => {
                log::info!("Backend reachable at {}", self.base_url);
                true
            }
            Err(err) => {
                log::warn!("Backend not available at {}: {err}", self.base_url);
                false
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, reqwest::Error> {
        let url = self.endpoint(path);
        let response = self.client.get(&url).send().await?;
        let response = response.error_for_status().inspect_err(|err| {
            if let Some(status) = err.status() {
                log::warn!("{url} answered {status}");
            }
        })?;
        response.json::<T>().await
    }
}
