use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// HEAD-checks a file's image URL. Any error, timeout, or non-2xx response
/// is treated as unreachable; there is no distinction worth making to the
/// caller between "404" and "connection refused", since both mean the
/// batch tied to that file must be skipped.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

#[derive(Clone)]
pub struct HttpImageProbe {
    http_client: Client,
    timeout: Duration,
}

impl HttpImageProbe {
    #[must_use]
    pub fn new(http_client: Client, timeout_ms: u64) -> Self {
        Self {
            http_client,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        let request = self.http_client.head(url).timeout(self.timeout).send();

        match request.await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                warn!(error = %err, url, "image reachability probe failed");
                false
            }
        }
    }
}
