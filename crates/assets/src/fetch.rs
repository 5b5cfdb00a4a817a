use crate::AssetError;
use std::time::Duration;

/// Source of bytes for remote asset locations.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// Blocking HTTP(S) fetcher. Meant for the import thread, not the event loop.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    pub timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("modelview/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let response = client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes()?;
        tracing::debug!("fetched {} bytes from {url}", bytes.len());
        Ok(bytes.to_vec())
    }
}
