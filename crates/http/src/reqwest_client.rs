use std::time::Duration;

use url::Url;

use crate::{Error, HttpClient};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`HttpClient`] over `reqwest`. Paths are resolved against `base` the way a
/// browser resolves links, so absolute locators handed out by the backend
/// (`http://cdn/.../en.vtt`) pass through untouched.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    base: Url,
}

impl ReqwestHttpClient {
    pub fn new(base: &str) -> Result<Self, Error> {
        Self::with_timeout(base, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self, Error> {
        let base = Url::parse(base)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn resolve(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base.join(path)?)
    }
}

impl HttpClient for ReqwestHttpClient {
    async fn get(&self, path: &str) -> Result<Vec<u8>, Error> {
        let url = self.resolve(path)?;
        tracing::trace!(%url, "http_get");
        let response = self.client.get(url).send().await?;
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn post(&self, path: &str, body: Vec<u8>, content_type: &str) -> Result<Vec<u8>, Error> {
        let url = self.resolve(path)?;
        tracing::trace!(%url, body_size_bytes = body.len(), "http_post");
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
