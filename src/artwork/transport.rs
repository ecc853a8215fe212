use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::ArtworkError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn post_form(
        &self,
        url: &str,
        basic_auth: (&str, &str),
        form: &[(&str, &str)],
    ) -> Result<HttpReply, ArtworkError>;

    async fn get(&self, url: &str, bearer: &str) -> Result<HttpReply, ArtworkError>;
}

pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: REQUEST_TIMEOUT,
        }
    }

    async fn into_reply(response: reqwest::Response) -> Result<HttpReply, ArtworkError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl CatalogTransport for ReqwestTransport {
    async fn post_form(
        &self,
        url: &str,
        basic_auth: (&str, &str),
        form: &[(&str, &str)],
    ) -> Result<HttpReply, ArtworkError> {
        let (user, password) = basic_auth;
        let response = self
            .client
            .post(url)
            .basic_auth(user, Some(password))
            .form(form)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::into_reply(response).await
    }

    async fn get(&self, url: &str, bearer: &str) -> Result<HttpReply, ArtworkError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::into_reply(response).await
    }
}
