use std::time::Duration;

use async_trait::async_trait;

use crate::domain::catalog::{CatalogTransport, TransportResponse};

/// reqwestによるCatalogTransport実装。
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("athenaeum/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CatalogTransport for ReqwestTransport {
    type Error = reqwest::Error;

    async fn get(&self, url: &str) -> Result<TransportResponse, Self::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
