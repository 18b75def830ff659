use async_trait::async_trait;

/// HTTP GETの結果。ステータスの解釈は呼び出し側が行う。
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// リモートカタログへのHTTP GETの抽象。Infra層が実装し、テストでは差し替える。
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn get(&self, url: &str) -> Result<TransportResponse, Self::Error>;
}
