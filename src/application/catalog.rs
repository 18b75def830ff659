use std::collections::BTreeSet;

use serde::de::DeserializeOwned;

use crate::domain::catalog::CatalogTransport;
use crate::domain::model::book::{main_topic, Book};
use crate::domain::model::id::BookId;
use crate::domain::model::query::{BooksResponse, CatalogPage, CatalogQuery};

use super::error::RemoteFetchError;

pub const GUTENDEX_BASE_URL: &str = "https://gutendex.com";

/// トップページのおすすめに使うトピック
pub const FEATURED_TOPIC: &str = "Fiction";

/// リモートカタログの問い合わせクライアント。
/// wire形式（パラメータ名・レスポンス構造）はここだけが知っている。
/// リトライ・キャッシュはしない。1呼び出し = 1往復。
pub struct CatalogClient<T: CatalogTransport> {
    transport: T,
    base_url: String,
}

impl<T: CatalogTransport> CatalogClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 検索URL。空の条件はクエリに現れない。
    pub fn books_url(&self, query: &CatalogQuery) -> Result<String, RemoteFetchError> {
        let endpoint = format!("{}/books/", self.base_url);
        let params = query.to_params();
        let url = if params.is_empty() {
            reqwest::Url::parse(&endpoint)
        } else {
            reqwest::Url::parse_with_params(&endpoint, &params)
        };
        url.map(String::from)
            .map_err(|e| RemoteFetchError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    pub fn book_url(&self, id: BookId) -> Result<String, RemoteFetchError> {
        let endpoint = format!("{}/books/{}", self.base_url, id);
        reqwest::Url::parse(&endpoint)
            .map(String::from)
            .map_err(|e| RemoteFetchError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    /// 検索条件で1ページ取得する。失敗はすべてerrorログに残す。
    pub async fn fetch_page(&self, query: &CatalogQuery) -> Result<CatalogPage, RemoteFetchError> {
        self.request_page(query)
            .await
            .inspect_err(|e| tracing::error!(?query, error = %e, "error fetching books"))
    }

    /// IDで1冊取得する。404は `NotFound`。
    pub async fn fetch_by_id(&self, id: BookId) -> Result<Book, RemoteFetchError> {
        self.request_book(id)
            .await
            .inspect_err(|e| tracing::error!(book_id = %id, error = %e, "error fetching book"))
    }

    /// おすすめ（Fiction 1ページ目の先頭 `limit` 件）
    pub async fn featured(&self, limit: usize) -> Result<Vec<Book>, RemoteFetchError> {
        let page = self
            .fetch_page(&CatalogQuery::with_topic(FEATURED_TOPIC).page(1))
            .await?;
        Ok(page.results.into_iter().take(limit).collect())
    }

    // --- private ---

    async fn request_page(&self, query: &CatalogQuery) -> Result<CatalogPage, RemoteFetchError> {
        query.validate()?;
        let url = self.books_url(query)?;
        let response: BooksResponse = self.get_json(&url).await?;
        Ok(CatalogPage::from_response(response, query.current_page()))
    }

    async fn request_book(&self, id: BookId) -> Result<Book, RemoteFetchError> {
        let url = self.book_url(id)?;
        self.get_json(&url).await.map_err(|e| match e {
            RemoteFetchError::Status { status: 404, .. } => RemoteFetchError::NotFound(id),
            other => other,
        })
    }

    async fn get_json<D: DeserializeOwned>(&self, url: &str) -> Result<D, RemoteFetchError> {
        tracing::debug!(%url, "GET");
        let response = self
            .transport
            .get(url)
            .await
            .map_err(|e| RemoteFetchError::Transport(Box::new(e)))?;
        if !response.is_success() {
            return Err(RemoteFetchError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }
}

/// 書籍群のsubjectから主トピックを重複なし・昇順で集める。
pub fn extract_topics(books: &[Book]) -> Vec<String> {
    books
        .iter()
        .flat_map(|b| b.subjects.iter())
        .map(|s| main_topic(s).to_string())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
