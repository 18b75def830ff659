use serde::{Deserialize, Serialize};

use super::book::Book;
use crate::domain::error::DomainError;

/// リモートカタログの1ページあたりの件数（公称値）
pub const GUTENDEX_PAGE_SIZE: u64 = 32;

/// カタログ検索条件。空の値は送信しない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub topic: Option<String>,
    pub author_year_start: Option<i32>,
    pub author_year_end: Option<i32>,
    pub page: Option<u32>,
}

impl CatalogQuery {
    pub fn with_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// ページ番号は1以上。他の値の妥当性はリモート側が判断する。
    pub fn validate(&self) -> Result<(), DomainError> {
        match self.page {
            Some(0) => Err(DomainError::InvalidPage(0)),
            _ => Ok(()),
        }
    }

    /// 要求ページ（未指定なら1）
    pub fn current_page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    /// wireパラメータ列。値があり空でも0でもないものだけを固定順で含める。
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(v) = non_blank(&self.search) {
            params.push(("search", v.to_string()));
        }
        if let Some(v) = non_blank(&self.topic) {
            params.push(("topic", v.to_string()));
        }
        if let Some(v) = self.author_year_start.filter(|y| *y != 0) {
            params.push(("author_year_start", v.to_string()));
        }
        if let Some(v) = self.author_year_end.filter(|y| *y != 0) {
            params.push(("author_year_end", v.to_string()));
        }
        if let Some(v) = self.page.filter(|p| *p != 0) {
            params.push(("page", v.to_string()));
        }
        params
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// `/books/` のレスポンス本体
#[derive(Debug, Clone, Deserialize)]
pub struct BooksResponse {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<Book>,
}

/// 正規化済みの検索結果1ページ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogPage {
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub current_page: u32,
    pub results: Vec<Book>,
}

impl CatalogPage {
    pub fn from_response(response: BooksResponse, current_page: u32) -> Self {
        Self {
            count: response.count,
            has_next: response.next.is_some(),
            has_previous: response.previous.is_some(),
            next: response.next,
            previous: response.previous,
            current_page,
            results: response.results,
        }
    }

    /// 総ページ数（公称ページサイズでの切り上げ）
    pub fn total_pages(&self) -> u64 {
        self.count.div_ceil(GUTENDEX_PAGE_SIZE)
    }
}
