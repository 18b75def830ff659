//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use athenaeum::application::bookmarks::BookmarkService;
use athenaeum::application::catalog::CatalogClient;
use athenaeum::domain::catalog::{CatalogTransport, TransportResponse};
use athenaeum::domain::model::book::{Author, Book};
use athenaeum::domain::repository::SlotStorage;

pub const BASE_URL: &str = "https://gutendex.test";

// =============================================================================
// InMemoryStore — テスト用スロットストレージ
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("in-memory store error")]
pub struct InMemoryError;

/// ファイルI/O不要のインメモリストレージ。
pub struct InMemoryStore {
    slots: RefCell<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(HashMap::new()),
        }
    }

    /// 生の文字列をスロットに直接書き込む（破損データの再現用）
    pub fn seed(&self, key: &str, raw: &str) {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), raw.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }
}

impl SlotStorage for InMemoryStore {
    type Error = InMemoryError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

pub fn empty_service() -> BookmarkService<InMemoryStore> {
    BookmarkService::new(InMemoryStore::new())
}

// =============================================================================
// FakeTransport — URL単位で応答を返すモックリモート
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
pub struct ConnectionRefused;

pub struct FakeTransport {
    routes: HashMap<String, TransportResponse>,
    offline: bool,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            offline: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new()
        }
    }

    pub fn route(mut self, url: &str, status: u16, body: serde_json::Value) -> Self {
        self.routes.insert(
            url.to_string(),
            TransportResponse {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn route_raw(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            TransportResponse {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    /// 受け付けたURL（到着順）
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogTransport for FakeTransport {
    type Error = ConnectionRefused;

    async fn get(&self, url: &str) -> Result<TransportResponse, Self::Error> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.offline {
            return Err(ConnectionRefused);
        }
        Ok(self
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| TransportResponse {
                status: 404,
                body: r#"{"detail": "Not found."}"#.to_string(),
            }))
    }
}

pub fn client(transport: FakeTransport) -> CatalogClient<FakeTransport> {
    CatalogClient::new(transport, BASE_URL)
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn book(id: u64, title: &str) -> Book {
    let mut b = Book::new(id, title);
    b.authors.push(Author {
        name: format!("Author of {title}"),
        birth_year: Some(1800),
        death_year: Some(1880),
    });
    b.languages.push("en".into());
    b
}

/// Gutendex形式の書籍JSON
pub fn book_json(id: u64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "authors": [{"name": format!("Author of {title}"), "birth_year": 1800, "death_year": 1880}],
        "translators": [],
        "subjects": ["Fiction -- Classics"],
        "bookshelves": ["Best Books Ever Listings"],
        "languages": ["en"],
        "copyright": false,
        "media_type": "Text",
        "formats": {
            "text/html": format!("https://www.gutenberg.org/ebooks/{id}.html.images"),
            "image/jpeg": format!("https://www.gutenberg.org/cache/epub/{id}/pg{id}.cover.medium.jpg")
        },
        "download_count": 1000 + id
    })
}

/// `{count:120, next:"...page=2", previous:null, results:[n items]}`
pub fn fiction_first_page(n: u64) -> serde_json::Value {
    json!({
        "count": 120,
        "next": format!("{BASE_URL}/books/?page=2&topic=Fiction"),
        "previous": null,
        "results": (1..=n).map(|i| book_json(i, &format!("Fiction {i}"))).collect::<Vec<_>>()
    })
}

// =============================================================================
// Assertion helpers
// =============================================================================

/// 結果がErrで、メッセージに指定文字列を含むことをassert。
pub fn assert_error_contains<T: std::fmt::Debug>(
    result: Result<T, impl std::fmt::Display>,
    expected: &str,
) {
    match result {
        Err(e) => {
            let msg = e.to_string();
            assert!(
                msg.contains(expected),
                "Expected error containing '{expected}', got: '{msg}'"
            );
        }
        Ok(v) => panic!("Expected error containing '{expected}', got Ok({v:?})"),
    }
}
