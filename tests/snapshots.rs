//! Snapshot tests — normalized catalog page and persisted bookmark format regression detection.

use chrono::{TimeZone, Utc};
use insta::assert_json_snapshot;
use serde_json::json;

use athenaeum::domain::model::book::Book;
use athenaeum::domain::model::bookmark::BookmarkCollection;
use athenaeum::domain::model::query::{BooksResponse, CatalogPage};

// =============================================================================
// Catalog page
// =============================================================================

#[test]
fn snapshot_catalog_page() {
    let response: BooksResponse = serde_json::from_value(json!({
        "count": 33,
        "next": null,
        "previous": "https://gutendex.com/books/?page=1&topic=Poetry",
        "results": [{
            "id": 1065,
            "title": "The Raven",
            "authors": [{"name": "Poe, Edgar Allan", "birth_year": 1809, "death_year": 1849}],
            "languages": ["en"],
            "copyright": false,
            "media_type": "Text",
            "formats": {"text/html": "https://www.gutenberg.org/ebooks/1065.html.images"},
            "download_count": 4321
        }]
    }))
    .unwrap();

    let page = CatalogPage::from_response(response, 2);
    assert_json_snapshot!("catalog_page", page);
}

// =============================================================================
// Persisted bookmarks
// =============================================================================

#[test]
fn snapshot_bookmark_collection() {
    let mut collection = BookmarkCollection::new();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
    collection.insert(Book::new(84, "Frankenstein"), at).unwrap();

    assert_json_snapshot!("bookmark_collection", collection);
}
