use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::book::Book;
use super::id::BookId;
use crate::domain::error::DomainError;

/// 保存済みの書籍。Book本体に保存時刻を付け足した形でシリアライズされる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(flatten)]
    book: Book,
    #[serde(rename = "bookmarkedAt")]
    bookmarked_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(book: Book, bookmarked_at: DateTime<Utc>) -> Self {
        Self {
            book,
            bookmarked_at,
        }
    }

    pub fn id(&self) -> BookId {
        self.book.id
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn bookmarked_at(&self) -> DateTime<Utc> {
        self.bookmarked_at
    }

    pub fn into_book(self) -> Book {
        self.book
    }
}

/// 永続化の単位となるブックマーク列。挿入順を保持し、IDの重複を許さない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkCollection {
    items: Vec<Bookmark>,
}

impl BookmarkCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: BookId) -> bool {
        self.items.iter().any(|b| b.id() == id)
    }

    pub fn get(&self, id: BookId) -> Option<&Bookmark> {
        self.items.iter().find(|b| b.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> + '_ {
        self.items.iter()
    }

    /// 末尾に追加する。既に同じIDがあれば拒否する。
    pub fn insert(&mut self, book: Book, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.contains(book.id) {
            return Err(DomainError::AlreadyBookmarked(book.id));
        }
        self.items.push(Bookmark::new(book, at));
        Ok(())
    }

    /// 該当IDを取り除く。存在しなければ何もしない。取り除いた件数を返す。
    pub fn remove(&mut self, id: BookId) -> usize {
        let before = self.items.len();
        self.items.retain(|b| b.id() != id);
        before - self.items.len()
    }

    /// 保存時刻の新しい順
    pub fn newest_first(&self) -> Vec<Bookmark> {
        let mut sorted = self.items.clone();
        sorted.sort_by(|a, b| b.bookmarked_at.cmp(&a.bookmarked_at));
        sorted
    }

    pub fn into_vec(self) -> Vec<Bookmark> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut c = BookmarkCollection::new();
        c.insert(Book::new(1, "One"), at(10)).unwrap();
        let err = c.insert(Book::new(1, "One again"), at(20)).unwrap_err();
        assert!(matches!(err, DomainError::AlreadyBookmarked(id) if id.get() == 1));
        assert_eq!(c.len(), 1);
        assert_eq!(c.get(BookId::new(1)).unwrap().book().title, "One");
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut c = BookmarkCollection::new();
        c.insert(Book::new(1, "One"), at(10)).unwrap();
        assert_eq!(c.remove(BookId::new(99)), 0);
        assert_eq!(c.remove(BookId::new(1)), 1);
        assert!(c.is_empty());
    }

    #[test]
    fn newest_first_orders_by_timestamp_descending() {
        let mut c = BookmarkCollection::new();
        c.insert(Book::new(1, "Old"), at(10)).unwrap();
        c.insert(Book::new(2, "New"), at(30)).unwrap();
        c.insert(Book::new(3, "Mid"), at(20)).unwrap();

        let ids: Vec<u64> = c.newest_first().iter().map(|b| b.id().get()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        // 保存順は変わらない
        let stored: Vec<u64> = c.iter().map(|b| b.id().get()).collect();
        assert_eq!(stored, vec![1, 2, 3]);
    }

    #[test]
    fn serializes_as_flat_array_with_timestamp() {
        let mut c = BookmarkCollection::new();
        c.insert(Book::new(5, "Five"), at(0)).unwrap();
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value[0]["id"], 5);
        assert_eq!(value[0]["title"], "Five");
        assert_eq!(value[0]["bookmarkedAt"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn reads_browser_written_collection() {
        let json = r#"[{
            "id": 84, "title": "Frankenstein",
            "authors": [{"name": "Shelley, Mary Wollstonecraft", "birth_year": 1797, "death_year": 1851}],
            "subjects": [], "bookshelves": [], "languages": ["en"],
            "copyright": false, "media_type": "Text", "formats": {}, "download_count": 1000,
            "bookmarkedAt": "2024-05-01T12:30:00.000Z"
        }]"#;
        let c: BookmarkCollection = serde_json::from_str(json).unwrap();
        let b = c.get(BookId::new(84)).unwrap();
        assert_eq!(b.book().extra["media_type"], "Text");
        assert!(!b.book().extra.contains_key("bookmarkedAt"));
        assert_eq!(b.bookmarked_at().to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }
}
