use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::BookId;

/// 著者が存在しない書籍の表示名
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// 階層化されたsubjectの区切り（"Fiction -- Romance"）
pub const SUBJECT_SEPARATOR: &str = " -- ";

/// ダウンロードリンクとして提示するMIME typeとラベル（表示順）
const DOWNLOAD_FORMATS: [(&str, &str); 5] = [
    ("text/html", "Read Online (HTML)"),
    ("application/epub+zip", "EPUB"),
    ("application/x-mobipocket-ebook", "Kindle (MOBI)"),
    ("text/plain", "Plain Text"),
    ("application/pdf", "PDF"),
];

const COVER_FORMAT: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
}

/// リモートカタログが返す書籍。
///
/// 未知のフィールド（`translators`, `media_type` 等）は `extra` に保持し、
/// ブックマークとして保存しても元のオブジェクトを損なわない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub bookshelves: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub copyright: Option<bool>,
    /// MIME type → ダウンロードURL
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// 表示用ダウンロードリンク
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    pub mime_type: String,
    pub label: &'static str,
    pub url: String,
}

impl Book {
    pub fn new(id: impl Into<BookId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            subjects: Vec::new(),
            bookshelves: Vec::new(),
            languages: Vec::new(),
            download_count: 0,
            copyright: None,
            formats: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// "A, B" 形式の著者名。著者がいなければ `UNKNOWN_AUTHOR`。
    pub fn author_names(&self) -> String {
        if self.authors.is_empty() {
            return UNKNOWN_AUTHOR.to_string();
        }
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 先頭 `limit` 件のsubjectを主トピックに丸めて返す。
    pub fn main_subjects(&self, limit: usize) -> Vec<&str> {
        self.subjects
            .iter()
            .take(limit)
            .map(|s| main_topic(s))
            .collect()
    }

    /// 既知フォーマットのみを表示順に並べる。
    /// `text/plain; charset=us-ascii` のようなパラメータ付きキーは素のMIME typeで照合する。
    pub fn download_links(&self) -> Vec<DownloadLink> {
        let mut links = Vec::new();
        for (mime, label) in DOWNLOAD_FORMATS {
            let found = self
                .formats
                .iter()
                .find(|(key, _)| bare_mime(key) == mime);
            if let Some((_, url)) = found {
                links.push(DownloadLink {
                    mime_type: mime.to_string(),
                    label,
                    url: url.clone(),
                });
            }
        }
        links
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.formats.get(COVER_FORMAT).map(String::as_str)
    }

    /// タイトルまたは著者名に `term`（小文字化済み）を含むか
    pub(crate) fn matches_lowercase(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(term)
            || self
                .authors
                .iter()
                .any(|a| a.name.to_lowercase().contains(term))
    }
}

/// "History -- Europe -- 19th century" → "History"
pub fn main_topic(subject: &str) -> &str {
    subject
        .split(SUBJECT_SEPARATOR)
        .next()
        .unwrap_or(subject)
        .trim()
}

fn bare_mime(key: &str) -> &str {
    key.split(';').next().unwrap_or(key).trim()
}
