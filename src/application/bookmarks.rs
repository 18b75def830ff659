use chrono::Utc;

use crate::domain::model::book::Book;
use crate::domain::model::bookmark::{Bookmark, BookmarkCollection};
use crate::domain::model::id::BookId;
use crate::domain::repository::SlotStorage;

use super::error::PersistenceError;

/// ブックマーク一覧を保存するスロット名
pub const BOOKMARKS_KEY: &str = "digital_athenaeum_bookmarks";

/// ブックマークに対するユースケース。
/// 全操作が load → mutate → save の丸ごと書き戻しで動く。
///
/// `try_*` は永続化の失敗をそのまま返す。接頭辞なしの操作は失敗をログに残して
/// 安全な既定値（空・`false`）に落とし、ストレージが使えなくても閲覧を止めない。
pub struct BookmarkService<S: SlotStorage> {
    storage: S,
}

impl<S: SlotStorage> BookmarkService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // --- explicit results ---

    /// 保存済みコレクションを読む。スロットが無ければ空。
    pub fn try_list(&self) -> Result<BookmarkCollection, PersistenceError> {
        let raw = self
            .storage
            .read(BOOKMARKS_KEY)
            .map_err(|e| PersistenceError::Read(Box::new(e)))?;
        match raw {
            None => Ok(BookmarkCollection::new()),
            Some(json) => serde_json::from_str(&json).map_err(PersistenceError::Corrupt),
        }
    }

    /// 追加できたら `Ok(true)`、既に保存済みなら書き込まずに `Ok(false)`。
    /// 読み込みに失敗した場合は書き込まない。
    pub fn try_add(&self, book: &Book) -> Result<bool, PersistenceError> {
        let mut collection = self.load_for_update()?;
        if collection.insert(book.clone(), Utc::now()).is_err() {
            return Ok(false);
        }
        self.persist(&collection)?;
        tracing::debug!(book_id = %book.id, "bookmark added");
        Ok(true)
    }

    pub fn try_remove(&self, id: BookId) -> Result<(), PersistenceError> {
        let mut collection = self.load_for_update()?;
        let removed = collection.remove(id);
        self.persist(&collection)?;
        tracing::debug!(book_id = %id, removed, "bookmark removed");
        Ok(())
    }

    pub fn try_clear_all(&self) -> Result<(), PersistenceError> {
        self.storage
            .delete(BOOKMARKS_KEY)
            .map_err(|e| PersistenceError::Delete(Box::new(e)))
    }

    // --- degrade-to-default operations ---

    pub fn list(&self) -> Vec<Bookmark> {
        self.load_or_empty().into_vec()
    }

    pub fn contains(&self, id: BookId) -> bool {
        self.load_or_empty().contains(id)
    }

    pub fn get(&self, id: BookId) -> Option<Bookmark> {
        self.load_or_empty().get(id).cloned()
    }

    /// 新規に追加された場合のみ `true`。
    pub fn add(&self, book: &Book) -> bool {
        self.try_add(book).unwrap_or_else(|e| {
            tracing::warn!(book_id = %book.id, error = %e, "failed to add bookmark");
            false
        })
    }

    /// 永続化に成功すれば `true`（対象が無くても `true`）。
    pub fn remove(&self, id: BookId) -> bool {
        match self.try_remove(id) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(book_id = %id, error = %e, "failed to remove bookmark");
                false
            }
        }
    }

    /// 操作後の保存状態を返す（保存済みなら `true`）。
    pub fn toggle(&self, book: &Book) -> bool {
        if self.contains(book.id) {
            !self.remove(book.id)
        } else {
            self.add(book)
        }
    }

    pub fn count(&self) -> usize {
        self.load_or_empty().len()
    }

    pub fn clear_all(&self) -> bool {
        match self.try_clear_all() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to clear bookmarks");
                false
            }
        }
    }

    /// 保存時刻の新しい順
    pub fn recent(&self) -> Vec<Bookmark> {
        self.load_or_empty().newest_first()
    }

    /// タイトル・著者名の部分一致（大文字小文字無視）。空なら全件。
    pub fn filter(&self, term: &str) -> Vec<Bookmark> {
        let term = term.trim().to_lowercase();
        let recent = self.recent();
        if term.is_empty() {
            return recent;
        }
        recent
            .into_iter()
            .filter(|b| b.book().matches_lowercase(&term))
            .collect()
    }

    // --- private ---

    fn load_or_empty(&self) -> BookmarkCollection {
        self.try_list().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "bookmark store unreadable, treating as empty");
            BookmarkCollection::new()
        })
    }

    /// 更新用の読み込み。壊れたスロットは空から作り直す。読み込み失敗はエラー。
    fn load_for_update(&self) -> Result<BookmarkCollection, PersistenceError> {
        match self.try_list() {
            Err(PersistenceError::Corrupt(e)) => {
                tracing::warn!(error = %e, "bookmark store corrupt, starting from empty");
                Ok(BookmarkCollection::new())
            }
            other => other,
        }
    }

    fn persist(&self, collection: &BookmarkCollection) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(collection).map_err(PersistenceError::Serialize)?;
        self.storage
            .write(BOOKMARKS_KEY, &json)
            .map_err(|e| PersistenceError::Write(Box::new(e)))
    }
}
