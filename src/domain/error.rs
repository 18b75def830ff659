use super::model::id::BookId;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("page must be a positive integer, got {0}")]
    InvalidPage(u32),

    #[error("book {0} is already bookmarked")]
    AlreadyBookmarked(BookId),
}
