use crate::domain::error::DomainError;
use crate::domain::model::id::BookId;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// リモートカタログ呼び出しの失敗。常に呼び出し元へ返す。
#[derive(Debug, thiserror::Error)]
pub enum RemoteFetchError {
    #[error(transparent)]
    InvalidQuery(#[from] DomainError),

    #[error("invalid catalog URL: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("book not found: {0}")]
    NotFound(BookId),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// ブックマーク永続化の失敗。ストア内で吸収され、既定値に落とされる。
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage read failed: {0}")]
    Read(#[source] BoxError),

    #[error("storage write failed: {0}")]
    Write(#[source] BoxError),

    #[error("storage delete failed: {0}")]
    Delete(#[source] BoxError),

    #[error("bookmark collection is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("bookmark serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),
}
