/// 名前付きスロットを持つKey-Valueストレージの抽象。Infra層が実装する。
/// スロットが無いことは `Ok(None)` で表す。
pub trait SlotStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;
    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error>;
    fn delete(&self, key: &str) -> Result<(), Self::Error>;
}
