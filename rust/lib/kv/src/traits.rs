use crate::error::KVError;

/// KVStore provides the key-value storage interface under the asset graph.
///
/// Keys follow a namespaced convention: `assetlibrary:group:/a/b`,
/// `assetlibrary:policy:p1`, etc.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Set a key only if it does not exist yet, in one transaction.
    /// Returns false, leaving the stored value untouched, when it does.
    fn insert_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, KVError>;

    /// Set several key-value pairs in one transaction.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns (key, value) pairs sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}
