/// A storage target a flush event can be written to (local disk, HDFS, object store...).
///
/// The event only keeps a non-owning reference to the storage it was assigned;
/// the storage manager owns the instances.
pub trait Storage: Send + Sync {
    /// Short storage type identifier (e.g., "LocalStorage", "HadoopStorage").
    /// Used in diagnostics.
    fn storage_type(&self) -> &str;

    /// Base path of the storage.
    fn storage_path(&self) -> String;
}
