//! Plan Cache, Plan Version Store, and Execution History: a
//! single-trait-many-backends pattern, so callers depend on `CacheStore`/
//! `VersionStore`/`HistoryStore` and never the concrete backend.

mod cache;
mod error;
mod factory;
mod hash;
mod history;
mod history_filetree;
mod history_objectstore;
mod history_sqlite;
mod version;

pub use cache::{CacheStats, CacheStore, FileCacheStore};
pub use error::StorageError;
pub use factory::{build_history_store, resolve_backend_kind, HistoryBackendKind};
pub use hash::fingerprint;
pub use history::{ExecutionRecord, ExecutionStatus, HistoryListFilter, HistoryStats, HistoryStore};
pub use history_filetree::FileTreeHistoryStore;
pub use history_objectstore::ObjectStoreHistoryStore;
pub use history_sqlite::SqliteHistoryStore;
pub use version::{FieldChange, FileVersionStore, PlanDiff, PlanVersion, StepChange, StepModification, VersionStore};
