//! Persistence for runs. The app only needs two operations from a store:
//! append a run, and read every run back newest first.

mod file;
mod supabase;

pub use file::FileStore;
pub use supabase::SupabaseStore;

use crate::models::Run;
use std::future::Future;
use thiserror::Error;

/// Table runs are read from and written to.
pub const RUNS_TABLE: &str = "runs";

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store already holds a run that conflicts with this one.
    #[error("duplicate run: {0}")]
    Duplicate(String),
    #[error("{0}")]
    Rejected(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
}

pub trait RunStore: Send + Sync {
    /// All runs, ordered by date descending.
    fn query(&self) -> impl Future<Output = Result<Vec<Run>, StoreError>> + Send;

    /// Persists `run` and returns the stored record.
    fn insert(&self, run: Run) -> impl Future<Output = Result<Run, StoreError>> + Send;
}

/// Store selected at startup from configuration.
pub enum AnyStore {
    Supabase(SupabaseStore),
    File(FileStore),
}

impl AnyStore {
    pub fn describe(&self) -> String {
        match self {
            AnyStore::Supabase(store) => format!("supabase at {}", store.base_url()),
            AnyStore::File(store) => format!("file at {}", store.path().display()),
        }
    }
}

impl RunStore for AnyStore {
    async fn query(&self) -> Result<Vec<Run>, StoreError> {
        match self {
            AnyStore::Supabase(store) => store.query().await,
            AnyStore::File(store) => store.query().await,
        }
    }

    async fn insert(&self, run: Run) -> Result<Run, StoreError> {
        match self {
            AnyStore::Supabase(store) => store.insert(run).await,
            AnyStore::File(store) => store.insert(run).await,
        }
    }
}

/// Sorts newest first, keeping the stored order of runs on the same day.
pub(crate) fn sort_newest_first(runs: &mut [Run]) {
    runs.sort_by(|a, b| b.date.cmp(&a.date));
}
