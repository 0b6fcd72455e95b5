use super::{RunStore, StoreError, sort_newest_first};
use crate::models::Run;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct RunFile {
    runs: Vec<Run>,
}

/// Runs kept in a pretty-printed JSON file.
///
/// With `unique_dates` set, a second run on the same date is refused with
/// [`StoreError::Duplicate`], the same signal a unique index on the remote
/// table produces.
pub struct FileStore {
    path: PathBuf,
    unique_dates: bool,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, unique_dates: bool) -> Self {
        Self {
            path: path.into(),
            unique_dates,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<RunFile, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no run file at {}, starting empty", self.path.display());
                Ok(RunFile::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, data: &RunFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let payload = serde_json::to_vec_pretty(data)?;
        fs::write(&self.path, payload).await?;
        Ok(())
    }
}

impl RunStore for FileStore {
    async fn query(&self) -> Result<Vec<Run>, StoreError> {
        let mut runs = self.read().await?.runs;
        sort_newest_first(&mut runs);
        Ok(runs)
    }

    async fn insert(&self, run: Run) -> Result<Run, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read().await?;

        if self.unique_dates && data.runs.iter().any(|existing| existing.date == run.date) {
            return Err(StoreError::Duplicate(format!(
                "a run for {} is already stored",
                run.date
            )));
        }

        data.runs.push(run.clone());
        self.write(&data).await?;
        info!("stored run for {} in {}", run.date, self.path.display());
        Ok(run)
    }
}
