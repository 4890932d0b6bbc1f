use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::Dataset;
use crate::error::DatasetError;

/// Holds the loaded dataset as an immutable snapshot.
///
/// The file is read once on `open`; later reads only happen through `reload`.
pub struct DatasetStore {
    path: PathBuf,
    snapshot: Arc<Dataset>,
    /// Last load or reload attempt, successful or not
    last_attempt: Instant,
}

impl DatasetStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let path = path.into();
        let dataset = Dataset::load(&path)?;
        Ok(Self {
            path,
            snapshot: Arc::new(dataset),
            last_attempt: Instant::now(),
        })
    }

    /// Wrap an already built dataset; `reload` will read from `path`.
    pub fn from_dataset(path: impl Into<PathBuf>, dataset: Dataset) -> Self {
        Self {
            path: path.into(),
            snapshot: Arc::new(dataset),
            last_attempt: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.snapshot)
    }

    /// Re-read the file. The previous snapshot survives a failed reload,
    /// and either outcome restarts the reload interval.
    pub fn reload(&mut self) -> Result<Arc<Dataset>, DatasetError> {
        self.last_attempt = Instant::now();
        match Dataset::load(&self.path) {
            Ok(dataset) => {
                info!(incidents = dataset.len(), "dataset reloaded");
                self.snapshot = Arc::new(dataset);
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "reload failed, keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Whether a periodic reload with the given interval is due
    pub fn reload_due(&self, interval: Duration) -> bool {
        self.last_attempt.elapsed() >= interval
    }
}
