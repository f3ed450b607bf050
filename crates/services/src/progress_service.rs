use std::sync::Arc;

use sabelo_core::model::Progress;
use storage::repository::ProgressRepository;

/// Loads and saves the player's progress without ever failing the caller.
///
/// Storage problems are logged and otherwise ignored; the session keeps
/// working on the in-memory value.
#[derive(Clone)]
pub struct ProgressService {
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self { repo }
    }

    /// Stored progress, or a fresh profile when nothing usable is stored.
    pub async fn load(&self) -> Progress {
        match self.repo.load_progress().await {
            Ok(Some(progress)) => progress,
            Ok(None) => Progress::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load progress; starting fresh");
                Progress::new()
            }
        }
    }

    /// Persist `progress` once the player has a username. Returns whether
    /// anything was written.
    pub async fn save(&self, progress: &Progress) -> bool {
        if progress.username().is_none() {
            return false;
        }
        match self.repo.save_progress(progress).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "failed to save progress");
                false
            }
        }
    }
}
