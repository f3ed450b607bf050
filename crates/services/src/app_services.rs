use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::generation::{ContentGenerator, GeminiClient};
use crate::leaderboard_notifier::{DebouncedNotifier, LeaderboardNotifier, NoopNotifier, SheetNotifier};
use crate::progress_service::ProgressService;
use crate::study_session::StudySession;

/// Assembles app-facing services from storage and the environment.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    progress: Arc<ProgressService>,
    generator: Arc<dyn ContentGenerator>,
    notifier: Arc<DebouncedNotifier>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with the generator and the
    /// leaderboard endpoint configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or a
    /// configured URL is malformed.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;

        let gemini = GeminiClient::from_env()?;
        if !gemini.enabled() {
            tracing::warn!("SABELO_AI_API_KEY is not set; content generation is disabled");
        }
        let sheet: Arc<dyn LeaderboardNotifier> = match SheetNotifier::from_env()? {
            Some(sheet) => Arc::new(sheet),
            None => {
                tracing::info!("SABELO_LEADERBOARD_URL is not set; leaderboard reporting is off");
                Arc::new(NoopNotifier)
            }
        };

        Ok(Self::new(clock, storage, Arc::new(gemini), sheet))
    }

    #[must_use]
    pub fn new(
        clock: Clock,
        storage: Storage,
        generator: Arc<dyn ContentGenerator>,
        notifier: Arc<dyn LeaderboardNotifier>,
    ) -> Self {
        Self {
            clock,
            progress: Arc::new(ProgressService::new(storage.progress)),
            generator,
            notifier: Arc::new(DebouncedNotifier::new(notifier)),
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn notifier(&self) -> Arc<DebouncedNotifier> {
        Arc::clone(&self.notifier)
    }

    /// Load stored progress and open a session on it.
    pub async fn start_session(&self) -> StudySession {
        let progress = self.progress.load().await;
        StudySession::new(
            self.clock,
            progress,
            Arc::clone(&self.generator),
            Arc::clone(&self.progress),
            Arc::clone(&self.notifier),
        )
    }
}
