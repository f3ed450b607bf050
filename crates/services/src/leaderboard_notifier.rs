//! Best-effort reporting of progress to the shared leaderboard sheet.

use std::env;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::Form;
use sabelo_core::model::Progress;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::{AppServicesError, NotifierError};

/// Quiet period before a progress change is reported.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2500);

/// Totals sent to the leaderboard endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub name: String,
    pub xp: u32,
    pub topics: u32,
    pub badges: usize,
}

impl ProgressReport {
    /// `None` until the player has a username.
    #[must_use]
    pub fn from_progress(progress: &Progress) -> Option<Self> {
        Some(Self {
            name: progress.username()?.to_string(),
            xp: progress.xp(),
            topics: progress.topics_completed(),
            badges: progress.achieved_badge_count(),
        })
    }

    /// Form fields in the order the sheet script reads them.
    #[must_use]
    pub fn form_fields(&self) -> [(&'static str, String); 4] {
        [
            ("nombre", self.name.clone()),
            ("puntos", self.xp.to_string()),
            ("temas", self.topics.to_string()),
            ("insignias", self.badges.to_string()),
        ]
    }
}

#[async_trait]
pub trait LeaderboardNotifier: Send + Sync {
    /// Send one report. No response body is consumed.
    ///
    /// # Errors
    ///
    /// Returns `NotifierError` when the request fails.
    async fn notify(&self, report: &ProgressReport) -> Result<(), NotifierError>;
}

/// Notifier used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl LeaderboardNotifier for NoopNotifier {
    async fn notify(&self, _report: &ProgressReport) -> Result<(), NotifierError> {
        Ok(())
    }
}

/// Posts reports as multipart form data to a spreadsheet script.
#[derive(Clone)]
pub struct SheetNotifier {
    client: Client,
    endpoint: Url,
}

impl SheetNotifier {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Read `SABELO_LEADERBOARD_URL`; unset or blank means no notifier.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::InvalidUrl` if the URL does not parse.
    pub fn from_env() -> Result<Option<Self>, AppServicesError> {
        let Some(raw) = env::var("SABELO_LEADERBOARD_URL")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
        else {
            return Ok(None);
        };
        let endpoint = Url::parse(raw.trim()).map_err(|source| AppServicesError::InvalidUrl {
            name: "SABELO_LEADERBOARD_URL",
            raw: raw.clone(),
            source,
        })?;
        Ok(Some(Self::new(endpoint)))
    }
}

#[async_trait]
impl LeaderboardNotifier for SheetNotifier {
    async fn notify(&self, report: &ProgressReport) -> Result<(), NotifierError> {
        let form = report
            .form_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifierError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

/// Collapses bursts of reports into one call after a quiet period.
///
/// Each [`schedule`](Self::schedule) cancels the report still waiting and
/// starts a new timer. Failures are logged and dropped; nothing is retried.
pub struct DebouncedNotifier {
    inner: Arc<dyn LeaderboardNotifier>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedNotifier {
    #[must_use]
    pub fn new(inner: Arc<dyn LeaderboardNotifier>) -> Self {
        Self::with_delay(inner, DEFAULT_DEBOUNCE)
    }

    #[must_use]
    pub fn with_delay(inner: Arc<dyn LeaderboardNotifier>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Replace any waiting report with `report`. Must be called from within a
    /// tokio runtime.
    pub fn schedule(&self, report: ProgressReport) {
        let inner = Arc::clone(&self.inner);
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = inner.notify(&report).await {
                tracing::warn!(error = %err, player = %report.name, "failed to report progress to leaderboard");
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    /// Drop the waiting report, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    /// Wait for the waiting report to go out, e.g. before the process exits.
    pub async fn flush(&self) {
        let task = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            // A cancelled task has nothing left to send.
            let _ = task.await;
        }
    }
}

impl Drop for DebouncedNotifier {
    fn drop(&mut self) {
        self.cancel();
    }
}
