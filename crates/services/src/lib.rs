#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod generation;
pub mod leaderboard_notifier;
pub mod progress_service;
pub mod study_session;

pub use sabelo_core::Clock;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, GENERATION_FAILED_MESSAGE, GenerationError, NotifierError,
    StudySessionError,
};
pub use generation::{ContentGenerator, GeminiClient, GeminiConfig, UploadedFile};
pub use leaderboard_notifier::{
    DebouncedNotifier, LeaderboardNotifier, NoopNotifier, ProgressReport, SheetNotifier,
};
pub use progress_service::ProgressService;
pub use study_session::{QuizOutcome, StudySession, SuggestionReply};
