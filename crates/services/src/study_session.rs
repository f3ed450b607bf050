use std::sync::Arc;

use sabelo_core::Clock;
use sabelo_core::flow::{
    AnswerFeedback, CardStep, FlowError, QuizStep, SUGGESTION_FALLBACK, Screen, ScreenView,
    StudyFlow, SuggestionRequest,
};
use sabelo_core::leaderboard::Leaderboard;
use sabelo_core::model::{Progress, StudyDataError, Syllabus};
use sabelo_core::progression::XpEvents;
use tokio::task::JoinHandle;

use crate::error::{GenerationError, StudySessionError};
use crate::generation::{ContentGenerator, UploadedFile};
use crate::leaderboard_notifier::{DebouncedNotifier, ProgressReport};
use crate::progress_service::ProgressService;

/// Result of finishing a quiz, minus the suggestion which arrives later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub events: XpEvents,
    pub correct: usize,
    pub total: usize,
    pub xp_gained: u32,
    pub suggestion: SuggestionRequest,
}

/// A resolved suggestion, tagged with the results screen it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionReply {
    pub epoch: u64,
    pub text: String,
}

/// One player's study session: the screen flow, their progress, and the
/// outside services both depend on.
///
/// Every progress change is saved (once a username is set) and scheduled
/// for the leaderboard before the call returns.
pub struct StudySession {
    clock: Clock,
    flow: StudyFlow,
    progress: Progress,
    generator: Arc<dyn ContentGenerator>,
    progress_service: Arc<ProgressService>,
    notifier: Arc<DebouncedNotifier>,
}

impl StudySession {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Progress,
        generator: Arc<dyn ContentGenerator>,
        progress_service: Arc<ProgressService>,
        notifier: Arc<DebouncedNotifier>,
    ) -> Self {
        Self {
            clock,
            flow: StudyFlow::new(),
            progress,
            generator,
            progress_service,
            notifier,
        }
    }

    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    #[must_use]
    pub fn flow(&self) -> &StudyFlow {
        &self.flow
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.flow.screen()
    }

    #[must_use]
    pub fn view(&self) -> ScreenView<'_> {
        self.flow.view()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.flow.error()
    }

    pub fn dismiss_error(&mut self) {
        self.flow.dismiss_error();
    }

    #[must_use]
    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard::with_mock_roster(
            self.progress.username(),
            self.progress.level(),
            self.progress.xp(),
        )
    }

    /// Log in under `name`.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::Progress` for a blank name.
    pub async fn set_username(&mut self, name: &str) -> Result<(), StudySessionError> {
        self.progress.set_username(name)?;
        tracing::info!(player = %name.trim(), "player logged in");
        self.commit_progress().await;
        Ok(())
    }

    //
    // ─── GENERATION ────────────────────────────────────────────────────────────
    //

    /// Generate a syllabus for a typed subject.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::Input` for a blank subject,
    /// `StudySessionError::Flow` if a request is already running or the
    /// screen is wrong, and `StudySessionError::Generation` when the
    /// generator fails. In that case the flow stays on topic selection with
    /// the failure message set.
    pub async fn select_subject(&mut self, subject: &str) -> Result<(), StudySessionError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(StudyDataError::EmptySubject.into());
        }
        self.flow.begin_syllabus()?;
        tracing::info!(%subject, "generating syllabus");
        let result = match self.generator.generate_syllabus(subject).await {
            Ok(topics) => Syllabus::new(subject, topics).map_err(GenerationError::from),
            Err(err) => Err(err),
        };
        self.finish_syllabus(result)
    }

    /// Generate a syllabus from uploaded notes.
    ///
    /// # Errors
    ///
    /// Same as [`select_subject`](Self::select_subject).
    pub async fn analyze_files(&mut self, files: &[UploadedFile]) -> Result<(), StudySessionError> {
        self.flow.begin_syllabus()?;
        tracing::info!(files = files.len(), "generating syllabus from files");
        let result = self.generator.generate_syllabus_from_files(files).await;
        self.finish_syllabus(result)
    }

    fn finish_syllabus(
        &mut self,
        result: Result<Syllabus, GenerationError>,
    ) -> Result<(), StudySessionError> {
        match result {
            Ok(syllabus) => {
                self.flow.complete_syllabus(syllabus)?;
                Ok(())
            }
            Err(err) => Err(self.generation_failed(err)),
        }
    }

    /// Generate materials for the topic at `index` and start studying it.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` for a busy flow, wrong screen or
    /// unknown topic, and `StudySessionError::Generation` when the materials
    /// cannot be produced; the flow then stays on the syllabus.
    pub async fn select_topic(&mut self, index: usize) -> Result<(), StudySessionError> {
        let request = self.flow.begin_topic(index)?;
        tracing::info!(topic = %request.topic.title, "generating study materials");
        let materials = match self
            .generator
            .generate_study_materials(&request.subject, &request.topic.title)
            .await
        {
            Ok(materials) => materials,
            Err(err) => return Err(self.generation_failed(err)),
        };

        match self.flow.complete_materials(materials) {
            Ok(()) => Ok(()),
            Err(FlowError::InvalidContent(err)) => {
                Err(self.generation_failed(GenerationError::InvalidContent(err)))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn generation_failed(&mut self, err: GenerationError) -> StudySessionError {
        tracing::warn!(error = %err, screen = %self.flow.screen(), "content generation failed");
        self.flow.fail_generation(err.user_message());
        err.into()
    }

    //
    // ─── FLASHCARDS ────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` outside the flashcard screen.
    pub fn flip_card(&mut self) -> Result<bool, StudySessionError> {
        Ok(self.flow.flip_card()?)
    }

    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` outside the flashcard screen.
    pub fn next_card(&mut self) -> Result<CardStep, StudySessionError> {
        Ok(self.flow.next_card()?)
    }

    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` outside the flashcard screen.
    pub fn previous_card(&mut self) -> Result<bool, StudySessionError> {
        Ok(self.flow.previous_card()?)
    }

    /// Close the deck and move on to the quiz.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` before the last card or outside the
    /// flashcard screen.
    pub async fn finish_flashcards(&mut self) -> Result<XpEvents, StudySessionError> {
        let (progress, events) = self
            .flow
            .finish_flashcards(&self.progress, self.clock.now())?;
        self.progress = progress;
        log_events(&events);
        self.commit_progress().await;
        Ok(events)
    }

    //
    // ─── QUIZ ──────────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` for a locked question, an unknown
    /// option, or outside the quiz.
    pub fn answer_question(&mut self, option: &str) -> Result<AnswerFeedback, StudySessionError> {
        Ok(self.flow.answer_question(option)?)
    }

    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` while the current question is open.
    pub fn next_question(&mut self) -> Result<QuizStep, StudySessionError> {
        Ok(self.flow.next_question()?)
    }

    /// Score the quiz and open the results screen.
    ///
    /// The suggestion is not requested here; pass the returned request to
    /// [`spawn_suggestion`](Self::spawn_suggestion) or
    /// [`resolve_suggestion`](Self::resolve_suggestion).
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` while questions remain unanswered.
    pub async fn finish_quiz(&mut self) -> Result<QuizOutcome, StudySessionError> {
        let completion = self.flow.finish_quiz(&self.progress, self.clock.now())?;
        tracing::info!(
            correct = completion.correct,
            total = completion.total,
            xp = completion.xp_gained,
            "quiz finished"
        );
        self.progress = completion.progress;
        log_events(&completion.events);
        self.commit_progress().await;

        Ok(QuizOutcome {
            events: completion.events,
            correct: completion.correct,
            total: completion.total,
            xp_gained: completion.xp_gained,
            suggestion: completion.suggestion,
        })
    }

    /// Ask for the suggestion in the background. The task never fails: a
    /// generator error resolves to the fallback text.
    #[must_use]
    pub fn spawn_suggestion(&self, request: SuggestionRequest) -> JoinHandle<SuggestionReply> {
        let generator = Arc::clone(&self.generator);
        tokio::spawn(async move {
            let text = match generator
                .generate_study_suggestion(
                    &request.subject,
                    &request.topic_title,
                    &request.quiz,
                    &request.answers,
                )
                .await
            {
                Ok(text) => text.trim().to_string(),
                Err(err) => {
                    tracing::warn!(error = %err, "study suggestion failed");
                    SUGGESTION_FALLBACK.to_string()
                }
            };
            SuggestionReply {
                epoch: request.epoch,
                text,
            }
        })
    }

    /// Show a suggestion if its results screen is still open.
    pub fn apply_suggestion(&mut self, reply: SuggestionReply) -> bool {
        let applied = self.flow.apply_suggestion(reply.epoch, reply.text);
        if !applied {
            tracing::debug!(epoch = reply.epoch, "discarding stale suggestion");
        }
        applied
    }

    /// Request the suggestion and wait for it.
    pub async fn resolve_suggestion(&mut self, request: SuggestionRequest) -> bool {
        let epoch = request.epoch;
        let reply = self.spawn_suggestion(request).await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "suggestion task did not complete");
            SuggestionReply {
                epoch,
                text: SUGGESTION_FALLBACK.to_string(),
            }
        });
        self.apply_suggestion(reply)
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` outside the results screen.
    pub fn retry_quiz(&mut self) -> Result<(), StudySessionError> {
        Ok(self.flow.retry_quiz()?)
    }

    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` outside the results screen.
    pub fn back_to_syllabus(&mut self) -> Result<(), StudySessionError> {
        Ok(self.flow.back_to_syllabus()?)
    }

    /// # Errors
    ///
    /// Returns `StudySessionError::Flow` outside the syllabus screen.
    pub fn start_over(&mut self) -> Result<(), StudySessionError> {
        Ok(self.flow.start_over()?)
    }

    async fn commit_progress(&self) {
        self.progress_service.save(&self.progress).await;
        if let Some(report) = ProgressReport::from_progress(&self.progress) {
            self.notifier.schedule(report);
        }
    }
}

fn log_events(events: &XpEvents) {
    if let Some(level) = events.level_up {
        tracing::info!(level, "level up");
    }
    for badge in &events.newly_achieved {
        tracing::info!(badge = badge.id, "badge unlocked");
    }
}
