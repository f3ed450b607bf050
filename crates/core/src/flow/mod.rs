//! Screen-by-screen study flow.
//!
//! `StudyFlow` owns everything the screens show and enforces which actions
//! are legal where. It never talks to the generator itself: a `begin_*`
//! call marks a request as in flight and the matching `complete_*` (or
//! [`StudyFlow::fail_generation`]) resolves it. XP awards go through the
//! progression engine and the updated [`Progress`] is handed back to the
//! caller.

mod quiz;
mod view;

use std::{fmt, mem};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Progress, QuizQuestion, StudyDataError, StudyMaterials, Syllabus, SyllabusTopic};
use crate::progression::{self, XP_PER_FLASHCARD_SESSION, XpEvents};

use quiz::QuizRun;
pub use quiz::{AnswerFeedback, QuizStep, score_message};
pub use view::{QuestionReview, ResultsView, ScreenView};

/// Shown in place of a suggestion when the request fails.
pub const SUGGESTION_FALLBACK: &str = "No se pudo generar un consejo. ¡Pero seguí estudiando!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    TopicSelection,
    SyllabusView,
    Studying,
    Quiz,
    Results,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::TopicSelection => "topic selection",
            Screen::SyllabusView => "syllabus",
            Screen::Studying => "flashcards",
            Screen::Quiz => "quiz",
            Screen::Results => "results",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlowError {
    #[error("a generation request is already in flight")]
    Busy,

    #[error("no {0} request is pending")]
    NothingPending(PendingRequest),

    #[error("cannot {action} from the {screen} screen")]
    InvalidTransition { screen: Screen, action: &'static str },

    #[error("syllabus has no topic at index {index}")]
    UnknownTopic { index: usize },

    #[error("{remaining} flashcards left to review")]
    FlashcardsRemaining { remaining: usize },

    #[error("current question is already answered")]
    AlreadyAnswered,

    #[error("current question has not been answered")]
    Unanswered,

    #[error("'{0}' is not one of the options")]
    UnknownOption(String),

    #[error("no question left to answer")]
    QuizOver,

    #[error("{remaining} questions left to answer")]
    QuestionsRemaining { remaining: usize },

    #[error("generated content is invalid: {0}")]
    InvalidContent(#[from] StudyDataError),
}

/// Kind of generation request the flow is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRequest {
    Syllabus,
    StudyMaterials,
}

impl fmt::Display for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingRequest::Syllabus => f.write_str("syllabus"),
            PendingRequest::StudyMaterials => f.write_str("study materials"),
        }
    }
}

/// What the caller must ask the generator for after [`StudyFlow::begin_topic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialsRequest {
    pub subject: String,
    pub topic: SyllabusTopic,
}

/// Outcome of moving to the next flashcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStep {
    Advanced,
    /// Already on the last card; the quiz can start.
    LastCard,
}

/// Input for the personalized suggestion shown on the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    /// Pass back to [`StudyFlow::apply_suggestion`]; results for an older
    /// epoch are dropped.
    pub epoch: u64,
    pub subject: String,
    pub topic_title: String,
    pub quiz: Vec<QuizQuestion>,
    pub answers: Vec<String>,
}

impl SuggestionRequest {
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.quiz.len() == self.answers.len()
            && self
                .quiz
                .iter()
                .zip(&self.answers)
                .all(|(question, answer)| question.is_correct(answer))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizCompletion {
    pub progress: Progress,
    pub events: XpEvents,
    pub correct: usize,
    pub total: usize,
    pub xp_gained: u32,
    pub suggestion: SuggestionRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Syllabus,
    Materials(SyllabusTopic),
}

impl Pending {
    fn request(&self) -> PendingRequest {
        match self {
            Pending::Syllabus => PendingRequest::Syllabus,
            Pending::Materials(_) => PendingRequest::StudyMaterials,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveTopic {
    topic: SyllabusTopic,
    materials: StudyMaterials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Suggestion {
    Pending,
    Ready(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    TopicSelection,
    SyllabusView,
    Studying {
        active: ActiveTopic,
        card: usize,
        flipped: bool,
    },
    Quiz {
        active: ActiveTopic,
        run: QuizRun,
    },
    Results {
        active: ActiveTopic,
        answers: Vec<String>,
        suggestion: Suggestion,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyFlow {
    syllabus: Option<Syllabus>,
    stage: Stage,
    pending: Option<Pending>,
    error: Option<String>,
    suggestion_epoch: u64,
}

impl Default for StudyFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl StudyFlow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            syllabus: None,
            stage: Stage::TopicSelection,
            pending: None,
            error: None,
            suggestion_epoch: 0,
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        match self.stage {
            Stage::TopicSelection => Screen::TopicSelection,
            Stage::SyllabusView => Screen::SyllabusView,
            Stage::Studying { .. } => Screen::Studying,
            Stage::Quiz { .. } => Screen::Quiz,
            Stage::Results { .. } => Screen::Results,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn pending_request(&self) -> Option<PendingRequest> {
        self.pending.as_ref().map(Pending::request)
    }

    /// Last user-facing error, kept until dismissed or replaced.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.syllabus.as_ref().map(Syllabus::subject)
    }

    #[must_use]
    pub fn syllabus(&self) -> Option<&Syllabus> {
        self.syllabus.as_ref()
    }

    /// Topic being studied, quizzed or reviewed.
    #[must_use]
    pub fn current_topic(&self) -> Option<&SyllabusTopic> {
        self.active().map(|active| &active.topic)
    }

    fn active(&self) -> Option<&ActiveTopic> {
        match &self.stage {
            Stage::Studying { active, .. }
            | Stage::Quiz { active, .. }
            | Stage::Results { active, .. } => Some(active),
            Stage::TopicSelection | Stage::SyllabusView => None,
        }
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidTransition {
            screen: self.screen(),
            action,
        }
    }

    fn ensure_idle(&self) -> Result<(), FlowError> {
        if self.pending.is_some() {
            return Err(FlowError::Busy);
        }
        Ok(())
    }

    //
    // ─── SYLLABUS ──────────────────────────────────────────────────────────────
    //

    /// Mark a syllabus request (typed subject or uploaded files) as in flight.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Busy` while another request is pending and
    /// `FlowError::InvalidTransition` outside topic selection.
    pub fn begin_syllabus(&mut self) -> Result<(), FlowError> {
        self.ensure_idle()?;
        if self.stage != Stage::TopicSelection {
            return Err(self.invalid("generate a syllabus"));
        }
        self.error = None;
        self.pending = Some(Pending::Syllabus);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `FlowError::NothingPending` if no syllabus request is in flight.
    pub fn complete_syllabus(&mut self, syllabus: Syllabus) -> Result<(), FlowError> {
        if self.pending != Some(Pending::Syllabus) {
            return Err(FlowError::NothingPending(PendingRequest::Syllabus));
        }
        self.pending = None;
        self.syllabus = Some(syllabus);
        self.stage = Stage::SyllabusView;
        Ok(())
    }

    /// Resolve the in-flight request as failed.
    ///
    /// The screen does not change, which leaves the user on the last stable
    /// screen with `message` to show.
    pub fn fail_generation(&mut self, message: impl Into<String>) {
        self.pending = None;
        self.error = Some(message.into());
    }

    /// Go back to choosing a subject, dropping the syllabus.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Busy` while a request is pending and
    /// `FlowError::InvalidTransition` outside the syllabus screen.
    pub fn start_over(&mut self) -> Result<(), FlowError> {
        self.ensure_idle()?;
        if self.stage != Stage::SyllabusView {
            return Err(self.invalid("start over"));
        }
        self.syllabus = None;
        self.error = None;
        self.stage = Stage::TopicSelection;
        Ok(())
    }

    //
    // ─── STUDY MATERIALS ───────────────────────────────────────────────────────
    //

    /// Pick a topic from the syllabus and mark its materials as in flight.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Busy`, `FlowError::InvalidTransition` outside the
    /// syllabus screen, or `FlowError::UnknownTopic`.
    pub fn begin_topic(&mut self, index: usize) -> Result<MaterialsRequest, FlowError> {
        self.ensure_idle()?;
        let syllabus = match (&self.stage, &self.syllabus) {
            (Stage::SyllabusView, Some(syllabus)) => syllabus,
            _ => return Err(self.invalid("select a topic")),
        };
        let topic = syllabus
            .topics()
            .get(index)
            .cloned()
            .ok_or(FlowError::UnknownTopic { index })?;
        let request = MaterialsRequest {
            subject: syllabus.subject().to_string(),
            topic: topic.clone(),
        };

        self.error = None;
        self.pending = Some(Pending::Materials(topic));
        Ok(request)
    }

    /// Start studying with freshly generated materials.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NothingPending` if no materials request is in
    /// flight. Returns `FlowError::InvalidContent` when the materials fail
    /// validation; the request is then resolved and the flow stays on the
    /// syllabus screen.
    pub fn complete_materials(&mut self, materials: StudyMaterials) -> Result<(), FlowError> {
        let topic = match self.pending.take() {
            Some(Pending::Materials(topic)) => topic,
            other => {
                self.pending = other;
                return Err(FlowError::NothingPending(PendingRequest::StudyMaterials));
            }
        };
        let materials = materials.validate()?;
        self.stage = Stage::Studying {
            active: ActiveTopic { topic, materials },
            card: 0,
            flipped: false,
        };
        Ok(())
    }

    //
    // ─── FLASHCARDS ────────────────────────────────────────────────────────────
    //

    /// Turn the current card over; returns whether the answer side is showing.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidTransition` outside the flashcard screen.
    pub fn flip_card(&mut self) -> Result<bool, FlowError> {
        let Stage::Studying { flipped, .. } = &mut self.stage else {
            return Err(self.invalid("flip a card"));
        };
        *flipped = !*flipped;
        Ok(*flipped)
    }

    /// # Errors
    ///
    /// Returns `FlowError::InvalidTransition` outside the flashcard screen.
    pub fn next_card(&mut self) -> Result<CardStep, FlowError> {
        let Stage::Studying {
            active,
            card,
            flipped,
        } = &mut self.stage
        else {
            return Err(self.invalid("move to the next card"));
        };
        if *card + 1 >= active.materials.flashcards.len() {
            return Ok(CardStep::LastCard);
        }
        *card += 1;
        *flipped = false;
        Ok(CardStep::Advanced)
    }

    /// Step back one card; returns `false` when already on the first.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidTransition` outside the flashcard screen.
    pub fn previous_card(&mut self) -> Result<bool, FlowError> {
        let Stage::Studying { card, flipped, .. } = &mut self.stage else {
            return Err(self.invalid("move to the previous card"));
        };
        if *card == 0 {
            return Ok(false);
        }
        *card -= 1;
        *flipped = false;
        Ok(true)
    }

    /// Close the flashcard deck, award the session XP and open the quiz.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::FlashcardsRemaining` before the last card and
    /// `FlowError::InvalidTransition` outside the flashcard screen.
    pub fn finish_flashcards(
        &mut self,
        progress: &Progress,
        at: DateTime<Utc>,
    ) -> Result<(Progress, XpEvents), FlowError> {
        let screen = self.screen();
        match mem::replace(&mut self.stage, Stage::TopicSelection) {
            Stage::Studying {
                active,
                card,
                flipped,
            } => {
                let remaining = active
                    .materials
                    .flashcards
                    .len()
                    .saturating_sub(card + 1);
                if remaining > 0 {
                    self.stage = Stage::Studying {
                        active,
                        card,
                        flipped,
                    };
                    return Err(FlowError::FlashcardsRemaining { remaining });
                }

                let label = format!("Flashcards: {}", active.topic.title);
                let awarded = progression::apply_xp(
                    progress.clone(),
                    XP_PER_FLASHCARD_SESSION,
                    label,
                    progress.prospective_topics(),
                    at,
                );
                self.stage = Stage::Quiz {
                    active,
                    run: QuizRun::default(),
                };
                Ok(awarded)
            }
            other => {
                self.stage = other;
                Err(FlowError::InvalidTransition {
                    screen,
                    action: "finish the flashcards",
                })
            }
        }
    }

    //
    // ─── QUIZ ──────────────────────────────────────────────────────────────────
    //

    /// Lock in an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::AlreadyAnswered`, `FlowError::UnknownOption`, or
    /// `FlowError::InvalidTransition` outside the quiz.
    pub fn answer_question(&mut self, option: &str) -> Result<AnswerFeedback, FlowError> {
        let Stage::Quiz { active, run } = &mut self.stage else {
            return Err(self.invalid("answer a question"));
        };
        run.answer(&active.materials.quiz, option)
    }

    /// # Errors
    ///
    /// Returns `FlowError::Unanswered` until the current question has an
    /// answer, or `FlowError::InvalidTransition` outside the quiz.
    pub fn next_question(&mut self) -> Result<QuizStep, FlowError> {
        let Stage::Quiz { active, run } = &mut self.stage else {
            return Err(self.invalid("move to the next question"));
        };
        run.advance(active.materials.quiz.len())
    }

    /// Score the quiz, award XP, count the topic and open the results.
    ///
    /// The results screen starts with a pending suggestion; the returned
    /// [`SuggestionRequest`] carries what the caller needs to fetch it.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::QuestionsRemaining` while questions are unanswered
    /// and `FlowError::InvalidTransition` outside the quiz.
    pub fn finish_quiz(
        &mut self,
        progress: &Progress,
        at: DateTime<Utc>,
    ) -> Result<QuizCompletion, FlowError> {
        let screen = self.screen();
        match mem::replace(&mut self.stage, Stage::TopicSelection) {
            Stage::Quiz { active, run } => {
                let total = active.materials.quiz.len();
                let remaining = total.saturating_sub(run.answered());
                if remaining > 0 {
                    self.stage = Stage::Quiz { active, run };
                    return Err(FlowError::QuestionsRemaining { remaining });
                }

                let answers = run.answers().to_vec();
                let correct = active.materials.count_correct(&answers);
                let xp_gained = progression::quiz_xp(correct);
                let label = format!("Cuestionario: {}", active.topic.title);
                let (awarded, events) = progression::apply_xp(
                    progress.clone(),
                    xp_gained,
                    label,
                    progress.prospective_topics(),
                    at,
                );
                let progress = progression::complete_topic(awarded);

                self.suggestion_epoch += 1;
                let suggestion = SuggestionRequest {
                    epoch: self.suggestion_epoch,
                    subject: self.subject().unwrap_or_default().to_string(),
                    topic_title: active.topic.title.clone(),
                    quiz: active.materials.quiz.clone(),
                    answers: answers.clone(),
                };
                self.stage = Stage::Results {
                    active,
                    answers,
                    suggestion: Suggestion::Pending,
                };

                Ok(QuizCompletion {
                    progress,
                    events,
                    correct,
                    total,
                    xp_gained,
                    suggestion,
                })
            }
            other => {
                self.stage = other;
                Err(FlowError::InvalidTransition {
                    screen,
                    action: "finish the quiz",
                })
            }
        }
    }

    //
    // ─── RESULTS ───────────────────────────────────────────────────────────────
    //

    /// Fill the pending suggestion. Returns `false` and drops `text` when the
    /// results screen it was requested for is gone.
    pub fn apply_suggestion(&mut self, epoch: u64, text: impl Into<String>) -> bool {
        if epoch != self.suggestion_epoch {
            return false;
        }
        match &mut self.stage {
            Stage::Results { suggestion, .. } if *suggestion == Suggestion::Pending => {
                *suggestion = Suggestion::Ready(text.into());
                true
            }
            _ => false,
        }
    }

    /// Take the same quiz again with a clean answer sheet.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidTransition` outside the results screen.
    pub fn retry_quiz(&mut self) -> Result<(), FlowError> {
        let screen = self.screen();
        match mem::replace(&mut self.stage, Stage::TopicSelection) {
            Stage::Results { active, .. } => {
                self.suggestion_epoch += 1;
                self.stage = Stage::Quiz {
                    active,
                    run: QuizRun::default(),
                };
                Ok(())
            }
            other => {
                self.stage = other;
                Err(FlowError::InvalidTransition {
                    screen,
                    action: "retry the quiz",
                })
            }
        }
    }

    /// # Errors
    ///
    /// Returns `FlowError::InvalidTransition` outside the results screen.
    pub fn back_to_syllabus(&mut self) -> Result<(), FlowError> {
        if !matches!(self.stage, Stage::Results { .. }) {
            return Err(self.invalid("go back to the syllabus"));
        }
        self.suggestion_epoch += 1;
        self.stage = Stage::SyllabusView;
        Ok(())
    }
}
