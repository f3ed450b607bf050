use crate::model::{Flashcard, QuizQuestion, SyllabusTopic};

use super::{Stage, StudyFlow, Suggestion, score_message};

/// What the current screen shows, borrowed from the flow.
///
/// Indices are zero-based; formatting is left to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenView<'a> {
    TopicSelection,
    Syllabus {
        subject: &'a str,
        topics: &'a [SyllabusTopic],
    },
    Flashcard {
        topic: &'a SyllabusTopic,
        card: &'a Flashcard,
        index: usize,
        total: usize,
        flipped: bool,
    },
    Question {
        topic: &'a SyllabusTopic,
        question: &'a QuizQuestion,
        index: usize,
        total: usize,
        chosen: Option<&'a str>,
    },
    Results(ResultsView<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview<'a> {
    pub question: &'a QuizQuestion,
    pub chosen: &'a str,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView<'a> {
    pub subject: &'a str,
    pub topic: &'a SyllabusTopic,
    pub correct: usize,
    pub total: usize,
    pub review: Vec<QuestionReview<'a>>,
    /// `None` while the suggestion is still being generated.
    pub suggestion: Option<&'a str>,
}

impl ResultsView<'_> {
    #[must_use]
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        self.correct * 100 / self.total
    }

    #[must_use]
    pub fn score_message(&self) -> &'static str {
        score_message(self.correct, self.total)
    }
}

impl StudyFlow {
    #[must_use]
    pub fn view(&self) -> ScreenView<'_> {
        match &self.stage {
            Stage::TopicSelection => ScreenView::TopicSelection,
            Stage::SyllabusView => match &self.syllabus {
                Some(syllabus) => ScreenView::Syllabus {
                    subject: syllabus.subject(),
                    topics: syllabus.topics(),
                },
                None => ScreenView::TopicSelection,
            },
            Stage::Studying {
                active,
                card,
                flipped,
            } => match active.materials.flashcards.get(*card) {
                Some(flashcard) => ScreenView::Flashcard {
                    topic: &active.topic,
                    card: flashcard,
                    index: *card,
                    total: active.materials.flashcards.len(),
                    flipped: *flipped,
                },
                None => ScreenView::TopicSelection,
            },
            Stage::Quiz { active, run } => match active.materials.quiz.get(run.current()) {
                Some(question) => ScreenView::Question {
                    topic: &active.topic,
                    question,
                    index: run.current(),
                    total: active.materials.quiz.len(),
                    chosen: run.current_answer(),
                },
                None => ScreenView::TopicSelection,
            },
            Stage::Results {
                active,
                answers,
                suggestion,
            } => {
                let review: Vec<_> = active
                    .materials
                    .quiz
                    .iter()
                    .zip(answers)
                    .map(|(question, chosen)| QuestionReview {
                        question,
                        chosen,
                        is_correct: question.is_correct(chosen),
                    })
                    .collect();
                ScreenView::Results(ResultsView {
                    subject: self.subject().unwrap_or_default(),
                    topic: &active.topic,
                    correct: review.iter().filter(|r| r.is_correct).count(),
                    total: active.materials.quiz.len(),
                    review,
                    suggestion: match suggestion {
                        Suggestion::Pending => None,
                        Suggestion::Ready(text) => Some(text.as_str()),
                    },
                })
            }
        }
    }
}
