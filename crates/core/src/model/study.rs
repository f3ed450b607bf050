use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Number of answer options every quiz question carries.
pub const QUIZ_OPTION_COUNT: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudyDataError {
    #[error("subject cannot be empty")]
    EmptySubject,

    #[error("syllabus has no topics")]
    EmptySyllabus,

    #[error("syllabus topic {index} has an empty title")]
    UntitledTopic { index: usize },

    #[error("study materials contain no flashcards")]
    NoFlashcards,

    #[error("study materials contain no quiz questions")]
    NoQuizQuestions,

    #[error("quiz question {index} has {count} options, expected 4")]
    WrongOptionCount { index: usize, count: usize },

    #[error("quiz question {index} has a correct answer that is not one of its options")]
    CorrectAnswerNotAnOption { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusTopic {
    pub title: String,
    pub description: String,
}

/// Subject plus the ordered list of topics generated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syllabus {
    subject: String,
    topics: Vec<SyllabusTopic>,
}

impl Syllabus {
    /// # Errors
    ///
    /// Returns `StudyDataError` if the subject is blank, the topic list is
    /// empty, or a topic has no title.
    pub fn new(subject: impl Into<String>, topics: Vec<SyllabusTopic>) -> Result<Self, StudyDataError> {
        let subject = subject.into().trim().to_string();
        if subject.is_empty() {
            return Err(StudyDataError::EmptySubject);
        }
        if topics.is_empty() {
            return Err(StudyDataError::EmptySyllabus);
        }
        if let Some(index) = topics.iter().position(|t| t.title.trim().is_empty()) {
            return Err(StudyDataError::UntitledTopic { index });
        }
        Ok(Self { subject, topics })
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn topics(&self) -> &[SyllabusTopic] {
        &self.topics
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(deserialize_with = "lenient_card_id")]
    pub id: u32,
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// Flashcards and quiz generated for a single topic.
///
/// The quiz is expected to test what the flashcards teach, but nothing here
/// checks that; only structural validity is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyMaterials {
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizQuestion>,
}

impl StudyMaterials {
    /// Check the structural rules every generated bundle must satisfy.
    ///
    /// # Errors
    ///
    /// Returns the first `StudyDataError` found.
    pub fn validate(self) -> Result<Self, StudyDataError> {
        if self.flashcards.is_empty() {
            return Err(StudyDataError::NoFlashcards);
        }
        if self.quiz.is_empty() {
            return Err(StudyDataError::NoQuizQuestions);
        }
        for (index, question) in self.quiz.iter().enumerate() {
            if question.options.len() != QUIZ_OPTION_COUNT {
                return Err(StudyDataError::WrongOptionCount {
                    index,
                    count: question.options.len(),
                });
            }
            if !question.has_option(&question.correct_answer) {
                return Err(StudyDataError::CorrectAnswerNotAnOption { index });
            }
        }
        Ok(self)
    }

    /// Number of answers matching the correct option, position by position.
    #[must_use]
    pub fn count_correct(&self, answers: &[String]) -> usize {
        self.quiz
            .iter()
            .zip(answers)
            .filter(|(question, answer)| question.is_correct(answer))
            .count()
    }
}

// Schema-constrained generators declare the card id as a JSON number, which
// may arrive as `3.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_card_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.fract() != 0.0 || raw < 0.0 || raw > f64::from(u32::MAX) {
        return Err(serde::de::Error::custom(format!("invalid flashcard id: {raw}")));
    }
    Ok(raw as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: &str) -> QuizQuestion {
        QuizQuestion {
            question: "¿Capital de Francia?".into(),
            options: vec!["París".into(), "Roma".into(), "Lima".into(), "Quito".into()],
            correct_answer: correct.into(),
            explanation: "París es la capital.".into(),
        }
    }

    fn card(id: u32) -> Flashcard {
        Flashcard {
            id,
            question: format!("Q{id}"),
            answer: format!("A{id}"),
            translation: None,
        }
    }

    #[test]
    fn syllabus_requires_subject_and_topics() {
        assert_eq!(
            Syllabus::new("  ", vec![]).unwrap_err(),
            StudyDataError::EmptySubject
        );
        assert_eq!(
            Syllabus::new("Historia", vec![]).unwrap_err(),
            StudyDataError::EmptySyllabus
        );
        let topics = vec![SyllabusTopic {
            title: "Revolución de Mayo".into(),
            description: "1810".into(),
        }];
        let syllabus = Syllabus::new(" Historia ", topics).unwrap();
        assert_eq!(syllabus.subject(), "Historia");
        assert_eq!(syllabus.topics().len(), 1);
    }

    #[test]
    fn materials_reject_answer_outside_options() {
        let materials = StudyMaterials {
            flashcards: vec![card(1)],
            quiz: vec![question("Madrid")],
        };
        assert_eq!(
            materials.validate().unwrap_err(),
            StudyDataError::CorrectAnswerNotAnOption { index: 0 }
        );
    }

    #[test]
    fn materials_reject_wrong_option_count() {
        let mut q = question("París");
        q.options.pop();
        let materials = StudyMaterials {
            flashcards: vec![card(1)],
            quiz: vec![q],
        };
        assert_eq!(
            materials.validate().unwrap_err(),
            StudyDataError::WrongOptionCount { index: 0, count: 3 }
        );
    }

    #[test]
    fn count_correct_compares_positionally() {
        let materials = StudyMaterials {
            flashcards: vec![card(1)],
            quiz: vec![question("París"), question("Roma"), question("Lima")],
        };
        let answers = vec!["París".to_string(), "París".to_string(), "Lima".to_string()];
        assert_eq!(materials.count_correct(&answers), 2);
    }

    #[test]
    fn generated_json_parses_with_float_ids_and_camel_case() {
        let json = r#"{
            "flashcards": [{"id": 1.0, "question": "Hello", "answer": "Hola", "translation": "(Hola)"}],
            "quiz": [{"question": "q", "options": ["a","b","c","d"], "correctAnswer": "b", "explanation": "e"}]
        }"#;
        let materials: StudyMaterials = serde_json::from_str(json).unwrap();
        let materials = materials.validate().unwrap();
        assert_eq!(materials.flashcards[0].id, 1);
        assert_eq!(materials.flashcards[0].translation.as_deref(), Some("(Hola)"));
        assert_eq!(materials.quiz[0].correct_answer, "b");
    }

    #[test]
    fn fractional_card_id_is_rejected() {
        let json = r#"{"id": 1.5, "question": "q", "answer": "a"}"#;
        assert!(serde_json::from_str::<Flashcard>(json).is_err());
    }
}
