use crate::model::QuizQuestion;

use super::FlowError;

/// Feedback shown right after an option is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}

/// Result of moving past the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    /// Moved on to the next question.
    Next,
    /// Every question has an answer; the quiz can be finished.
    AllAnswered,
}

/// Answers recorded so far for one pass through a quiz.
///
/// Each question takes exactly one answer, in order; an answer is locked once
/// given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct QuizRun {
    answers: Vec<String>,
    current: usize,
}

impl QuizRun {
    pub(crate) fn current(&self) -> usize {
        self.current
    }

    pub(crate) fn answers(&self) -> &[String] {
        &self.answers
    }

    pub(crate) fn answered(&self) -> usize {
        self.answers.len()
    }

    pub(crate) fn current_answer(&self) -> Option<&str> {
        self.answers.get(self.current).map(String::as_str)
    }

    pub(crate) fn answer(
        &mut self,
        questions: &[QuizQuestion],
        option: &str,
    ) -> Result<AnswerFeedback, FlowError> {
        let question = questions
            .get(self.current)
            .ok_or(FlowError::QuizOver)?;
        if self.answers.len() > self.current {
            return Err(FlowError::AlreadyAnswered);
        }
        if !question.has_option(option) {
            return Err(FlowError::UnknownOption(option.to_string()));
        }

        self.answers.push(option.to_string());
        Ok(AnswerFeedback {
            is_correct: question.is_correct(option),
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
        })
    }

    pub(crate) fn advance(&mut self, total: usize) -> Result<QuizStep, FlowError> {
        if self.answers.len() <= self.current {
            return Err(FlowError::Unanswered);
        }
        if self.current + 1 < total {
            self.current += 1;
            Ok(QuizStep::Next)
        } else {
            Ok(QuizStep::AllAnswered)
        }
    }
}

/// Encouragement line for a final score.
#[must_use]
pub fn score_message(correct: usize, total: usize) -> &'static str {
    if total == 0 {
        return "¡No te desanimes! Repasar es la clave del éxito.";
    }
    let scaled = correct.saturating_mul(100);
    if scaled >= total * 100 {
        "¡Puntaje perfecto! ¡Sos un genio!"
    } else if scaled >= total * 75 {
        "¡Excelente trabajo! Casi lo tenés."
    } else if scaled >= total * 50 {
        "¡Nada mal! Un poco más de práctica y lo dominás."
    } else {
        "¡No te desanimes! Repasar es la clave del éxito."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<QuizQuestion> {
        (1..=2)
            .map(|n| QuizQuestion {
                question: format!("Q{n}"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: "a".into(),
                explanation: format!("E{n}"),
            })
            .collect()
    }

    #[test]
    fn answers_lock_and_advance_in_order() {
        let qs = questions();
        let mut run = QuizRun::default();

        assert_eq!(run.advance(qs.len()), Err(FlowError::Unanswered));
        let feedback = run.answer(&qs, "b").unwrap();
        assert!(!feedback.is_correct);
        assert_eq!(feedback.correct_answer, "a");
        assert_eq!(run.answer(&qs, "a"), Err(FlowError::AlreadyAnswered));

        assert_eq!(run.advance(qs.len()), Ok(QuizStep::Next));
        assert!(run.answer(&qs, "a").unwrap().is_correct);
        assert_eq!(run.advance(qs.len()), Ok(QuizStep::AllAnswered));
        assert_eq!(run.answers(), ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn unknown_option_is_rejected_without_recording() {
        let qs = questions();
        let mut run = QuizRun::default();
        assert_eq!(
            run.answer(&qs, "z"),
            Err(FlowError::UnknownOption("z".into()))
        );
        assert_eq!(run.answered(), 0);
    }

    #[test]
    fn score_messages_follow_thresholds() {
        assert_eq!(score_message(5, 5), "¡Puntaje perfecto! ¡Sos un genio!");
        assert_eq!(score_message(4, 5), "¡Excelente trabajo! Casi lo tenés.");
        assert_eq!(score_message(3, 5), "¡Nada mal! Un poco más de práctica y lo dominás.");
        assert_eq!(score_message(2, 5), "¡No te desanimes! Repasar es la clave del éxito.");
    }
}
