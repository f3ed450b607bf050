use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sabelo_core::flow::{CardStep, QuizStep, SUGGESTION_FALLBACK, Screen, ScreenView};
use sabelo_core::model::{
    Flashcard, QuizQuestion, StudyDataError, StudyMaterials, Syllabus, SyllabusTopic,
};
use sabelo_core::time::fixed_now;
use services::{
    AppServices, Clock, ContentGenerator, GENERATION_FAILED_MESSAGE, GenerationError,
    LeaderboardNotifier, NotifierError, ProgressReport, StudySessionError, UploadedFile,
};
use storage::repository::{InMemoryRepository, Storage};

#[derive(Default)]
struct FakeGenerator {
    fail_materials: bool,
    fail_suggestion: bool,
    subjects: Mutex<Vec<String>>,
    suggestion_calls: Mutex<usize>,
}

fn topics() -> Vec<SyllabusTopic> {
    ["Revolución de Mayo", "Independencia"]
        .into_iter()
        .map(|title| SyllabusTopic {
            title: title.into(),
            description: format!("Sobre {title}"),
        })
        .collect()
}

fn materials() -> StudyMaterials {
    StudyMaterials {
        flashcards: (1..=2)
            .map(|id| Flashcard {
                id,
                question: format!("Q{id}"),
                answer: format!("A{id}"),
                translation: None,
            })
            .collect(),
        quiz: (0..5)
            .map(|n| QuizQuestion {
                question: format!("P{n}"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: "a".into(),
                explanation: format!("E{n}"),
            })
            .collect(),
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate_syllabus(&self, subject: &str) -> Result<Vec<SyllabusTopic>, GenerationError> {
        self.subjects.lock().unwrap().push(subject.to_string());
        Ok(topics())
    }

    async fn generate_syllabus_from_files(
        &self,
        files: &[UploadedFile],
    ) -> Result<Syllabus, GenerationError> {
        if files.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(Syllabus::new("Apuntes", topics())?)
    }

    async fn generate_study_materials(
        &self,
        _subject: &str,
        _topic_title: &str,
    ) -> Result<StudyMaterials, GenerationError> {
        if self.fail_materials {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(materials())
    }

    async fn generate_study_suggestion(
        &self,
        _subject: &str,
        topic_title: &str,
        _quiz: &[QuizQuestion],
        _answers: &[String],
    ) -> Result<String, GenerationError> {
        *self.suggestion_calls.lock().unwrap() += 1;
        if self.fail_suggestion {
            return Err(GenerationError::Disabled);
        }
        Ok(format!("  Repasá {topic_title}.  "))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    reports: Mutex<Vec<ProgressReport>>,
}

#[async_trait]
impl LeaderboardNotifier for RecordingNotifier {
    async fn notify(&self, report: &ProgressReport) -> Result<(), NotifierError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

struct Harness {
    services: AppServices,
    generator: Arc<FakeGenerator>,
    repo: InMemoryRepository,
    notifier: Arc<RecordingNotifier>,
}

fn harness(generator: FakeGenerator) -> Harness {
    let repo = InMemoryRepository::new();
    let storage = Storage {
        progress: Arc::new(repo.clone()),
    };
    let notifier = Arc::new(RecordingNotifier::default());
    let generator = Arc::new(generator);
    let services = AppServices::new(
        Clock::fixed(fixed_now()),
        storage,
        generator.clone(),
        notifier.clone(),
    );
    Harness {
        services,
        generator,
        repo,
        notifier,
    }
}

#[tokio::test(start_paused = true)]
async fn full_topic_awards_xp_and_reports_once() {
    let h = harness(FakeGenerator::default());
    let mut session = h.services.start_session().await;
    session.set_username("Ana").await.unwrap();

    session.select_subject("Historia").await.unwrap();
    assert_eq!(session.screen(), Screen::SyllabusView);
    session.select_topic(0).await.unwrap();
    assert_eq!(session.screen(), Screen::Studying);

    assert_eq!(session.next_card().unwrap(), CardStep::Advanced);
    let events = session.finish_flashcards().await.unwrap();
    assert_eq!(events.unlocked_badge.map(|b| b.id), Some("topic_1"));
    assert_eq!(session.progress().xp(), 50);

    for answer in ["a", "b", "a", "c", "a"] {
        session.answer_question(answer).unwrap();
        session.next_question().unwrap();
    }
    let outcome = session.finish_quiz().await.unwrap();
    assert_eq!(outcome.correct, 3);
    assert_eq!(outcome.xp_gained, 60);
    assert_eq!(session.progress().xp(), 110);
    assert_eq!(session.progress().topics_completed(), 1);
    assert_eq!(session.screen(), Screen::Results);

    assert!(session.resolve_suggestion(outcome.suggestion).await);
    let ScreenView::Results(results) = session.view() else {
        panic!("expected results");
    };
    assert_eq!(results.suggestion, Some("Repasá Revolución de Mayo."));

    let stored = h.services.progress().load().await;
    assert_eq!(stored, *session.progress());

    tokio::time::sleep(Duration::from_secs(3)).await;
    let reports = h.notifier.reports.lock().unwrap().clone();
    assert_eq!(
        reports,
        vec![ProgressReport {
            name: "Ana".into(),
            xp: 110,
            topics: 1,
            badges: 1,
        }]
    );
}

#[tokio::test]
async fn failed_materials_keep_syllabus_and_show_message() {
    let h = harness(FakeGenerator {
        fail_materials: true,
        ..FakeGenerator::default()
    });
    let mut session = h.services.start_session().await;
    session.select_subject("Historia").await.unwrap();

    let err = session.select_topic(1).await.unwrap_err();
    assert!(matches!(err, StudySessionError::Generation(_)));
    assert_eq!(session.screen(), Screen::SyllabusView);
    assert_eq!(session.error(), Some(GENERATION_FAILED_MESSAGE));
    assert!(!session.flow().is_loading());
}

#[tokio::test]
async fn files_syllabus_uses_inferred_subject() {
    let h = harness(FakeGenerator::default());
    let mut session = h.services.start_session().await;

    let file = UploadedFile::from_bytes("image/png", b"notes");
    session.analyze_files(&[file]).await.unwrap();
    assert_eq!(session.flow().subject(), Some("Apuntes"));

    session.start_over().unwrap();
    assert_eq!(session.screen(), Screen::TopicSelection);
    assert!(session.analyze_files(&[]).await.is_err());
    assert_eq!(session.screen(), Screen::TopicSelection);
}

#[tokio::test]
async fn failing_suggestion_falls_back_and_stale_ones_are_dropped() {
    let h = harness(FakeGenerator {
        fail_suggestion: true,
        ..FakeGenerator::default()
    });
    let mut session = h.services.start_session().await;
    session.select_subject("Historia").await.unwrap();
    session.select_topic(0).await.unwrap();
    session.next_card().unwrap();
    session.finish_flashcards().await.unwrap();
    for _ in 0..5 {
        session.answer_question("a").unwrap();
        session.next_question().unwrap();
    }
    let first = session.finish_quiz().await.unwrap();

    let pending = session.spawn_suggestion(first.suggestion.clone());
    session.retry_quiz().unwrap();
    let reply = pending.await.unwrap();
    assert_eq!(reply.text, SUGGESTION_FALLBACK);
    assert!(!session.apply_suggestion(reply));

    for _ in 0..4 {
        session.answer_question("a").unwrap();
        assert_eq!(session.next_question().unwrap(), QuizStep::Next);
    }
    session.answer_question("a").unwrap();
    assert_eq!(session.next_question().unwrap(), QuizStep::AllAnswered);
    let second = session.finish_quiz().await.unwrap();
    assert!(session.resolve_suggestion(second.suggestion).await);
    let ScreenView::Results(results) = session.view() else {
        panic!("expected results");
    };
    assert_eq!(results.suggestion, Some(SUGGESTION_FALLBACK));
}

#[tokio::test]
async fn anonymous_progress_is_neither_saved_nor_reported() {
    let h = harness(FakeGenerator::default());
    let mut session = h.services.start_session().await;
    session.select_subject("Historia").await.unwrap();
    session.select_topic(0).await.unwrap();
    session.next_card().unwrap();
    session.finish_flashcards().await.unwrap();

    assert_eq!(session.progress().xp(), 50);
    assert!(h.repo.get_raw(storage::repository::PROGRESS_KEY).unwrap().is_none());
    h.services.notifier().flush().await;
    assert!(h.notifier.reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blank_username_is_rejected() {
    let h = harness(FakeGenerator::default());
    let mut session = h.services.start_session().await;
    assert!(matches!(
        session.set_username("   ").await,
        Err(StudySessionError::Progress(_))
    ));
    assert_eq!(session.leaderboard().current_user().name, "Tú");
}

#[tokio::test]
async fn blank_subject_never_reaches_the_generator() {
    let h = harness(FakeGenerator::default());
    let mut session = h.services.start_session().await;

    assert!(matches!(
        session.select_subject("   ").await,
        Err(StudySessionError::Input(StudyDataError::EmptySubject))
    ));
    assert_eq!(session.screen(), Screen::TopicSelection);
    assert!(!session.flow().is_loading());
    assert_eq!(session.error(), None);

    session.select_subject("  Historia ").await.unwrap();
    assert_eq!(*h.generator.subjects.lock().unwrap(), vec!["Historia".to_string()]);
    assert_eq!(session.flow().subject(), Some("Historia"));
}
