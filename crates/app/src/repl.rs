//! Line-oriented study loop over stdin.

use std::io::Write as _;
use std::path::PathBuf;

use sabelo_core::flow::{CardStep, QuizStep, SUGGESTION_FALLBACK, Screen, ScreenView};
use services::{StudySession, StudySessionError, SuggestionReply, UploadedFile};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;

use crate::render;

type Input = Lines<BufReader<Stdin>>;

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

/// A suggestion still being generated for the results screen `epoch`.
struct PendingSuggestion {
    epoch: u64,
    task: JoinHandle<SuggestionReply>,
}

/// Resolves with the pending suggestion, or never when there is none.
///
/// The task stays in `pending` until it finishes, so dropping this future
/// early loses nothing.
async fn next_reply(pending: &mut Option<PendingSuggestion>) -> SuggestionReply {
    let Some(suggestion) = pending.as_mut() else {
        return std::future::pending().await;
    };
    let result = (&mut suggestion.task).await;
    let epoch = suggestion.epoch;
    *pending = None;
    result.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "suggestion task did not complete");
        SuggestionReply {
            epoch,
            text: SUGGESTION_FALLBACK.to_string(),
        }
    })
}

struct Driver<'a> {
    session: StudySession,
    files: &'a [PathBuf],
    suggestion: Option<PendingSuggestion>,
}

/// Run until `/salir` or end of input.
///
/// # Errors
///
/// Only stdin failures end the loop early; study errors are printed and the
/// loop carries on.
pub async fn run(
    mut session: StudySession,
    user: Option<&str>,
    files: &[PathBuf],
) -> std::io::Result<()> {
    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();

    if !login(&mut session, user, &mut input).await? {
        return Ok(());
    }
    let mut driver = Driver {
        session,
        files,
        suggestion: None,
    };
    if !files.is_empty() {
        driver.analyze().await;
    }

    loop {
        driver.show();
        prompt("> ");

        // Results stay interactive while the suggestion is generated.
        let line = tokio::select! {
            line = input.next_line() => line?,
            reply = next_reply(&mut driver.suggestion) => {
                driver.session.apply_suggestion(reply);
                println!();
                continue;
            }
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        match line {
            "" => {}
            "/salir" => break,
            "/progreso" => println!("{}", render::progress(driver.session.progress())),
            "/ranking" => println!("{}", render::leaderboard(&driver.session.leaderboard())),
            _ => match driver.handle(line).await {
                Ok(()) => {}
                // The flow already carries the user-facing message.
                Err(StudySessionError::Generation(_)) => {}
                Err(err) => println!("⚠️  {err}"),
            },
        }
    }
    Ok(())
}

/// Returns `false` when input ends before a name is given.
async fn login(
    session: &mut StudySession,
    user: Option<&str>,
    input: &mut Input,
) -> std::io::Result<bool> {
    if let Some(name) = user {
        if session.set_username(name).await.is_ok() {
            return Ok(true);
        }
    }
    if let Some(name) = session.progress().username() {
        println!("¡Hola de nuevo, {name}!");
        return Ok(true);
    }

    loop {
        prompt("¿Cómo te llamás? ");
        let Some(line) = input.next_line().await? else {
            return Ok(false);
        };
        match session.set_username(&line).await {
            Ok(()) => return Ok(true),
            Err(_) => println!("❗ Tenés que ingresar tu nombre para continuar."),
        }
    }
}

impl Driver<'_> {
    fn show(&mut self) {
        if let Some(message) = self.session.error() {
            println!("⚠️  {message}");
        }
        self.session.dismiss_error();
        print!("\n{}", render::screen(&self.session.view()));
    }

    async fn analyze(&mut self) {
        if self.files.is_empty() {
            println!("Pasá tus apuntes con --file <ruta> al iniciar.");
            return;
        }
        let mut uploads = Vec::with_capacity(self.files.len());
        for path in self.files {
            match UploadedFile::read(path) {
                Ok(file) => uploads.push(file),
                Err(err) => {
                    println!("⚠️  No se pudo leer {}: {err}", path.display());
                    return;
                }
            }
        }
        println!("⏳ Analizando tus apuntes…");
        if let Err(err) = self.session.analyze_files(&uploads).await {
            tracing::debug!(error = %err, "file analysis failed");
        }
    }

    async fn handle(&mut self, line: &str) -> Result<(), StudySessionError> {
        if self.session.screen() == Screen::TopicSelection && line == "/archivos" {
            self.analyze().await;
            return Ok(());
        }

        let session = &mut self.session;
        match session.screen() {
            Screen::TopicSelection => {
                println!("⏳ Generando temario…");
                session.select_subject(line).await
            }
            Screen::SyllabusView => {
                if line == "/volver" {
                    return session.start_over();
                }
                match line.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                    Some(index) => {
                        println!("⏳ Generando materiales de estudio…");
                        session.select_topic(index).await
                    }
                    None => {
                        println!("Escribí el número de un tema.");
                        Ok(())
                    }
                }
            }
            Screen::Studying => match line {
                "g" => session.flip_card().map(|_| ()),
                "s" => {
                    if session.next_card()? == CardStep::LastCard {
                        println!("Última tarjeta. Escribí c para pasar al cuestionario.");
                    }
                    Ok(())
                }
                "a" => session.previous_card().map(|_| ()),
                "c" => {
                    let events = session.finish_flashcards().await?;
                    print!("{}", render::events(&events));
                    Ok(())
                }
                _ => {
                    println!("Comando desconocido: {line}");
                    Ok(())
                }
            },
            Screen::Quiz => {
                let option = match session.view() {
                    ScreenView::Question { question, .. } => line
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|index| question.options.get(index).cloned()),
                    _ => None,
                }
                .unwrap_or_else(|| line.to_string());

                let feedback = session.answer_question(&option)?;
                println!("{}", render::feedback(&feedback));
                if session.next_question()? == QuizStep::AllAnswered {
                    let outcome = session.finish_quiz().await?;
                    println!("+{} XP", outcome.xp_gained);
                    print!("{}", render::events(&outcome.events));
                    let pending = PendingSuggestion {
                        epoch: outcome.suggestion.epoch,
                        task: session.spawn_suggestion(outcome.suggestion),
                    };
                    if let Some(stale) = self.suggestion.replace(pending) {
                        stale.task.abort();
                    }
                }
                Ok(())
            }
            Screen::Results => match line {
                "r" => session.retry_quiz(),
                "t" => session.back_to_syllabus(),
                _ => {
                    println!("Comando desconocido: {line}");
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use sabelo_core::model::{Flashcard, QuizQuestion, StudyMaterials, Syllabus, SyllabusTopic};
    use sabelo_core::time::fixed_now;
    use services::{AppServices, Clock, ContentGenerator, GenerationError, NoopNotifier};
    use storage::repository::Storage;

    use super::*;

    /// Answers instantly, except for suggestions which take ten seconds.
    struct SlowSuggestions;

    #[async_trait]
    impl ContentGenerator for SlowSuggestions {
        async fn generate_syllabus(
            &self,
            _subject: &str,
        ) -> Result<Vec<SyllabusTopic>, GenerationError> {
            Ok(vec![SyllabusTopic {
                title: "Revolución de Mayo".into(),
                description: "1810".into(),
            }])
        }

        async fn generate_syllabus_from_files(
            &self,
            _files: &[UploadedFile],
        ) -> Result<Syllabus, GenerationError> {
            Err(GenerationError::Disabled)
        }

        async fn generate_study_materials(
            &self,
            _subject: &str,
            _topic_title: &str,
        ) -> Result<StudyMaterials, GenerationError> {
            Ok(StudyMaterials {
                flashcards: vec![Flashcard {
                    id: 1,
                    question: "¿Cuándo?".into(),
                    answer: "1810".into(),
                    translation: None,
                }],
                quiz: vec![QuizQuestion {
                    question: "¿Año?".into(),
                    options: vec!["1806".into(), "1810".into(), "1816".into(), "1820".into()],
                    correct_answer: "1810".into(),
                    explanation: "Fue en mayo de 1810.".into(),
                }],
            })
        }

        async fn generate_study_suggestion(
            &self,
            _subject: &str,
            _topic_title: &str,
            _quiz: &[QuizQuestion],
            _answers: &[String],
        ) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok("Repasá las fechas.".into())
        }
    }

    async fn driver_at_last_question(files: &[PathBuf]) -> Driver<'_> {
        let services = AppServices::new(
            Clock::fixed(fixed_now()),
            Storage::in_memory(),
            Arc::new(SlowSuggestions),
            Arc::new(NoopNotifier),
        );
        let mut driver = Driver {
            session: services.start_session().await,
            files,
            suggestion: None,
        };
        driver.handle("Historia").await.unwrap();
        driver.handle("1").await.unwrap();
        driver.handle("c").await.unwrap();
        assert_eq!(driver.session.screen(), Screen::Quiz);
        driver
    }

    #[tokio::test(start_paused = true)]
    async fn results_open_before_the_suggestion_arrives() {
        let mut driver = driver_at_last_question(&[]).await;

        let started = tokio::time::Instant::now();
        // A wrong answer, so the suggestion has to be generated.
        driver.handle("1").await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));

        assert_eq!(driver.session.screen(), Screen::Results);
        let ScreenView::Results(results) = driver.session.view() else {
            panic!("expected results");
        };
        assert_eq!(results.suggestion, None);
        assert!(render::screen(&driver.session.view()).contains("Generando un consejo"));
        assert!(driver.suggestion.is_some());

        let reply = next_reply(&mut driver.suggestion).await;
        assert!(driver.session.apply_suggestion(reply));
        let ScreenView::Results(results) = driver.session.view() else {
            panic!("expected results");
        };
        assert_eq!(results.suggestion, Some("Repasá las fechas."));
    }

    #[tokio::test(start_paused = true)]
    async fn suggestion_for_a_left_results_screen_is_ignored() {
        let mut driver = driver_at_last_question(&[]).await;
        driver.handle("1").await.unwrap();
        driver.handle("r").await.unwrap();
        assert_eq!(driver.session.screen(), Screen::Quiz);

        let reply = next_reply(&mut driver.suggestion).await;
        assert!(!driver.session.apply_suggestion(reply));
        assert!(driver.suggestion.is_none());
    }
}
