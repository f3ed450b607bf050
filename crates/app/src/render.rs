//! Plain-text rendering for the terminal front end.

use std::fmt::Write as _;

use sabelo_core::flow::{AnswerFeedback, ResultsView, ScreenView};
use sabelo_core::leaderboard::Leaderboard;
use sabelo_core::model::{BadgeCategory, Progress};
use sabelo_core::progression::{LevelProgress, XpEvents, level_name};

const BAR_WIDTH: usize = 20;

fn bar(percent: u32) -> String {
    let filled = (percent.min(100) as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Dashboard: level, XP bar, badges by category and recent activity.
pub fn progress(progress: &Progress) -> String {
    let mut out = String::new();
    let level = LevelProgress::of(progress);
    let name = progress.username().unwrap_or("Sin nombre");

    let _ = writeln!(out, "👤 {name}");
    let _ = writeln!(
        out,
        "Nivel {} ({}) · {} XP · {} temas completados",
        progress.level(),
        level_name(progress.level()),
        progress.xp(),
        progress.topics_completed()
    );
    let _ = writeln!(
        out,
        "{} {}/{} XP para el próximo nivel",
        bar(level.percent()),
        level.xp_into_level,
        level.xp_for_next
    );

    for category in BadgeCategory::ALL {
        let _ = writeln!(out, "\n{category}");
        for badge in progress.badges_in(category) {
            let mark = if badge.is_achieved() { "🏅" } else { "🔒" };
            let _ = writeln!(out, "  {mark} {}: {}", badge.name(), badge.description());
        }
    }

    let _ = writeln!(out, "\nActividad reciente");
    if progress.activity_log().is_empty() {
        let _ = writeln!(out, "  Todavía no hay actividad.");
    }
    for entry in progress.activity_log() {
        let _ = writeln!(
            out,
            "  {} · {} (+{} XP)",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.activity_name,
            entry.xp_gained
        );
    }
    out
}

pub fn leaderboard(board: &Leaderboard) -> String {
    let mut out = String::from("🏆 Tabla de clasificación\n");
    if let Some(hint) = board.hint() {
        let _ = writeln!(out, "{hint}");
    }
    for user in board.users() {
        let marker = if user.is_current { "➤" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {:>3}  {:<20} Nivel {:<3} {:>5} XP",
            user.rank_display().to_string(),
            user.name,
            user.level,
            user.xp
        );
    }
    out
}

pub fn events(events: &XpEvents) -> String {
    let mut out = String::new();
    if let Some(level) = events.level_up {
        let _ = writeln!(out, "⬆️  ¡Subiste al nivel {level}!");
    }
    for badge in &events.newly_achieved {
        let _ = writeln!(out, "🏅 Insignia desbloqueada: {}", badge.name);
    }
    out
}

pub fn feedback(feedback: &AnswerFeedback) -> String {
    if feedback.is_correct {
        format!("✅ ¡Correcto! {}", feedback.explanation)
    } else {
        format!(
            "❌ Incorrecto. La respuesta era: {}. {}",
            feedback.correct_answer, feedback.explanation
        )
    }
}

pub fn screen(view: &ScreenView<'_>) -> String {
    let mut out = String::new();
    match view {
        ScreenView::TopicSelection => {
            let _ = writeln!(out, "¿Qué querés estudiar hoy?");
            let _ = writeln!(out, "Escribí una materia, o /archivos para usar tus apuntes.");
        }
        ScreenView::Syllabus { subject, topics } => {
            let _ = writeln!(out, "📚 {subject}");
            for (index, topic) in topics.iter().enumerate() {
                let _ = writeln!(out, "  {}. {} · {}", index + 1, topic.title, topic.description);
            }
            let _ = writeln!(out, "Elegí un tema por número, o /volver para cambiar de materia.");
        }
        ScreenView::Flashcard {
            topic,
            card,
            index,
            total,
            flipped,
        } => {
            let _ = writeln!(out, "🃏 {} · tarjeta {}/{}", topic.title, index + 1, total);
            if *flipped {
                let _ = writeln!(out, "  {}", card.answer);
                if let Some(translation) = &card.translation {
                    let _ = writeln!(out, "  ({translation})");
                }
            } else {
                let _ = writeln!(out, "  {}", card.question);
            }
            let _ = writeln!(out, "g girar · s siguiente · a anterior · c cuestionario");
        }
        ScreenView::Question {
            topic,
            question,
            index,
            total,
            ..
        } => {
            let _ = writeln!(out, "❓ {} · pregunta {}/{}", topic.title, index + 1, total);
            let _ = writeln!(out, "  {}", question.question);
            for (n, option) in question.options.iter().enumerate() {
                let _ = writeln!(out, "  {}) {option}", n + 1);
            }
        }
        ScreenView::Results(results) => out.push_str(&self::results(results)),
    }
    out
}

fn results(results: &ResultsView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "🎯 {} · {}/{} ({}%)",
        results.topic.title,
        results.correct,
        results.total,
        results.percent()
    );
    let _ = writeln!(out, "{}", results.score_message());
    for review in &results.review {
        let mark = if review.is_correct { "✅" } else { "❌" };
        let _ = writeln!(out, "  {mark} {}", review.question.question);
        if !review.is_correct {
            let _ = writeln!(
                out,
                "     Tu respuesta: {} · Correcta: {}",
                review.chosen, review.question.correct_answer
            );
        }
    }
    match results.suggestion {
        Some(text) => {
            let _ = writeln!(out, "💡 {text}");
        }
        None => {
            let _ = writeln!(out, "💡 Generando un consejo…");
        }
    }
    let _ = writeln!(out, "r reintentar · t volver a los temas");
    out
}
