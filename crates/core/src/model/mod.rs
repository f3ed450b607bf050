mod badge;
mod progress;
mod study;

pub use badge::{
    BADGE_CATALOG, Badge, BadgeCategory, BadgeDefinition, BadgeRule, find_badge, initial_badges,
};
pub use progress::{ActivityLogEntry, Progress, ProgressError};
pub use study::{
    Flashcard, QUIZ_OPTION_COUNT, QuizQuestion, StudyDataError, StudyMaterials, Syllabus,
    SyllabusTopic,
};
