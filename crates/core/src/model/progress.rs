use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::badge::{Badge, BadgeCategory, initial_badges};
use crate::progression::level_for_xp;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("level must be at least 1")]
    InvalidLevel,

    #[error("level {level} does not match {xp} xp (expected {expected})")]
    LevelMismatch { xp: u32, level: u32, expected: u32 },
}

/// One line of the "recent activity" panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLogEntry {
    pub activity_name: String,
    pub xp_gained: u32,
    pub timestamp: DateTime<Utc>,
}

impl ActivityLogEntry {
    #[must_use]
    pub fn new(activity_name: impl Into<String>, xp_gained: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            activity_name: activity_name.into(),
            xp_gained,
            timestamp,
        }
    }
}

/// The player's accumulated progress.
///
/// XP and badges only ever grow; the progression engine is the only writer of
/// `xp`, `level`, badges and the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub(crate) username: Option<String>,
    pub(crate) xp: u32,
    pub(crate) level: u32,
    pub(crate) topics_completed: u32,
    pub(crate) badges: Vec<Badge>,
    pub(crate) activity_log: Vec<ActivityLogEntry>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Fresh progress: level 1, no XP, every badge locked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            username: None,
            xp: 0,
            level: 1,
            topics_completed: 0,
            badges: initial_badges(),
            activity_log: Vec::new(),
        }
    }

    /// Rehydrate progress from a persisted snapshot.
    ///
    /// `achieved` lists the ids of unlocked badges; ids missing from the catalog
    /// are ignored. `activity_log` must already be ordered most recent first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidLevel` for level 0 and
    /// `ProgressError::LevelMismatch` when `level` is not the level implied by `xp`.
    pub fn from_persisted<'a>(
        username: Option<String>,
        xp: u32,
        level: u32,
        topics_completed: u32,
        achieved: impl IntoIterator<Item = &'a str>,
        activity_log: Vec<ActivityLogEntry>,
    ) -> Result<Self, ProgressError> {
        if level == 0 {
            return Err(ProgressError::InvalidLevel);
        }
        let expected = level_for_xp(xp);
        if level != expected {
            return Err(ProgressError::LevelMismatch {
                xp,
                level,
                expected,
            });
        }

        let mut badges = initial_badges();
        for id in achieved {
            if let Some(badge) = badges.iter_mut().find(|badge| badge.id() == id) {
                badge.achieve();
            }
        }

        let username = username
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(Self {
            username,
            xp,
            level,
            topics_completed,
            badges,
            activity_log,
        })
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Sets the player name shown on the leaderboard.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::EmptyUsername` if the trimmed name is empty.
    pub fn set_username(&mut self, name: &str) -> Result<(), ProgressError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ProgressError::EmptyUsername);
        }
        self.username = Some(trimmed.to_string());
        Ok(())
    }

    #[must_use]
    pub fn xp(&self) -> u32 {
        self.xp
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn topics_completed(&self) -> u32 {
        self.topics_completed
    }

    /// Topic count a badge check should use when the award being applied
    /// belongs to a topic that is about to be completed.
    #[must_use]
    pub fn prospective_topics(&self) -> u32 {
        self.topics_completed.saturating_add(1)
    }

    #[must_use]
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn badges_in(&self, category: BadgeCategory) -> impl Iterator<Item = &Badge> {
        self.badges
            .iter()
            .filter(move |badge| badge.category() == category)
    }

    #[must_use]
    pub fn badge(&self, id: &str) -> Option<&Badge> {
        self.badges.iter().find(|badge| badge.id() == id)
    }

    pub fn achieved_badges(&self) -> impl Iterator<Item = &Badge> {
        self.badges.iter().filter(|badge| badge.is_achieved())
    }

    #[must_use]
    pub fn achieved_badge_count(&self) -> usize {
        self.achieved_badges().count()
    }

    /// Most recent entry first.
    #[must_use]
    pub fn activity_log(&self) -> &[ActivityLogEntry] {
        &self.activity_log
    }
}
