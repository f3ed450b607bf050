//! JSON shape of the persisted progress value.
//!
//! Field names are camelCase so a snapshot written by the browser client
//! loads unchanged. Every field is optional on read; missing values fall back
//! to a fresh profile's defaults.

use chrono::{DateTime, Utc};
use sabelo_core::model::{ActivityLogEntry, Badge, Progress};
use sabelo_core::progression::level_for_xp;
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub achieved: bool,
}

impl BadgeRecord {
    #[must_use]
    pub fn from_badge(badge: &Badge) -> Self {
        Self {
            id: badge.id().to_string(),
            name: badge.name().to_string(),
            description: badge.description().to_string(),
            category: badge.category().label().to_string(),
            achieved: badge.is_achieved(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub activity_name: String,
    #[serde(default)]
    pub xp_gained: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub xp: u32,
    /// Absent in hand-edited snapshots; derived from `xp` when missing.
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub badges: Vec<BadgeRecord>,
    #[serde(default)]
    pub topics_completed: u32,
    #[serde(default)]
    pub activity_log: Vec<ActivityRecord>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn from_progress(progress: &Progress) -> Self {
        Self {
            username: progress.username().map(str::to_string),
            xp: progress.xp(),
            level: Some(progress.level()),
            badges: progress.badges().iter().map(BadgeRecord::from_badge).collect(),
            topics_completed: progress.topics_completed(),
            activity_log: progress
                .activity_log()
                .iter()
                .map(|entry| ActivityRecord {
                    activity_name: entry.activity_name.clone(),
                    xp_gained: entry.xp_gained,
                    timestamp: entry.timestamp,
                })
                .collect(),
        }
    }

    /// Rebuild domain progress. Only the `achieved` flag of each badge is
    /// restored; names and rules always come from the current catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` when the stored level contradicts
    /// the stored XP.
    pub fn into_progress(self) -> Result<Progress, StorageError> {
        let level = self.level.unwrap_or_else(|| level_for_xp(self.xp));
        let achieved = self
            .badges
            .iter()
            .filter(|badge| badge.achieved)
            .map(|badge| badge.id.as_str());
        let activity_log = self
            .activity_log
            .into_iter()
            .map(|record| {
                ActivityLogEntry::new(record.activity_name, record.xp_gained, record.timestamp)
            })
            .collect();

        Progress::from_persisted(
            self.username,
            self.xp,
            level,
            self.topics_completed,
            achieved,
            activity_log,
        )
        .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed JSON.
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))
    }
}
