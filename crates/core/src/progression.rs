//! XP accounting, level derivation and badge unlocking.
//!
//! Everything here is a pure function over an explicit [`Progress`] value;
//! callers own persistence and notification.

use chrono::{DateTime, Utc};

use crate::model::{ActivityLogEntry, BadgeDefinition, Progress};

/// XP needed per level.
pub const XP_TO_LEVEL_UP: u32 = 200;
/// Fixed award for finishing a topic's flashcards.
pub const XP_PER_FLASHCARD_SESSION: u32 = 50;
/// Award per correctly answered quiz question.
pub const XP_PER_QUIZ_CORRECT_ANSWER: u32 = 20;

/// Level implied by a total XP value. Level 1 starts at 0 XP.
#[must_use]
pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_TO_LEVEL_UP + 1
}

/// XP earned for a quiz with `correct` right answers.
#[must_use]
pub fn quiz_xp(correct: usize) -> u32 {
    u32::try_from(correct)
        .unwrap_or(u32::MAX)
        .saturating_mul(XP_PER_QUIZ_CORRECT_ANSWER)
}

/// Display tier for a level.
#[must_use]
pub fn level_name(level: u32) -> &'static str {
    match level {
        15.. => "Supremo",
        10..=14 => "Avanzado",
        5..=9 => "Intermedio",
        _ => "Principiante",
    }
}

/// Position inside the current level, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub xp_into_level: u32,
    pub xp_for_next: u32,
}

impl LevelProgress {
    #[must_use]
    pub fn of(progress: &Progress) -> Self {
        let floor = (progress.level() - 1).saturating_mul(XP_TO_LEVEL_UP);
        Self {
            xp_into_level: progress.xp().saturating_sub(floor),
            xp_for_next: XP_TO_LEVEL_UP,
        }
    }

    /// Whole percentage, clamped to 100.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.xp_for_next == 0 {
            return 0;
        }
        (self.xp_into_level.saturating_mul(100) / self.xp_for_next).min(100)
    }
}

/// What an XP award changed that the user should hear about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XpEvents {
    /// New level, when the award crossed a level boundary.
    pub level_up: Option<u32>,
    /// The badge to announce: the first one unlocked in catalog order.
    pub unlocked_badge: Option<&'static BadgeDefinition>,
    /// Every badge unlocked by this award, in catalog order.
    pub newly_achieved: Vec<&'static BadgeDefinition>,
}

impl XpEvents {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.level_up.is_none() && self.newly_achieved.is_empty()
    }
}

/// Award `points` XP and re-evaluate every locked badge.
///
/// Topic badges are checked against `prospective_topics` rather than the
/// stored count: an award made while completing a topic must count that topic
/// even though [`complete_topic`] is applied afterwards. Callers pass
/// [`Progress::prospective_topics`] for topic-related awards.
#[must_use]
pub fn apply_xp(
    mut progress: Progress,
    points: u32,
    activity: impl Into<String>,
    prospective_topics: u32,
    at: DateTime<Utc>,
) -> (Progress, XpEvents) {
    let new_xp = progress.xp.saturating_add(points);
    let new_level = level_for_xp(new_xp);

    let mut events = XpEvents::default();
    if new_level > progress.level {
        events.level_up = Some(new_level);
    }

    progress.xp = new_xp;
    progress.level = new_level;
    progress
        .activity_log
        .insert(0, ActivityLogEntry::new(activity, points, at));

    for badge in progress.badges.iter_mut().filter(|b| !b.is_achieved()) {
        let rule = badge.definition().rule;
        if rule.is_satisfied(new_xp, new_level, prospective_topics) {
            badge.achieve();
            events.newly_achieved.push(badge.definition());
        }
    }
    events.unlocked_badge = events.newly_achieved.first().copied();

    (progress, events)
}

/// Count one more completed topic.
#[must_use]
pub fn complete_topic(mut progress: Progress) -> Progress {
    progress.topics_completed = progress.topics_completed.saturating_add(1);
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn award(progress: Progress, points: u32) -> (Progress, XpEvents) {
        let topics = progress.topics_completed();
        apply_xp(progress, points, "test", topics, fixed_now())
    }

    #[test]
    fn level_tracks_xp_after_every_award() {
        let mut progress = Progress::new();
        for points in [0, 1, 199, 200, 57, 1000, 13, 0, 399] {
            let (next, _) = award(progress, points);
            assert_eq!(next.level(), next.xp() / 200 + 1);
            progress = next;
        }
        assert_eq!(progress.xp(), 1869);
    }

    #[test]
    fn fifty_then_one_fifty_levels_up_once() {
        let (progress, first) = award(Progress::new(), 50);
        assert_eq!(first.level_up, None);

        let (progress, second) = award(progress, 150);
        assert_eq!(progress.xp(), 200);
        assert_eq!(progress.level(), 2);
        assert_eq!(second.level_up, Some(2));
    }

    #[test]
    fn activity_log_is_prepended() {
        let (progress, _) = apply_xp(Progress::new(), 50, "Flashcards: A", 1, fixed_now());
        let (progress, _) = apply_xp(progress, 40, "Cuestionario: A", 1, fixed_now());
        let names: Vec<_> = progress
            .activity_log()
            .iter()
            .map(|e| e.activity_name.as_str())
            .collect();
        assert_eq!(names, vec!["Cuestionario: A", "Flashcards: A"]);
        assert_eq!(progress.activity_log()[0].xp_gained, 40);
    }

    #[test]
    fn simultaneous_unlocks_announce_first_in_catalog_order() {
        // 200 xp reaches xp_130 and level_2 in the same award.
        let (progress, events) = award(Progress::new(), 200);
        let ids: Vec<_> = events.newly_achieved.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["xp_130", "level_2"]);
        assert_eq!(events.unlocked_badge.map(|d| d.id), Some("xp_130"));
        assert!(progress.badge("level_2").unwrap().is_achieved());
    }

    #[test]
    fn topic_badge_uses_prospective_count() {
        let progress = Progress::new();
        let prospective = progress.prospective_topics();
        let (progress, events) = apply_xp(progress, 0, "Cuestionario: A", prospective, fixed_now());
        assert_eq!(events.unlocked_badge.map(|d| d.id), Some("topic_1"));
        // The stored counter is untouched until the topic is completed.
        assert_eq!(progress.topics_completed(), 0);
        assert_eq!(complete_topic(progress).topics_completed(), 1);
    }

    #[test]
    fn reevaluation_is_idempotent() {
        let (progress, events) = award(Progress::new(), 600);
        assert!(!events.newly_achieved.is_empty());
        let achieved_before = progress.achieved_badge_count();

        let (progress, again) = award(progress, 0);
        assert!(again.newly_achieved.is_empty());
        assert_eq!(again.unlocked_badge, None);
        assert_eq!(progress.achieved_badge_count(), achieved_before);
    }

    #[test]
    fn achieved_badges_never_revert() {
        let (progress, _) = apply_xp(Progress::new(), 10, "a", 5, fixed_now());
        assert!(progress.badge("topic_5").unwrap().is_achieved());
        // A later award evaluated against a lower topic count keeps the badge.
        let (progress, _) = apply_xp(progress, 10, "b", 0, fixed_now());
        assert!(progress.badge("topic_5").unwrap().is_achieved());
    }

    #[test]
    fn quiz_xp_is_twenty_per_correct_answer() {
        assert_eq!(quiz_xp(0), 0);
        assert_eq!(quiz_xp(3), 60);
        assert_eq!(quiz_xp(5), 100);
    }

    #[test]
    fn level_names_follow_tiers() {
        assert_eq!(level_name(1), "Principiante");
        assert_eq!(level_name(5), "Intermedio");
        assert_eq!(level_name(10), "Avanzado");
        assert_eq!(level_name(15), "Supremo");
        assert_eq!(level_name(40), "Supremo");
    }

    #[test]
    fn level_progress_reports_position_in_level() {
        let (progress, _) = award(Progress::new(), 450);
        let bar = LevelProgress::of(&progress);
        assert_eq!(bar.xp_into_level, 50);
        assert_eq!(bar.xp_for_next, 200);
        assert_eq!(bar.percent(), 25);
    }
}
