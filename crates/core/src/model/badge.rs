use serde::{Deserialize, Serialize};
use std::fmt;

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Grouping used when badges are listed on the dashboard.
///
/// Serialized with the Spanish labels so persisted snapshots stay readable by
/// older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeCategory {
    #[serde(rename = "Temas Completados")]
    Topics,
    #[serde(rename = "XP Acumulado")]
    Xp,
    #[serde(rename = "Niveles Alcanzados")]
    Levels,
    #[serde(rename = "Desafíos Especiales")]
    Challenges,
}

impl BadgeCategory {
    /// Categories in dashboard order.
    pub const ALL: [BadgeCategory; 4] = [
        BadgeCategory::Topics,
        BadgeCategory::Xp,
        BadgeCategory::Levels,
        BadgeCategory::Challenges,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BadgeCategory::Topics => "Temas Completados",
            BadgeCategory::Xp => "XP Acumulado",
            BadgeCategory::Levels => "Niveles Alcanzados",
            BadgeCategory::Challenges => "Desafíos Especiales",
        }
    }
}

impl fmt::Display for BadgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── RULES ─────────────────────────────────────────────────────────────────────
//

/// Activation rule carried by each catalog badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeRule {
    XpThreshold(u32),
    LevelThreshold(u32),
    TopicThreshold(u32),
    /// Challenge badges have no rule the progression engine can evaluate.
    CustomChallenge(&'static str),
}

impl BadgeRule {
    #[must_use]
    pub fn category(self) -> BadgeCategory {
        match self {
            BadgeRule::XpThreshold(_) => BadgeCategory::Xp,
            BadgeRule::LevelThreshold(_) => BadgeCategory::Levels,
            BadgeRule::TopicThreshold(_) => BadgeCategory::Topics,
            BadgeRule::CustomChallenge(_) => BadgeCategory::Challenges,
        }
    }

    /// Returns true when the rule holds for the given totals.
    #[must_use]
    pub fn is_satisfied(self, xp: u32, level: u32, topics_completed: u32) -> bool {
        match self {
            BadgeRule::XpThreshold(required) => xp >= required,
            BadgeRule::LevelThreshold(required) => level >= required,
            BadgeRule::TopicThreshold(required) => topics_completed >= required,
            BadgeRule::CustomChallenge(_) => false,
        }
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Static description of an unlockable badge.
#[derive(Debug, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rule: BadgeRule,
}

impl BadgeDefinition {
    #[must_use]
    pub fn category(&self) -> BadgeCategory {
        self.rule.category()
    }
}

macro_rules! badge {
    ($id:literal, $name:literal, $description:literal, $rule:expr) => {
        BadgeDefinition {
            id: $id,
            name: $name,
            description: $description,
            rule: $rule,
        }
    };
}

/// Every badge, in evaluation order. The first badge unlocked by an XP award
/// in this order is the one announced to the user.
pub static BADGE_CATALOG: [BadgeDefinition; 20] = [
    badge!("topic_1", "Primera Entrega", "Completaste tu primer tema.", BadgeRule::TopicThreshold(1)),
    badge!("topic_5", "Ritmo Constante", "Completaste 5 temas.", BadgeRule::TopicThreshold(5)),
    badge!("topic_10", "Compulsivo", "Completaste 10 temas.", BadgeRule::TopicThreshold(10)),
    badge!("topic_20", "Maratón de estudio", "Completaste 20 temas.", BadgeRule::TopicThreshold(20)),
    badge!("topic_50", "Mente brillante", "Completaste 50 temas.", BadgeRule::TopicThreshold(50)),
    badge!("xp_130", "Primer paso", "Alcanzaste 130 XP.", BadgeRule::XpThreshold(130)),
    badge!("xp_500", "Explorador", "Alcanzaste 500 XP.", BadgeRule::XpThreshold(500)),
    badge!("xp_1000", "Avanzado", "Alcanzaste 1.000 XP.", BadgeRule::XpThreshold(1000)),
    badge!("xp_2000", "Maestro", "Alcanzaste 2.000 XP.", BadgeRule::XpThreshold(2000)),
    badge!("xp_5000", "Leyenda", "Alcanzaste 5.000 XP.", BadgeRule::XpThreshold(5000)),
    badge!("level_2", "Nivelado", "Alcanzaste Nivel 2.", BadgeRule::LevelThreshold(2)),
    badge!("level_4", "Ascendente", "Alcanzaste Nivel 4.", BadgeRule::LevelThreshold(4)),
    badge!("level_6", "Avanzado", "Alcanzaste Nivel 6.", BadgeRule::LevelThreshold(6)),
    badge!("level_10", "Experto", "Alcanzaste Nivel 10.", BadgeRule::LevelThreshold(10)),
    badge!("level_15", "Imparable", "Alcanzaste Nivel 15.", BadgeRule::LevelThreshold(15)),
    badge!("challenge_streak", "Racha activa", "Estudiaste 3 días seguidos.", BadgeRule::CustomChallenge("streak")),
    badge!("challenge_daily", "Contrarreloj", "Completaste 3 temas en un solo día.", BadgeRule::CustomChallenge("daily")),
    badge!("challenge_top3", "Competidor", "Entraste al Top 3 del ranking.", BadgeRule::CustomChallenge("top3")),
    badge!("challenge_5_badges", "Estratega", "Desbloqueaste 5 insignias diferentes.", BadgeRule::CustomChallenge("5_badges")),
    badge!("challenge_all_badges", "Dominador", "Desbloqueaste todas las insignias.", BadgeRule::CustomChallenge("all_badges")),
];

/// Looks up a catalog entry by its string id.
#[must_use]
pub fn find_badge(id: &str) -> Option<&'static BadgeDefinition> {
    BADGE_CATALOG.iter().find(|def| def.id == id)
}

//
// ─── BADGE STATE ───────────────────────────────────────────────────────────────
//

/// A catalog badge together with the user's unlock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    definition: &'static BadgeDefinition,
    achieved: bool,
}

impl Badge {
    #[must_use]
    pub fn locked(definition: &'static BadgeDefinition) -> Self {
        Self {
            definition,
            achieved: false,
        }
    }

    #[must_use]
    pub fn definition(&self) -> &'static BadgeDefinition {
        self.definition
    }

    #[must_use]
    pub fn id(&self) -> &'static str {
        self.definition.id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.definition.name
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        self.definition.description
    }

    #[must_use]
    pub fn category(&self) -> BadgeCategory {
        self.definition.category()
    }

    #[must_use]
    pub fn is_achieved(&self) -> bool {
        self.achieved
    }

    /// Marks the badge as achieved. There is no way back to locked.
    pub(crate) fn achieve(&mut self) {
        self.achieved = true;
    }
}

/// All catalog badges in the locked state.
#[must_use]
pub fn initial_badges() -> Vec<Badge> {
    BADGE_CATALOG.iter().map(Badge::locked).collect()
}
