use std::fmt;

/// Name shown for the player before a username is chosen.
pub const DEFAULT_PLAYER_NAME: &str = "Tú";

/// A fixed competitor on the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: &'static str,
    pub level: u32,
    pub xp: u32,
}

const fn entry(name: &'static str, level: u32, xp: u32) -> RosterEntry {
    RosterEntry { name, level, xp }
}

/// Competitors the player is ranked against.
pub const MOCK_ROSTER: [RosterEntry; 12] = [
    entry("SabelotodoSupremo", 15, 3050),
    entry("Cerebrito", 14, 2890),
    entry("MaestroDelQuiz", 12, 2510),
    entry("EstudianteEstrella", 11, 2240),
    entry("MenteBrillante", 10, 2080),
    entry("EstudiosoPro", 8, 1750),
    entry("ElIluminado", 7, 1520),
    entry("SumaPuntos", 6, 1240),
    entry("CazadorDeLogros", 4, 880),
    entry("AprendizConstante", 3, 650),
    entry("NovatoEstelar", 2, 410),
    entry("ElPersistente", 1, 150),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardUser {
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub rank: usize,
    pub is_current: bool,
}

impl LeaderboardUser {
    #[must_use]
    pub fn rank_display(&self) -> RankDisplay {
        RankDisplay::for_rank(self.rank)
    }
}

/// Medal for the podium, plain number below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDisplay {
    Medal(&'static str),
    Number(usize),
}

impl RankDisplay {
    #[must_use]
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            1 => RankDisplay::Medal("🥇"),
            2 => RankDisplay::Medal("🥈"),
            3 => RankDisplay::Medal("🥉"),
            n => RankDisplay::Number(n),
        }
    }
}

impl fmt::Display for RankDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankDisplay::Medal(glyph) => f.write_str(glyph),
            RankDisplay::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Motivational line shown above the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardHint {
    /// `points` more XP passes `name`, the next user above.
    Overtake { name: String, points: u32 },
    /// The player leads a board with at least one other user.
    TopOfBoard,
}

impl fmt::Display for LeaderboardHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderboardHint::Overtake { name, points } => {
                write!(f, "¡Te faltan {points} puntos para superar a {name}!")
            }
            LeaderboardHint::TopOfBoard => {
                f.write_str("¡Estás en la cima! ¡Mantené la racha! 🚀")
            }
        }
    }
}

/// Ranked view of the roster plus the current player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    users: Vec<LeaderboardUser>,
    current: usize,
}

impl Leaderboard {
    /// Rank `roster` together with the player.
    ///
    /// Sorting is stable and descending by XP, so on equal XP roster entries
    /// keep their order and stay ahead of the player, who is appended last.
    #[must_use]
    pub fn rank(roster: &[RosterEntry], player_name: Option<&str>, level: u32, xp: u32) -> Self {
        let mut users: Vec<LeaderboardUser> = roster
            .iter()
            .map(|entry| LeaderboardUser {
                name: entry.name.to_string(),
                level: entry.level,
                xp: entry.xp,
                rank: 0,
                is_current: false,
            })
            .collect();
        users.push(LeaderboardUser {
            name: player_name.unwrap_or(DEFAULT_PLAYER_NAME).to_string(),
            level,
            xp,
            rank: 0,
            is_current: true,
        });

        users.sort_by(|a, b| b.xp.cmp(&a.xp));
        for (index, user) in users.iter_mut().enumerate() {
            user.rank = index + 1;
        }
        let current = users.iter().position(|u| u.is_current).unwrap_or(0);

        Self { users, current }
    }

    /// Rank the player against [`MOCK_ROSTER`].
    #[must_use]
    pub fn with_mock_roster(player_name: Option<&str>, level: u32, xp: u32) -> Self {
        Self::rank(&MOCK_ROSTER, player_name, level, xp)
    }

    #[must_use]
    pub fn users(&self) -> &[LeaderboardUser] {
        &self.users
    }

    #[must_use]
    pub fn current_user(&self) -> &LeaderboardUser {
        &self.users[self.current]
    }

    /// XP still needed to pass the next user up; zero when already first.
    #[must_use]
    pub fn points_to_overtake(&self) -> u32 {
        if self.current == 0 {
            return 0;
        }
        let above = &self.users[self.current - 1];
        above.xp.saturating_sub(self.current_user().xp)
    }

    #[must_use]
    pub fn hint(&self) -> Option<LeaderboardHint> {
        if self.current == 0 {
            return (self.users.len() > 1).then_some(LeaderboardHint::TopOfBoard);
        }
        let points = self.points_to_overtake();
        (points > 0).then(|| LeaderboardHint::Overtake {
            name: self.users[self.current - 1].name.clone(),
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_above_top_roster_entry_ranks_first() {
        let board = Leaderboard::with_mock_roster(Some("Ana"), 16, 3060);
        assert_eq!(board.current_user().rank, 1);
        assert_eq!(board.users()[1].name, "SabelotodoSupremo");
        assert_eq!(board.points_to_overtake(), 0);
        assert_eq!(board.hint(), Some(LeaderboardHint::TopOfBoard));
    }

    #[test]
    fn player_below_everyone_ranks_last() {
        let board = Leaderboard::with_mock_roster(None, 1, 100);
        let me = board.current_user();
        assert_eq!(me.rank, 13);
        assert_eq!(me.name, DEFAULT_PLAYER_NAME);
        assert_eq!(board.points_to_overtake(), 50);
        assert_eq!(
            board.hint(),
            Some(LeaderboardHint::Overtake {
                name: "ElPersistente".into(),
                points: 50
            })
        );
    }

    #[test]
    fn ties_keep_roster_ahead_of_player() {
        let board = Leaderboard::with_mock_roster(Some("Ana"), 3, 650);
        let me = board.current_user();
        assert_eq!(me.rank, 11);
        assert_eq!(board.users()[9].name, "AprendizConstante");
        // Equal XP leaves nothing to show.
        assert_eq!(board.points_to_overtake(), 0);
        assert_eq!(board.hint(), None);
    }

    #[test]
    fn ranks_are_contiguous_and_sorted() {
        let board = Leaderboard::with_mock_roster(Some("Ana"), 5, 900);
        for (index, user) in board.users().iter().enumerate() {
            assert_eq!(user.rank, index + 1);
        }
        assert!(board.users().windows(2).all(|w| w[0].xp >= w[1].xp));
    }

    #[test]
    fn player_sharing_a_roster_name_is_still_identified() {
        let board = Leaderboard::with_mock_roster(Some("Cerebrito"), 1, 0);
        assert!(board.current_user().is_current);
        assert_eq!(board.current_user().xp, 0);
    }

    #[test]
    fn rank_display_uses_medals_for_podium() {
        assert_eq!(RankDisplay::for_rank(1).to_string(), "🥇");
        assert_eq!(RankDisplay::for_rank(3).to_string(), "🥉");
        assert_eq!(RankDisplay::for_rank(4).to_string(), "4");
    }

    #[test]
    fn lone_player_gets_no_hint() {
        let board = Leaderboard::rank(&[], Some("Ana"), 1, 0);
        assert_eq!(board.current_user().rank, 1);
        assert_eq!(board.hint(), None);
    }
}
