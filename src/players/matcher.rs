use std::collections::HashMap;

use log::{debug, info};

use crate::domain::{TournamentPlayer, UserId, UserRow};

/// Lookup from case-folded username/display name to user id.
///
/// When two roster entries fold to the same name the first one wins. Rosters
/// are not expected to contain such duplicates.
#[derive(Debug, Default)]
pub struct RosterIndex {
    by_name: HashMap<String, UserId>,
}

impl RosterIndex {
    pub fn build(roster: &[UserRow]) -> Self {
        let mut by_name = HashMap::with_capacity(roster.len() * 2);

        for user in roster {
            for name in [&user.username, &user.display_name].into_iter().flatten() {
                if let Some(key) = fold(name) {
                    by_name.entry(key).or_insert(user.id);
                }
            }
        }

        debug!("Built roster index with {} names for {} users", by_name.len(), roster.len());
        Self { by_name }
    }

    pub fn resolve(&self, candidate: &str) -> Option<UserId> {
        let key = fold(candidate)?;
        self.by_name.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn fold(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Resolve one name against a roster by exact, case-insensitive comparison
pub fn match_player_name(candidate: &str, roster: &[UserRow]) -> Option<UserId> {
    let key = fold(candidate)?;

    roster
        .iter()
        .find(|user| {
            [&user.username, &user.display_name]
                .into_iter()
                .flatten()
                .any(|name| fold(name).as_deref() == Some(key.as_str()))
        })
        .map(|user| user.id)
}

/// Resolve many names while indexing the roster once
pub fn match_player_names<S: AsRef<str>>(
    candidates: &[S],
    roster: &[UserRow],
) -> HashMap<String, Option<UserId>> {
    let index = RosterIndex::build(roster);

    candidates
        .iter()
        .map(|name| {
            let name = name.as_ref();
            (name.to_string(), index.resolve(name))
        })
        .collect()
}

/// Fill in user ids on imported players; returns how many were matched
pub fn link_players(players: &mut [TournamentPlayer], index: &RosterIndex) -> usize {
    let mut matched = 0;
    for player in players.iter_mut() {
        player.user_id = index.resolve(&player.name);
        if player.user_id.is_some() {
            matched += 1;
        }
    }
    info!("  → Matched {}/{} players to accounts", matched, players.len());
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId, username: Option<&str>, display_name: Option<&str>) -> UserRow {
        UserRow {
            id,
            username: username.map(str::to_string),
            display_name: display_name.map(str::to_string),
        }
    }

    fn roster() -> Vec<UserRow> {
        vec![
            user(1, Some("alice"), Some("Alice Liddell")),
            user(2, Some("bob"), None),
            user(3, None, Some("Carol Danvers")),
        ]
    }

    #[test]
    fn test_exact_case_insensitive_match() {
        let roster = roster();
        assert_eq!(match_player_name("ALICE", &roster), Some(1));
        assert_eq!(match_player_name("alice liddell", &roster), Some(1));
        assert_eq!(match_player_name("Bob", &roster), Some(2));
        assert_eq!(match_player_name("carol danvers", &roster), Some(3));
    }

    #[test]
    fn test_no_partial_matches() {
        let roster = roster();
        assert_eq!(match_player_name("ali", &roster), None);
        assert_eq!(match_player_name("alice extra", &roster), None);
        assert_eq!(match_player_name("Carol", &roster), None);
    }

    #[test]
    fn test_blank_names_and_empty_roster() {
        let roster = roster();
        assert_eq!(match_player_name("", &roster), None);
        assert_eq!(match_player_name("   \t", &roster), None);
        assert_eq!(match_player_name("alice", &[]), None);
        assert_eq!(RosterIndex::build(&[]).resolve("alice"), None);
    }

    #[test]
    fn test_first_entry_wins_on_duplicates() {
        let roster = vec![user(7, Some("Dana"), None), user(8, None, Some("dana"))];
        assert_eq!(match_player_name("DANA", &roster), Some(7));
        assert_eq!(RosterIndex::build(&roster).resolve("DANA"), Some(7));
    }

    #[test]
    fn test_batch_agrees_with_single_lookup() {
        let roster = roster();
        let names = ["ALICE", "ali", "", "bob", "Carol Danvers", "nobody", "alice extra"];

        let resolved = match_player_names(&names, &roster);

        assert_eq!(resolved.len(), names.len());
        for name in names {
            assert_eq!(resolved[name], match_player_name(name, &roster), "name {:?}", name);
        }
    }

    #[test]
    fn test_link_players() {
        let index = RosterIndex::build(&roster());
        let mut players = vec![
            TournamentPlayer {
                name: "Bob".to_string(),
                faction: None,
                detachment: None,
                placement: 1,
                wins: 3,
                losses: 0,
                draws: 0,
                battle_points: 60.0,
                user_id: None,
            },
            TournamentPlayer {
                name: "Mallory".to_string(),
                faction: None,
                detachment: None,
                placement: 2,
                wins: 0,
                losses: 3,
                draws: 0,
                battle_points: 10.0,
                user_id: Some(99),
            },
        ];

        assert_eq!(link_players(&mut players, &index), 1);
        assert_eq!(players[0].user_id, Some(2));
        assert_eq!(players[1].user_id, None);
    }

    #[test]
    fn test_index_counts_distinct_names() {
        let roster = vec![
            user(1, Some("Ada"), Some("ada")),
            user(2, None, Some("  ")),
            user(3, Some("Bob"), Some("Robert")),
        ];

        let index = RosterIndex::build(&roster);
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
        assert!(RosterIndex::build(&[user(4, None, None)]).is_empty());
    }
}
