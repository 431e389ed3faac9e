use std::collections::{BTreeSet, HashMap};

use log::{info, warn};
use rayon::prelude::*;

use super::glicko2::update_rating;
use super::types::{Outcome, PeriodGame, PlayerId, Rating, RatingMap};
use crate::config::RatingSettings;
use crate::errors::RatingError;

/// Rate every player for one completed period.
///
/// Runs in three phases: outcomes are gathered against a frozen snapshot of
/// pre-period ratings, every player is updated in parallel from that
/// snapshot, and the results are committed into a new map. Players in `prior`
/// without games receive the idle-period update; players first seen in
/// `games` start from the initial rating.
pub fn process_period(
    prior: &RatingMap,
    games: &[PeriodGame],
    settings: &RatingSettings,
) -> Result<RatingMap, RatingError> {
    info!("Rating period with {} games, {} previously rated players", games.len(), prior.len());

    let snapshot = build_snapshot(prior, games, settings);
    let outcomes = collect_outcomes(&snapshot, games);

    let players: Vec<PlayerId> = snapshot.keys().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let updates = players
        .par_iter()
        .map(|id| {
            let player_outcomes = outcomes.get(id).map(Vec::as_slice).unwrap_or(&[]);
            update_rating(&snapshot[id], player_outcomes, settings).map(|rating| (*id, rating))
        })
        .collect::<Result<Vec<_>, RatingError>>()?;

    let committed: RatingMap = updates.into_iter().collect();
    info!("  → Updated {} ratings", committed.len());
    Ok(committed)
}

fn build_snapshot(prior: &RatingMap, games: &[PeriodGame], settings: &RatingSettings) -> RatingMap {
    let mut snapshot = prior.clone();
    for game in games {
        for id in [game.player_a, game.player_b] {
            snapshot
                .entry(id)
                .or_insert_with(|| Rating::initial(settings));
        }
    }
    snapshot
}

fn collect_outcomes(snapshot: &RatingMap, games: &[PeriodGame]) -> HashMap<PlayerId, Vec<Outcome>> {
    let mut outcomes: HashMap<PlayerId, Vec<Outcome>> = HashMap::new();

    for game in games {
        if game.player_a == game.player_b {
            warn!("Ignoring game of player {} against themselves", game.player_a);
            continue;
        }
        let a = &snapshot[&game.player_a];
        let b = &snapshot[&game.player_b];

        outcomes
            .entry(game.player_a)
            .or_default()
            .push(Outcome::against(b, game.result));
        outcomes
            .entry(game.player_b)
            .or_default()
            .push(Outcome::against(a, game.result.inverted()));
    }

    outcomes
}
