use std::path::Path;

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::RatingSettings;
use crate::errors::{read_to_string, with_parse_context};
use crate::rating::{process_period, ConfidenceLevel, PeriodGame, PlayerId, Rating, RatingMap};

/// A player's rating as exchanged with the storage layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedPlayer {
    pub player_id: PlayerId,
    #[serde(flatten)]
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRow {
    pub player_id: PlayerId,
    #[serde(flatten)]
    pub rating: Rating,
    pub confidence_level: ConfidenceLevel,
}

pub struct RatingPeriodService {
    settings: RatingSettings,
}

impl RatingPeriodService {
    pub fn new(settings: RatingSettings) -> Self {
        Self { settings }
    }

    /// Rate one period from JSON files and write the ranked result
    pub fn run(&self, prior_path: Option<&Path>, games_path: &Path, output_path: &Path) -> Result<Vec<RatingRow>> {
        info!("=== Starting Rating Period ===\n");

        let prior = match prior_path {
            Some(path) => load_prior(path)?,
            None => RatingMap::new(),
        };
        let games = load_games(games_path)?;
        info!("  → Loaded {} prior ratings and {} games\n", prior.len(), games.len());

        let updated = process_period(&prior, &games, &self.settings)?;
        let rows = ranked(&updated);

        let json = serde_json::to_string_pretty(&rows)?;
        std::fs::write(output_path, json)?;
        info!("=== Rating Period Complete: {} players ===", rows.len());
        Ok(rows)
    }
}

fn load_prior(path: &Path) -> Result<RatingMap> {
    let json = read_to_string(path)?;
    let players: Vec<RatedPlayer> = with_parse_context(serde_json::from_str(&json), "prior ratings")?;
    Ok(players.into_iter().map(|p| (p.player_id, p.rating)).collect())
}

fn load_games(path: &Path) -> Result<Vec<PeriodGame>> {
    let json = read_to_string(path)?;
    with_parse_context(serde_json::from_str(&json), "period games")
}

/// Highest rating first; ties broken by player id
pub fn ranked(ratings: &RatingMap) -> Vec<RatingRow> {
    let mut rows: Vec<RatingRow> = ratings
        .iter()
        .map(|(&player_id, &rating)| RatingRow {
            player_id,
            rating,
            confidence_level: rating.confidence_level(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.rating
            .rating
            .total_cmp(&a.rating.rating)
            .then(a.player_id.cmp(&b.player_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_period_from_files() {
        let dir = TempDir::new().unwrap();
        let prior_path = dir.path().join("prior.json");
        let games_path = dir.path().join("games.json");
        let output_path = dir.path().join("ratings.json");
        fs::write(
            &prior_path,
            r#"[{"player_id": 1, "rating": 1500.0, "deviation": 200.0, "volatility": 0.06}]"#,
        )
        .unwrap();
        fs::write(
            &games_path,
            r#"[{"player_a": 1, "player_b": 2, "result": "win"},
                {"player_a": 3, "player_b": 1, "result": "draw"}]"#,
        )
        .unwrap();

        let rows = RatingPeriodService::new(RatingSettings::default())
            .run(Some(&prior_path), &games_path, &output_path)
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].player_id, 1);
        assert!(output_path.exists());
    }

    #[test]
    fn test_invalid_prior_is_rejected() {
        let dir = TempDir::new().unwrap();
        let prior_path = dir.path().join("prior.json");
        let games_path = dir.path().join("games.json");
        fs::write(
            &prior_path,
            r#"[{"player_id": 1, "rating": 1500.0, "deviation": -1.0, "volatility": 0.06}]"#,
        )
        .unwrap();
        fs::write(&games_path, "[]").unwrap();

        let result = RatingPeriodService::new(RatingSettings::default()).run(
            Some(&prior_path),
            &games_path,
            &dir.path().join("out.json"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_ranked_order() {
        let ratings: RatingMap = [
            (5, Rating { rating: 1400.0, deviation: 100.0, volatility: 0.06 }),
            (2, Rating { rating: 1600.0, deviation: 60.0, volatility: 0.06 }),
            (1, Rating { rating: 1400.0, deviation: 300.0, volatility: 0.06 }),
        ]
        .into_iter()
        .collect();

        let order: Vec<PlayerId> = ranked(&ratings).iter().map(|r| r.player_id).collect();
        assert_eq!(order, vec![2, 1, 5]);
    }
}
