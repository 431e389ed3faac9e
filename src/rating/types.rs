use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::RatingSettings;
use crate::domain::UserId;
use crate::errors::RatingError;

pub type PlayerId = UserId;
pub type RatingMap = HashMap<PlayerId, Rating>;

/// Public-scale Glicko-2 rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rating: f64,
    pub deviation: f64,
    pub volatility: f64,
}

impl Rating {
    /// Rating assigned on a player's first rated appearance
    pub fn initial(settings: &RatingSettings) -> Self {
        Self {
            rating: settings.initial_rating,
            deviation: settings.initial_deviation,
            volatility: settings.initial_volatility,
        }
    }

    pub fn validate(&self) -> Result<(), RatingError> {
        if !self.rating.is_finite() {
            return Err(RatingError::InvalidRating(self.rating));
        }
        validate_deviation(self.deviation)?;
        if !(self.volatility.is_finite() && self.volatility > 0.0) {
            return Err(RatingError::InvalidVolatility(self.volatility));
        }
        Ok(())
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_deviation(self.deviation)
    }
}

fn validate_deviation(deviation: f64) -> Result<(), RatingError> {
    if deviation.is_finite() && deviation > 0.0 {
        Ok(())
    } else {
        Err(RatingError::InvalidDeviation(deviation))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    pub fn score(&self) -> f64 {
        match self {
            GameResult::Win => 1.0,
            GameResult::Loss => 0.0,
            GameResult::Draw => 0.5,
        }
    }

    /// The same game seen from the opponent's side
    pub fn inverted(&self) -> Self {
        match self {
            GameResult::Win => GameResult::Loss,
            GameResult::Loss => GameResult::Win,
            GameResult::Draw => GameResult::Draw,
        }
    }
}

/// One game of a rating period, from the rated player's point of view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub opponent_rating: f64,
    pub opponent_deviation: f64,
    pub result: GameResult,
}

impl Outcome {
    pub fn against(opponent: &Rating, result: GameResult) -> Self {
        Self {
            opponent_rating: opponent.rating,
            opponent_deviation: opponent.deviation,
            result,
        }
    }

    pub fn validate(&self) -> Result<(), RatingError> {
        if !self.opponent_rating.is_finite() {
            return Err(RatingError::InvalidRating(self.opponent_rating));
        }
        validate_deviation(self.opponent_deviation)
    }
}

/// Game between two players in a period; `result` is from `player_a`'s side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodGame {
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub result: GameResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Unranked,    // RD >= 250
    Provisional, // 150..250
    Emerging,    // 80..150
    Established, // < 80
}

impl ConfidenceLevel {
    pub fn from_deviation(deviation: f64) -> Self {
        if deviation >= 250.0 {
            ConfidenceLevel::Unranked
        } else if deviation >= 150.0 {
            ConfidenceLevel::Provisional
        } else if deviation >= 80.0 {
            ConfidenceLevel::Emerging
        } else {
            ConfidenceLevel::Established
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConfidenceLevel::Unranked => "unranked",
            ConfidenceLevel::Provisional => "provisional",
            ConfidenceLevel::Emerging => "emerging",
            ConfidenceLevel::Established => "established",
        }
    }
}
