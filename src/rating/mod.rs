pub mod glicko2;
pub mod period;
pub mod types;
pub mod volatility;

pub use glicko2::update_rating;
pub use period::process_period;
pub use types::{ConfidenceLevel, GameResult, Outcome, PeriodGame, PlayerId, Rating, RatingMap};
