pub mod settings;

pub use settings::{AppConfig, ImportSettings, RatingSettings};
