use std::path::PathBuf;

pub const CACHE_DIR_ENV: &str = "MUSTER_CACHE_DIR";

#[derive(Debug, Clone)]
pub struct RatingSettings {
    pub initial_rating: f64,
    pub initial_deviation: f64,
    pub initial_volatility: f64,
    /// System constant constraining volatility change between periods
    pub tau: f64,
    pub convergence_tolerance: f64,
    pub max_iterations: usize,
    /// Floor applied to RD after a rated period
    pub min_deviation: f64,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            initial_rating: 1500.0,
            initial_deviation: 350.0,
            initial_volatility: 0.06,
            tau: 0.5,
            convergence_tolerance: 1e-6,
            max_iterations: 100,
            min_deviation: 30.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub cache_dir: PathBuf,
    pub catalog_extensions: Vec<&'static str>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        let cache_dir = std::env::var(CACHE_DIR_ENV).unwrap_or_else(|_| "cache".to_string());
        Self {
            cache_dir: PathBuf::from(cache_dir),
            catalog_extensions: vec!["cat", "gst", "xml"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rating: RatingSettings,
    pub import: ImportSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            rating: RatingSettings::default(),
            import: ImportSettings::default(),
        }
    }
}

// Passed explicitly to services rather than read from a global.
