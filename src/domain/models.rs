use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity of a user account in the external user store
pub type UserId = i64;

// --- Catalog ---

/// One army unit extracted from a catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitProfile {
    pub content_id: String,
    pub name: String,
    pub faction: String,
    pub weapons: Vec<WeaponProfile>,
    pub keywords: Vec<String>,
    pub abilities: Vec<String>,
    pub points: u32,
}

/// Weapon carried by a unit. Characteristics are kept as printed ("D6+1", "3+").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub name: String,
    pub range: String,
    pub attacks: String,
    pub skill: String,
    pub strength: String,
    pub armour_penetration: String,
    pub damage: String,
    pub abilities: Vec<WeaponAbility>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum WeaponAbility {
    Assault,
    Heavy,
    Pistol,
    Torrent,
    LethalHits,
    DevastatingWounds,
    TwinLinked,
    IgnoresCover,
    Precision,
    Blast,
    Hazardous,
    Lance,
    IndirectFire,
    Psychic,
    ExtraAttacks,
    OneShot,
    RapidFire(String),
    SustainedHits(String),
    Melta(String),
    Anti { keyword: String, threshold: String },
    Other(String),
}

// --- Tournaments ---

/// Export dialects accepted by the tournament importer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Best Coast Pairings placings export (no event metadata)
    BestCoast,
    /// tabletop.to results export (no event metadata)
    Tabletop,
    /// Spreadsheet with optional event/date columns, possibly several events
    Generic,
}

impl TournamentFormat {
    pub fn label(&self) -> &'static str {
        match self {
            TournamentFormat::BestCoast => "Best Coast",
            TournamentFormat::Tabletop => "Tabletop",
            TournamentFormat::Generic => "Generic",
        }
    }

    /// Whether exports in this dialect carry event name and date themselves
    pub fn embeds_event_metadata(&self) -> bool {
        matches!(self, TournamentFormat::Generic)
    }
}

/// Event name and date supplied alongside an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event_name: String,
    pub event_date: NaiveDate,
}

impl EventMetadata {
    pub fn new(event_name: impl Into<String>, event_date: NaiveDate) -> Self {
        Self {
            event_name: event_name.into(),
            event_date,
        }
    }
}

/// One imported event in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub event_name: String,
    pub event_date: NaiveDate,
    pub players: Vec<TournamentPlayer>,
    pub source_format: TournamentFormat,
}

impl TournamentRecord {
    /// Replace placeholder metadata with operator-supplied values
    pub fn apply_metadata(&mut self, metadata: &EventMetadata) {
        self.event_name = metadata.event_name.clone();
        self.event_date = metadata.event_date;
    }

    pub fn total_games(&self) -> u32 {
        self.players.iter().map(TournamentPlayer::games_played).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentPlayer {
    pub name: String,
    pub faction: Option<String>,
    pub detachment: Option<String>,
    pub placement: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub battle_points: f64,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl TournamentPlayer {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }
}

// --- Users ---

/// Read-only snapshot of an account, as supplied by the user store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}
