use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{info, warn};

use crate::cache::Cache;
use crate::config::ImportSettings;
use crate::domain::{EventMetadata, TournamentFormat, TournamentRecord, UserRow};
use crate::errors::{read_to_string, with_parse_context};
use crate::players::{link_players, RosterIndex};
use crate::tournament::import_tournament;

pub struct TournamentImportRequest {
    pub export_path: PathBuf,
    pub format: TournamentFormat,
    pub metadata: Option<EventMetadata>,
    pub roster_path: Option<PathBuf>,
}

pub struct TournamentImportService {
    cache: Cache,
}

impl TournamentImportService {
    pub fn new(settings: &ImportSettings) -> Result<Self> {
        Ok(Self {
            cache: Cache::new(&settings.cache_dir)?,
        })
    }

    pub fn run(&self, request: &TournamentImportRequest) -> Result<Vec<TournamentRecord>> {
        info!("=== Starting Tournament Import ===\n");

        let raw = read_to_string(&request.export_path)?;
        let mut records = import_tournament(&raw, request.format, request.metadata.clone())?;
        info!("  → Parsed {} event(s)\n", records.len());

        if let Some(roster_path) = &request.roster_path {
            let roster = load_roster(roster_path)?;
            let index = RosterIndex::build(&roster);
            if index.is_empty() {
                warn!("Roster {} names no users; players left unlinked", roster_path.display());
            } else {
                info!("  → Roster indexed {} names\n", index.len());
                for record in &mut records {
                    link_players(&mut record.players, &index);
                }
            }
        }

        let key = cache_key(&request.export_path);
        self.cache.save_parsed(&key, &records)?;

        info!("=== Tournament Import Complete ===");
        Ok(records)
    }
}

pub fn load_roster(path: &Path) -> Result<Vec<UserRow>> {
    let json = read_to_string(path)?;
    with_parse_context(serde_json::from_str(&json), "user roster")
}

fn cache_key(export_path: &Path) -> String {
    let stem = export_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    format!("tournament_{}", stem)
}
