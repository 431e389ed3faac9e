use anyhow::{Context, Result};
use log::info;

use super::columns::{assign_placements, read_rows, ColumnAliases};
use crate::domain::{EventMetadata, TournamentFormat, TournamentRecord};

/// Results table export: single event, usually without a placement column
pub const COLUMNS: ColumnAliases = ColumnAliases {
    name: &["player", "playername", "name", "nickname"],
    first_name: &[],
    last_name: &[],
    faction: &["faction", "army", "codex"],
    detachment: &["detachment"],
    army_list: &["armylist", "roster", "list"],
    placement: &["position", "pos", "rank", "place"],
    wins: &["w", "wins", "won"],
    losses: &["l", "losses", "lost"],
    draws: &["d", "draws", "drawn"],
    record: &[],
    battle_points: &["score", "points", "tournamentpoints", "tp", "battlepoints"],
    event_name: &[],
    event_date: &[],
};

pub fn parse(raw: &str, metadata: &EventMetadata) -> Result<TournamentRecord> {
    let rows = read_rows(raw, &COLUMNS).context("Failed to parse Tabletop export")?;
    let players = assign_placements(rows);
    info!("  → Tabletop export: {} players", players.len());

    Ok(TournamentRecord {
        event_name: metadata.event_name.clone(),
        event_date: metadata.event_date,
        players,
        source_format: TournamentFormat::Tabletop,
    })
}
