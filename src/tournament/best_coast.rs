use anyhow::{Context, Result};
use log::info;

use super::columns::{assign_placements, read_rows, ColumnAliases};
use crate::domain::{EventMetadata, TournamentFormat, TournamentRecord};

/// Placings export: one event per file, no event name or date inside
pub const COLUMNS: ColumnAliases = ColumnAliases {
    name: &["name", "playername", "player"],
    first_name: &["firstname", "first"],
    last_name: &["lastname", "last"],
    faction: &["faction", "army", "armyfaction"],
    detachment: &["detachment", "subfaction"],
    army_list: &["armylist", "list"],
    placement: &["rank", "placing", "place", "position"],
    wins: &["wins", "win", "w"],
    losses: &["losses", "loss", "l"],
    draws: &["draws", "ties", "draw", "tie", "d", "t"],
    record: &["record", "wld", "wlt"],
    battle_points: &["battlepoints", "totalbattlepoints", "bp", "points"],
    event_name: &[],
    event_date: &[],
};

pub fn parse(raw: &str, metadata: &EventMetadata) -> Result<TournamentRecord> {
    let rows = read_rows(raw, &COLUMNS).context("Failed to parse Best Coast export")?;
    let players = assign_placements(rows);
    info!("  → Best Coast export: {} players", players.len());

    Ok(TournamentRecord {
        event_name: metadata.event_name.clone(),
        event_date: metadata.event_date,
        players,
        source_format: TournamentFormat::BestCoast,
    })
}
