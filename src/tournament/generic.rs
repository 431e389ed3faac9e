use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use log::{info, warn};

use super::columns::{assign_placements, read_rows, ColumnAliases, ParsedRow};
use crate::domain::{EventMetadata, TournamentFormat, TournamentRecord};

/// Hand-made spreadsheets. Event and date columns are optional and may
/// describe several events in one file.
pub const COLUMNS: ColumnAliases = ColumnAliases {
    name: &["player", "playername", "name", "participant", "competitor"],
    first_name: &["firstname"],
    last_name: &["lastname", "surname"],
    faction: &["faction", "army", "codex"],
    detachment: &["detachment", "subfaction"],
    army_list: &["armylist", "list", "roster"],
    placement: &["placement", "rank", "place", "position", "standing"],
    wins: &["wins", "win", "w"],
    losses: &["losses", "loss", "l"],
    draws: &["draws", "draw", "ties", "d"],
    record: &["record", "wld"],
    battle_points: &["battlepoints", "points", "bp", "score", "vp"],
    event_name: &["event", "eventname", "tournament", "tournamentname"],
    event_date: &["date", "eventdate", "tournamentdate"],
};

/// Parse a generic export into one record per (event, date).
///
/// Rows that name no event or date take them from `fallback`. Records keep the
/// order in which their events first appear.
pub fn parse(raw: &str, fallback: &EventMetadata) -> Result<Vec<TournamentRecord>> {
    let rows = read_rows(raw, &COLUMNS).context("Failed to parse generic tournament export")?;

    let known_dates = first_dates(&rows);
    let mut events: IndexMap<(String, NaiveDate), Vec<ParsedRow>> = IndexMap::new();
    for row in rows {
        let key = event_key(&row, &known_dates, fallback);
        events.entry(key).or_default().push(row);
    }

    let records: Vec<TournamentRecord> = events
        .into_iter()
        .map(|((event_name, event_date), rows)| TournamentRecord {
            event_name,
            event_date,
            players: assign_placements(rows),
            source_format: TournamentFormat::Generic,
        })
        .collect();

    info!("  → Generic export: {} events", records.len());
    Ok(records)
}

// First readable date seen for each named event
fn first_dates(rows: &[ParsedRow]) -> HashMap<String, NaiveDate> {
    let mut dates = HashMap::new();
    for row in rows {
        if let (Some(name), Some(date)) = (
            row.event_name.as_ref(),
            row.event_date.as_deref().and_then(parse_event_date),
        ) {
            dates.entry(name.clone()).or_insert(date);
        }
    }
    dates
}

/// Undated rows of a named event join that event's dated rows
fn event_key(
    row: &ParsedRow,
    known_dates: &HashMap<String, NaiveDate>,
    fallback: &EventMetadata,
) -> (String, NaiveDate) {
    let name = row
        .event_name
        .clone()
        .unwrap_or_else(|| fallback.event_name.clone());
    let default_date = known_dates.get(&name).copied().unwrap_or(fallback.event_date);

    let date = match row.event_date.as_deref() {
        Some(text) => parse_event_date(text).unwrap_or_else(|| {
            warn!("Unrecognised event date {:?}, using {}", text, default_date);
            default_date
        }),
        None => default_date,
    };

    (name, date)
}

/// Accepts ISO dates, day-first dates and timestamps
pub fn parse_event_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    None
}
