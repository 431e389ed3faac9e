use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};

use crate::army_list::extract_detachment;
use crate::domain::TournamentPlayer;

/// Header spellings a dialect uses for each canonical field, in priority order.
/// Spellings are compared after `normalize_header`.
pub struct ColumnAliases {
    pub name: &'static [&'static str],
    pub first_name: &'static [&'static str],
    pub last_name: &'static [&'static str],
    pub faction: &'static [&'static str],
    pub detachment: &'static [&'static str],
    pub army_list: &'static [&'static str],
    pub placement: &'static [&'static str],
    pub wins: &'static [&'static str],
    pub losses: &'static [&'static str],
    pub draws: &'static [&'static str],
    /// Combined "W-L-D" column, used only when the separate counts are absent
    pub record: &'static [&'static str],
    pub battle_points: &'static [&'static str],
    pub event_name: &'static [&'static str],
    pub event_date: &'static [&'static str],
}

/// "Battle Points", "battle_points" and "BATTLEPOINTS" all become "battlepoints"
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ColumnMap {
    name: Option<usize>,
    first_name: Option<usize>,
    last_name: Option<usize>,
    faction: Option<usize>,
    detachment: Option<usize>,
    army_list: Option<usize>,
    placement: Option<usize>,
    wins: Option<usize>,
    losses: Option<usize>,
    draws: Option<usize>,
    record: Option<usize>,
    battle_points: Option<usize>,
    event_name: Option<usize>,
    event_date: Option<usize>,
}

impl ColumnMap {
    pub fn resolve(headers: &StringRecord, aliases: &ColumnAliases) -> Self {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let mut taken = HashSet::new();
        let mut find = |candidates: &[&str]| -> Option<usize> {
            let idx = candidates.iter().find_map(|alias| {
                normalized
                    .iter()
                    .enumerate()
                    .find(|(idx, header)| header.as_str() == *alias && !taken.contains(idx))
                    .map(|(idx, _)| idx)
            })?;
            taken.insert(idx);
            Some(idx)
        };

        Self {
            name: find(aliases.name),
            first_name: find(aliases.first_name),
            last_name: find(aliases.last_name),
            faction: find(aliases.faction),
            detachment: find(aliases.detachment),
            army_list: find(aliases.army_list),
            placement: find(aliases.placement),
            wins: find(aliases.wins),
            losses: find(aliases.losses),
            draws: find(aliases.draws),
            record: find(aliases.record),
            battle_points: find(aliases.battle_points),
            event_name: find(aliases.event_name),
            event_date: find(aliases.event_date),
        }
    }

    pub fn has_player_name(&self) -> bool {
        self.name.is_some() || self.first_name.is_some() || self.last_name.is_some()
    }

    fn has_separate_counts(&self) -> bool {
        self.wins.is_some() || self.losses.is_some() || self.draws.is_some()
    }
}

/// A CSV row mapped to canonical fields, before placements are settled
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub player: TournamentPlayer,
    pub explicit_placement: Option<u32>,
    pub event_name: Option<String>,
    pub event_date: Option<String>,
}

/// Read an export into rows using a dialect's column aliases.
///
/// Rows without a player name, or that the CSV reader cannot decode, are
/// dropped with a warning. Fails when the header row is unreadable or names
/// no player column.
pub fn read_rows(raw: &str, aliases: &ColumnAliases) -> Result<Vec<ParsedRow>> {
    let raw = raw.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    let headers = reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();
    let columns = ColumnMap::resolve(&headers, aliases);
    if !columns.has_player_name() {
        bail!(
            "No player name column among CSV headers: {}",
            headers.iter().collect::<Vec<_>>().join(", ")
        );
    }
    debug!("Resolved CSV columns: {:?}", columns);

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Dropping unreadable CSV row {}: {}", line, e);
                continue;
            }
        };

        match read_row(&record, &columns) {
            Some(row) => rows.push(row),
            None => warn!("Dropping CSV row {}: no player name", line),
        }
    }

    Ok(rows)
}

fn read_row(record: &StringRecord, columns: &ColumnMap) -> Option<ParsedRow> {
    let name = player_name(record, columns)?;
    let field = |idx: Option<usize>| idx.and_then(|i| record.get(i));
    let text = |idx: Option<usize>| optional_text(field(idx));

    let (wins, losses, draws) = if !columns.has_separate_counts() && columns.record.is_some() {
        parse_record(field(columns.record))
    } else {
        (
            parse_count(field(columns.wins)),
            parse_count(field(columns.losses)),
            parse_count(field(columns.draws)),
        )
    };

    let detachment = text(columns.detachment)
        .or_else(|| field(columns.army_list).and_then(extract_detachment));

    Some(ParsedRow {
        player: TournamentPlayer {
            name,
            faction: text(columns.faction),
            detachment,
            placement: 0,
            wins,
            losses,
            draws,
            battle_points: parse_points(field(columns.battle_points)),
            user_id: None,
        },
        explicit_placement: parse_placement(field(columns.placement)),
        event_name: text(columns.event_name),
        event_date: text(columns.event_date),
    })
}

fn player_name(record: &StringRecord, columns: &ColumnMap) -> Option<String> {
    let full = columns
        .name
        .and_then(|i| optional_text(record.get(i)));
    if full.is_some() {
        return full;
    }

    let parts: Vec<&str> = [columns.first_name, columns.last_name]
        .into_iter()
        .flatten()
        .filter_map(|i| record.get(i))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "-")
        .map(str::to_string)
}

/// Win/loss/draw count; anything non-numeric or negative counts as zero
pub fn parse_count(value: Option<&str>) -> u32 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.floor().min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

/// Battle points; anything non-numeric counts as zero
pub fn parse_points(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Positive placement, tolerating ordinal suffixes ("1st", "2nd")
pub fn parse_placement(value: Option<&str>) -> Option<u32> {
    let digits = value?.trim().trim_end_matches(|c: char| c.is_alphabetic());
    digits.parse::<u32>().ok().filter(|p| *p > 0)
}

// "4-1-0" or "4/1/0"; missing parts are zero
fn parse_record(value: Option<&str>) -> (u32, u32, u32) {
    let parts: Vec<&str> = value
        .unwrap_or_default()
        .split(['-', '/'])
        .collect();
    (
        parse_count(parts.first().copied()),
        parse_count(parts.get(1).copied()),
        parse_count(parts.get(2).copied()),
    )
}

/// Settle placements for one event's rows.
///
/// Explicit placements are used only when every row has one and none repeat;
/// players are then ordered by placement. Otherwise row order is placement.
pub fn assign_placements(rows: Vec<ParsedRow>) -> Vec<TournamentPlayer> {
    let explicit: Option<Vec<u32>> = rows.iter().map(|r| r.explicit_placement).collect();
    let explicit = explicit.filter(|placements| {
        let unique: HashSet<&u32> = placements.iter().collect();
        unique.len() == placements.len()
    });

    if explicit.is_none() && rows.iter().any(|r| r.explicit_placement.is_some()) {
        warn!("Placement column is incomplete or repeats values, using row order instead");
    }

    let mut players: Vec<TournamentPlayer> = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut player = row.player;
            player.placement = match &explicit {
                Some(placements) => placements[idx],
                None => idx as u32 + 1,
            };
            player
        })
        .collect();

    players.sort_by_key(|p| p.placement);
    players
}
