use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::{info, warn};

use super::{best_coast, generic, tabletop};
use crate::domain::{EventMetadata, TournamentFormat, TournamentRecord};

/// Import one export, filling placeholder metadata dated today when none is given.
///
/// Callers holding the real event name and date overwrite the placeholders
/// afterwards with `TournamentRecord::apply_metadata`.
pub fn import_tournament(
    raw: &str,
    format: TournamentFormat,
    metadata: Option<EventMetadata>,
) -> Result<Vec<TournamentRecord>> {
    import_tournament_on(raw, format, metadata, Local::now().date_naive())
}

/// Same as `import_tournament` with an explicit "today"
pub fn import_tournament_on(
    raw: &str,
    format: TournamentFormat,
    metadata: Option<EventMetadata>,
    today: NaiveDate,
) -> Result<Vec<TournamentRecord>> {
    info!("Importing {} export", format.label());
    let metadata = match metadata {
        Some(metadata) => metadata,
        None => {
            let placeholder = placeholder_metadata(format, today);
            if !format.embeds_event_metadata() {
                warn!(
                    "{} exports carry no event name or date; using placeholder {:?}",
                    format.label(),
                    placeholder.event_name
                );
            }
            placeholder
        }
    };

    match format {
        TournamentFormat::BestCoast => Ok(vec![best_coast::parse(raw, &metadata)?]),
        TournamentFormat::Tabletop => Ok(vec![tabletop::parse(raw, &metadata)?]),
        TournamentFormat::Generic => generic::parse(raw, &metadata),
    }
}

pub fn placeholder_metadata(format: TournamentFormat, today: NaiveDate) -> EventMetadata {
    EventMetadata::new(
        format!("{} import {}", format.label(), today.format("%Y-%m-%d")),
        today,
    )
}
