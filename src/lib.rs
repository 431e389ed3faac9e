pub mod army_list;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod players;
pub mod rating;
pub mod services;
pub mod tournament;

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use cli::Cli;
use colored::Colorize;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::domain::{EventMetadata, TournamentFormat};
use crate::services::catalog_import::CatalogImportService;
use crate::services::rating_period::RatingPeriodService;
use crate::services::tournament_import::{TournamentImportRequest, TournamentImportService};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_catalog(dir: &Path) -> Result<()> {
    let config = AppConfig::new();
    let service = CatalogImportService::new(&config.import)?;
    let report = service.run(dir)?;

    println!(
        "{} {} units from {} documents ({:?} import)",
        "Imported".green().bold(),
        report.units,
        report.documents,
        report.plan
    );
    for path in &report.failed {
        println!("  {} {}", "skipped".yellow(), path.display());
    }
    if !report.complete {
        println!(
            "{} full import incomplete, previous units kept; fix the skipped documents and re-run",
            "Warning:".yellow().bold()
        );
    }
    Ok(())
}

pub fn handle_tournament(
    file: &Path,
    format: TournamentFormat,
    event: Option<(&str, NaiveDate)>,
    roster: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let config = AppConfig::new();
    let service = TournamentImportService::new(&config.import)?;
    let request = TournamentImportRequest {
        export_path: file.to_path_buf(),
        format,
        metadata: event.map(|(name, date)| EventMetadata::new(name, date)),
        roster_path: roster.map(Path::to_path_buf),
    };
    let records = service.run(&request)?;

    for record in &records {
        let linked = record.players.iter().filter(|p| p.user_id.is_some()).count();
        println!(
            "{} {} ({}): {} players, {} linked",
            format.label().cyan().bold(),
            record.event_name.bold(),
            record.event_date,
            record.players.len(),
            linked
        );
    }

    if let Some(output) = output {
        std::fs::write(output, serde_json::to_string_pretty(&records)?)?;
    }
    Ok(())
}

pub fn handle_rate(ratings: Option<&Path>, games: &Path, output: &Path) -> Result<()> {
    let config = AppConfig::new();
    let service = RatingPeriodService::new(config.rating);
    let rows = service.run(ratings, games, output)?;

    for (rank, row) in rows.iter().take(10).enumerate() {
        println!(
            "{:>3}. {:>6} {:>8.1} ± {:>5.1} {}",
            rank + 1,
            row.player_id,
            row.rating.rating,
            row.rating.deviation,
            row.confidence_level.as_str().dimmed()
        );
    }
    println!("{} {}", "Wrote".green().bold(), output.display());
    Ok(())
}
