use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::TournamentFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "muster-ranking import and rating jobs")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Import every catalog document in a directory into the unit cache
    Catalog {
        /// Directory holding .cat/.gst/.xml documents
        dir: PathBuf,
    },
    /// Parse a tournament results export
    Tournament {
        /// CSV export file
        file: PathBuf,
        /// Export dialect
        #[arg(short, long, value_enum)]
        format: TournamentFormat,
        /// Event name (required together with --event-date)
        #[arg(long, requires = "event_date")]
        event_name: Option<String>,
        /// Event date, YYYY-MM-DD
        #[arg(long, requires = "event_name")]
        event_date: Option<NaiveDate>,
        /// JSON user roster used to link players to accounts
        #[arg(short, long)]
        roster: Option<PathBuf>,
        /// Write the parsed records here as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run one Glicko-2 rating period
    Rate {
        /// JSON list of prior ratings (optional)
        #[arg(long)]
        ratings: Option<PathBuf>,
        /// JSON list of games played in the period
        games: PathBuf,
        /// Where to write updated ratings
        #[arg(short, long, default_value = "ratings.json")]
        output: PathBuf,
    },
}
