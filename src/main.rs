use anyhow::Result;

use muster_ranking::cli::Command;
use muster_ranking::{handle_catalog, handle_rate, handle_tournament, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Catalog { dir } => handle_catalog(dir),
        Command::Tournament {
            file,
            format,
            event_name,
            event_date,
            roster,
            output,
        } => {
            let event = event_name.as_deref().zip(*event_date);
            handle_tournament(file, *format, event, roster.as_deref(), output.as_deref())
        }
        Command::Rate { ratings, games, output } => handle_rate(ratings.as_deref(), games, output),
    }
}
