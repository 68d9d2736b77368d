use super::StopTimesOperation;
use clap::Parser;

/// command line tool for validating and repairing the chronology of GTFS stop_times.txt files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct StopTimesApp {
    #[command(subcommand)]
    pub op: StopTimesOperation,
}
