use std::{fs::File, io::BufWriter, path::Path};

use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::app::{DatasetArgs, DatasetConfig};
use crate::stop_times::{
    dataset_ops, repair_ops, validation_report, InvalidTripPolicy, StopTimeError,
    StopTimesSchema,
};

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum StopTimesOperation {
    /// report overlapping stop visits, departures before arrivals, orphaned
    /// trip/stop references and structural problems without modifying the dataset
    Validate {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// if provided, write the full validation report to this file as JSON
        #[arg(long)]
        report_file: Option<String>,
    },
    /// rewrite stop times so that each trip is chronologically consistent,
    /// correcting times by whole hours
    Repair {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// output file for the repaired stop times, relative to the dataset directory
        /// [default: stop_times_fixed.txt]
        #[arg(long)]
        output_file: Option<String>,
        /// how to handle a trip containing a time that cannot be parsed
        #[arg(long, value_enum, default_value_t = InvalidTripPolicy::Fail)]
        invalid_trip_policy: InvalidTripPolicy,
        /// replace the output file if it already exists
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
}

impl StopTimesOperation {
    pub fn run(&self) -> Result<(), StopTimeError> {
        match self {
            StopTimesOperation::Validate {
                dataset,
                report_file,
            } => {
                let config = DatasetConfig::new(dataset, None)?;
                validate(&config, report_file.as_deref())
            }
            StopTimesOperation::Repair {
                dataset,
                output_file,
                invalid_trip_policy,
                overwrite,
            } => {
                let config = DatasetConfig::new(dataset, output_file.as_deref())?;
                repair(&config, invalid_trip_policy, *overwrite)
            }
        }
    }
}

fn validate(config: &DatasetConfig, report_file: Option<&str>) -> Result<(), StopTimeError> {
    let stop_times_path = config.stop_times_path();
    println!("Reading {}...", stop_times_path.display());
    let dataset = dataset_ops::read_stop_times(&stop_times_path)?;
    let trip_ids = dataset_ops::read_reference_ids(&config.trips_path(), StopTimesSchema::TRIP_ID)?;
    let stop_ids = dataset_ops::read_reference_ids(&config.stops_path(), StopTimesSchema::STOP_ID)?;

    let report = validation_report::validate_dataset(&dataset, trip_ids.as_ref(), stop_ids.as_ref());

    println!("\n=== Validation Results ===");
    for line in report.diagnostics() {
        println!("{line}");
    }
    println!("\n{}", report.summary);

    if let Some(report_file) = report_file {
        let writer = BufWriter::new(File::create(Path::new(report_file))?);
        serde_json::to_writer_pretty(writer, &report)?;
        log::info!("wrote validation report to {report_file}");
    }
    Ok(())
}

fn repair(
    config: &DatasetConfig,
    policy: &InvalidTripPolicy,
    overwrite: bool,
) -> Result<(), StopTimeError> {
    let stop_times_path = config.stop_times_path();
    let output_path = config.output_path();
    if output_path.exists() && !overwrite {
        return Err(StopTimeError::OutputExists(
            output_path.to_string_lossy().to_string(),
        ));
    }

    println!("Reading {}...", stop_times_path.display());
    let dataset = dataset_ops::read_stop_times(&stop_times_path)?;
    if !dataset.rejected.is_empty() {
        log::warn!(
            "{} malformed record(s) will not be written to the repaired file",
            dataset.rejected.len()
        );
    }
    println!("Read {} stop records", dataset.visits.len());

    let outcome = repair_ops::repair_dataset(&dataset.visits, policy)?;
    println!("Found {} trips", outcome.trips);

    println!("\nWriting {}...", output_path.display());
    dataset_ops::write_stop_times(&output_path, &dataset.schema, &outcome.visits, overwrite)?;

    println!(
        "Done! Fixed {} out of {} trips",
        outcome.trips_repaired, outcome.trips
    );
    if outcome.trips_kept > 0 {
        println!(
            "{} trip(s) with unparseable times were written unchanged",
            outcome.trips_kept
        );
    }
    Ok(())
}
