use std::path::{Path, PathBuf};

use clap::Args;
use config::Config;
use serde::{Deserialize, Serialize};

use crate::stop_times::StopTimeError;

/// arguments locating a GTFS dataset on disk. each one overrides the matching
/// key of the optional TOML configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Args)]
pub struct DatasetArgs {
    /// TOML file with any of the keys directory, stop_times_file, trips_file, stops_file, output_file
    #[arg(long)]
    pub config_file: Option<String>,
    /// directory containing the GTFS files [default: .]
    #[arg(long)]
    pub directory: Option<String>,
    /// stop times file, relative to the directory [default: stop_times.txt]
    #[arg(long)]
    pub stop_times_file: Option<String>,
    /// trips file used for trip_id reference checks [default: trips.txt]
    #[arg(long)]
    pub trips_file: Option<String>,
    /// stops file used for stop_id reference checks [default: stops.txt]
    #[arg(long)]
    pub stops_file: Option<String>,
}

/// resolved locations of the files read and written by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub directory: String,
    pub stop_times_file: String,
    pub trips_file: String,
    pub stops_file: String,
    /// where repaired stop times are written
    pub output_file: String,
}

impl DatasetConfig {
    pub const DEFAULT_DIRECTORY: &str = ".";
    pub const DEFAULT_STOP_TIMES_FILE: &str = "stop_times.txt";
    pub const DEFAULT_TRIPS_FILE: &str = "trips.txt";
    pub const DEFAULT_STOPS_FILE: &str = "stops.txt";
    pub const DEFAULT_OUTPUT_FILE: &str = "stop_times_fixed.txt";

    /// layers defaults, the configuration file (if given) and the command line arguments,
    /// in increasing order of precedence.
    pub fn new(
        args: &DatasetArgs,
        output_file: Option<&str>,
    ) -> Result<DatasetConfig, StopTimeError> {
        let mut builder = Config::builder()
            .set_default("directory", Self::DEFAULT_DIRECTORY)
            .and_then(|b| b.set_default("stop_times_file", Self::DEFAULT_STOP_TIMES_FILE))
            .and_then(|b| b.set_default("trips_file", Self::DEFAULT_TRIPS_FILE))
            .and_then(|b| b.set_default("stops_file", Self::DEFAULT_STOPS_FILE))
            .and_then(|b| b.set_default("output_file", Self::DEFAULT_OUTPUT_FILE))
            .map_err(config_error("failed setting configuration defaults"))?;
        if let Some(config_file) = &args.config_file {
            let file = config::File::new(config_file, config::FileFormat::Toml);
            builder = builder.add_source(file);
        }
        let config = builder
            .set_override_option("directory", args.directory.clone())
            .and_then(|b| b.set_override_option("stop_times_file", args.stop_times_file.clone()))
            .and_then(|b| b.set_override_option("trips_file", args.trips_file.clone()))
            .and_then(|b| b.set_override_option("stops_file", args.stops_file.clone()))
            .and_then(|b| b.set_override_option("output_file", output_file.map(String::from)))
            .and_then(|b| b.build())
            .map_err(config_error("failed reading dataset configuration"))?;
        let dataset_config = config
            .try_deserialize::<DatasetConfig>()
            .map_err(config_error("failed deserializing dataset configuration"))?;
        log::debug!("dataset configuration: {dataset_config:?}");
        Ok(dataset_config)
    }

    pub fn stop_times_path(&self) -> PathBuf {
        self.resolve(&self.stop_times_file)
    }

    pub fn trips_path(&self) -> PathBuf {
        self.resolve(&self.trips_file)
    }

    pub fn stops_path(&self) -> PathBuf {
        self.resolve(&self.stops_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_file)
    }

    /// file names are relative to the dataset directory unless absolute.
    fn resolve(&self, filename: &str) -> PathBuf {
        Path::new(&self.directory).join(filename)
    }
}

fn config_error(msg: &str) -> impl FnOnce(config::ConfigError) -> StopTimeError {
    let msg = msg.to_string();
    move |source| StopTimeError::ConfigReadError { msg, source }
}
