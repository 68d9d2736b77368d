mod dataset_config;
mod operation;
mod stoptimes_app;

pub use dataset_config::{DatasetArgs, DatasetConfig};
pub use operation::StopTimesOperation;
pub use stoptimes_app::StopTimesApp;
