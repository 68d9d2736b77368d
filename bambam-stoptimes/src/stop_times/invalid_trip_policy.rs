use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Enumerates alternative ways to handle a trip
/// whose times cannot be parsed during repair
#[derive(Serialize, Deserialize, Debug, ValueEnum, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvalidTripPolicy {
    #[default]
    Fail,
    KeepOriginal,
}
