use std::fmt::Display;

use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

use crate::stop_times::stop_time_error::StopTimeError;

/// a GTFS time value, measured in seconds elapsed since the start of the service day.
///
/// GTFS allows hours beyond 23 to represent trips running past midnight, so this is
/// not a clock time: `25:10:00` is a valid value that sorts after `23:59:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ServiceTime(u32);

impl ServiceTime {
    pub const SECONDS_PER_HOUR: u32 = 3600;
    pub const SECONDS_PER_MINUTE: u32 = 60;

    pub fn from_seconds(seconds: u32) -> ServiceTime {
        ServiceTime(seconds)
    }

    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> ServiceTime {
        ServiceTime(hours * Self::SECONDS_PER_HOUR + minutes * Self::SECONDS_PER_MINUTE + seconds)
    }

    /// parses `HH:MM` or `HH:MM:SS`. the hour component is unbounded, the minute
    /// and second components must fall in [0, 59].
    pub fn parse(value: &str) -> Result<ServiceTime, StopTimeError> {
        let parts = value.trim().split(':').collect::<Vec<_>>();
        let (h, m, s) = match parts.as_slice() {
            [h, m] => (*h, *m, "0"),
            [h, m, s] => (*h, *m, *s),
            _ => {
                let msg = format!("expected HH:MM or HH:MM:SS, found {} component(s)", parts.len());
                return Err(StopTimeError::malformed_time(value, msg));
            }
        };
        let hours = parse_component(value, "hour", h)?;
        let minutes = parse_component(value, "minute", m)?;
        let seconds = parse_component(value, "second", s)?;
        if minutes > 59 {
            return Err(StopTimeError::malformed_time(
                value,
                format!("minute {minutes} not in [0, 59]"),
            ));
        }
        if seconds > 59 {
            return Err(StopTimeError::malformed_time(
                value,
                format!("second {seconds} not in [0, 59]"),
            ));
        }
        hours
            .checked_mul(Self::SECONDS_PER_HOUR)
            .and_then(|h| h.checked_add(minutes * Self::SECONDS_PER_MINUTE + seconds))
            .map(ServiceTime)
            .ok_or_else(|| StopTimeError::malformed_time(value, "hour out of range"))
    }

    pub fn total_seconds(&self) -> u32 {
        self.0
    }

    pub fn hours(&self) -> u32 {
        self.0 / Self::SECONDS_PER_HOUR
    }

    pub fn minutes(&self) -> u32 {
        (self.0 % Self::SECONDS_PER_HOUR) / Self::SECONDS_PER_MINUTE
    }

    pub fn seconds(&self) -> u32 {
        self.0 % Self::SECONDS_PER_MINUTE
    }

    /// the minute and second components, as seconds past the hour. repair never changes this
    /// value for a time it wraps.
    pub fn sub_hour_seconds(&self) -> u32 {
        self.0 % Self::SECONDS_PER_HOUR
    }

    /// this time advanced by exactly one hour, or None on overflow.
    pub fn checked_add_hour(&self) -> Option<ServiceTime> {
        self.0.checked_add(Self::SECONDS_PER_HOUR).map(ServiceTime)
    }
}

fn parse_component(value: &str, name: &str, component: &str) -> Result<u32, StopTimeError> {
    if component.is_empty() || !component.chars().all(|c| c.is_ascii_digit()) {
        return Err(StopTimeError::malformed_time(
            value,
            format!("{name} component '{component}' is not a number"),
        ));
    }
    component
        .parse::<u32>()
        .map_err(|e| StopTimeError::malformed_time(value, format!("{name} component: {e}")))
}

impl Display for ServiceTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

impl Serialize for ServiceTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ServiceTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let time_str: String = String::deserialize(deserializer)?;
        ServiceTime::parse(&time_str).map_err(|e| D::Error::custom(e.to_string()))
    }
}
