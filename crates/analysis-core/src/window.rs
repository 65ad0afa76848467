use chrono::{DateTime, NaiveDateTime, NaiveTime};
use std::fmt;

use crate::AnalysisError;

/// Intraday window a scan covers, e.g. 09:15-15:30
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    /// Parse "HH:MM" (or "HH:MM:SS") bounds. The start must not be after the end.
    pub fn parse(start: &str, end: &str) -> Result<Self, AnalysisError> {
        let start_time = parse_clock_time(start).ok_or_else(|| {
            AnalysisError::InvalidTimeWindow(format!("start time '{}' is not HH:MM", start))
        })?;
        let end_time = parse_clock_time(end).ok_or_else(|| {
            AnalysisError::InvalidTimeWindow(format!("end time '{}' is not HH:MM", end))
        })?;

        if start_time > end_time {
            return Err(AnalysisError::InvalidTimeWindow(format!(
                "start time {} is after end time {}",
                start, end
            )));
        }

        Ok(Self {
            start: start_time,
            end: end_time,
        })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn start_label(&self) -> String {
        self.start.format("%H:%M").to_string()
    }

    pub fn end_label(&self) -> String {
        self.end.format("%H:%M").to_string()
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.end
    }

    /// Whether a provider time label falls inside the window.
    /// Returns `None` when the label carries no readable time of day.
    pub fn contains_label(&self, label: &str) -> Option<bool> {
        parse_time_label(label).map(|time| self.contains(time))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_label(), self.end_label())
    }
}

fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Extract the time of day from labels such as "10:15", "10:15:30",
/// "2025-03-10T10:15:30" or an RFC 3339 timestamp.
pub fn parse_time_label(label: &str) -> Option<NaiveTime> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    if let Some(time) = parse_clock_time(label) {
        return Some(time);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(label) {
        return Some(dt.time());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(label, format) {
            return Some(dt.time());
        }
    }
    None
}
