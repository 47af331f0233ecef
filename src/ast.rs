use std::{cmp::Ordering, fmt};

use chrono::NaiveTime;

use crate::settings::Settings;

/// Display format of every time of day in the reports.
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub settings: Option<Settings>,
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("meeting {id} must start before it ends ({from} >= {to})", from = .start.format(TIME_FORMAT), to = .end.format(TIME_FORMAT))]
pub struct InvalidMeetingError {
    pub id: usize,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("working hours must open before they close ({from} >= {to})", from = .open.format(TIME_FORMAT), to = .close.format(TIME_FORMAT))]
pub struct InvalidWorkingHoursError {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

/// A meeting occupying `[start, end)` on the reported day.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Meeting {
    id: usize,
    #[serde(with = "hhmm")]
    start: NaiveTime,
    #[serde(with = "hhmm")]
    end: NaiveTime,
}

impl Meeting {
    pub fn new(id: usize, start: NaiveTime, end: NaiveTime) -> Result<Self, InvalidMeetingError> {
        if start >= end {
            return Err(InvalidMeetingError { id, start, end });
        }

        Ok(Self { id, start, end })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Intersection with `other`. Touching endpoints do not count.
    pub fn overlap(&self, other: &Meeting) -> Option<TimeWindow> {
        if self.start < other.end && other.start < self.end {
            Some(TimeWindow {
                start: self.start.max(other.start),
                end: self.end.min(other.end),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Meeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Meeting {} @ {}_{}",
            self.id,
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT)
        )
    }
}

// Earlier start first, then the shorter meeting, then the lower id.
impl Ord for Meeting {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Meeting {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TimeWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct WorkingHours {
    #[serde(with = "hhmm")]
    open: NaiveTime,
    #[serde(with = "hhmm")]
    close: NaiveTime,
}

impl WorkingHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Result<Self, InvalidWorkingHoursError> {
        if open >= close {
            return Err(InvalidWorkingHoursError { open, close });
        }

        Ok(Self { open, close })
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }

    pub fn contains(&self, meeting: &Meeting) -> bool {
        meeting.start >= self.open && meeting.end <= self.close
    }
}

/// `HH:MM` (de)serialization of [`NaiveTime`].
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
