use chrono::{NaiveDate, NaiveTime};

use crate::ast::{hhmm, InvalidWorkingHoursError, WorkingHours};

/// Front matter of a times file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub day: Option<NaiveDate>,
    pub working_hours: Option<WorkingHoursSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkingHoursSettings {
    #[serde(with = "hhmm")]
    pub open: NaiveTime,
    #[serde(with = "hhmm")]
    pub close: NaiveTime,
}

impl WorkingHoursSettings {
    pub fn resolve(&self) -> Result<WorkingHours, InvalidWorkingHoursError> {
        WorkingHours::new(self.open, self.close)
    }
}
