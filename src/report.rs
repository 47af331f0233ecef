use std::fmt;

use chrono::NaiveDate;

use crate::{
    ast::TIME_FORMAT,
    processing::{Overlap, Report},
};

const DAY_FORMAT: &str = "%Y-%m-%d";

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Meetings: {} and {} overlaps for {} min ({} to {})",
            self.first,
            self.second,
            self.minutes,
            self.window.start.format(TIME_FORMAT),
            self.window.end.format(TIME_FORMAT)
        )
    }
}

/// Plain text rendering of a [`Report`] for one day.
struct TextReport<'a> {
    report: &'a Report,
    day: NaiveDate,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = self.day.format(DAY_FORMAT);

        writeln!(f, "Meetings conflict for {day}")?;
        if self.report.overlaps.is_empty() {
            writeln!(f, "No conflicts found")?;
        }
        for overlap in &self.report.overlaps {
            writeln!(f, "{overlap}")?;
        }

        let (Some(hours), Some(out_of_hours)) = (&self.report.working_hours, &self.report.out_of_hours) else {
            return Ok(());
        };

        writeln!(
            f,
            "Invalid Meetings, outside working hours for {day}: {} to {}",
            hours.open().format(TIME_FORMAT),
            hours.close().format(TIME_FORMAT)
        )?;
        if out_of_hours.is_empty() {
            writeln!(f, "No meetings outside working hours")?;
        }
        for entry in out_of_hours {
            writeln!(f, "{}", entry.meeting)?;
        }

        Ok(())
    }
}

pub fn render_text(report: &Report, day: NaiveDate) -> String {
    TextReport { report, day }.to_string()
}

#[derive(serde::Serialize)]
struct JsonReport<'a> {
    day: NaiveDate,
    #[serde(flatten)]
    report: &'a Report,
}

pub fn render_json(report: &Report, day: NaiveDate) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport { day, report })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::{
        ast::{Meeting, WorkingHours},
        processing::detect_conflicts,
    };

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, TIME_FORMAT).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 26).unwrap()
    }

    fn meetings(spans: &[(&str, &str)]) -> Vec<Meeting> {
        spans
            .iter()
            .enumerate()
            .map(|(i, (start, end))| Meeting::new(i + 1, t(start), t(end)).unwrap())
            .collect()
    }

    #[test]
    fn renders_overlaps() {
        let schedule = meetings(&[("09:00", "10:00"), ("09:30", "10:30"), ("13:30", "15:00"), ("15:00", "15:30")]);
        let report = detect_conflicts(&schedule, None).unwrap();

        assert_eq!(
            render_text(&report, day()),
            "Meetings conflict for 2022-01-26\n\
             Meetings: Meeting 1 @ 09:00_10:00 and Meeting 2 @ 09:30_10:30 overlaps for 30 min (09:30 to 10:00)\n"
        );
    }

    #[test]
    fn renders_out_of_hours_section() {
        let hours = WorkingHours::new(t("08:00"), t("17:00")).unwrap();
        let schedule = meetings(&[("18:00", "19:00"), ("09:00", "10:00")]);
        let report = detect_conflicts(&schedule, Some(&hours)).unwrap();

        assert_eq!(
            render_text(&report, day()),
            "Meetings conflict for 2022-01-26\n\
             No conflicts found\n\
             Invalid Meetings, outside working hours for 2022-01-26: 08:00 to 17:00\n\
             Meeting 1 @ 18:00_19:00\n"
        );
    }

    #[test]
    fn all_meetings_inside_working_hours() {
        let hours = WorkingHours::new(t("08:00"), t("17:00")).unwrap();
        let report = detect_conflicts(&meetings(&[("09:00", "10:00")]), Some(&hours)).unwrap();

        assert!(render_text(&report, day()).ends_with(
            "outside working hours for 2022-01-26: 08:00 to 17:00\nNo meetings outside working hours\n"
        ));
    }

    #[test]
    fn renders_json() {
        let report = detect_conflicts(&meetings(&[("10:45", "13:00"), ("12:00", "13:00")]), None).unwrap();
        let json: serde_json::Value = serde_json::from_str(&render_json(&report, day()).unwrap()).unwrap();

        assert_eq!(json["day"], "2022-01-26");
        assert_eq!(json["overlaps"][0]["first"]["id"], 1);
        assert_eq!(json["overlaps"][0]["window"]["start"], "12:00");
        assert_eq!(json["overlaps"][0]["window"]["end"], "13:00");
        assert_eq!(json["overlaps"][0]["minutes"], 60);
        assert!(json["out_of_hours"].is_null());
    }
}
