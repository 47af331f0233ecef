use std::collections::HashSet;

use crate::ast::{Meeting, TimeWindow, WorkingHours};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid schedule: meeting id {0} is used more than once")]
    InvalidSchedule(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Overlap {
    pub first: Meeting,
    pub second: Meeting,
    pub window: TimeWindow,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OutOfHours {
    pub meeting: Meeting,
    pub working_hours: WorkingHours,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Report {
    pub overlaps: Vec<Overlap>,
    /// `None` when no working hours were given.
    pub out_of_hours: Option<Vec<OutOfHours>>,
    pub working_hours: Option<WorkingHours>,
}

pub fn detect_conflicts(
    meetings: &[Meeting],
    working_hours: Option<&WorkingHours>,
) -> Result<Report, Error> {
    check_unique_ids(meetings)?;

    let overlaps = find_overlaps(meetings);
    log::debug!("{} of {} meeting pairs overlap", overlaps.len(), pair_count(meetings.len()));

    let out_of_hours = working_hours.map(|hours| find_out_of_hours(meetings, hours));

    Ok(Report {
        overlaps,
        out_of_hours,
        working_hours: working_hours.copied(),
    })
}

/// Every overlapping pair, each reported once with the earlier meeting first.
pub fn find_overlaps(meetings: &[Meeting]) -> Vec<Overlap> {
    let mut sorted = meetings.to_vec();
    sorted.sort();

    let mut overlaps = Vec::new();
    for (i, first) in sorted.iter().enumerate() {
        for second in &sorted[i + 1..] {
            // sorted by start: nothing later can overlap `first`
            if second.start() >= first.end() {
                break;
            }

            let Some(window) = first.overlap(second) else {
                continue;
            };

            log::trace!("{first} overlaps {second} for {} min", window.minutes());
            overlaps.push(Overlap {
                first: first.clone(),
                second: second.clone(),
                window,
                minutes: window.minutes(),
            });
        }
    }

    overlaps
}

pub fn find_out_of_hours(meetings: &[Meeting], working_hours: &WorkingHours) -> Vec<OutOfHours> {
    let mut sorted = meetings.to_vec();
    sorted.sort();

    sorted
        .into_iter()
        .filter(|meeting| !working_hours.contains(meeting))
        .inspect(|meeting| log::trace!("{meeting} is outside working hours"))
        .map(|meeting| OutOfHours {
            meeting,
            working_hours: *working_hours,
        })
        .collect()
}

fn check_unique_ids(meetings: &[Meeting]) -> Result<(), Error> {
    let mut seen = HashSet::with_capacity(meetings.len());
    match meetings.iter().find(|meeting| !seen.insert(meeting.id())) {
        Some(duplicate) => Err(Error::InvalidSchedule(duplicate.id())),
        None => Ok(()),
    }
}

fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}
