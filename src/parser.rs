use chrono::NaiveTime;

use crate::{
    ast::{InvalidMeetingError, Meeting, Schedule},
    settings::Settings,
};

pub type Result<T> = std::result::Result<T, ParseError>;

const DELIMITERS: [char; 4] = [' ', '_', ',', '-'];

#[derive(Debug, Clone, thiserror::Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("expected one of {expected:?}, found {found:?}")]
    ExpectedChars { expected: Vec<char>, found: char },
    #[error("expected a digit, found {0:?}")]
    ExpectedDigit(char),
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("invalid time, expected HH:MM or H:MM am/pm")]
    InvalidTime,
    #[error("invalid settings: {0}")]
    TomlError(toml::de::Error),
    #[error("{0}")]
    InvalidMeeting(InvalidMeetingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

#[derive(Debug, Clone)]
pub struct Parser {
    source: Vec<char>,

    start: usize,
    current: usize,

    line: usize,
    column: usize,
}

impl Parser {
    pub fn new(source: Vec<char>) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn parse_file(&mut self) -> Result<Schedule> {
        self.skip_space();
        let settings = if self.peek() == Some('-') {
            Some(self.parse_settings()?)
        } else {
            None
        };

        let mut meetings: Vec<Meeting> = Vec::new();
        let mut first_record = true;
        loop {
            self.skip_space();
            match self.peek() {
                None => break,
                Some('\n') => {
                    self.advance();
                    self.clear();
                }
                Some('#') => self.skip_line(),
                // header row, e.g. `start,end`
                Some(c) if first_record && c.is_alphabetic() => {
                    self.skip_line();
                    first_record = false;
                }
                Some(_) => {
                    meetings.push(self.parse_meeting(meetings.len() + 1)?);
                    first_record = false;
                }
            }
        }

        Ok(Schedule { settings, meetings })
    }

    fn parse_settings(&mut self) -> Result<Settings> {
        self.expect_string("---")?;
        self.skip_space();
        self.expect_line_end()?;

        let mut toml = String::new();
        while self.peek().is_some() {
            self.extract_until('\n');
            let line = self.collect().unwrap_or_default();

            if line.trim_end() == "---" {
                let settings = toml::from_str(&toml)
                    .map_err(|e| self.make_error(ParseErrorKind::TomlError(e)))?;
                self.expect_line_end()?;
                return Ok(settings);
            }

            toml.push_str(&line);
            toml.push('\n');
            self.expect_line_end()?;
        }

        Err(self.make_error(ParseErrorKind::UnexpectedEof))
    }

    fn parse_meeting(&mut self, id: usize) -> Result<Meeting> {
        let line = self.line;

        let start = self.parse_time()?;
        self.skip_delimiters()?;
        let end = self.parse_time()?;

        self.skip_space();
        self.expect_line_end()?;

        Meeting::new(id, start, end)
            .map_err(|e| ParseError::new(ParseErrorKind::InvalidMeeting(e), line, 1))
    }

    fn parse_time(&mut self) -> Result<NaiveTime> {
        let (line, column) = (self.line, self.column);
        let invalid = || ParseError::new(ParseErrorKind::InvalidTime, line, column);

        let hours: u32 = self.extract_num()?.parse().map_err(|_| invalid())?;
        self.expect_char(':')?;
        self.clear();
        let minutes: u32 = self.extract_num()?.parse().map_err(|_| invalid())?;

        let hours = match self.parse_meridiem() {
            None => Some(hours),
            Some(meridiem) => to_24_hours(hours, meridiem),
        };

        hours
            .and_then(|hours| NaiveTime::from_hms_opt(hours, minutes, 0))
            .ok_or_else(invalid)
    }

    /// Consumes an optional `am`/`pm` suffix, with or without leading spaces.
    fn parse_meridiem(&mut self) -> Option<Meridiem> {
        let mut offset = 0;
        while matches!(self.peek_nth(offset), Some(' ' | '\t')) {
            offset += 1;
        }

        let meridiem = match self.peek_nth(offset).map(|c| c.to_ascii_lowercase()) {
            Some('a') => Meridiem::Am,
            Some('p') => Meridiem::Pm,
            _ => return None,
        };
        if !matches!(self.peek_nth(offset + 1), Some('m' | 'M')) {
            return None;
        }
        if matches!(self.peek_nth(offset + 2), Some(c) if c.is_alphanumeric()) {
            return None;
        }

        for _ in 0..offset + 2 {
            self.advance();
        }
        self.clear();

        Some(meridiem)
    }

    #[must_use]
    fn make_error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.line, self.column)
    }

    fn extract_num(&mut self) -> Result<String> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        match self.collect() {
            Some(num) if !num.is_empty() => Ok(num),
            _ => match self.peek() {
                Some(c) => Err(self.make_error(ParseErrorKind::ExpectedDigit(c))),
                None => Err(self.make_error(ParseErrorKind::UnexpectedEof)),
            },
        }
    }

    fn skip_delimiters(&mut self) -> Result<()> {
        self.expect_chars(DELIMITERS.iter().copied().chain(std::iter::once('\t')))?;
        while matches!(self.peek(), Some(c) if c != '\n' && (c.is_whitespace() || DELIMITERS.contains(&c)))
        {
            self.advance();
        }

        self.clear();
        Ok(())
    }

    fn expect_line_end(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some('\n') => {
                self.advance();
                self.clear();
                Ok(())
            }
            Some(found) => Err(self.make_error(ParseErrorKind::ExpectedChars {
                expected: vec!['\n'],
                found,
            })),
        }
    }

    fn expect_string(&mut self, s: &str) -> Result<()> {
        s.chars()
            .map(|c| self.expect_char(c))
            .find(Result::is_err)
            .unwrap_or(Ok(()))
    }

    fn expect_char(&mut self, c: char) -> Result<()> {
        self.expect_chars(std::iter::once(c))
    }

    fn expect_chars(&mut self, chars: impl IntoIterator<Item = char> + Clone) -> Result<()> {
        if let Some(c) = self.peek() {
            if chars.clone().into_iter().any(|char| char == c) {
                self.advance();
                Ok(())
            } else {
                Err(self.make_error(ParseErrorKind::ExpectedChars {
                    expected: chars.into_iter().collect(),
                    found: c,
                }))
            }
        } else {
            Err(self.make_error(ParseErrorKind::UnexpectedEof))
        }
    }

    // `\r` counts as space, so CRLF files parse like LF ones.
    fn skip_space(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace() && c != '\n') {
            self.advance();
        }

        self.clear();
    }

    fn skip_line(&mut self) {
        self.extract_until('\n');
        self.advance();
        self.clear();
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.source.get(self.current);
        self.current += 1;

        if let Some(c) = c {
            if *c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }

        c.cloned()
    }

    fn peek(&self) -> Option<char> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source.get(self.current + n).cloned()
    }

    fn extract_until(&mut self, c: char) {
        while let Some(current) = self.peek() {
            if current == c {
                break;
            }
            self.advance();
        }
    }

    fn collect(&mut self) -> Option<String> {
        let result = self
            .source
            .get(self.start..self.current)?
            .iter()
            .cloned()
            .collect::<String>()
            .into();

        self.clear();

        result
    }

    fn clear(&mut self) {
        self.start = self.current;
    }
}

fn to_24_hours(hours: u32, meridiem: Meridiem) -> Option<u32> {
    match (hours, meridiem) {
        (1..=11, Meridiem::Am) => Some(hours),
        (12, Meridiem::Am) => Some(0),
        (1..=11, Meridiem::Pm) => Some(hours + 12),
        (12, Meridiem::Pm) => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Schedule> {
        Parser::new(source.chars().collect()).parse_file()
    }

    fn spans(schedule: &Schedule) -> Vec<String> {
        schedule.meetings.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn numbers_meetings_by_line_order() {
        let schedule = parse("09:00 10:00\n09:30_10:30\n13:30,15:00\n15:00 - 15:30\n").unwrap();

        assert_eq!(schedule.settings, None);
        assert_eq!(
            spans(&schedule),
            vec![
                "Meeting 1 @ 09:00_10:00",
                "Meeting 2 @ 09:30_10:30",
                "Meeting 3 @ 13:30_15:00",
                "Meeting 4 @ 15:00_15:30",
            ]
        );
    }

    #[test]
    fn skips_header_comments_and_blank_lines() {
        let schedule = parse("start,end\n\n# standup\n9:00,9:15\n\n   \n10:00,11:00").unwrap();

        assert_eq!(
            spans(&schedule),
            vec!["Meeting 1 @ 09:00_09:15", "Meeting 2 @ 10:00_11:00"]
        );
    }

    #[test]
    fn accepts_twelve_hour_times() {
        let schedule = parse("9:30 am 1:00PM\n12:00am,12:30 am\n11:00 AM 12:00 pm\n").unwrap();

        assert_eq!(
            spans(&schedule),
            vec![
                "Meeting 1 @ 09:30_13:00",
                "Meeting 2 @ 00:00_00:30",
                "Meeting 3 @ 11:00_12:00",
            ]
        );
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let schedule = parse("09:00 10:00\r\n10:00 11:00\r\n").unwrap();
        assert_eq!(schedule.meetings.len(), 2);
    }

    #[test]
    fn empty_file_has_no_meetings() {
        assert!(parse("").unwrap().meetings.is_empty());
        assert!(parse("\n\n").unwrap().meetings.is_empty());
    }

    #[test]
    fn reads_front_matter() {
        let source = "---\nday = \"2022-01-26\"\n[working_hours]\nopen = \"08:00\"\nclose = \"17:00\"\n---\n18:00 19:00\n";
        let schedule = parse(source).unwrap();

        let settings = schedule.settings.as_ref().unwrap();
        assert_eq!(settings.day, chrono::NaiveDate::from_ymd_opt(2022, 1, 26));
        assert!(settings.working_hours.is_some());
        assert_eq!(spans(&schedule), vec!["Meeting 1 @ 18:00_19:00"]);
    }

    #[test]
    fn unterminated_front_matter() {
        let err = parse("---\nday = \"2022-01-26\"\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedEof));
    }

    #[test]
    fn bad_front_matter() {
        let err = parse("---\nday = 12\n---\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::TomlError(_)));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn reports_line_of_malformed_time() {
        let err = parse("09:00 10:00\n8h00 9:00\n").unwrap_err();

        assert!(matches!(err.kind, ParseErrorKind::ExpectedChars { found: 'h', .. }));
        assert_eq!((err.line, err.column), (2, 2));
    }

    #[test]
    fn rejects_out_of_range_times() {
        for source in ["25:00 26:00", "09:60 10:00", "13:00pm 14:00", "0:30am 1:00"] {
            let err = parse(source).unwrap_err();
            assert!(matches!(err.kind, ParseErrorKind::InvalidTime), "{source}");
        }
    }

    #[test]
    fn rejects_missing_end_time() {
        let err = parse("09:00\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ExpectedChars { found: '\n', .. }));

        let err = parse("09:00 ").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedEof));
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse("09:00 10:00 11:00\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ExpectedChars { found: '1', .. }));
    }

    #[test]
    fn meeting_ending_before_start_fails_on_its_line() {
        let err = parse("09:00 10:00\n\n11:00 10:00\n").unwrap_err();

        let ParseErrorKind::InvalidMeeting(meeting) = &err.kind else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(meeting.id, 2);
        assert_eq!(err.line, 3);
        assert_eq!(
            err.to_string(),
            "line 3, column 1: meeting 2 must start before it ends (11:00 >= 10:00)"
        );
    }
}
