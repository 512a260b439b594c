use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const MS_PER_MINUTE: i64 = 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Choose date and time")]
    MissingInput,
    #[error("Chosen time is in the past")]
    InPast,
    #[error("Invalid date or time: {0}")]
    Invalid(String),
}

/// Date and time inputs of the schedule dialog.
///
/// Inputs are interpreted in the time zone of the `now` passed to each call,
/// so callers pick between `Local` and anything else.
#[derive(Debug, Clone, Default)]
pub struct SchedulePicker {
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// `HH:MM`
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulePreview {
    /// One of the inputs is still empty.
    Incomplete,
    Invalid(String),
    /// Candidate is not strictly after now.
    InPast,
    Valid {
        /// `DD/MM/YYYY HH:MM`
        formatted: String,
        hours: i64,
        minutes: i64,
    },
}

impl SchedulePreview {
    /// Whether "publish later" may be pressed.
    pub fn can_confirm(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

impl fmt::Display for SchedulePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete => Ok(()),
            Self::Invalid(reason) => write!(f, "INVALID DATE OR TIME: {reason}"),
            Self::InPast => f.write_str("CHOSEN TIME IS IN THE PAST"),
            Self::Valid { formatted, hours, minutes } => {
                write!(f, "POST SCHEDULED FOR:\n{formatted}\n(in {hours}h {minutes}min)")
            }
        }
    }
}

impl SchedulePicker {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            time: Some(time.into()),
        }
    }

    /// Earliest date the date input accepts.
    pub fn min_date<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
        now.date_naive()
    }

    /// Fill empty inputs with today's date and the current time.
    pub fn fill_defaults<Tz: TimeZone>(&mut self, now: &DateTime<Tz>)
    where
        Tz::Offset: fmt::Display,
    {
        if self.date.as_deref().map_or(true, str::is_empty) {
            self.date = Some(now.format("%Y-%m-%d").to_string());
        }
        if self.time.as_deref().map_or(true, str::is_empty) {
            self.time = Some(now.format("%H:%M").to_string());
        }
    }

    pub fn preview<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> SchedulePreview
    where
        Tz::Offset: fmt::Display,
    {
        let candidate = match self.candidate(&now.timezone()) {
            Ok(Some(c)) => c,
            Ok(None) => return SchedulePreview::Incomplete,
            Err(ScheduleError::Invalid(reason)) => return SchedulePreview::Invalid(reason),
            Err(e) => return SchedulePreview::Invalid(e.to_string()),
        };

        if candidate <= *now {
            return SchedulePreview::InPast;
        }

        let diff = candidate.clone().signed_duration_since(now.clone()).num_milliseconds();

        SchedulePreview::Valid {
            formatted: candidate.format("%d/%m/%Y %H:%M").to_string(),
            hours: diff / MS_PER_HOUR,
            minutes: (diff % MS_PER_HOUR) / MS_PER_MINUTE,
        }
    }

    /// Validate the inputs and produce the schedule time to store on the draft.
    pub fn confirm<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let candidate = self
            .candidate(&now.timezone())?
            .ok_or(ScheduleError::MissingInput)?;

        if candidate <= *now {
            return Err(ScheduleError::InPast);
        }

        Ok(candidate.with_timezone(&Utc))
    }

    fn candidate<Tz: TimeZone>(&self, tz: &Tz) -> Result<Option<DateTime<Tz>>, ScheduleError> {
        let (date, time) = match (non_empty(&self.date), non_empty(&self.time)) {
            (Some(d), Some(t)) => (d, t),
            _ => return Ok(None),
        };

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| ScheduleError::Invalid(format!("date {date:?}: {e}")))?;
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .map_err(|e| ScheduleError::Invalid(format!("time {time:?}: {e}")))?;

        let naive = NaiveDateTime::new(date, time);

        tz.from_local_datetime(&naive)
            .earliest()
            .map(Some)
            .ok_or_else(|| {
                ScheduleError::Invalid(format!("{naive} does not exist in this time zone"))
            })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, Local};

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn far_future_preview_shows_absolute_time_and_countdown() {
        let picker = SchedulePicker::new("2099-01-01", "10:00");

        match picker.preview(&Local::now()) {
            SchedulePreview::Valid { formatted, hours, minutes } => {
                assert!(formatted.contains("01/01/2099 10:00"));
                assert!(hours >= 0);
                assert!((0..60).contains(&minutes));
            }
            other => panic!("unexpected preview {other:?}"),
        }

        assert!(picker.preview(&Local::now()).to_string().contains("01/01/2099 10:00"));
    }

    #[test]
    fn countdown_uses_integer_division() {
        let now = utc(2030, 5, 1, 8, 0) + Duration::seconds(30);
        let picker = SchedulePicker::new("2030-05-01", "10:15");

        assert_eq!(
            picker.preview(&now),
            SchedulePreview::Valid {
                formatted: "01/05/2030 10:15".into(),
                hours: 2,
                minutes: 14,
            }
        );
    }

    #[test]
    fn now_and_past_are_rejected() {
        let now = utc(2030, 5, 1, 10, 0);

        let exactly_now = SchedulePicker::new("2030-05-01", "10:00");
        assert_eq!(exactly_now.preview(&now), SchedulePreview::InPast);
        assert_eq!(exactly_now.confirm(&now), Err(ScheduleError::InPast));

        let past = SchedulePicker::new("2030-04-30", "23:59");
        assert!(!past.preview(&now).can_confirm());
        assert_eq!(past.confirm(&now), Err(ScheduleError::InPast));
    }

    #[test]
    fn confirm_converts_to_utc() {
        let msk = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = msk.with_ymd_and_hms(2030, 5, 1, 9, 0, 0).unwrap();

        let at = SchedulePicker::new("2030-05-01", "12:30").confirm(&now).unwrap();

        assert_eq!(at, utc(2030, 5, 1, 9, 30));
    }

    #[test]
    fn missing_inputs() {
        let now = utc(2030, 5, 1, 10, 0);
        let picker = SchedulePicker { date: Some("2030-05-02".into()), time: None };

        assert_eq!(picker.preview(&now), SchedulePreview::Incomplete);
        assert_eq!(picker.confirm(&now), Err(ScheduleError::MissingInput));
    }

    #[test]
    fn garbage_input_is_invalid() {
        let now = utc(2030, 5, 1, 10, 0);
        let picker = SchedulePicker::new("tomorrow", "10:00");

        assert!(matches!(picker.preview(&now), SchedulePreview::Invalid(_)));
        assert!(matches!(picker.confirm(&now), Err(ScheduleError::Invalid(_))));
    }

    #[test]
    fn defaults_only_fill_empty_inputs() {
        let now = utc(2030, 5, 1, 7, 5);

        let mut picker = SchedulePicker::default();
        picker.fill_defaults(&now);
        assert_eq!(picker.date.as_deref(), Some("2030-05-01"));
        assert_eq!(picker.time.as_deref(), Some("07:05"));

        let mut picker = SchedulePicker::new("2031-01-01", "");
        picker.fill_defaults(&now);
        assert_eq!(picker.date.as_deref(), Some("2031-01-01"));
        assert_eq!(picker.time.as_deref(), Some("07:05"));

        assert_eq!(SchedulePicker::min_date(&now), NaiveDate::from_ymd_opt(2030, 5, 1).unwrap());
    }
}
