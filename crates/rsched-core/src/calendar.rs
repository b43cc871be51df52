//! Calendar events in the systemd-calendar style: a recurrence pattern over
//! weekday, date and time fields, each either unrestricted or limited to an
//! explicit set of values.

use std::fmt;

use thiserror::Error;

const SHORT_WEEK_DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const LONG_WEEK_DAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Returned by [`CalendarValue::add_value`] when a value falls outside the
/// field's fixed domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value {value} is out of the permitted range [{min}, {max}]")]
pub struct OutOfRangeError {
    pub value: i32,
    pub min: i32,
    pub max: i32,
}

/// A single constrained field of an [`Event`].
///
/// The field starts unrestricted (matching every value in its domain) and can
/// only be narrowed by adding explicit values; the `[min, max]` bounds are
/// fixed for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarValue {
    min: i32,
    max: i32,
    values: Vec<i32>,
}

impl CalendarValue {
    pub fn new(min: i32, max: i32) -> Self {
        CalendarValue {
            min,
            max,
            values: Vec::new(),
        }
    }

    /// True when the field has been restricted to explicit values.
    pub fn has_value(&self) -> bool {
        !self.values.is_empty()
    }

    /// Restrict the field to also match `value`. Adding a value twice is a
    /// no-op; values are kept in ascending order.
    pub fn add_value(&mut self, value: i32) -> Result<(), OutOfRangeError> {
        if value < self.min || value > self.max {
            return Err(OutOfRangeError {
                value,
                min: self.min,
                max: self.max,
            });
        }
        if let Err(position) = self.values.binary_search(&value) {
            self.values.insert(position, value);
        }
        Ok(())
    }

    /// Like [`add_value`](Self::add_value) for call sites where the value is a
    /// constant already known to be inside the domain. Panics on violation;
    /// must never be reached by externally supplied input.
    pub fn must_add_value(&mut self, value: i32) {
        if let Err(err) = self.add_value(value) {
            panic!("{err}");
        }
    }

    /// The explicit values, ascending. Empty when unrestricted.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    fn padding(&self) -> usize {
        if self.max > 99 { 4 } else { 2 }
    }
}

impl fmt::Display for CalendarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_value() {
            return f.write_str("*");
        }
        let width = self.padding();
        for (index, value) in self.values.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value:0width$}")?;
        }
        Ok(())
    }
}

/// A recurring point in time described by seven independent fields.
///
/// Constructed fully unrestricted; callers narrow individual fields before
/// the event is rendered or installed into a crontab entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub week_day: CalendarValue,
    pub year: CalendarValue,
    pub month: CalendarValue,
    pub day: CalendarValue,
    pub hour: CalendarValue,
    pub minute: CalendarValue,
    pub second: CalendarValue,
}

impl Event {
    pub fn new() -> Self {
        Event {
            week_day: CalendarValue::new(1, 7),
            year: CalendarValue::new(2000, 2200),
            month: CalendarValue::new(1, 12),
            day: CalendarValue::new(1, 31),
            hour: CalendarValue::new(0, 23),
            minute: CalendarValue::new(0, 59),
            second: CalendarValue::new(0, 59),
        }
    }

    /// Weekday names rendered directly from the underlying values (ISO
    /// numbering, Monday = 1), never by substitution over rendered text.
    fn week_day_names(&self) -> String {
        let mut names = String::new();
        for (index, value) in self.week_day.values().iter().enumerate() {
            if index > 0 {
                names.push(',');
            }
            names.push_str(SHORT_WEEK_DAYS[(value - 1) as usize]);
        }
        names
    }
}

impl Default for Event {
    fn default() -> Self {
        Event::new()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.week_day.has_value() {
            write!(f, "{} ", self.week_day_names())?;
        }
        write!(
            f,
            "{}-{}-{} {}:{}:{}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Returned by [`Event::parse`] for malformed schedule expressions.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("empty schedule expression")]
    Empty,
    #[error("unexpected token {0:?} in schedule expression")]
    UnexpectedToken(String),
    #[error("unknown weekday name {0:?}")]
    UnknownWeekDay(String),
    #[error("invalid weekday range {0:?}")]
    InvalidRange(String),
    #[error("invalid number {0:?} in schedule expression")]
    InvalidNumber(String),
    #[error("step values are not supported: {0:?}")]
    StepValue(String),
    #[error("invalid date {0:?}, expected year-month-day or month-day")]
    InvalidDate(String),
    #[error("invalid time {0:?}, expected hour:minute or hour:minute:second")]
    InvalidTime(String),
    #[error(transparent)]
    OutOfRange(#[from] OutOfRangeError),
}

impl Event {
    /// Parse a systemd-calendar-like schedule expression.
    ///
    /// Accepts a shorthand keyword (`hourly`, `daily`, `weekly`, `monthly`,
    /// `yearly`/`annually`) or up to three whitespace-separated parts in
    /// order: a weekday list (`mon,tue` or `mon..fri`), a date
    /// (`year-month-day` or `month-day`) and a time (`hour:minute[:second]`).
    /// Date and time components are `*` or a comma-separated list of
    /// integers. When no time is given, 00:00:00 is implied.
    pub fn parse(input: &str) -> Result<Event, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }
        if let Some(event) = keyword_event(trimmed) {
            return Ok(event);
        }

        let mut event = Event::new();
        let mut tokens = trimmed.split_whitespace().peekable();

        if let Some(token) = tokens.peek() {
            if token.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                parse_week_days(&mut event, token)?;
                tokens.next();
            }
        }

        let mut seen_date = false;
        let mut seen_time = false;
        for token in tokens {
            if token.contains(':') && !seen_time {
                parse_time(&mut event, token)?;
                seen_time = true;
            } else if token.contains('-') && !seen_date && !seen_time {
                parse_date(&mut event, token)?;
                seen_date = true;
            } else {
                return Err(ParseError::UnexpectedToken(token.to_string()));
            }
        }

        // systemd behaviour: an expression without a time part means midnight
        if !seen_time {
            event.hour.must_add_value(0);
            event.minute.must_add_value(0);
            event.second.must_add_value(0);
        }
        Ok(event)
    }
}

fn keyword_event(input: &str) -> Option<Event> {
    let mut event = Event::new();
    match input.to_ascii_lowercase().as_str() {
        "hourly" => {
            event.minute.must_add_value(0);
            event.second.must_add_value(0);
        }
        "daily" => {
            event.hour.must_add_value(0);
            event.minute.must_add_value(0);
            event.second.must_add_value(0);
        }
        "weekly" => {
            event.week_day.must_add_value(1);
            event.hour.must_add_value(0);
            event.minute.must_add_value(0);
            event.second.must_add_value(0);
        }
        "monthly" => {
            event.day.must_add_value(1);
            event.hour.must_add_value(0);
            event.minute.must_add_value(0);
            event.second.must_add_value(0);
        }
        "yearly" | "annually" => {
            event.month.must_add_value(1);
            event.day.must_add_value(1);
            event.hour.must_add_value(0);
            event.minute.must_add_value(0);
            event.second.must_add_value(0);
        }
        _ => return None,
    }
    Some(event)
}

fn parse_week_days(event: &mut Event, token: &str) -> Result<(), ParseError> {
    for part in token.split(',') {
        match part.split_once("..") {
            Some((start, end)) => {
                let first = week_day_number(start)?;
                let last = week_day_number(end)?;
                if first > last {
                    return Err(ParseError::InvalidRange(part.to_string()));
                }
                for day in first..=last {
                    // week_day_number only returns values inside [1, 7]
                    event.week_day.must_add_value(day);
                }
            }
            None => {
                let day = week_day_number(part)?;
                event.week_day.must_add_value(day);
            }
        }
    }
    Ok(())
}

fn week_day_number(name: &str) -> Result<i32, ParseError> {
    let lower = name.to_ascii_lowercase();
    for (index, long_name) in LONG_WEEK_DAYS.iter().enumerate() {
        if lower == *long_name || lower == long_name[..3] {
            return Ok(index as i32 + 1);
        }
    }
    Err(ParseError::UnknownWeekDay(name.to_string()))
}

fn parse_date(event: &mut Event, token: &str) -> Result<(), ParseError> {
    let components: Vec<&str> = token.split('-').collect();
    match components.as_slice() {
        [year, month, day] => {
            parse_component(&mut event.year, year)?;
            parse_component(&mut event.month, month)?;
            parse_component(&mut event.day, day)?;
        }
        [month, day] => {
            parse_component(&mut event.month, month)?;
            parse_component(&mut event.day, day)?;
        }
        _ => return Err(ParseError::InvalidDate(token.to_string())),
    }
    Ok(())
}

fn parse_time(event: &mut Event, token: &str) -> Result<(), ParseError> {
    let components: Vec<&str> = token.split(':').collect();
    match components.as_slice() {
        [hour, minute] => {
            parse_component(&mut event.hour, hour)?;
            parse_component(&mut event.minute, minute)?;
            event.second.must_add_value(0);
        }
        [hour, minute, second] => {
            parse_component(&mut event.hour, hour)?;
            parse_component(&mut event.minute, minute)?;
            parse_component(&mut event.second, second)?;
        }
        _ => return Err(ParseError::InvalidTime(token.to_string())),
    }
    Ok(())
}

fn parse_component(field: &mut CalendarValue, text: &str) -> Result<(), ParseError> {
    if text == "*" {
        return Ok(());
    }
    for part in text.split(',') {
        if part.contains('/') {
            return Err(ParseError::StepValue(part.to_string()));
        }
        let value: i32 = part
            .parse()
            .map_err(|_| ParseError::InvalidNumber(part.to_string()))?;
        field.add_value(value)?;
    }
    Ok(())
}
