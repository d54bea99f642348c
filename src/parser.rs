use crate::error::LogError;
use chrono::{NaiveDate, NaiveDateTime};

/// One entry of the server's log stream as handed to handlers.
///
/// Both fields are `None` exactly once, in the final record broadcast when
/// the log socket stops: handlers should treat that as an end-of-stream
/// notification and tear down whatever they own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// When the server says the line happened. Naive wall-clock time in the
    /// server's own timezone.
    pub timestamp: Option<NaiveDateTime>,
    /// The raw line with the timestamp stripped. Left unparsed here; picking
    /// quoted fields or player tags out of it is handler business.
    pub message: Option<Vec<u8>>,
}

impl LogRecord {
    pub fn new(timestamp: NaiveDateTime, message: Vec<u8>) -> Self {
        LogRecord {
            timestamp: Some(timestamp),
            message: Some(message),
        }
    }

    /// The sentinel record that closes the stream.
    pub fn end_of_stream() -> Self {
        LogRecord {
            timestamp: None,
            message: None,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.timestamp.is_none() && self.message.is_none()
    }
}

/// Parses the `MM/DD/YYYY HH:MM:SS` timestamp opening a log line, returning
/// it along with everything after the `: ` that closes the seconds field.
///
/// Fields may be one or two digits wide and the separator between the date
/// and the time does not matter: the scanner only collects digit runs and
/// assigns them on `/`, the first space and `:`, in that order. Anything
/// else is skipped.
pub fn parse_timestamp(buffer: &[u8]) -> Result<(NaiveDateTime, &[u8]), LogError> {
    let mut digits: Option<u32> = None;
    let (mut month, mut day, mut year) = (None, None, None);
    let (mut hour, mut minute) = (None, None);
    let mut second = None;
    let mut end = buffer.len();

    for (idx, &ch) in buffer.iter().enumerate() {
        match ch {
            b'0'..=b'9' => {
                digits = Some(
                    digits
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|value| value.checked_add((ch - b'0') as u32))
                        .ok_or(LogError::MalformedTimestamp)?,
                );
            }
            b'/' if month.is_none() => {
                month = Some(digits.take().ok_or(LogError::MalformedTimestamp)?)
            }
            b'/' if day.is_none() => {
                day = Some(digits.take().ok_or(LogError::MalformedTimestamp)?)
            }
            b' ' if year.is_none() => {
                year = Some(digits.take().ok_or(LogError::MalformedTimestamp)?)
            }
            b':' if hour.is_none() => {
                hour = Some(digits.take().ok_or(LogError::MalformedTimestamp)?)
            }
            b':' if minute.is_none() => {
                minute = Some(digits.take().ok_or(LogError::MalformedTimestamp)?)
            }
            b':' => {
                second = Some(digits.take().ok_or(LogError::MalformedTimestamp)?);
                end = idx;
                break;
            }
            _ => {}
        }
    }

    let (Some(month), Some(day), Some(year), Some(hour), Some(minute), Some(second)) =
        (month, day, year, hour, minute, second)
    else {
        return Err(LogError::MalformedTimestamp);
    };

    let timestamp = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or(LogError::MalformedTimestamp)?;

    // skip the `: ` that closes the seconds field
    let remainder = buffer.get(end + 2..).unwrap_or(&[]);

    Ok((timestamp, remainder))
}

/// Parses one complete log frame, already stripped of its junk header and
/// trailing newline, into a [LogRecord].
pub fn parse_record(payload: &[u8]) -> Result<LogRecord, LogError> {
    let (timestamp, message) = parse_timestamp(payload)?;
    Ok(LogRecord::new(timestamp, message.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn parses_a_timestamp() {
        let message = b"11/20/2016 - 13:05:40: This has junk on the end";
        let (date, _) = parse_timestamp(message).unwrap();

        assert_eq!(date, datetime(2016, 11, 20, 13, 5, 40));
    }

    #[test]
    fn leaves_the_remainder() {
        let message = b"11/20/2016 - 13:05:40: This has junk on the end";
        let (_, rest) = parse_timestamp(message).unwrap();

        assert_eq!(rest, b"This has junk on the end");
    }

    #[test]
    fn accepts_single_digit_fields() {
        let message = b"1/1/2000 - 12:0:9: END OF DATA";
        let (date, rest) = parse_timestamp(message).unwrap();

        assert_eq!(date, datetime(2000, 1, 1, 12, 0, 9));
        assert_eq!(rest, b"END OF DATA");
    }

    #[test]
    fn tolerates_a_missing_trailing_space() {
        // a truncated line can end right at the seconds colon; the remainder
        // is then simply empty
        let (date, rest) = parse_timestamp(b"11/20/2016 - 13:05:40:").unwrap();

        assert_eq!(date, datetime(2016, 11, 20, 13, 5, 40));
        assert_eq!(rest, b"");
    }

    #[test]
    fn rejects_an_impossible_date() {
        assert!(matches!(
            parse_timestamp(b"13/32/2016 - 13:05:40: nope"),
            Err(LogError::MalformedTimestamp)
        ));
    }

    #[test]
    fn rejects_an_empty_field() {
        assert!(matches!(
            parse_timestamp(b"11//2016 - 13:05:40: nope"),
            Err(LogError::MalformedTimestamp)
        ));
    }

    #[test]
    fn rejects_a_truncated_line() {
        assert!(matches!(
            parse_timestamp(b"11/20/2016 - 13:05"),
            Err(LogError::MalformedTimestamp)
        ));
    }

    #[test]
    fn rejects_text_without_a_timestamp() {
        assert!(matches!(
            parse_timestamp(b"World triggered \"Round_Start\""),
            Err(LogError::MalformedTimestamp)
        ));
    }

    #[test]
    fn parses_a_record() {
        let record = parse_record(b"11/20/2016 - 13:5:40: World triggered \"Round_Start\"").unwrap();

        assert_eq!(record.timestamp, Some(datetime(2016, 11, 20, 13, 5, 40)));
        assert_eq!(
            record.message.as_deref(),
            Some(&b"World triggered \"Round_Start\""[..])
        );
        assert!(!record.is_end_of_stream());
    }

    #[test]
    fn the_sentinel_has_no_fields() {
        let record = LogRecord::end_of_stream();

        assert_eq!(record.timestamp, None);
        assert_eq!(record.message, None);
        assert!(record.is_end_of_stream());
    }
}
