//! A handler which writes the log stream to a file.

use crate::config::LogFileConfig;
use crate::dispatch::{Dispatcher, HandlerId};
use crate::error::HandlerError;
use crate::parser::LogRecord;
use log::error;
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Opens the configured file and registers a handler that appends one
/// `<timestamp>: <message>` line per record. The end-of-stream sentinel
/// flushes and closes the file.
pub fn init(
    dispatch: &Dispatcher<LogRecord>,
    config: &LogFileConfig,
) -> Result<HandlerId, HandlerError> {
    let file = File::create(&config.filename)?;
    let output = RefCell::new(Some(BufWriter::new(file)));

    Ok(dispatch.register(move |record: &LogRecord| {
        match (&record.timestamp, &record.message) {
            (Some(timestamp), Some(message)) => {
                if let Some(file) = output.borrow_mut().as_mut() {
                    let line = String::from_utf8_lossy(message);
                    if let Err(err) = writeln!(file, "{}: {}", timestamp, line) {
                        error!("cannot write to the log file: {}", err);
                    }
                }
            }
            _ => {
                // end of stream
                if let Some(mut file) = output.borrow_mut().take() {
                    if let Err(err) = file.flush() {
                        error!("cannot flush the log file: {}", err);
                    }
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn writes_records_and_closes_on_the_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.log");

        let dispatch = Dispatcher::new();
        init(
            &dispatch,
            &LogFileConfig {
                filename: path.clone(),
            },
        )
        .unwrap();

        let timestamp = NaiveDate::from_ymd_opt(2016, 11, 20)
            .unwrap()
            .and_hms_opt(13, 5, 40)
            .unwrap();
        dispatch.fire(&LogRecord::new(timestamp, b"World triggered \"Round_Start\"".to_vec()));
        dispatch.fire(&LogRecord::new(timestamp, b"Started map \"de_dust2\"".to_vec()));
        dispatch.fire(&LogRecord::end_of_stream());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "2016-11-20 13:05:40: World triggered \"Round_Start\"\n\
             2016-11-20 13:05:40: Started map \"de_dust2\"\n"
        );

        // records after the sentinel go nowhere
        dispatch.fire(&LogRecord::new(timestamp, b"too late".to_vec()));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("too late"));
    }
}
