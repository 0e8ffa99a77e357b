use std::{
    fmt,
    io::{self, Write},
};

use log::{Level, LevelFilter, Metadata, Record};
use time::OffsetDateTime;

const CRATE_PATH: &str = "win_engine";

/// Line logger for this crate's records: stderr, plus the debugger on Windows.
pub struct ConsoleLogger;

impl ConsoleLogger {
    pub fn init(level: LevelFilter) {
        let _ = log::set_boxed_logger(Box::new(ConsoleLogger));
        log::set_max_level(level);
    }

    fn is_our_path(&self, path: &Option<&str>) -> bool {
        path.iter().any(|p| p.starts_with(CRATE_PATH))
    }
}

pub fn format_line(level: Level, time: OffsetDateTime, args: &fmt::Arguments) -> String {
    let (hour, minute, second, nano) = time.to_hms_nano();

    format!(
        "[{}] {}-{:02}-{:02} {:02}:{:02}:{:02}.{:03} {}\r\n",
        level,
        time.year(),
        u8::from(time.month()),
        time.day(),
        hour,
        minute,
        second,
        nano / 1_000_000,
        args
    )
}

#[cfg(windows)]
fn write_debugger(line: &str) {
    use windows::{core::PCWSTR, Win32::System::Diagnostics::Debug::OutputDebugStringW};

    let wide = crate::utf16z!(line);
    unsafe { OutputDebugStringW(PCWSTR(wide.as_ptr())) };
}

#[cfg(not(windows))]
fn write_debugger(_line: &str) {}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) && self.is_our_path(&record.module_path()) {
            let time = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
            let line = format_line(record.level(), time, record.args());

            let _ = io::stderr().lock().write_all(line.as_bytes());
            write_debugger(&line);
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_has_level_and_millis() {
        let time = OffsetDateTime::from_unix_timestamp_nanos(1_700_000_000_123_456_789).unwrap();
        let line = format_line(Level::Warn, time, &format_args!("window {} gone", 7));
        assert_eq!(line, "[WARN] 2023-11-14 22:13:20.123 window 7 gone\r\n");
    }

    #[test]
    fn only_crate_records_pass() {
        let logger = ConsoleLogger;
        assert!(logger.is_our_path(&Some("win_engine::ui::engine")));
        assert!(!logger.is_our_path(&Some("other_crate")));
        assert!(!logger.is_our_path(&None));
    }
}
