//! Structured event log for the synchronizer
//!
//! Collects level-filtered, subsystem-tagged entries in a bounded buffer so
//! acquisition behavior can be inspected after a run. Entries are recorded
//! on state transitions and decode completions only, never per sample.

use std::fmt;

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
        }
    }
}

/// A single log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub subsystem: &'static str,
    pub message: String,
}

/// Bounded, drop-oldest event collector
#[derive(Debug, Clone)]
pub struct EventLog {
    min_level: LogLevel,
    max_entries: usize,
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new(min_level: LogLevel, max_entries: usize) -> Self {
        Self {
            min_level,
            max_entries,
            entries: Vec::with_capacity(max_entries.min(1024)),
        }
    }

    pub fn log(&mut self, level: LogLevel, subsystem: &'static str, message: impl fmt::Display) {
        if level < self.min_level || self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries {
            self.entries.remove(0);
        }
        self.entries.push(LogEntry {
            level,
            subsystem,
            message: message.to_string(),
        });
    }

    pub fn debug(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Debug, subsystem, message);
    }

    pub fn info(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Info, subsystem, message);
    }

    pub fn warn(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Warn, subsystem, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn entries_for_subsystem(&self, subsystem: &str) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.subsystem == subsystem)
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(LogLevel::Debug, 1000)
    }
}

impl fmt::Display for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.entries {
            writeln!(f, "[{}] {}: {}", e.level, e.subsystem, e.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_below_min_level() {
        let mut log = EventLog::new(LogLevel::Info, 16);
        log.debug("SYNC", "ignored");
        log.info("SYNC", "kept");
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].message, "kept");
    }

    #[test]
    fn drops_oldest_at_capacity() {
        let mut log = EventLog::new(LogLevel::Debug, 2);
        log.info("A", "one");
        log.info("A", "two");
        log.info("A", "three");
        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[0].message, "two");
    }

    #[test]
    fn subsystem_lookup() {
        let mut log = EventLog::default();
        log.info("SYNC", "locked");
        log.info("SQUELCH", "reset");
        assert_eq!(log.entries_for_subsystem("SQUELCH").len(), 1);
    }
}
