//! Database configuration.

use std::time::Duration;

/// Configuration for creating a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether write transactions record a change log by default.
    pub track_changes: bool,

    /// Writer-lock waits longer than this are logged as warnings.
    pub writer_wait_warning: Duration,

    /// Default channel limit for watch sets built against this database.
    pub watch_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            track_changes: true,
            writer_wait_warning: Duration::from_secs(1),
            watch_limit: 2048,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether write transactions record changes.
    #[must_use]
    pub const fn track_changes(mut self, value: bool) -> Self {
        self.track_changes = value;
        self
    }

    /// Sets the writer-lock wait warning threshold.
    #[must_use]
    pub const fn writer_wait_warning(mut self, value: Duration) -> Self {
        self.writer_wait_warning = value;
        self
    }

    /// Sets the default watch set limit.
    #[must_use]
    pub const fn watch_limit(mut self, value: usize) -> Self {
        self.watch_limit = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.track_changes);
        assert_eq!(config.writer_wait_warning, Duration::from_secs(1));
        assert_eq!(config.watch_limit, 2048);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .track_changes(false)
            .writer_wait_warning(Duration::from_millis(5))
            .watch_limit(16);

        assert!(!config.track_changes);
        assert_eq!(config.writer_wait_warning, Duration::from_millis(5));
        assert_eq!(config.watch_limit, 16);
    }
}
