use crate::error::ConfigError;
use std::time::Duration;

/// Upper bounds of the random pauses workers take between iterations.
///
/// Each pause is drawn uniformly from `[0, bound)`. A zero bound disables the pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub produce_delay: Duration,
    pub consume_delay: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            produce_delay: Duration::from_millis(1000),
            consume_delay: Duration::from_millis(1500),
        }
    }
}

/// Configuration as supplied by the operator, before validation.
///
/// Counts are signed so that nonsensical input reaches [`Config::validate`] and is
/// reported as a [`ConfigError`] instead of being rejected by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub producers: i64,
    pub consumers: i64,
    pub capacity: i64,
    pub run_duration_secs: i64,
    pub verbose: bool,
    pub cadence: Cadence,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            producers: 5,
            consumers: 1,
            capacity: 5,
            run_duration_secs: 30,
            verbose: true,
            cadence: Cadence::default(),
        }
    }
}

/// Validated configuration, every count known to be positive.
///
/// Only [`Config::validate`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub(crate) producers: usize,
    pub(crate) consumers: usize,
    pub(crate) capacity: usize,
    pub(crate) run_duration: Duration,
    pub(crate) verbose: bool,
    pub(crate) cadence: Cadence,
}

impl Settings {
    #[inline]
    pub fn producers(&self) -> usize {
        self.producers
    }

    #[inline]
    pub fn consumers(&self) -> usize {
        self.consumers
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn run_duration(&self) -> Duration {
        self.run_duration
    }

    #[inline]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    #[inline]
    pub fn cadence(&self) -> Cadence {
        self.cadence
    }
}

impl Config {
    /// Checks every count, in declaration order, and reports the first bad one.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let producers = positive(self.producers).ok_or(ConfigError::Producers(self.producers))?;
        let consumers = positive(self.consumers).ok_or(ConfigError::Consumers(self.consumers))?;
        let capacity = positive(self.capacity).ok_or(ConfigError::Capacity(self.capacity))?;
        let run_secs = positive(self.run_duration_secs)
            .ok_or(ConfigError::RunDuration(self.run_duration_secs))?;

        Ok(Settings {
            producers,
            consumers,
            capacity,
            run_duration: Duration::from_secs(run_secs as u64),
            verbose: self.verbose,
            cadence: self.cadence,
        })
    }
}

fn positive(value: i64) -> Option<usize> {
    if value <= 0 {
        return None;
    }
    usize::try_from(value).ok()
}
