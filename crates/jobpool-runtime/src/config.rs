//! Pool configuration

use std::str::FromStr;

use jobpool_core::constants::{MAX_SLOTS, MIN_SLOTS};
use jobpool_core::jwarn;

/// Overwrite `value` from the environment when the variable is set and
/// parses; a set-but-malformed variable is reported, not silently dropped.
fn env_override<T: FromStr>(key: &str, value: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse() {
            Ok(parsed) => *value = parsed,
            Err(_) => jwarn!("ignoring malformed {}={:?}", key, raw),
        }
    }
}

/// Configuration for the worker pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Total slot count: timer + joined thread + minions (defaults to
    /// CPU count, clamped to the roster bounds)
    pub threads: u8,

    /// Stack size for pool-owned threads (None = system default)
    pub stack_size: Option<usize>,

    /// Prefix for thread names ("<prefix>-timer", "<prefix>-minion-<slot>")
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let num_cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(MAX_SLOTS as usize) as u8;

        Self {
            threads: num_cpus.max(MIN_SLOTS),
            stack_size: None,
            thread_name_prefix: "jobpool".to_string(),
        }
    }
}

impl PoolConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with environment overrides applied
    ///
    /// Honors `JOBPOOL_THREADS` and `JOBPOOL_STACK_KB`; out-of-range thread
    /// counts are clamped to the roster bounds.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        env_override("JOBPOOL_THREADS", &mut config.threads);
        config.threads = config.threads.clamp(MIN_SLOTS, MAX_SLOTS);

        let mut stack_kb: usize = 0;
        env_override("JOBPOOL_STACK_KB", &mut stack_kb);
        if stack_kb > 0 {
            config.stack_size = Some(stack_kb * 1024);
        }

        config
    }

    /// Set the total slot count
    pub fn threads(mut self, n: u8) -> Self {
        self.threads = n;
        self
    }

    /// Set the stack size for pool-owned threads
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Set the thread name prefix
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.threads < MIN_SLOTS {
            return Err("threads must be at least 2 (timer + joined slot)");
        }
        if self.threads > MAX_SLOTS {
            return Err("threads exceeds the roster maximum");
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty");
        }
        Ok(())
    }
}
