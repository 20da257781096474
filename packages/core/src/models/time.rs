//! Time Provider Abstraction
//!
//! Trait-based clock so timestamp rules (which edits bump `modifiedAt`,
//! which never do) can be tested deterministically without sleeps.
//!
//! # Examples
//!
//! ```rust
//! use notegrid_core::models::time::{SystemTimeProvider, TimeProvider};
//! use chrono::Utc;
//!
//! let clock = SystemTimeProvider;
//! assert!(clock.now() <= Utc::now());
//! ```

use chrono::{DateTime, Utc};

/// Trait for providing current time
pub trait TimeProvider: Send + Sync {
    /// Get the current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// System time provider using the actual system clock
///
/// Default implementation for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock time provider for deterministic tests
///
/// Holds a fixed instant that tests advance explicitly. Clones share the
/// same instant, so a test can keep one handle while the code under test
/// holds another.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct MockTimeProvider {
    current_time: std::sync::Arc<std::sync::Mutex<DateTime<Utc>>>,
}

#[cfg(test)]
impl MockTimeProvider {
    /// Create a mock provider starting at the current time
    pub fn new() -> Self {
        Self::with_time(Utc::now())
    }

    /// Create a mock provider pinned to a specific instant
    pub fn with_time(time: DateTime<Utc>) -> Self {
        Self {
            current_time: std::sync::Arc::new(std::sync::Mutex::new(time)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: chrono::Duration) {
        *self.current_time.lock().unwrap() += duration;
    }
}

#[cfg(test)]
impl TimeProvider for MockTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.current_time.lock().unwrap()
    }
}

#[cfg(test)]
impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}
