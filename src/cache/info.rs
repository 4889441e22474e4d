//! Expiry bookkeeping for cached data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Last update time and maximum age of a cached item
///
/// Expiry only signals that a resync is due; expired data stays readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    /// When the data was last refreshed, `None` if never
    pub last_update: Option<DateTime<Utc>>,

    /// Maximum age before the data is considered expired
    pub age: Duration,
}

impl Default for CacheInfo {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl CacheInfo {
    /// Create bookkeeping for data that has never been refreshed
    pub fn new(age: Duration) -> Self {
        Self {
            last_update: None,
            age,
        }
    }

    /// Record a refresh at the current time
    pub fn touch(&mut self) {
        self.last_update = Some(Utc::now());
    }

    /// Record a refresh at the given time
    pub fn touch_at(&mut self, at: DateTime<Utc>) {
        self.last_update = Some(at);
    }

    /// Change the maximum age
    pub fn set_age(&mut self, age: Duration) {
        self.age = age;
    }

    /// `now - last_update >= age`; data never refreshed is always expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit clock reading
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_update else {
            return true;
        };

        match (now - last).to_std() {
            Ok(elapsed) => elapsed >= self.age,
            // Clock went backwards
            Err(_) => self.age.is_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_never_updated_is_expired() {
        let info = CacheInfo::new(Duration::from_secs(60));
        assert!(info.is_expired());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let mut info = CacheInfo::new(Duration::from_secs(60));
        info.touch_at(now);

        assert!(!info.is_expired_at(now + TimeDelta::seconds(59)));
        assert!(info.is_expired_at(now + TimeDelta::seconds(60)));
        assert!(info.is_expired_at(now + TimeDelta::seconds(61)));
    }

    #[test]
    fn test_zero_age_always_expired() {
        let mut info = CacheInfo::default();
        info.touch();
        assert!(info.is_expired());
    }

    #[test]
    fn test_set_age() {
        let now = Utc::now();
        let mut info = CacheInfo::new(Duration::from_secs(10));
        info.touch_at(now);
        info.set_age(Duration::from_secs(3600));

        assert!(!info.is_expired_at(now + TimeDelta::seconds(30)));
    }
}
