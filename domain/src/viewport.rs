use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderId(u64);

impl PlaceholderId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "placeholder#{}", self.0)
    }
}

/// Minimum visible fraction of a placeholder that starts its fetch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct VisibilityThreshold(f64);

impl VisibilityThreshold {
    pub const DEFAULT: f64 = 0.1;

    pub fn new(fraction: f64) -> DomainResult<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(DomainError::InvalidThreshold(format!(
                "{fraction} is outside 0.0..=1.0"
            )));
        }
        Ok(Self(fraction))
    }

    #[must_use]
    pub fn fraction(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_met_by(self, entry: IntersectionEntry) -> bool {
        entry.is_intersecting && entry.visible_fraction >= self.0
    }
}

impl Default for VisibilityThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f64> for VisibilityThreshold {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VisibilityThreshold> for f64 {
    fn from(value: VisibilityThreshold) -> Self {
        value.0
    }
}

/// One observation of a placeholder against the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub is_intersecting: bool,
    pub visible_fraction: f64,
}

impl IntersectionEntry {
    #[must_use]
    pub fn visible(fraction: f64) -> Self {
        Self {
            is_intersecting: fraction > 0.0,
            visible_fraction: fraction,
        }
    }

    #[must_use]
    pub fn hidden() -> Self {
        Self {
            is_intersecting: false,
            visible_fraction: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Observing,
    Triggered,
}

/// One-shot visibility subscription for a single placeholder.
#[derive(Debug)]
pub struct ViewportWatch {
    threshold: VisibilityThreshold,
    state: WatchState,
}

impl ViewportWatch {
    #[must_use]
    pub fn new(threshold: VisibilityThreshold) -> Self {
        Self {
            threshold,
            state: WatchState::Observing,
        }
    }

    #[must_use]
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Returns `true` exactly once: on the first entry that meets the threshold.
    pub fn observe(&mut self, entry: IntersectionEntry) -> bool {
        if self.state == WatchState::Triggered || !self.threshold.is_met_by(entry) {
            return false;
        }
        self.state = WatchState::Triggered;
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn threshold_must_be_a_fraction() {
        assert!(VisibilityThreshold::new(-0.1).is_err());
        assert!(VisibilityThreshold::new(1.5).is_err());
        assert!(VisibilityThreshold::new(f64::NAN).is_err());
        assert!((VisibilityThreshold::default().fraction() - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn watch_fires_once_above_threshold() {
        let mut watch = ViewportWatch::new(VisibilityThreshold::default());

        assert!(!watch.observe(IntersectionEntry::visible(0.05)));
        assert!(!watch.observe(IntersectionEntry::hidden()));
        assert!(watch.observe(IntersectionEntry::visible(0.1)));
        assert_eq!(watch.state(), WatchState::Triggered);

        assert!(!watch.observe(IntersectionEntry::hidden()));
        assert!(!watch.observe(IntersectionEntry::visible(1.0)));
    }

    #[test]
    fn non_intersecting_entry_never_fires() {
        let mut watch = ViewportWatch::new(VisibilityThreshold::new(0.0).unwrap());
        let entry = IntersectionEntry {
            is_intersecting: false,
            visible_fraction: 0.5,
        };
        assert!(!watch.observe(entry));
    }
}
