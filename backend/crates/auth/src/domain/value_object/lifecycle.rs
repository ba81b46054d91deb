//! Lifecycle Value Object
//!
//! Explicit two-state lifecycle tag for soft-deletable records. Replaces
//! the nullable-timestamp convention: a record is either `Active` or
//! `Deleted` with the deletion instant attached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Record is live
    #[default]
    Active,
    /// Record was soft-deleted at the given instant
    Deleted { at: DateTime<Utc> },
}

impl Lifecycle {
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    #[inline]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }

    /// Deletion instant, if deleted
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { at } => Some(*at),
        }
    }

    /// Transition to deleted (now)
    pub fn delete(&mut self) {
        *self = Self::Deleted { at: Utc::now() };
    }

    /// Transition back to active
    pub fn restore(&mut self) {
        *self = Self::Active;
    }

    /// Map from the database's nullable `removed_at` column
    pub fn from_removed_at(removed_at: Option<DateTime<Utc>>) -> Self {
        match removed_at {
            None => Self::Active,
            Some(at) => Self::Deleted { at },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_active() {
        let lc = Lifecycle::default();
        assert!(lc.is_active());
        assert!(!lc.is_deleted());
        assert!(lc.deleted_at().is_none());
    }

    #[test]
    fn test_delete_and_restore() {
        let mut lc = Lifecycle::Active;
        lc.delete();
        assert!(lc.is_deleted());
        assert!(lc.deleted_at().is_some());

        lc.restore();
        assert!(lc.is_active());
        assert!(lc.deleted_at().is_none());
    }

    #[test]
    fn test_removed_at_roundtrip() {
        assert_eq!(Lifecycle::from_removed_at(None), Lifecycle::Active);

        let at = Utc::now();
        let lc = Lifecycle::from_removed_at(Some(at));
        assert_eq!(lc.deleted_at(), Some(at));
    }

    #[test]
    fn test_exactly_one_state() {
        let mut lc = Lifecycle::Active;
        assert!(lc.is_active() != lc.is_deleted());
        lc.delete();
        assert!(lc.is_active() != lc.is_deleted());
    }
}
