use crate::types::HierarchyLevel;
use displaydoc::Display;

/** Attempted to acquire a lock at hierarchy level {attempted_level} while already
    holding a lock at level {held_level}; levels must strictly decrease.
*/
#[derive(Debug, Display, Eq, PartialEq)]
pub struct LockOrderViolation {
    /// The level of the lock whose acquisition was rejected.
    pub attempted_level: HierarchyLevel,
    /// The calling thread's ledger at the time of the attempt: the level of the
    /// most recently acquired, still-held lock, or [NO_LOCK_HELD] if none.
    ///
    /// [NO_LOCK_HELD]: crate::types::NO_LOCK_HELD
    pub held_level: HierarchyLevel,
}

/// Any error which can occur during a non-blocking acquisition attempt.
#[derive(Debug, Display, Eq, PartialEq)]
pub enum TryLockError {
    /// The acquisition would break the hierarchy discipline: {0}
    Violation(LockOrderViolation),
    /// The lock is currently held by another thread.
    Contended,
}

impl From<LockOrderViolation> for TryLockError {
    fn from(violation: LockOrderViolation) -> Self {
        TryLockError::Violation(violation)
    }
}

/// A sort or merge operation received an unusable index range.
///
/// These are caller errors, reported before any element of the array is touched.
#[derive(Debug, Display, Eq, PartialEq)]
pub enum RangeError {
    /// The range [{start}, {end}) falls outside an array of length {len}.
    OutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },
    /// The range [{start}, {end}) is empty or inverted.
    EmptyOrInverted { start: usize, end: usize },
    /// The split point {split} does not fall strictly inside ({start}, {end}).
    SplitNotInterior {
        start: usize,
        split: usize,
        end: usize,
    },
}
