//! A mutex which checks a strictly-decreasing acquisition order at runtime.
//!
//! Each [HierMutex] carries a fixed [HierarchyLevel]. Every thread keeps a ledger
//! of the level it most recently acquired and still holds; an attempt to acquire a
//! lock at an equal or higher level is rejected with [LockOrderViolation] before
//! the thread ever contends for the underlying mutex. Lock-ordering deadlocks
//! inside the family of hierarchy-checked locks thereby become synchronous errors
//! at the offending call site.
//!
//! The check is a correctness probe, not a liveness mechanism: it says nothing
//! about locks outside this family.

use core::cell::Cell;
use core::ops::{Deref, DerefMut};

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use crate::err::{LockOrderViolation, TryLockError};
use crate::types::{HierarchyLevel, NO_LOCK_HELD};

thread_local! {
    /// The calling thread's hierarchy ledger: the level of the most recently
    /// acquired, still-held [HierMutex], or [NO_LOCK_HELD] when none is held.
    static HELD_LEVEL: Cell<HierarchyLevel> = const { Cell::new(NO_LOCK_HELD) };
}

/// A mutual exclusion primitive enforcing strictly-decreasing acquisition order.
///
/// The protected value is owned by the mutex and reachable only through a
/// [HierMutexGuard]. Acquisition validates the hierarchy rule first and only then
/// touches the underlying [parking_lot::Mutex], so a thread destined to violate
/// the rule never blocks.
#[derive(Debug)]
pub struct HierMutex<T> {
    level: HierarchyLevel,
    inner: Mutex<T>,
}

/// An RAII guard over a [HierMutex].
///
/// Dropping the guard restores the owning thread's ledger to the value saved at
/// acquisition and releases the underlying lock. The guard is `!Send` (inherited
/// from [MutexGuard]), so the release always happens on the acquiring thread.
#[must_use = "if unused the HierMutex will immediately unlock"]
#[derive(Debug)]
pub struct HierMutexGuard<'a, T> {
    previous_level: HierarchyLevel,
    inner: MutexGuard<'a, T>,
}

impl<T> HierMutex<T> {
    /// Create a lock at the given hierarchy level, taking ownership of `value`.
    pub fn new(level: HierarchyLevel, value: T) -> Self {
        Self {
            level,
            inner: Mutex::new(value),
        }
    }

    /// The hierarchy level assigned at construction.
    pub fn level(&self) -> HierarchyLevel {
        self.level
    }

    /// Validate the strict-descent rule against the calling thread's ledger.
    ///
    /// Returns the current ledger value so a successful acquisition can save it
    /// for restoration at release.
    fn check_order(&self) -> Result<HierarchyLevel, LockOrderViolation> {
        let held_level: HierarchyLevel = HELD_LEVEL.with(Cell::get);
        if self.level >= held_level {
            return Err(LockOrderViolation {
                attempted_level: self.level,
                held_level,
            });
        }
        Ok(held_level)
    }

    /// Acquire the lock, blocking until it is available.
    ///
    /// The hierarchy check happens before the blocking acquire: on violation the
    /// error is returned immediately, the underlying mutex is never contended, and
    /// the thread's ledger is untouched. Re-acquiring a lock at the level already
    /// held is itself a violation, which converts accidental re-entrancy into a
    /// reported error rather than a deadlock.
    pub fn lock(&self) -> Result<HierMutexGuard<'_, T>, LockOrderViolation> {
        let previous_level: HierarchyLevel = self.check_order()?;
        let inner: MutexGuard<'_, T> = self.inner.lock();

        HELD_LEVEL.with(|held| held.set(self.level));
        trace!(level = self.level, previous_level, "acquired");
        Ok(HierMutexGuard {
            previous_level,
            inner,
        })
    }

    /// Attempt to acquire the lock without blocking.
    ///
    /// The same hierarchy validation as [HierMutex::lock] runs first; a contended
    /// lock yields [TryLockError::Contended]. On either failure the underlying
    /// lock is not held and the thread's ledger is untouched.
    pub fn try_lock(&self) -> Result<HierMutexGuard<'_, T>, TryLockError> {
        let previous_level: HierarchyLevel = self.check_order()?;
        let inner: MutexGuard<'_, T> = self.inner.try_lock().ok_or(TryLockError::Contended)?;

        HELD_LEVEL.with(|held| held.set(self.level));
        trace!(level = self.level, previous_level, "acquired without blocking");
        Ok(HierMutexGuard {
            previous_level,
            inner,
        })
    }
}

impl<'a, T> Deref for HierMutexGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.inner.deref()
    }
}

impl<'a, T> DerefMut for HierMutexGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.inner.deref_mut()
    }
}

impl<'a, T> Drop for HierMutexGuard<'a, T> {
    fn drop(&mut self) {
        // The ledger is thread-local, so restoring it before the inner MutexGuard
        // field releases the mutex is unobservable.
        HELD_LEVEL.with(|held| held.set(self.previous_level));
        trace!(restored_level = self.previous_level, "released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::{LockOrderViolation, TryLockError};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use test_log::test;
    use tracing::debug;

    fn held_level() -> HierarchyLevel {
        HELD_LEVEL.with(Cell::get)
    }

    #[test]
    fn test_descending_acquisition_succeeds_and_restores_ledger() {
        let outer: HierMutex<u32> = HierMutex::new(100, 0);
        let middle: HierMutex<u32> = HierMutex::new(75, 0);
        let inner: HierMutex<u32> = HierMutex::new(50, 0);

        let outer_guard = outer.lock().unwrap();
        assert_eq!(held_level(), 100);
        {
            let inner_guard = inner.lock().unwrap();
            assert_eq!(held_level(), 50);
            drop(inner_guard);
        }
        // ledger is back at the outer level, so a level between 50 and 100 is
        // acquirable again
        assert_eq!(held_level(), 100);
        let middle_guard = middle.lock().unwrap();
        assert_eq!(held_level(), 75);

        drop(middle_guard);
        drop(outer_guard);
        assert_eq!(held_level(), NO_LOCK_HELD);
    }

    #[test]
    fn test_equal_or_higher_level_is_rejected() {
        let low: HierMutex<()> = HierMutex::new(10, ());
        let same: HierMutex<()> = HierMutex::new(10, ());
        let high: Arc<HierMutex<()>> = Arc::new(HierMutex::new(20, ()));

        let _guard = low.lock().unwrap();

        let error: LockOrderViolation = same.lock().unwrap_err();
        assert_eq!(
            error,
            LockOrderViolation {
                attempted_level: 10,
                held_level: 10
            }
        );

        let error: LockOrderViolation = high.lock().unwrap_err();
        debug!("violation: {error}");
        assert_eq!(
            error,
            LockOrderViolation {
                attempted_level: 20,
                held_level: 10
            }
        );

        // the rejected lock was never acquired: another thread can take it freely
        let high_clone = Arc::clone(&high);
        thread::spawn(move || {
            let guard = high_clone.lock().unwrap();
            drop(guard);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_violation_leaves_ledger_untouched() {
        let low: HierMutex<()> = HierMutex::new(5, ());
        let high: HierMutex<()> = HierMutex::new(99, ());

        let _guard = low.lock().unwrap();
        assert!(high.lock().is_err());
        assert!(high.try_lock().is_err());
        assert_eq!(held_level(), 5);
    }

    #[test]
    fn test_sentinel_allows_any_first_acquisition() {
        let nearly_max: HierMutex<()> = HierMutex::new(HierarchyLevel::MAX - 1, ());
        let guard = nearly_max.lock().unwrap();
        drop(guard);

        // the sentinel level itself is reserved and can never be acquired
        let reserved: HierMutex<()> = HierMutex::new(NO_LOCK_HELD, ());
        assert!(reserved.lock().is_err());
    }

    #[test]
    fn test_try_lock_reports_contention() {
        let lock: Arc<HierMutex<u32>> = Arc::new(HierMutex::new(7, 0));
        let (acquired_tx, acquired_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let lock_clone = Arc::clone(&lock);
        let holder = thread::spawn(move || {
            let _guard = lock_clone.lock().unwrap();
            acquired_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        });

        acquired_rx.recv().unwrap();
        let error: TryLockError = lock.try_lock().unwrap_err();
        assert_eq!(error, TryLockError::Contended);

        release_tx.send(()).unwrap();
        holder.join().unwrap();

        // free again: the earlier failures left no residue
        let guard = lock.try_lock().unwrap();
        drop(guard);
    }

    #[test]
    fn test_ledger_is_per_thread() {
        let low: HierMutex<()> = HierMutex::new(1, ());
        let high: Arc<HierMutex<()>> = Arc::new(HierMutex::new(1_000, ()));

        let _guard = low.lock().unwrap();

        // holding level 1 here does not constrain another thread's ledger
        let high_clone = Arc::clone(&high);
        thread::spawn(move || {
            let guard = high_clone.lock().unwrap();
            drop(guard);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_guard_gives_access_to_the_value() {
        let lock: HierMutex<Vec<u32>> = HierMutex::new(3, vec![1, 2]);
        {
            let mut guard = lock.lock().unwrap();
            guard.push(3);
        }
        let guard = lock.lock().unwrap();
        assert_eq!(*guard, vec![1, 2, 3]);
    }
}
