//! Small multithreading building blocks: a mutex which turns lock-ordering
//! deadlocks into synchronous errors, a scoped owner for spawned threads, and a
//! partitioned parallel sort driver built on top of it.
//!
//! # Hierarchy-checked locking
//!
//! A [HierMutex] is tagged with a [HierarchyLevel] at construction. Each thread
//! keeps a ledger of the level it most recently acquired and still holds;
//! acquiring at an equal or higher level fails with [LockOrderViolation] before
//! the thread ever contends for the underlying mutex:
//!
//! ```
//! use stratalock::HierMutex;
//!
//! let outer = HierMutex::new(2, "outer");
//! let inner = HierMutex::new(1, "inner");
//!
//! let outer_guard = outer.lock().unwrap();
//! let inner_guard = inner.lock().unwrap(); // 1 < 2: fine
//! drop(inner_guard);
//! assert!(outer.lock().is_err()); // 2 >= 2: rejected, not deadlocked
//! # drop(outer_guard);
//! ```
//!
//! # Scoped thread ownership
//!
//! A [ScopedThread] owns a `JoinHandle` and joins or detaches it exactly once
//! when dropped, on every exit path.
//!
//! # Partitioned sorting
//!
//! [sort_partitioned] sorts disjoint partitions of a slice on one thread each,
//! joins them all, then merges the sorted partitions sequentially:
//!
//! ```
//! use stratalock::sort_partitioned;
//!
//! let mut values = vec![5, 3, 8, 1, 9, 2, 7, 4];
//! sort_partitioned(&mut values);
//! assert_eq!(values, vec![1, 2, 3, 4, 5, 7, 8, 9]);
//! ```

pub mod err;
pub mod hier;
pub mod scoped;
pub mod sort;
pub mod types;

pub use err::{LockOrderViolation, RangeError, TryLockError};
pub use hier::{HierMutex, HierMutexGuard};
pub use scoped::{ReleaseMode, ScopedThread};
pub use sort::{merge_adjacent, partition_ranges, sort_partitioned, sort_range, worker_count};
pub use types::{HierarchyLevel, NO_LOCK_HELD};
