//! Scoped ownership of a spawned thread.
//!
//! [ScopedThread] binds a [JoinHandle] to a lexical scope: when the wrapper is
//! dropped, the release action chosen at construction fires exactly once, on every
//! exit path, including early return and unwinding. This is the join barrier
//! building block used by the sort driver in [crate::sort].

use std::panic;
use std::thread::{self, JoinHandle};

use tracing::{error, trace};

/// What to do with the owned thread when the wrapper goes out of scope.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReleaseMode {
    /// Block until the owned thread finishes.
    Join,
    /// Let the owned thread keep running independently; no further
    /// synchronization with it is possible.
    Detach,
}

/// Owns a running thread's handle and joins or detaches it exactly once at drop.
///
/// The handle is moved in at construction, so the wrapper cannot be copied and the
/// release action cannot fire twice. In [ReleaseMode::Join] mode, a panic raised
/// on the owned thread is resumed on the owner at join time, unless the owner is
/// itself already unwinding, in which case the panic is logged and swallowed
/// (panicking during a panic would abort).
#[derive(Debug)]
pub struct ScopedThread {
    handle: Option<JoinHandle<()>>,
    mode: ReleaseMode,
}

impl ScopedThread {
    /// Take ownership of `handle`, to be released in `mode` at end of scope.
    pub fn new(handle: JoinHandle<()>, mode: ReleaseMode) -> Self {
        Self {
            handle: Some(handle),
            mode,
        }
    }

}

impl Drop for ScopedThread {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match self.mode {
            ReleaseMode::Join => {
                trace!(thread_id = ?handle.thread().id(), "joining owned thread");
                if let Err(panic_payload) = handle.join() {
                    if thread::panicking() {
                        error!("owned thread panicked while its owner was already unwinding");
                    } else {
                        panic::resume_unwind(panic_payload);
                    }
                }
            }
            ReleaseMode::Detach => {
                trace!(thread_id = ?handle.thread().id(), "detaching owned thread");
                drop(handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;
    use test_log::test;

    #[test]
    fn test_join_mode_completes_before_scope_exit() {
        let finished: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));

        {
            let finished = Arc::clone(&finished);
            let _owner = ScopedThread::new(
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(20));
                    finished.store(true, Ordering::Release);
                }),
                ReleaseMode::Join,
            );
        }

        // the scope exit above was the join barrier
        assert!(finished.load(Ordering::Acquire));
    }

    #[test]
    fn test_join_fires_on_early_exit() {
        let finished: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));

        fn early_return(flag: Arc<AtomicBool>) -> Option<()> {
            let _owner = ScopedThread::new(
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(20));
                    flag.store(true, Ordering::Release);
                }),
                ReleaseMode::Join,
            );
            let missing: Option<()> = None;
            missing?;
            Some(())
        }

        assert!(early_return(Arc::clone(&finished)).is_none());
        assert!(finished.load(Ordering::Acquire));
    }

    #[test]
    fn test_detach_mode_does_not_block() {
        let (unblock_tx, unblock_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        {
            let _owner = ScopedThread::new(
                thread::spawn(move || {
                    // still blocked here when the owner's scope exits
                    unblock_rx.recv().unwrap();
                    done_tx.send(()).unwrap();
                }),
                ReleaseMode::Detach,
            );
        }

        // reaching this point proves the drop did not wait for the thread;
        // the detached thread keeps running independently
        unblock_tx.send(()).unwrap();
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("detached thread never finished");
    }

    #[test]
    #[should_panic(expected = "worker exploded")]
    fn test_join_forwards_worker_panic() {
        let _owner = ScopedThread::new(
            thread::spawn(|| panic!("worker exploded")),
            ReleaseMode::Join,
        );
    }
}
