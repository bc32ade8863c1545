//! Partitioned parallel sorting.
//!
//! The driver [sort_partitioned] splits an array into contiguous, non-overlapping
//! partitions, one per worker thread, sorts each partition concurrently, waits for
//! every worker at a join barrier, and then folds the sorted partitions together
//! left-to-right with a sequential two-pointer merge.
//!
//! The workers operate on disjoint sub-slices, so the sort phase needs no locking:
//! correctness comes from partitioning, not synchronization.

use core::cmp;
use core::mem;
use core::ops::Range;
use core::slice;
use std::num::NonZeroUsize;
use std::thread;

use tracing::{debug, instrument, trace, warn};

use crate::err::RangeError;
use crate::scoped::{ReleaseMode, ScopedThread};

/// The number of sort workers to fan out: the reported hardware parallelism with a
/// floor of 2.
///
/// The floor is authoritative: an environment reporting zero or failing to report
/// at all still gets two workers.
pub fn worker_count() -> usize {
    let reported: usize = thread::available_parallelism().map_or(0, NonZeroUsize::get);
    cmp::max(2, reported)
}

/// Split `[0, len)` into `workers` contiguous half-open ranges.
///
/// Every range spans `len / workers` elements except the last, which extends to
/// `len` to absorb the remainder of the integer division. The ranges are
/// collectively exhaustive with no gaps or overlaps. A worker count of zero is
/// treated as one.
pub fn partition_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers: usize = cmp::max(1, workers);
    let section_size: usize = len / workers;

    (0..workers)
        .map(|i| {
            let start: usize = i * section_size;
            let end: usize = if i == workers - 1 {
                len
            } else {
                (i + 1) * section_size
            };
            start..end
        })
        .collect()
}

/// Sort `data[range]` ascending in place.
///
/// An out-of-bounds, empty, or inverted range is rejected before any element is
/// touched. No stability guarantee; equal elements may be reordered.
pub fn sort_range<T: Ord>(data: &mut [T], range: Range<usize>) -> Result<(), RangeError> {
    if range.end > data.len() {
        return Err(RangeError::OutOfBounds {
            start: range.start,
            end: range.end,
            len: data.len(),
        });
    }
    if range.start >= range.end {
        return Err(RangeError::EmptyOrInverted {
            start: range.start,
            end: range.end,
        });
    }
    data[range].sort_unstable();
    Ok(())
}

/// Merge the two adjacent sorted sub-ranges `[start, split)` and `[split, end)` of
/// `data` into one sorted range `[start, end)`, in place.
///
/// Both inputs must already be sorted ascending. The split point must lie strictly
/// inside `(start, end)`; a degenerate request is rejected with no mutation. The
/// merge runs through a temporary buffer sized `end - start` and writes back at
/// the same offsets.
pub fn merge_adjacent<T>(
    data: &mut [T],
    start: usize,
    split: usize,
    end: usize,
) -> Result<(), RangeError>
where
    T: Ord + Clone,
{
    if end > data.len() {
        return Err(RangeError::OutOfBounds {
            start,
            end,
            len: data.len(),
        });
    }
    if !(start < split && split < end) {
        return Err(RangeError::SplitNotInterior { start, split, end });
    }

    let mut merged: Vec<T> = Vec::with_capacity(end - start);
    let mut left: usize = start;
    let mut right: usize = split;
    while left < split && right < end {
        if data[left] < data[right] {
            merged.push(data[left].clone());
            left += 1;
        } else {
            merged.push(data[right].clone());
            right += 1;
        }
    }
    merged.extend_from_slice(&data[left..split]);
    merged.extend_from_slice(&data[right..end]);

    data[start..end].clone_from_slice(&merged);
    Ok(())
}

/// A partition's base pointer and length, sendable to its worker thread.
///
/// Soundness relies on the caller handing out pointers to disjoint sub-slices and
/// joining every worker before the underlying borrow ends.
struct RawSection<T> {
    ptr: *mut T,
    len: usize,
}

unsafe impl<T: Send> Send for RawSection<T> {}

/// Sort `data` ascending using one worker thread per partition.
///
/// The partition layout comes from [partition_ranges] with [worker_count] workers.
/// Workers sort concurrently; the merge phase is strictly sequential and only
/// begins once every worker has been joined. Partitions that come out empty
/// (arrays shorter than the worker count) are logged and skipped, as are the
/// degenerate merges they produce; the array still ends up sorted.
#[instrument(skip(data), fields(len = data.len()))]
pub fn sort_partitioned<T>(data: &mut [T])
where
    T: Ord + Clone + Send + 'static,
{
    if data.len() < 2 {
        trace!("nothing to sort");
        return;
    }

    let workers: usize = worker_count();
    let ranges: Vec<Range<usize>> = partition_ranges(data.len(), workers);
    debug!(workers, "partitioned for concurrent sorting");

    {
        let mut sorters: Vec<ScopedThread> = Vec::with_capacity(ranges.len());
        let mut rest: &mut [T] = &mut *data;
        for range in &ranges {
            let (section, tail) = mem::take(&mut rest).split_at_mut(range.len());
            rest = tail;

            let raw: RawSection<T> = RawSection {
                ptr: section.as_mut_ptr(),
                len: section.len(),
            };
            let section_start: usize = range.start;
            let handle = thread::spawn(move || {
                // capture the whole struct so its Send impl applies, not the raw
                // pointer field alone (edition-2021 disjoint closure captures)
                let raw: RawSection<T> = raw;
                // SAFETY: `raw` points at a sub-slice carved off by split_at_mut,
                // so no two workers alias, and the ScopedThread join barrier below
                // fires on every exit path before the borrow of `data` ends.
                let section: &mut [T] = unsafe { slice::from_raw_parts_mut(raw.ptr, raw.len) };
                let section_len: usize = section.len();
                if let Err(error) = sort_range(section, 0..section_len) {
                    warn!(%error, section_start, "skipping unsortable partition");
                }
            });
            sorters.push(ScopedThread::new(handle, ReleaseMode::Join));
        }
        // dropping `sorters` is the join barrier: every partition is fully sorted
        // past this point
    }

    for range in ranges.iter().skip(1) {
        if let Err(error) = merge_adjacent(data, 0, range.start, range.end) {
            warn!(%error, "skipping degenerate merge");
        }
    }
}
