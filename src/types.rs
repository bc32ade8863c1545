/// An integer tag attached to each [HierMutex] at construction.
///
/// A thread may only acquire a lock whose level is strictly lower than the level of
/// the most recently acquired lock it still holds, so nested acquisitions always
/// walk down the hierarchy and a cycle between two threads is impossible within the
/// family of hierarchy-checked locks.
///
/// [HierMutex]: crate::hier::HierMutex
pub type HierarchyLevel = usize;

/// The per-thread ledger value meaning "no hierarchy-checked lock is held".
///
/// Every level compares strictly lower than this sentinel, so a thread holding no
/// lock may acquire at any level except [HierarchyLevel::MAX] itself, which is
/// reserved for the sentinel. A [HierMutex] constructed at `usize::MAX` can never
/// be acquired.
///
/// [HierMutex]: crate::hier::HierMutex
pub const NO_LOCK_HELD: HierarchyLevel = HierarchyLevel::MAX;
