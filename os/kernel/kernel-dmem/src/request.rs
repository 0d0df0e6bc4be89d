use crate::MemoryType;
use core::fmt;
use kernel_info::memory::DIRECT_MEMORY_GRANULARITY;
use kernel_memory_addresses::{Extent, PhysicalAddress};

/// The caller-bounded range `[start, end)` an allocation must lie in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SearchWindow {
    start: PhysicalAddress,
    end: PhysicalAddress,
}

impl SearchWindow {
    /// An `end` at or below `start` yields an empty window that never fits anything.
    #[inline]
    #[must_use]
    pub const fn new(start: PhysicalAddress, end: PhysicalAddress) -> Self {
        Self { start, end }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        self.end
    }

    #[inline]
    #[must_use]
    pub const fn contains_extent(&self, extent: &Extent) -> bool {
        extent.base().as_u64() >= self.start.as_u64()
            && extent.end().as_u64() <= self.end.as_u64()
    }
}

impl fmt::Display for SearchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// A reservation request as the allocator sees it.
///
/// The syscall layer validates the guest's raw arguments before building one
/// of these; the allocator still never trusts it to stay in bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AllocRequest {
    pub window: SearchWindow,
    pub len: u64,
    /// Requested alignment; `0` selects the 16 KiB granularity.
    pub alignment: u64,
    pub memory_type: MemoryType,
}

impl AllocRequest {
    /// The alignment actually applied to the carved extent.
    ///
    /// Never finer than the granularity, so every carve stays granule aligned.
    #[must_use]
    pub const fn effective_alignment(&self) -> u64 {
        effective_alignment(self.alignment)
    }
}

pub(crate) const fn effective_alignment(alignment: u64) -> u64 {
    if alignment == 0 {
        DIRECT_MEMORY_GRANULARITY
    } else {
        match alignment.checked_next_multiple_of(DIRECT_MEMORY_GRANULARITY) {
            Some(aligned) => aligned,
            None => alignment,
        }
    }
}
