//! # Direct Memory Allocator
//!
//! [`DirectMemory`] owns the region table and serializes every mutation of
//! it behind one mutex. Each public operation holds the lock for its whole
//! search, split/merge and bookkeeping, so concurrent guest threads only ever
//! observe the table between operations.

use crate::region_table::RegionTable;
use crate::request::effective_alignment;
use crate::{
    AllocRequest, AllocationRecord, DirectMemoryConfig, DirectMemoryError, MemoryType, Region,
    SearchWindow,
};
use kernel_info::memory::DIRECT_MEMORY_GRANULARITY;
use kernel_memory_addresses::{Extent, PhysicalAddress};
use log::{trace, warn};
use std::sync::{Mutex, MutexGuard};

/// The emulated kernel's direct memory allocator.
///
/// One instance is created at emulator start and handed by reference to every
/// syscall that needs it; there is no global.
///
/// # Example
/// ```rust
/// use kernel_dmem::{AllocRequest, DirectMemory, DirectMemoryConfig, MemoryType, SearchWindow};
/// use kernel_memory_addresses::{Extent, PhysicalAddress};
///
/// let dmem = DirectMemory::new(&DirectMemoryConfig::new(1 << 30).unwrap());
/// let request = AllocRequest {
///     window: SearchWindow::new(PhysicalAddress::zero(), PhysicalAddress::new(1 << 30)),
///     len: 0x4000,
///     alignment: 0,
///     memory_type: MemoryType::WbOnion,
/// };
/// let pa = dmem.allocate(&request).unwrap();
/// assert_eq!(pa, PhysicalAddress::zero());
/// dmem.free(Extent::new(pa, 0x4000).unwrap()).unwrap();
/// ```
#[derive(Debug)]
pub struct DirectMemory {
    /// Immutable after construction; read without taking the lock.
    total_size: u64,
    table: Mutex<RegionTable>,
}

impl DirectMemory {
    #[must_use]
    pub fn new(config: &DirectMemoryConfig) -> Self {
        let total_size = config.total_size();
        trace!("direct memory budget {total_size:#x}");
        Self {
            total_size,
            table: Mutex::new(RegionTable::new(total_size)),
        }
    }

    /// The fixed direct memory budget in bytes.
    #[inline]
    #[must_use]
    pub const fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Reserve the lowest-addressed extent satisfying `request`.
    ///
    /// # Errors
    /// [`DirectMemoryError::Busy`] if no free region inside the search window
    /// can hold an aligned extent of `request.len` bytes. The table is left
    /// untouched in that case.
    ///
    /// # Panics
    /// If the region table lock was poisoned by an earlier invariant failure.
    pub fn allocate(&self, request: &AllocRequest) -> Result<PhysicalAddress, DirectMemoryError> {
        let align = request.effective_alignment();
        self.with_table(|table| {
            let Some(carve) = table.first_fit(request.window, request.len, align) else {
                warn!(
                    "direct memory exhausted: {:#x} bytes (alignment {align:#x}) in {}",
                    request.len, request.window
                );
                return Err(DirectMemoryError::Busy { len: request.len });
            };
            debug_assert!(request.window.contains_extent(&carve));
            table.reserve(carve, request.memory_type);
            Ok(carve.base())
        })
    }

    /// Release the allocation exactly matching `extent`, coalescing the freed
    /// range with free neighbours. Returns the type it was allocated with.
    ///
    /// # Errors
    /// [`DirectMemoryError::NotFound`] if `extent` does not match one
    /// allocation exactly (partial frees are refused).
    ///
    /// # Panics
    /// If the region table lock was poisoned by an earlier invariant failure.
    pub fn free(&self, extent: Extent) -> Result<MemoryType, DirectMemoryError> {
        self.with_table(|table| table.release(extent))
    }

    /// The largest free run inside `window` whose start honours `alignment`
    /// (`0` selects the granularity).
    ///
    /// # Errors
    /// [`DirectMemoryError::Busy`] if the window holds no free, aligned granule.
    ///
    /// # Panics
    /// If the region table lock was poisoned by an earlier invariant failure.
    pub fn available(&self, window: SearchWindow, alignment: u64) -> Result<Extent, DirectMemoryError> {
        let align = effective_alignment(alignment);
        self.with_table(|table| table.largest_free(window, align))
            .ok_or(DirectMemoryError::Busy {
                len: DIRECT_MEMORY_GRANULARITY,
            })
    }

    /// The allocation containing `address`; when there is none and
    /// `find_next` is set, the first allocation above it.
    ///
    /// # Errors
    /// [`DirectMemoryError::NotFound`] if no such allocation exists.
    ///
    /// # Panics
    /// If the region table lock was poisoned by an earlier invariant failure.
    pub fn query(&self, address: PhysicalAddress, find_next: bool) -> Result<AllocationRecord, DirectMemoryError> {
        self.with_table(|table| table.find_allocation(address, find_next))
            .ok_or(DirectMemoryError::NotFound { address })
    }

    /// Consistent snapshot of the region table, in address order.
    ///
    /// # Panics
    /// If the region table lock was poisoned by an earlier invariant failure.
    #[must_use]
    pub fn regions(&self) -> Vec<Region> {
        self.with_table(|table| table.regions().collect())
    }

    /// Bytes currently reserved.
    ///
    /// # Panics
    /// If the region table lock was poisoned by an earlier invariant failure.
    #[must_use]
    pub fn allocated_size(&self) -> u64 {
        self.with_table(|table| table.allocated_size())
    }

    /// Verify the region table invariants.
    ///
    /// # Panics
    /// If any invariant is violated; that is a host defect, not a guest error.
    pub fn check_invariants(&self) {
        self.lock().check_invariants();
    }

    fn lock(&self) -> MutexGuard<'_, RegionTable> {
        self.table
            .lock()
            .expect("direct memory region table poisoned by an earlier invariant failure")
    }

    /// Run `f` inside the critical section; debug builds re-verify the
    /// invariants before the lock is released.
    fn with_table<R>(&self, f: impl FnOnce(&mut RegionTable) -> R) -> R {
        let mut table = self.lock();
        let result = f(&mut table);
        if cfg!(debug_assertions) {
            table.check_invariants();
        }
        result
    }
}
