use crate::{DirectMemoryError, MemoryType, SearchWindow};
use core::ops::Bound;
use kernel_info::memory::DIRECT_MEMORY_GRANULARITY;
use kernel_memory_addresses::{Extent, PhysicalAddress, Size16K};
use log::trace;
use std::collections::BTreeMap;

/// Whether a region is available or reserved, and for what.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RegionState {
    Free,
    Allocated(MemoryType),
}

/// One entry of the region table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub extent: Extent,
    pub state: RegionState,
}

impl Region {
    #[inline]
    #[must_use]
    pub const fn is_free(&self) -> bool {
        matches!(self.state, RegionState::Free)
    }
}

/// A live reservation: the extent and the type it was allocated with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AllocationRecord {
    pub extent: Extent,
    pub memory_type: MemoryType,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Slot {
    len: u64,
    state: RegionState,
}

impl Slot {
    const fn is_free(self) -> bool {
        matches!(self.state, RegionState::Free)
    }
}

/// Align `value` up to a multiple of `align` (any non-zero value).
#[inline]
const fn checked_align_up(value: u64, align: u64) -> Option<u64> {
    let rem = value % align;
    if rem == 0 {
        Some(value)
    } else {
        value.checked_add(align - rem)
    }
}

/// Build the extent of a slot; failing here means the table is corrupted.
fn slot_extent(base: u64, len: u64) -> Extent {
    Extent::new(PhysicalAddress::new(base), len)
        .unwrap_or_else(|e| panic!("region table corrupted at {base:#x}: {e}"))
}

/// The authoritative map of direct memory usage.
///
/// Regions are keyed by base address and partition `[0, total_size)`
/// exactly. Reservation splits a free region into up to two free remainders
/// around the carved extent; release coalesces with free neighbours on both
/// sides.
///
/// # Invariants
/// - Regions are non-overlapping and leave no gaps; their union is `[0, total_size)`.
/// - Every base and length is a non-zero multiple of the 16 KiB granularity.
/// - No two adjacent regions are both free.
#[derive(Debug)]
pub(crate) struct RegionTable {
    total_size: u64,
    slots: BTreeMap<u64, Slot>,
}

impl RegionTable {
    /// A table with a single free region spanning the whole budget.
    pub(crate) fn new(total_size: u64) -> Self {
        debug_assert!(total_size > 0 && total_size.is_multiple_of(DIRECT_MEMORY_GRANULARITY));
        let mut slots = BTreeMap::new();
        slots.insert(
            0,
            Slot {
                len: total_size,
                state: RegionState::Free,
            },
        );
        Self { total_size, slots }
    }

    /// Slots overlapping `window` (clamped to the budget), in address order.
    fn slots_within(&self, window: SearchWindow) -> impl Iterator<Item = (u64, Slot)> + '_ {
        let end = window.end().as_u64().min(self.total_size);
        let start = window.start().as_u64().min(end);
        let first = self
            .slots
            .range(..=start)
            .next_back()
            .map_or(start, |(&base, _)| base);
        self.slots
            .range(first..end)
            .map(|(&base, &slot)| (base, slot))
            .filter(move |(base, slot)| base + slot.len > start)
    }

    /// The slot whose range contains `addr`, if any.
    fn slot_containing(&self, addr: u64) -> Option<(u64, Slot)> {
        self.slots
            .range(..=addr)
            .next_back()
            .map(|(&base, &slot)| (base, slot))
            .filter(|(base, slot)| addr < base + slot.len)
    }

    /// Lowest-addressed extent of `len` bytes, aligned to `align`, lying inside
    /// both a free region and `window`.
    pub(crate) fn first_fit(&self, window: SearchWindow, len: u64, align: u64) -> Option<Extent> {
        if len == 0 || align == 0 {
            return None;
        }
        let window_end = window.end().as_u64().min(self.total_size);
        let window_start = window.start().as_u64();
        self.slots_within(window)
            .filter(|(_, slot)| slot.is_free())
            .find_map(|(base, slot)| {
                let lo = base.max(window_start);
                let hi = (base + slot.len).min(window_end);
                let carve_start = checked_align_up(lo, align)?;
                let carve_end = carve_start.checked_add(len)?;
                if carve_end > hi {
                    return None;
                }
                Extent::new(PhysicalAddress::new(carve_start), len).ok()
            })
    }

    /// Largest free, `align`-aligned, granule-sized run inside `window`.
    ///
    /// Ties go to the lowest address.
    pub(crate) fn largest_free(&self, window: SearchWindow, align: u64) -> Option<Extent> {
        if align == 0 {
            return None;
        }
        let window_end = window.end().as_u64().min(self.total_size);
        let window_start = window.start().as_u64();
        self.slots_within(window)
            .filter(|(_, slot)| slot.is_free())
            .filter_map(|(base, slot)| {
                let lo = checked_align_up(base.max(window_start), align)?;
                let hi = PhysicalAddress::new((base + slot.len).min(window_end)).align_down::<Size16K>();
                Extent::from_bounds(PhysicalAddress::new(lo), hi).ok()
            })
            .fold(None, |best: Option<Extent>, candidate| match best {
                Some(best) if best.len() >= candidate.len() => Some(best),
                _ => Some(candidate),
            })
    }

    /// Mark `carve` as allocated, splitting the free region that holds it.
    ///
    /// # Panics
    /// If `carve` is not wholly inside one free region. Callers obtain `carve`
    /// from [`first_fit`](Self::first_fit) under the same lock, so this only
    /// fires on table corruption.
    pub(crate) fn reserve(&mut self, carve: Extent, memory_type: MemoryType) {
        let carve_start = carve.base().as_u64();
        let carve_end = carve.end().as_u64();
        let Some((base, slot)) = self.slot_containing(carve_start) else {
            panic!("carve {carve} lies outside the region table");
        };
        let slot_end = base + slot.len;
        assert!(
            slot.is_free() && carve_end <= slot_end,
            "carve {carve} is not inside a single free region"
        );

        self.slots.remove(&base);
        if carve_start > base {
            self.slots.insert(
                base,
                Slot {
                    len: carve_start - base,
                    state: RegionState::Free,
                },
            );
        }
        self.slots.insert(
            carve_start,
            Slot {
                len: carve.len(),
                state: RegionState::Allocated(memory_type),
            },
        );
        if carve_end < slot_end {
            self.slots.insert(
                carve_end,
                Slot {
                    len: slot_end - carve_end,
                    state: RegionState::Free,
                },
            );
        }
        trace!("reserved {carve} ({memory_type}) from free region [{base:#x}..{slot_end:#x})");
    }

    /// Return the allocation exactly matching `extent` to the free pool.
    ///
    /// # Errors
    /// [`DirectMemoryError::NotFound`] unless an allocated region starts at
    /// `extent.base()` with exactly `extent.len()` bytes.
    pub(crate) fn release(&mut self, extent: Extent) -> Result<MemoryType, DirectMemoryError> {
        let base = extent.base().as_u64();
        let memory_type = match self.slots.get(&base) {
            Some(&Slot {
                len,
                state: RegionState::Allocated(memory_type),
            }) if len == extent.len() => memory_type,
            _ => {
                return Err(DirectMemoryError::NotFound {
                    address: extent.base(),
                });
            }
        };
        self.slots.remove(&base);

        let mut start = base;
        let mut end = base + extent.len();

        let prev = self
            .slots
            .range(..base)
            .next_back()
            .map(|(&prev_base, &prev)| (prev_base, prev));
        if let Some((prev_base, prev)) = prev
            && prev.is_free()
            && prev_base + prev.len == base
        {
            self.slots.remove(&prev_base);
            start = prev_base;
        }

        if let Some(next) = self.slots.get(&end).copied()
            && next.is_free()
        {
            self.slots.remove(&end);
            end += next.len;
        }

        self.slots.insert(
            start,
            Slot {
                len: end - start,
                state: RegionState::Free,
            },
        );
        trace!("released {extent} ({memory_type}), free region now [{start:#x}..{end:#x})");
        Ok(memory_type)
    }

    /// The allocation containing `addr`; failing that, when `find_next` is
    /// set, the first allocation above it.
    pub(crate) fn find_allocation(&self, addr: PhysicalAddress, find_next: bool) -> Option<AllocationRecord> {
        let record = |base: u64, slot: Slot| match slot.state {
            RegionState::Allocated(memory_type) => Some(AllocationRecord {
                extent: slot_extent(base, slot.len),
                memory_type,
            }),
            RegionState::Free => None,
        };

        let addr = addr.as_u64();
        if let Some(found) = self
            .slot_containing(addr)
            .and_then(|(base, slot)| record(base, slot))
        {
            return Some(found);
        }
        if !find_next {
            return None;
        }
        self.slots
            .range((Bound::Excluded(addr), Bound::Unbounded))
            .find_map(|(&base, &slot)| record(base, slot))
    }

    pub(crate) fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.slots.iter().map(|(&base, slot)| Region {
            extent: slot_extent(base, slot.len),
            state: slot.state,
        })
    }

    /// Bytes currently reserved.
    pub(crate) fn allocated_size(&self) -> u64 {
        self.slots
            .values()
            .filter(|slot| !slot.is_free())
            .map(|slot| slot.len)
            .sum()
    }

    /// Verify every table invariant.
    ///
    /// # Panics
    /// On the first violated invariant; the table is corrupted and no guest
    /// call can be answered reliably anymore.
    pub(crate) fn check_invariants(&self) {
        let mut cursor = 0_u64;
        let mut prev_free = false;
        for (&base, slot) in &self.slots {
            assert_eq!(base, cursor, "gap or overlap at {base:#x} (expected {cursor:#x})");
            assert!(slot.len > 0, "empty region at {base:#x}");
            assert!(
                base.is_multiple_of(DIRECT_MEMORY_GRANULARITY)
                    && slot.len.is_multiple_of(DIRECT_MEMORY_GRANULARITY),
                "region at {base:#x} (len {:#x}) breaks the 16 KiB granularity",
                slot.len
            );
            assert!(
                !(prev_free && slot.is_free()),
                "free region at {base:#x} was not coalesced with its predecessor"
            );
            prev_free = slot.is_free();
            cursor = base
                .checked_add(slot.len)
                .unwrap_or_else(|| panic!("region at {base:#x} overflows"));
        }
        assert_eq!(cursor, self.total_size, "regions do not cover the budget");
    }
}
