use crate::{PageSize, PhysicalAddress, Size16K};
use core::fmt;

/// A contiguous, non-empty run of direct memory: `[base, base + len)`.
///
/// # Invariants
/// - `len > 0`
/// - `base` and `len` are multiples of [`Size16K`]
/// - `base + len` does not overflow
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Extent {
    base: PhysicalAddress,
    len: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtentError {
    #[error("extent length must not be zero")]
    Empty,
    #[error("extent base {0} is not 16 KiB aligned")]
    UnalignedBase(PhysicalAddress),
    #[error("extent length {0:#x} is not a multiple of 16 KiB")]
    UnalignedLength(u64),
    #[error("extent end overflows the address space")]
    Overflow,
}

impl Extent {
    /// Build an extent, checking every invariant.
    ///
    /// # Errors
    /// Returns an [`ExtentError`] naming the first invariant that does not hold.
    pub const fn new(base: PhysicalAddress, len: u64) -> Result<Self, ExtentError> {
        if len == 0 {
            return Err(ExtentError::Empty);
        }
        if !base.is_aligned::<Size16K>() {
            return Err(ExtentError::UnalignedBase(base));
        }
        if !len.is_multiple_of(Size16K::SIZE) {
            return Err(ExtentError::UnalignedLength(len));
        }
        if base.checked_add(len).is_none() {
            return Err(ExtentError::Overflow);
        }
        Ok(Self { base, len })
    }

    /// Build an extent from `[base, end)`.
    ///
    /// # Errors
    /// See [`Extent::new`]; `end <= base` reports [`ExtentError::Empty`].
    pub const fn from_bounds(base: PhysicalAddress, end: PhysicalAddress) -> Result<Self, ExtentError> {
        if end.as_u64() <= base.as_u64() {
            return Err(ExtentError::Empty);
        }
        Self::new(base, end.as_u64() - base.as_u64())
    }

    #[inline]
    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    #[inline]
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Exclusive end address.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.base.as_u64() + self.len)
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, addr: PhysicalAddress) -> bool {
        addr.as_u64() >= self.base.as_u64() && addr.as_u64() < self.end().as_u64()
    }

    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.base.as_u64() < other.end().as_u64() && other.base.as_u64() < self.end().as_u64()
    }
}

impl fmt::Debug for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extent[{}..{})", self.base, self.end())
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.base, self.end())
    }
}
