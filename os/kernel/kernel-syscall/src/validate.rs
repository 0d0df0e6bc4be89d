//! # Request Validation
//!
//! Turns the guest's raw integers into typed requests, or rejects them.
//! Checks run in a fixed order and the first failing one is reported, so the
//! error a guest sees for an input breaking several rules is stable.

use crate::error::ValidationError;
use kernel_dmem::{AllocRequest, MemoryType, SearchWindow};
use kernel_info::memory::DIRECT_MEMORY_GRANULARITY;
use kernel_memory_addresses::{Extent, PhysicalAddress};

/// How the allocation length is checked against the search window.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BoundsCheck {
    /// The window must be at least `len` bytes wide.
    #[default]
    RangeFit,
    /// The console kernel's own test: `start < len && end > len`.
    ///
    /// It compares the length against the window's addresses, so it both
    /// rejects fitting requests high in memory and admits windows narrower
    /// than `len` (which then fail as busy). Select it to reproduce the
    /// kernel's error responses exactly.
    Literal,
}

impl BoundsCheck {
    /// Whether `len` passes against `[start, end)`; both bounds are already
    /// known to be non-negative with `end > start`.
    #[must_use]
    pub const fn admits(self, start: i64, end: i64, len: u64) -> bool {
        let start = start.cast_unsigned();
        let end = end.cast_unsigned();
        match self {
            Self::RangeFit => end.saturating_sub(start) >= len,
            Self::Literal => start < len && end > len,
        }
    }
}

/// Raw `sceKernelAllocateDirectMemory` arguments.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AllocArgs {
    pub search_start: i64,
    pub search_end: i64,
    pub len: u64,
    pub alignment: u64,
    pub memory_type: i32,
    /// Whether the guest passed a non-null physical address out pointer.
    pub has_output: bool,
}

/// An [`AllocRequest`] that passed [`validate_alloc`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ValidatedAllocRequest(AllocRequest);

impl ValidatedAllocRequest {
    #[inline]
    #[must_use]
    pub const fn request(&self) -> &AllocRequest {
        &self.0
    }
}

const fn is_granular(value: u64) -> bool {
    value.is_multiple_of(DIRECT_MEMORY_GRANULARITY)
}

const fn check_window(start: i64, end: i64) -> Result<SearchWindow, ValidationError> {
    if start < 0 {
        return Err(ValidationError::NegativeSearchStart(start));
    }
    if end <= start {
        return Err(ValidationError::EmptySearchWindow { start, end });
    }
    Ok(SearchWindow::new(
        PhysicalAddress::new(start.cast_unsigned()),
        PhysicalAddress::new(end.cast_unsigned()),
    ))
}

/// `0` (granularity) or a power of two that is itself 16 KiB aligned.
const fn check_alignment(alignment: u64) -> Result<u64, ValidationError> {
    if alignment != 0 && (!alignment.is_power_of_two() || !is_granular(alignment)) {
        return Err(ValidationError::InvalidAlignment(alignment));
    }
    Ok(alignment)
}

/// Validate an allocation request.
///
/// Order: search start sign, window emptiness, length and bounds, alignment,
/// output pointer, memory type.
///
/// # Errors
/// The first rule the arguments break.
pub fn validate_alloc(args: &AllocArgs, bounds: BoundsCheck) -> Result<ValidatedAllocRequest, ValidationError> {
    let window = check_window(args.search_start, args.search_end)?;

    let len = args.len;
    if len == 0 || !is_granular(len) {
        return Err(ValidationError::InvalidLength(len));
    }
    if !bounds.admits(args.search_start, args.search_end, len) {
        return Err(ValidationError::LengthOutOfWindow {
            start: args.search_start,
            end: args.search_end,
            len,
        });
    }

    let alignment = check_alignment(args.alignment)?;

    if !args.has_output {
        return Err(ValidationError::MissingOutput);
    }

    let memory_type = MemoryType::try_from(args.memory_type)?;

    Ok(ValidatedAllocRequest(AllocRequest {
        window,
        len,
        alignment,
        memory_type,
    }))
}

/// Validate a release of `[start, start + len)`.
///
/// # Errors
/// Negative or misaligned start, zero or misaligned length, or a range
/// running past the end of the address space.
pub fn validate_free(start: i64, len: u64) -> Result<Extent, ValidationError> {
    if start < 0 {
        return Err(ValidationError::NegativeAddress(start));
    }
    if !is_granular(start.cast_unsigned()) {
        return Err(ValidationError::UnalignedAddress(start));
    }
    if len == 0 || !is_granular(len) {
        return Err(ValidationError::InvalidLength(len));
    }
    Ok(Extent::new(PhysicalAddress::new(start.cast_unsigned()), len)?)
}

/// Validate an available-size query; returns the window and alignment.
///
/// # Errors
/// Same window and alignment rules as [`validate_alloc`], then missing outputs.
pub const fn validate_available(
    search_start: i64,
    search_end: i64,
    alignment: u64,
    has_outputs: bool,
) -> Result<(SearchWindow, u64), ValidationError> {
    let window = match check_window(search_start, search_end) {
        Ok(window) => window,
        Err(e) => return Err(e),
    };
    let alignment = match check_alignment(alignment) {
        Ok(alignment) => alignment,
        Err(e) => return Err(e),
    };
    if !has_outputs {
        return Err(ValidationError::MissingOutput);
    }
    Ok((window, alignment))
}

/// Validate a lookup at `address`.
///
/// # Errors
/// Negative address or missing outputs.
pub const fn validate_lookup(address: i64, has_outputs: bool) -> Result<PhysicalAddress, ValidationError> {
    if address < 0 {
        return Err(ValidationError::NegativeAddress(address));
    }
    if !has_outputs {
        return Err(ValidationError::MissingOutput);
    }
    Ok(PhysicalAddress::new(address.cast_unsigned()))
}
