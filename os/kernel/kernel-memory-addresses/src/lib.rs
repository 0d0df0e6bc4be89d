//! # Physical Address and Extent Types
//!
//! Strongly typed wrappers for the raw `u64` values the guest kernel ABI uses
//! for physical memory.
//!
//! ## Overview
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PhysicalAddress`] | A guest physical (direct memory) address. |
//! | [`Extent`] | A non-empty, granule-aligned run `[base, base + len)`. |
//! | [`PageSize`] | Marker trait for the fixed granules (`Size16K`, `Size64K`, `Size2M`). |
//!
//! The syscall layer receives signed and unsigned integers from the guest;
//! it converts them into these types once and nothing past that boundary
//! deals in loose integers again.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0000_0000_0000_6000);
//! assert!(!pa.is_aligned::<Size16K>());
//! assert_eq!(pa.align_up_to(Size16K::SIZE), Some(PhysicalAddress::new(0x8000)));
//!
//! let extent = Extent::new(PhysicalAddress::new(0x8000), 3 * Size16K::SIZE).unwrap();
//! assert_eq!(extent.end(), PhysicalAddress::new(0x14000));
//! assert!(extent.contains(PhysicalAddress::new(0x13FFF)));
//! ```
//!
//! ## Design Notes
//!
//! - The types are `#[repr(transparent)]` / plain `Copy` structs and implement
//!   `Eq`, `Ord`, and `Hash`, making them suitable as map keys.
//! - Alignment helpers come in two flavours: the type-level `S: PageSize`
//!   variants for the fixed granules, and `*_to(align)` variants for the
//!   runtime alignments a guest passes in.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod extent;
mod page_size;
mod physical_address;

pub use extent::{Extent, ExtentError};
pub use page_size::{PageSize, Size16K, Size2M, Size64K};
pub use physical_address::PhysicalAddress;
