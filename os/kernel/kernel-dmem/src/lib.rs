//! # Direct Memory Allocation
//!
//! This crate emulates the console kernel's direct (physical) memory
//! allocator: a fixed budget of guest physical memory that titles reserve in
//! 16 KiB granules, tag with a [`MemoryType`], and later map into their virtual
//! address space.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Syscall layer (kernel-syscall)         │
//! │    • Raw ABI arguments and status codes             │
//! │    • Request validation                             │
//! └─────────────────┬───────────────────────────────────┘
//!                   │ AllocRequest / Extent
//! ┌─────────────────▼───────────────────────────────────┐
//! │              Allocator ([`DirectMemory`])           │
//! │    • First-fit, lowest address first                │
//! │    • Bounded by the caller's search window          │
//! │    • One critical section per operation             │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │              Region table                           │
//! │    • Free / allocated extents partitioning [0, N)   │
//! │    • Split on reserve, coalesce on release          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Allocation Semantics
//!
//! * **Determinism**: The lowest-addressed free extent that can hold an aligned
//!   carve wins. Titles may depend on getting the same addresses run to run,
//!   so there is no best-fit.
//! * **Search window**: An allocation never leaves `[start, end)` of its
//!   request, even if room exists elsewhere.
//! * **Exhaustion**: When nothing fits, [`DirectMemoryError::Busy`] is
//!   returned immediately; the table is not touched and nothing waits.
//! * **Release**: Only an exact `(base, len)` match of a live allocation can be
//!   freed. The freed range merges with free neighbours.
//!
//! ## Concurrency
//!
//! [`DirectMemory`] is `Send + Sync`. All mutation runs under one mutex held
//! for the whole operation. The total budget is immutable and read without
//! locking.

mod allocator;
mod config;
mod error;
mod memory_type;
mod region_table;
mod request;

pub use allocator::DirectMemory;
pub use config::{ConfigError, DirectMemoryConfig};
pub use error::DirectMemoryError;
pub use memory_type::{MemoryType, UnknownMemoryType};
pub use region_table::{AllocationRecord, Region, RegionState};
pub use request::{AllocRequest, SearchWindow};
