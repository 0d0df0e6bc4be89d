//! # Direct Memory Configuration
//!
//! This crate is the single source of truth for the fixed values that govern
//! the emulated console kernel's direct (physical) memory facility. Every
//! other crate reads its budget and granularity from here, so the allocator,
//! the syscall layer and their tests can never drift apart.
//!
//! ## Layout
//!
//! ```text
//! Direct memory (guest physical) address space:
//!
//! 0x0000_0000_0000_0000 ┌─────────────────────────────────┐
//!                       │                                 │
//!                       │  Direct memory budget           │
//!                       │  (16 KiB granular extents,      │
//!                       │   free or allocated + typed)    │
//!                       │                                 │
//! MAIN_DIRECT_MEMORY_SIZE└─────────────────────────────────┘ 0x0000_0001_5000_0000
//! ```
//!
//! The values are `const`s checked at compile time. A running emulator may pick
//! a smaller budget through the allocator's runtime configuration, but it can
//! never change the granularity.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
