//! # Direct Memory Syscalls
//!
//! The guest-visible surface of the emulated kernel's direct memory facility.
//! The syscall dispatcher decodes the guest's registers and calls into this
//! crate; results go back as kernel status codes.
//!
//! ```text
//! guest call
//!     │ raw i64 / u64 / i32 arguments, nullable out pointers
//!     ▼
//! [`direct_memory`]   ABI shape: Status + out slots
//!     │
//!     ▼
//! [`validate`]        first failing rule → InvalidArgument
//!     │ ValidatedAllocRequest / Extent / SearchWindow
//!     ▼
//! kernel_dmem::DirectMemory   first-fit reserve / release under one lock
//! ```
//!
//! All state lives in a [`DirectMemoryContext`] created once from a
//! [`SyscallConfig`]; there is no global allocator.
//!
//! ```rust
//! use kernel_dmem::{DirectMemoryConfig, MemoryType};
//! use kernel_syscall::{DirectMemoryContext, SCE_OK, SyscallConfig, direct_memory};
//!
//! let ctx = DirectMemoryContext::new(&SyscallConfig {
//!     direct_memory: DirectMemoryConfig::new(1 << 30).unwrap(),
//!     ..SyscallConfig::default()
//! });
//!
//! let mut pa = -1;
//! let status = direct_memory::allocate_direct_memory(
//!     &ctx, 0, 1 << 30, 0x4000, 0, MemoryType::WbOnion.as_i32(), Some(&mut pa),
//! );
//! assert_eq!(status, SCE_OK);
//! assert_eq!(pa, 0);
//! assert_eq!(direct_memory::free_direct_memory(&ctx, pa, 0x4000), SCE_OK);
//! ```

pub mod direct_memory;
pub mod status;
pub mod validate;

mod context;
mod error;

pub use context::{DirectMemoryContext, SyscallConfig};
pub use error::{SyscallError, ValidationError};
pub use status::{ErrorCode, SCE_OK, Status};
pub use validate::BoundsCheck;
