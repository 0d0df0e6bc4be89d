//! # Syscall Context

use crate::validate::BoundsCheck;
use kernel_dmem::{DirectMemory, DirectMemoryConfig};

/// Configuration read once when the emulated kernel starts.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SyscallConfig {
    pub direct_memory: DirectMemoryConfig,
    pub bounds_check: BoundsCheck,
}

/// State shared by the direct memory syscalls.
///
/// Built once at emulator start and passed by reference to every call; it is
/// `Send + Sync`, so guest threads may share it through an `Arc`.
#[derive(Debug)]
pub struct DirectMemoryContext {
    memory: DirectMemory,
    bounds_check: BoundsCheck,
}

impl DirectMemoryContext {
    #[must_use]
    pub fn new(config: &SyscallConfig) -> Self {
        Self {
            memory: DirectMemory::new(&config.direct_memory),
            bounds_check: config.bounds_check,
        }
    }

    #[inline]
    #[must_use]
    pub const fn memory(&self) -> &DirectMemory {
        &self.memory
    }

    #[inline]
    #[must_use]
    pub const fn bounds_check(&self) -> BoundsCheck {
        self.bounds_check
    }
}

impl Default for DirectMemoryContext {
    fn default() -> Self {
        Self::new(&SyscallConfig::default())
    }
}
