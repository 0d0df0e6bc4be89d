//! # Runtime Configuration

use kernel_info::memory::{DIRECT_MEMORY_GRANULARITY, MAIN_DIRECT_MEMORY_SIZE};

/// Values fixed when the emulated kernel starts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DirectMemoryConfig {
    total_size: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("the direct memory budget must not be empty")]
    Empty,
    #[error("the direct memory budget {0:#x} is not a multiple of 16 KiB")]
    Unaligned(u64),
}

impl DirectMemoryConfig {
    /// # Errors
    /// The budget must be non-zero and a multiple of the 16 KiB granularity.
    pub const fn new(total_size: u64) -> Result<Self, ConfigError> {
        if total_size == 0 {
            return Err(ConfigError::Empty);
        }
        if !total_size.is_multiple_of(DIRECT_MEMORY_GRANULARITY) {
            return Err(ConfigError::Unaligned(total_size));
        }
        Ok(Self { total_size })
    }

    #[inline]
    #[must_use]
    pub const fn total_size(&self) -> u64 {
        self.total_size
    }
}

impl Default for DirectMemoryConfig {
    fn default() -> Self {
        Self {
            total_size: MAIN_DIRECT_MEMORY_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_main_budget() {
        assert_eq!(DirectMemoryConfig::default().total_size(), MAIN_DIRECT_MEMORY_SIZE);
    }

    #[test]
    fn rejects_bad_budgets() {
        assert_eq!(DirectMemoryConfig::new(0), Err(ConfigError::Empty));
        assert_eq!(
            DirectMemoryConfig::new(0x1000),
            Err(ConfigError::Unaligned(0x1000))
        );
        assert!(DirectMemoryConfig::new(1 << 30).is_ok());
    }
}
