//! # Direct Memory Types
//!
//! The guest tags every direct memory allocation with the bus and caching
//! mode it intends to map it with. The numeric values are part of the guest
//! ABI and must round-trip exactly.

use core::fmt;

/// Intended use of a direct memory allocation.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemoryType {
    /// Write-back, accessed through the CPU-coherent ("Onion") bus.
    WbOnion = 0,
    /// Write-combined, accessed through the GPU ("Garlic") bus.
    WcGarlic = 3,
    /// Write-back, accessed through the GPU ("Garlic") bus.
    WbGarlic = 10,
}

/// The guest passed a memory type value with no known variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direct memory type {0}")]
pub struct UnknownMemoryType(pub i32);

impl MemoryType {
    pub const ALL: [Self; 3] = [Self::WbOnion, Self::WcGarlic, Self::WbGarlic];

    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::WbOnion),
            3 => Some(Self::WcGarlic),
            10 => Some(Self::WbGarlic),
            _ => None,
        }
    }

    /// The kernel's name for this type; diagnostics only.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WbOnion => "SCE_KERNEL_WB_ONION",
            Self::WcGarlic => "SCE_KERNEL_WC_GARLIC",
            Self::WbGarlic => "SCE_KERNEL_WB_GARLIC",
        }
    }
}

impl TryFrom<i32> for MemoryType {
    type Error = UnknownMemoryType;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_i32(value).ok_or(UnknownMemoryType(value))
    }
}

impl From<MemoryType> for i32 {
    fn from(value: MemoryType) -> Self {
        value.as_i32()
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abi_values_round_trip() {
        for ty in MemoryType::ALL {
            assert_eq!(MemoryType::try_from(ty.as_i32()), Ok(ty));
        }
        assert_eq!(MemoryType::WbOnion.as_i32(), 0);
        assert_eq!(MemoryType::WcGarlic.as_i32(), 3);
        assert_eq!(MemoryType::WbGarlic.as_i32(), 10);
    }

    #[test]
    fn unknown_values_are_rejected() {
        for raw in [-1, 1, 2, 4, 9, 11, i32::MAX, i32::MIN] {
            assert_eq!(MemoryType::try_from(raw), Err(UnknownMemoryType(raw)));
        }
    }

    #[test]
    fn names() {
        assert_eq!(MemoryType::WcGarlic.to_string(), "SCE_KERNEL_WC_GARLIC");
    }
}
