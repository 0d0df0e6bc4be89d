use crate::status::ErrorCode;
use kernel_dmem::{DirectMemoryError, UnknownMemoryType};
use kernel_memory_addresses::ExtentError;

/// Why the validator refused a request. Every variant reports
/// [`ErrorCode::InvalidArgument`] to the guest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("search start {0:#x} is negative")]
    NegativeSearchStart(i64),
    #[error("search end {end:#x} is not above search start {start:#x}")]
    EmptySearchWindow { start: i64, end: i64 },
    #[error("length {0:#x} is zero or not a multiple of 16 KiB")]
    InvalidLength(u64),
    #[error("length {len:#x} does not fit the search window [{start:#x}..{end:#x})")]
    LengthOutOfWindow { start: i64, end: i64, len: u64 },
    #[error("alignment {0:#x} is not a 16 KiB aligned power of two")]
    InvalidAlignment(u64),
    #[error("output pointer is null")]
    MissingOutput,
    #[error(transparent)]
    UnknownMemoryType(#[from] UnknownMemoryType),
    #[error("address {0:#x} is negative")]
    NegativeAddress(i64),
    #[error("address {0:#x} is not 16 KiB aligned")]
    UnalignedAddress(i64),
    #[error(transparent)]
    Extent(#[from] ExtentError),
}

/// Everything a direct memory syscall can fail with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyscallError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),
    #[error(transparent)]
    DirectMemory(#[from] DirectMemoryError),
}

impl SyscallError {
    /// The status code the guest sees.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::DirectMemory(DirectMemoryError::Busy { .. }) => ErrorCode::ResourceBusy,
            Self::DirectMemory(DirectMemoryError::NotFound { .. }) => ErrorCode::NotFound,
        }
    }
}
