//! # Kernel Status Codes
//!
//! Every syscall returns a signed status: [`SCE_OK`] on success, otherwise the
//! sign-extended 32-bit kernel error code of an [`ErrorCode`].

/// Raw status as returned to the guest.
pub type Status = i64;

/// Success.
pub const SCE_OK: Status = 0;

const fn kernel_code(raw: u32) -> Status {
    raw.cast_signed() as Status
}

/// Errors the direct memory syscalls can report.
#[repr(i64)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `SCE_KERNEL_ERROR_ENOENT`: no allocation matches.
    NotFound = kernel_code(0x8002_0002),
    /// `SCE_KERNEL_ERROR_EINVAL`: the caller broke the call's contract.
    InvalidArgument = kernel_code(0x8002_0016),
    /// `SCE_KERNEL_ERROR_EAGAIN`: nothing free fits the request right now.
    ResourceBusy = kernel_code(0x8002_0023),
}

impl ErrorCode {
    #[inline]
    #[must_use]
    pub const fn status(self) -> Status {
        self as Status
    }

    #[must_use]
    pub const fn from_status(status: Status) -> Option<Self> {
        match status {
            s if s == Self::NotFound.status() => Some(Self::NotFound),
            s if s == Self::InvalidArgument.status() => Some(Self::InvalidArgument),
            s if s == Self::ResourceBusy.status() => Some(Self::ResourceBusy),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "SCE_KERNEL_ERROR_ENOENT",
            Self::InvalidArgument => "SCE_KERNEL_ERROR_EINVAL",
            Self::ResourceBusy => "SCE_KERNEL_ERROR_EAGAIN",
        }
    }
}
