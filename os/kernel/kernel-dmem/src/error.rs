use kernel_memory_addresses::PhysicalAddress;

/// Failures the allocator reports back to the syscall layer.
///
/// Both are guest-visible outcomes, never host faults.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectMemoryError {
    /// Nothing free in the search window can hold the request.
    #[error("no free extent of {len:#x} bytes fits the search window")]
    Busy { len: u64 },
    /// No allocation starts (or lies) at the given address.
    #[error("no direct memory allocation matches {address}")]
    NotFound { address: PhysicalAddress },
}
