//! # Direct Memory Layout

use kernel_memory_addresses::{PageSize, Size16K};

/// Allocation unit of the direct memory facility.
///
/// Every extent handed out (and every extent released) has its base and
/// length aligned to this value.
pub const DIRECT_MEMORY_GRANULARITY: u64 = Size16K::SIZE;

/// Total direct memory available to a title running on the main console
/// (5376 MiB). This is what `sceKernelGetDirectMemorySize` reports.
pub const MAIN_DIRECT_MEMORY_SIZE: u64 = 5376 * 1024 * 1024;

const _: () = {
    assert!(DIRECT_MEMORY_GRANULARITY.is_power_of_two());
    assert!(MAIN_DIRECT_MEMORY_SIZE.is_multiple_of(DIRECT_MEMORY_GRANULARITY));
};
