use core::fmt;
use core::hash::Hash;

/// Sealed trait pattern to restrict `PageSize` impls to our markers.
mod sealed {
    pub trait Sealed {}
}

/// Marker trait for the fixed granules of the direct memory facility.
pub trait PageSize:
    sealed::Sealed + Clone + Copy + Eq + PartialEq + Ord + PartialOrd + Hash + fmt::Display + fmt::Debug
{
    /// Size in bytes (power of two).
    const SIZE: u64;
    /// log2(SIZE), i.e., number of low bits used for the offset.
    const SHIFT: u32;

    fn as_str() -> &'static str;
}

/// 16 KiB granule: the allocation unit of direct memory.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size16K;
impl sealed::Sealed for Size16K {}
impl PageSize for Size16K {
    const SIZE: u64 = 16 * 1024;
    const SHIFT: u32 = 14;

    fn as_str() -> &'static str {
        "16K"
    }
}

/// 64 KiB page, the large GPU page size.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size64K;
impl sealed::Sealed for Size64K {}
impl PageSize for Size64K {
    const SIZE: u64 = 64 * 1024;
    const SHIFT: u32 = 16;

    fn as_str() -> &'static str {
        "64K"
    }
}

/// 2 MiB page (`2_097_152` bytes).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size2M;
impl sealed::Sealed for Size2M {}
impl PageSize for Size2M {
    const SIZE: u64 = 2 * 1024 * 1024;
    const SHIFT: u32 = 21;

    fn as_str() -> &'static str {
        "2M"
    }
}

macro_rules! impl_fmt {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str(Self::as_str())
                }
            }

            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    fmt::Display::fmt(&self, f)
                }
            }
        )+
    };
}

impl_fmt!(Size16K, Size64K, Size2M);

const _: () = {
    assert!(Size16K::SIZE == 1 << Size16K::SHIFT);
    assert!(Size64K::SIZE == 1 << Size64K::SHIFT);
    assert!(Size2M::SIZE == 1 << Size2M::SHIFT);
};
