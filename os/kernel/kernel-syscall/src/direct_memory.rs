//! # Direct Memory Syscalls
//!
//! Guest-facing entry points of the direct memory facility. Each call comes in
//! two layers:
//!
//! * `try_*` functions take parsed arguments and return a typed `Result`;
//! * the plain functions keep the kernel ABI shape: raw integers in, a
//!   [`Status`] out, and results written through the out slots **only** on
//!   success. A null guest pointer arrives as `None`.

use crate::context::DirectMemoryContext;
use crate::error::SyscallError;
use crate::status::{SCE_OK, Status};
use crate::validate::{AllocArgs, validate_alloc, validate_available, validate_free, validate_lookup};
use kernel_dmem::{AllocationRecord, MemoryType};
use kernel_memory_addresses::PhysicalAddress;
use log::debug;

/// `SceKernelDirectMemoryQueryInfo` as the guest lays it out.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DirectMemoryQueryInfo {
    pub start: i64,
    pub end: i64,
    pub memory_type: i32,
}

impl From<AllocationRecord> for DirectMemoryQueryInfo {
    fn from(record: AllocationRecord) -> Self {
        Self {
            start: record.extent.base().as_u64().cast_signed(),
            end: record.extent.end().as_u64().cast_signed(),
            memory_type: record.memory_type.as_i32(),
        }
    }
}

/// Largest free run found by [`try_available_direct_memory_size`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AvailableDirectMemory {
    pub available: u64,
    pub start: PhysicalAddress,
    pub end: PhysicalAddress,
}

fn to_status<T>(call: &str, result: Result<T, SyscallError>, write: impl FnOnce(T)) -> Status {
    match result {
        Ok(value) => {
            write(value);
            SCE_OK
        }
        Err(err) => {
            let code = err.code();
            debug!("{call} failed with {}: {err}", code.as_str());
            code.status()
        }
    }
}

/// `sceKernelGetDirectMemorySize`: the fixed direct memory budget.
#[must_use]
pub fn get_direct_memory_size(ctx: &DirectMemoryContext) -> u64 {
    let size = ctx.memory().total_size();
    debug!("sceKernelGetDirectMemorySize() = {size:#018x}");
    size
}

/// Typed `sceKernelAllocateDirectMemory`.
///
/// # Errors
/// [`SyscallError::InvalidArgument`] if validation fails, otherwise the
/// allocator's [`Busy`](kernel_dmem::DirectMemoryError::Busy).
pub fn try_allocate_direct_memory(
    ctx: &DirectMemoryContext,
    args: &AllocArgs,
) -> Result<PhysicalAddress, SyscallError> {
    let validated = validate_alloc(args, ctx.bounds_check())?;
    let request = validated.request();
    debug!(
        concat!(
            "sceKernelAllocateDirectMemory:\n",
            "  search_start = {search_start:#018x}\n",
            "  search_end   = {search_end:#018x}\n",
            "  len          = {len:#018x}\n",
            "  alignment    = {alignment:#018x}\n",
            "  memory_type  = {memory_type}"
        ),
        search_start = args.search_start,
        search_end = args.search_end,
        len = request.len,
        alignment = request.alignment,
        memory_type = request.memory_type,
    );

    let pa = ctx.memory().allocate(request)?;
    debug!("  phys_addr    = {:#018x}", pa.as_u64());
    Ok(pa)
}

/// `sceKernelAllocateDirectMemory`.
#[must_use]
pub fn allocate_direct_memory(
    ctx: &DirectMemoryContext,
    search_start: i64,
    search_end: i64,
    len: u64,
    alignment: u64,
    memory_type: i32,
    phys_addr_out: Option<&mut i64>,
) -> Status {
    let args = AllocArgs {
        search_start,
        search_end,
        len,
        alignment,
        memory_type,
        has_output: phys_addr_out.is_some(),
    };
    to_status(
        "sceKernelAllocateDirectMemory",
        try_allocate_direct_memory(ctx, &args),
        |pa| {
            if let Some(out) = phys_addr_out {
                *out = pa.as_u64().cast_signed();
            }
        },
    )
}

/// Typed `sceKernelReleaseDirectMemory`; returns the released type.
///
/// # Errors
/// [`SyscallError::InvalidArgument`] for a malformed range, otherwise the
/// allocator's [`NotFound`](kernel_dmem::DirectMemoryError::NotFound).
pub fn try_free_direct_memory(
    ctx: &DirectMemoryContext,
    start: i64,
    len: u64,
) -> Result<MemoryType, SyscallError> {
    let extent = validate_free(start, len)?;
    debug!("sceKernelReleaseDirectMemory: {extent}");
    Ok(ctx.memory().free(extent)?)
}

/// `sceKernelReleaseDirectMemory`.
#[must_use]
pub fn free_direct_memory(ctx: &DirectMemoryContext, start: i64, len: u64) -> Status {
    to_status(
        "sceKernelReleaseDirectMemory",
        try_free_direct_memory(ctx, start, len),
        |_| {},
    )
}

/// Typed `sceKernelAvailableDirectMemorySize`.
///
/// # Errors
/// [`SyscallError::InvalidArgument`] if validation fails, otherwise the
/// allocator's [`Busy`](kernel_dmem::DirectMemoryError::Busy) when the window
/// holds no free granule.
pub fn try_available_direct_memory_size(
    ctx: &DirectMemoryContext,
    search_start: i64,
    search_end: i64,
    alignment: u64,
) -> Result<AvailableDirectMemory, SyscallError> {
    let (window, alignment) = validate_available(search_start, search_end, alignment, true)?;
    let run = ctx.memory().available(window, alignment)?;
    debug!("sceKernelAvailableDirectMemorySize: {window} align {alignment:#x} -> {run}");
    Ok(AvailableDirectMemory {
        available: run.len(),
        start: run.base(),
        end: run.end(),
    })
}

/// `sceKernelAvailableDirectMemorySize`.
#[must_use]
pub fn available_direct_memory_size(
    ctx: &DirectMemoryContext,
    search_start: i64,
    search_end: i64,
    alignment: u64,
    phys_addr_out: Option<&mut i64>,
    size_out: Option<&mut u64>,
) -> Status {
    let result = validate_available(
        search_start,
        search_end,
        alignment,
        phys_addr_out.is_some() && size_out.is_some(),
    )
    .map_err(SyscallError::from)
    .and_then(|_| try_available_direct_memory_size(ctx, search_start, search_end, alignment));
    to_status("sceKernelAvailableDirectMemorySize", result, |available| {
        if let (Some(addr), Some(size)) = (phys_addr_out, size_out) {
            *addr = available.start.as_u64().cast_signed();
            *size = available.available;
        }
    })
}

/// Typed `sceKernelDirectMemoryQuery`.
///
/// # Errors
/// [`SyscallError::InvalidArgument`] for a negative offset, otherwise the
/// allocator's [`NotFound`](kernel_dmem::DirectMemoryError::NotFound).
pub fn try_direct_memory_query(
    ctx: &DirectMemoryContext,
    offset: i64,
    find_next: bool,
) -> Result<AllocationRecord, SyscallError> {
    let address = validate_lookup(offset, true)?;
    let record = ctx.memory().query(address, find_next)?;
    debug!(
        "sceKernelDirectMemoryQuery: {address} (next: {find_next}) -> {} {}",
        record.extent, record.memory_type
    );
    Ok(record)
}

/// `sceKernelDirectMemoryQuery`.
#[must_use]
pub fn direct_memory_query(
    ctx: &DirectMemoryContext,
    offset: i64,
    find_next: bool,
    info_out: Option<&mut DirectMemoryQueryInfo>,
) -> Status {
    let result = validate_lookup(offset, info_out.is_some())
        .map_err(SyscallError::from)
        .and_then(|_| try_direct_memory_query(ctx, offset, find_next));
    to_status("sceKernelDirectMemoryQuery", result, |record| {
        if let Some(info) = info_out {
            *info = record.into();
        }
    })
}

/// `sceKernelGetDirectMemoryType`: the type and bounds of the allocation
/// containing `start`.
#[must_use]
pub fn get_direct_memory_type(
    ctx: &DirectMemoryContext,
    start: i64,
    memory_type_out: Option<&mut i32>,
    region_start_out: Option<&mut i64>,
    region_end_out: Option<&mut i64>,
) -> Status {
    let has_outputs =
        memory_type_out.is_some() && region_start_out.is_some() && region_end_out.is_some();
    let result = validate_lookup(start, has_outputs)
        .map_err(SyscallError::from)
        .and_then(|_| try_direct_memory_query(ctx, start, false));
    to_status("sceKernelGetDirectMemoryType", result, |record| {
        if let (Some(ty), Some(region_start), Some(region_end)) =
            (memory_type_out, region_start_out, region_end_out)
        {
            let info = DirectMemoryQueryInfo::from(record);
            *ty = info.memory_type;
            *region_start = info.start;
            *region_end = info.end;
        }
    })
}
