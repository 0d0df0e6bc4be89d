use kernel_dmem::{DirectMemoryConfig, DirectMemoryError, MemoryType, RegionState};
use kernel_info::memory::MAIN_DIRECT_MEMORY_SIZE;
use kernel_memory_addresses::PhysicalAddress;
use kernel_syscall::direct_memory::{
    AvailableDirectMemory, DirectMemoryQueryInfo, allocate_direct_memory,
    available_direct_memory_size, direct_memory_query, free_direct_memory,
    get_direct_memory_size, get_direct_memory_type, try_allocate_direct_memory,
    try_available_direct_memory_size, try_free_direct_memory,
};
use kernel_syscall::validate::AllocArgs;
use kernel_syscall::{
    BoundsCheck, DirectMemoryContext, ErrorCode, SCE_OK, SyscallConfig, SyscallError,
    ValidationError,
};
use std::sync::{Arc, Barrier};
use std::thread;

const KIB16: u64 = 0x4000;
const GIB: u64 = 1 << 30;
const GIB_I: i64 = 1 << 30;
const WB: i32 = 0;

const EINVAL: i64 = ErrorCode::InvalidArgument.status();
const EAGAIN: i64 = ErrorCode::ResourceBusy.status();
const ENOENT: i64 = ErrorCode::NotFound.status();

fn ctx_with(bounds_check: BoundsCheck) -> DirectMemoryContext {
    DirectMemoryContext::new(&SyscallConfig {
        direct_memory: DirectMemoryConfig::new(GIB).unwrap(),
        bounds_check,
    })
}

fn ctx() -> DirectMemoryContext {
    ctx_with(BoundsCheck::RangeFit)
}

fn alloc(ctx: &DirectMemoryContext, start: i64, end: i64, len: u64, alignment: u64) -> (i64, i64) {
    let mut pa = -1;
    let status = allocate_direct_memory(ctx, start, end, len, alignment, WB, Some(&mut pa));
    (status, pa)
}

#[test]
fn reports_fixed_budget() {
    assert_eq!(get_direct_memory_size(&ctx()), GIB);
    assert_eq!(
        get_direct_memory_size(&DirectMemoryContext::default()),
        MAIN_DIRECT_MEMORY_SIZE
    );
}

#[test]
fn first_allocation_of_one_gib_budget() {
    let ctx = ctx();
    assert_eq!(alloc(&ctx, 0, GIB_I, KIB16, 0), (SCE_OK, 0));

    let regions = ctx.memory().regions();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].state, RegionState::Allocated(MemoryType::WbOnion));
    assert!(regions[1].is_free());
    assert_eq!(regions[1].extent.base().as_u64(), KIB16);
    assert_eq!(regions[1].extent.end().as_u64(), GIB);
}

#[test]
fn empty_window_is_rejected_without_touching_the_table() {
    let ctx = ctx();
    assert_eq!(alloc(&ctx, 0, 0, KIB16, 0), (EINVAL, -1));
    assert_eq!(ctx.memory().regions().len(), 1);
    assert_eq!(ctx.memory().allocated_size(), 0);
}

#[test]
fn non_power_of_two_alignment_is_rejected() {
    let ctx = ctx();
    assert_eq!(alloc(&ctx, 0, GIB_I, KIB16, 3), (EINVAL, -1));
}

#[test]
fn unknown_memory_type_is_rejected() {
    let ctx = ctx();
    let mut pa = -1;
    for ty in [1, 2, 11, -1] {
        let status = allocate_direct_memory(&ctx, 0, GIB_I, KIB16, 0, ty, Some(&mut pa));
        assert_eq!(status, EINVAL, "type {ty}");
    }
    assert_eq!(pa, -1);
    for ty in MemoryType::ALL {
        let status = allocate_direct_memory(&ctx, 0, GIB_I, KIB16, 0, ty.as_i32(), Some(&mut pa));
        assert_eq!(status, SCE_OK);
    }
}

#[test]
fn null_output_is_rejected() {
    let ctx = ctx();
    assert_eq!(allocate_direct_memory(&ctx, 0, GIB_I, KIB16, 0, WB, None), EINVAL);
    assert_eq!(ctx.memory().allocated_size(), 0);
}

#[test]
fn typed_layer_reports_reasons() {
    let ctx = ctx();
    let args = AllocArgs {
        search_start: -1,
        search_end: GIB_I,
        len: KIB16,
        alignment: 0,
        memory_type: WB,
        has_output: true,
    };
    let err = try_allocate_direct_memory(&ctx, &args).unwrap_err();
    assert_eq!(
        err,
        SyscallError::InvalidArgument(ValidationError::NegativeSearchStart(-1))
    );
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn exhaustion_is_busy_not_invalid() {
    let ctx = ctx();
    assert_eq!(alloc(&ctx, 0, GIB_I, GIB, 0), (SCE_OK, 0));
    let before = ctx.memory().regions();
    assert_eq!(alloc(&ctx, 0, GIB_I, KIB16, 0), (EAGAIN, -1));
    assert_eq!(ctx.memory().regions(), before);

    let args = AllocArgs {
        search_start: 0,
        search_end: GIB_I,
        len: KIB16,
        alignment: 0,
        memory_type: WB,
        has_output: true,
    };
    assert_eq!(
        try_allocate_direct_memory(&ctx, &args),
        Err(SyscallError::DirectMemory(DirectMemoryError::Busy { len: KIB16 }))
    );
}

#[test]
fn results_respect_alignment_and_window() {
    let ctx = ctx();
    alloc(&ctx, 0, GIB_I, KIB16, 0);
    let (status, pa) = alloc(&ctx, 0x10_0000, 0x80_0000, 4 * KIB16, 0x20_0000);
    assert_eq!(status, SCE_OK);
    assert_eq!(pa, 0x20_0000);

    let (status, pa) = alloc(&ctx, 0x30_0000, 0x30_8000, 2 * KIB16, 0);
    assert_eq!((status, pa), (SCE_OK, 0x30_0000));
    assert_eq!(alloc(&ctx, 0x30_0000, 0x30_8000, KIB16, 0), (EAGAIN, -1));
}

#[test]
fn literal_bounds_check_reproduces_kernel_quirks() {
    // The length must sit strictly between the bounds.
    let literal = ctx_with(BoundsCheck::Literal);
    assert_eq!(alloc(&literal, 0x10000, GIB_I, KIB16, 0), (EINVAL, -1));
    assert_eq!(alloc(&literal, 0, 0x4000, KIB16, 0), (EINVAL, -1));
    // Passes validation despite the narrow window, then cannot fit.
    assert_eq!(alloc(&literal, 0x4000, 0x8004, 0x8000, 0), (EAGAIN, -1));
    assert_eq!(alloc(&literal, 0, GIB_I, KIB16, 0), (SCE_OK, 0));
}

#[test]
fn range_fit_bounds_check_uses_window_width() {
    let ctx = ctx();
    assert_eq!(alloc(&ctx, 0x10000, GIB_I, KIB16, 0), (SCE_OK, 0x10000));
    assert_eq!(alloc(&ctx, 0, 0x4000, KIB16, 0), (SCE_OK, 0));
    assert_eq!(alloc(&ctx, 0x4000, 0x8004, 0x8000, 0), (EINVAL, -1));
}

#[test]
fn free_round_trip_and_errors() {
    let ctx = ctx();
    alloc(&ctx, 0, GIB_I, KIB16, 0);
    let before = ctx.memory().regions();

    let (status, pa) = alloc(&ctx, 0, GIB_I, 3 * KIB16, 0x10000);
    assert_eq!(status, SCE_OK);

    assert_eq!(free_direct_memory(&ctx, pa, KIB16), ENOENT);
    assert_eq!(free_direct_memory(&ctx, pa + 0x4000, 2 * KIB16), ENOENT);
    assert_eq!(free_direct_memory(&ctx, pa, 3 * KIB16 + 1), EINVAL);
    assert_eq!(free_direct_memory(&ctx, pa + 1, 3 * KIB16), EINVAL);
    assert_eq!(free_direct_memory(&ctx, -0x4000, KIB16), EINVAL);

    assert_eq!(try_free_direct_memory(&ctx, pa, 3 * KIB16), Ok(MemoryType::WbOnion));
    assert_eq!(ctx.memory().regions(), before);
    assert_eq!(free_direct_memory(&ctx, pa, 3 * KIB16), ENOENT);
}

#[test]
fn available_size_reports_largest_run() {
    let ctx = ctx();
    alloc(&ctx, 0x40_0000, GIB_I, KIB16, 0);

    let mut start = -1;
    let mut size = 0;
    let status =
        available_direct_memory_size(&ctx, 0, GIB_I, 0, Some(&mut start), Some(&mut size));
    assert_eq!(status, SCE_OK);
    assert_eq!(start, 0x40_4000);
    assert_eq!(size, GIB - 0x40_4000);

    let status =
        available_direct_memory_size(&ctx, 0, 0x40_0000, 0, Some(&mut start), Some(&mut size));
    assert_eq!((status, start, size), (SCE_OK, 0, 0x40_0000));

    assert_eq!(
        available_direct_memory_size(&ctx, 0, GIB_I, 0, None, Some(&mut size)),
        EINVAL
    );
    assert_eq!(
        available_direct_memory_size(&ctx, 0, GIB_I, 0x6000, Some(&mut start), Some(&mut size)),
        EINVAL
    );
    assert_eq!(
        available_direct_memory_size(
            &ctx,
            0x40_0000,
            0x40_4000,
            0,
            Some(&mut start),
            Some(&mut size)
        ),
        EAGAIN
    );

    let typed = try_available_direct_memory_size(&ctx, 0, GIB_I, 0).unwrap();
    assert_eq!(
        typed,
        AvailableDirectMemory {
            available: GIB - 0x40_4000,
            start: PhysicalAddress::new(0x40_4000),
            end: PhysicalAddress::new(GIB),
        }
    );
}

#[test]
fn query_and_type_lookups() {
    let ctx = ctx();
    let mut pa = 0;
    assert_eq!(
        allocate_direct_memory(&ctx, 0x10_0000, GIB_I, 2 * KIB16, 0, 3, Some(&mut pa)),
        SCE_OK
    );

    let mut info = DirectMemoryQueryInfo::default();
    assert_eq!(direct_memory_query(&ctx, pa + 0x10, false, Some(&mut info)), SCE_OK);
    assert_eq!(
        info,
        DirectMemoryQueryInfo {
            start: 0x10_0000,
            end: 0x10_8000,
            memory_type: 3
        }
    );

    let mut next = DirectMemoryQueryInfo::default();
    assert_eq!(direct_memory_query(&ctx, 0, false, Some(&mut next)), ENOENT);
    assert_eq!(next, DirectMemoryQueryInfo::default());
    assert_eq!(direct_memory_query(&ctx, 0, true, Some(&mut next)), SCE_OK);
    assert_eq!(next, info);
    assert_eq!(direct_memory_query(&ctx, 0, true, None), EINVAL);
    assert_eq!(direct_memory_query(&ctx, -1, true, Some(&mut next)), EINVAL);

    let (mut ty, mut start, mut end) = (-1, -1, -1);
    assert_eq!(
        get_direct_memory_type(&ctx, pa + 0x4000, Some(&mut ty), Some(&mut start), Some(&mut end)),
        SCE_OK
    );
    assert_eq!((ty, start, end), (3, 0x10_0000, 0x10_8000));
    assert_eq!(
        get_direct_memory_type(&ctx, 0x10_8000, Some(&mut ty), Some(&mut start), Some(&mut end)),
        ENOENT
    );
    assert_eq!(
        get_direct_memory_type(&ctx, pa, None, Some(&mut start), Some(&mut end)),
        EINVAL
    );
}

#[test]
fn concurrent_guest_threads_get_disjoint_memory() {
    let threads = 8;
    let per_thread = 32;

    let ctx = Arc::new(ctx());
    let start = Arc::new(Barrier::new(threads));

    let mut handles = Vec::with_capacity(threads);
    for _ in 0..threads {
        let ctx = Arc::clone(&ctx);
        let start = Arc::clone(&start);
        handles.push(thread::spawn(move || {
            start.wait();
            (0..per_thread)
                .map(|_| {
                    let (status, pa) = alloc(&ctx, 0, 0x100_0000, 2 * KIB16, 0);
                    assert_eq!(status, SCE_OK);
                    pa
                })
                .collect::<Vec<_>>()
        }));
    }

    let mut addrs: Vec<i64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    addrs.sort_unstable();
    for pair in addrs.windows(2) {
        assert!(pair[1] - pair[0] >= 0x8000, "{pair:x?} overlap");
    }
    ctx.memory().check_invariants();
}
