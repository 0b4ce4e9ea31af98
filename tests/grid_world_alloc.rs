//! Allocation accounting for grid worlds. Kept in its own test binary so the
//! counting allocator sees nothing but this file's single test.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, Ordering};

use devon::world::{GridWorld, WorldMoe, WorldType};
use devon::RenderError;

struct CountingAllocator;

static LIVE_BYTES: AtomicIsize = AtomicIsize::new(0);

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            LIVE_BYTES.fetch_add(layout.size() as isize, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        LIVE_BYTES.fetch_sub(layout.size() as isize, Ordering::SeqCst);
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

fn live_bytes() -> isize {
    LIVE_BYTES.load(Ordering::SeqCst)
}

#[test]
fn create_destroy_cycles_return_to_baseline() {
    let sizes = [(2, 2), (3, 7), (64, 64), (255, 257), (1, 1), (1000, 3)];

    // Warm up anything the test harness allocates lazily.
    drop(GridWorld::new(WorldType::Moe, 2, 2));

    for (width, height) in sizes {
        let baseline = live_bytes();
        for _ in 0..3 {
            let world = GridWorld::new(WorldType::Moe, width, height).unwrap();
            assert_eq!(world.elements_as::<WorldMoe>().len(), (width * height) as usize);
            assert!(live_bytes() - baseline >= (width * height) as isize * 2);
            drop(world);
            assert_eq!(live_bytes(), baseline, "{width}x{height} leaked");
        }
    }

    let baseline = live_bytes();
    assert!(matches!(
        GridWorld::new(WorldType::Moe, 0, 16),
        Err(RenderError::InvalidDimensions { width: 0, height: 16 })
    ));
    assert_eq!(live_bytes(), baseline);
}
