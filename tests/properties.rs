use proptest::prelude::*;
use tinyheap::{Arena, BLOCK_SIZE, HEADER_BLOCKS};

#[repr(C, align(64))]
struct Buffer([u8; 4096]);

impl Buffer {
  fn new() -> Self {
    Self([0; 4096])
  }
}

#[derive(Clone, Debug)]
enum Op {
  Acquire(usize),
  ZeroAcquire(usize, usize),
  Resize(usize, usize),
  Release(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
  prop_oneof![
    (1usize..600).prop_map(Op::Acquire),
    (1usize..8, 1usize..64).prop_map(|(count, size)| Op::ZeroAcquire(count, size)),
    (0usize..32, 1usize..600).prop_map(|(slot, size)| Op::Resize(slot, size)),
    (0usize..32).prop_map(Op::Release),
  ]
}

fn layout(arena: &Arena) -> Vec<(bool, usize)> {
  arena
    .sections()
    .map(|section| (section.taken, section.size.blocks))
    .collect()
}

/// Checks contiguity, eager coalescing and summary accounting.
fn check_chain(
  arena: &Arena,
  capacity: usize,
) -> Result<(), TestCaseError> {
  let sections: Vec<_> = arena.sections().collect();

  for pair in sections.windows(2) {
    prop_assert_eq!(
      pair[1].header as usize - pair[0].header as usize,
      (pair[0].size.blocks + HEADER_BLOCKS) * BLOCK_SIZE
    );
    prop_assert!(pair[0].taken || pair[1].taken, "adjacent free sections");
  }

  let summary = arena.inspect();
  prop_assert_eq!(summary.total.blocks, capacity);
  prop_assert_eq!(
    summary.free.blocks + summary.taken.blocks + (summary.sections.total - 1) * HEADER_BLOCKS,
    capacity
  );

  Ok(())
}

proptest! {
  #[test]
  fn acquire_then_release_restores_layout(size in 1usize..2000) {
    let mut buffer = Buffer::new();
    let mut arena = Arena::new();
    arena.init(&mut buffer.0);
    let before = layout(&arena);

    let data = arena.acquire(size);
    prop_assert!(!data.is_null());
    unsafe { arena.release(data) };

    prop_assert_eq!(layout(&arena), before);
  }

  #[test]
  fn release_order_does_not_matter(
    first in 1usize..500,
    second in 1usize..500,
    third in 1usize..500,
  ) {
    let mut forward = Buffer::new();
    let mut backward = Buffer::new();
    let mut a = Arena::new();
    let mut b = Arena::new();
    a.init(&mut forward.0);
    b.init(&mut backward.0);

    let a1 = a.acquire(first);
    let a2 = a.acquire(second);
    let _a3 = a.acquire(third);
    let b1 = b.acquire(first);
    let b2 = b.acquire(second);
    let _b3 = b.acquire(third);

    unsafe {
      a.release(a1);
      a.release(a2);
      b.release(b2);
      b.release(b1);
    }

    prop_assert_eq!(layout(&a), layout(&b));
    prop_assert_eq!(layout(&a)[0], (false, blocks(first) + HEADER_BLOCKS + blocks(second)));
  }

  #[test]
  fn random_operations_keep_chain_consistent(ops in proptest::collection::vec(arb_op(), 1..64)) {
    let mut buffer = Buffer::new();
    let mut arena = Arena::new();
    arena.init(&mut buffer.0);
    let capacity = arena.inspect().free.blocks;
    let mut live: Vec<*mut u8> = Vec::new();

    for op in ops {
      match op {
        Op::Acquire(size) => {
          let data = arena.acquire(size);
          prop_assert_eq!(arena.last_operation().success, !data.is_null());
          if !data.is_null() {
            live.push(data);
          }
        }
        Op::ZeroAcquire(count, size) => {
          let data = arena.zero_acquire(count, size);
          if !data.is_null() {
            for i in 0..count * size {
              prop_assert_eq!(unsafe { *data.add(i) }, 0);
            }
            live.push(data);
          }
        }
        Op::Resize(slot, size) if !live.is_empty() => {
          let slot = slot % live.len();
          let data = unsafe { arena.resize(live[slot], size) };
          if !data.is_null() {
            live[slot] = data;
          }
        }
        Op::Release(slot) if !live.is_empty() => {
          let data = live.swap_remove(slot % live.len());
          unsafe { arena.release(data) };
          prop_assert!(arena.last_operation().success);
        }
        _ => {}
      }

      check_chain(&arena, capacity)?;
    }

    for data in live {
      unsafe { arena.release(data) };
    }
    prop_assert_eq!(layout(&arena), vec![(false, capacity)]);
  }

  #[test]
  fn out_of_memory_override_blocks_everything(size in 1usize..500) {
    let mut buffer = Buffer::new();
    let mut arena = Arena::new();
    arena.init(&mut buffer.0);
    let before = layout(&arena);

    arena.set_out_of_memory(true);
    prop_assert!(arena.acquire(size).is_null());
    prop_assert!(arena.zero_acquire(1, size).is_null());
    let resized = unsafe { arena.resize(std::ptr::null_mut(), size) };
    prop_assert!(resized.is_null());
    prop_assert_eq!(layout(&arena), before.clone());

    arena.set_out_of_memory(false);
    prop_assert!(!arena.acquire(size).is_null());
  }
}

fn blocks(size: usize) -> usize {
  size.div_ceil(BLOCK_SIZE)
}
