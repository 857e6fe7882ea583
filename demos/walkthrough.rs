use std::io::Read;

use tinyheap::{Arena, ArenaConfig, BLOCK_SIZE, print_arena};
use tracing_subscriber::EnvFilter;

/// Waits until the user presses ENTER.
/// Gives you time to read the arena dump before the next step changes it.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn main() {
  // RUST_LOG=tinyheap=trace shows every recorded operation.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let mut buffer = [0u8; 1024];

  // --------------------------------------------------------------------
  // 0) Start from the embedded static region, owned by the arena.
  // --------------------------------------------------------------------
  let mut arena = Arena::from_config(ArenaConfig::embedded());
  println!(
    "[0] Loaded a {} byte static region",
    ArenaConfig::DEFAULT_STATIC_REGION
  );
  print_arena(&arena);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Attach the arena to a stack buffer instead.
  //    One free section spans everything between the first header and
  //    the sentinel.
  // --------------------------------------------------------------------
  arena.init(&mut buffer);
  println!("[1] Attached a 1024 byte buffer, blocks are {BLOCK_SIZE} bytes");
  print_arena(&arena);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Acquire three sections. Each one is split off the front of the
  //    trailing free section.
  // --------------------------------------------------------------------
  let first = arena.acquire(40);
  let second = arena.acquire(100);
  let third = arena.acquire(8);
  println!("\n[2] Acquired 40, 100 and 8 bytes");
  print_arena(&arena);
  block_until_enter_pressed();

  unsafe {
    // ------------------------------------------------------------------
    // 3) Release the middle section. Its neighbours are taken, so it
    //    stays a free hole.
    // ------------------------------------------------------------------
    arena.release(second);
    println!("\n[3] Released the 100 byte section");
    print_arena(&arena);
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 4) Grow the first section. The hole right after it is free, so the
    //    pointer does not move.
    // ------------------------------------------------------------------
    let grown = arena.resize(first, 80);
    println!(
      "\n[4] Resized the first section to 80 bytes, moved: {}",
      grown != first
    );
    print_arena(&arena);
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 5) Release everything. Coalescing folds the chain back into a
    //    single free section.
    // ------------------------------------------------------------------
    arena.release(grown);
    arena.release(third);
    println!("\n[5] Released everything");
    print_arena(&arena);
    block_until_enter_pressed();
  }

  // --------------------------------------------------------------------
  // 6) Force failures with the out-of-memory override.
  // --------------------------------------------------------------------
  arena.set_out_of_memory(true);
  let denied = arena.zero_acquire(4, 4);
  println!(
    "\n[6] Override set: {}, zero_acquire returned null: {}",
    arena.out_of_memory(),
    denied.is_null()
  );
  println!("last operation: {}", arena.last_operation());
  arena.set_out_of_memory(false);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 7) Reset drops the stack buffer and reformats the static region.
  // --------------------------------------------------------------------
  arena.reset();
  println!("\n[7] Reset back to the static region");
  print_arena(&arena);

  println!("\n[8] End of walkthrough.");
}
