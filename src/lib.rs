//! # tinyheap - A First-Fit Allocator Inside Your Own Buffer
//!
//! This crate provides [`Arena`], a replacement for `malloc`, `realloc`,
//! `calloc` and `free` that works entirely inside one caller-supplied byte
//! buffer (or an owned static region). It targets places without a general
//! purpose heap: embedded targets, deterministic tests, fault injection.
//!
//! ## Overview
//!
//! The buffer is cut into fixed-size **blocks**, each as large as the
//! platform's maximum alignment, so any type can live at a block boundary.
//! Blocks are grouped into **sections**: a one-word header followed by the
//! payload.
//!
//! ```text
//!   Arena Layout:
//!
//!   ┌────┬──────────────┬────┬──────┬────┬─────────────────────────┬────┐
//!   │ H  │  taken (3)   │ H  │ free │ H  │       free (n)          │ S  │
//!   └────┴──────────────┴────┴──────┴────┴─────────────────────────┴────┘
//!     ▲    ▲                                                         ▲
//!     │    └── pointer returned to the caller                        │
//!     └── header: taken bit | payload blocks              sentinel: taken, 0
//! ```
//!
//! Sections are contiguous and in address order:
//! `next = header + HEADER_BLOCKS + payload_blocks`. The zero-length taken
//! sentinel ends every scan.
//!
//! ## Header Encoding
//!
//! ```text
//!   63                                                               0
//!   ┌───┬──────────────────────────────────────────────────────────────┐
//!   │ T │                 payload length in blocks                     │
//!   └───┴──────────────────────────────────────────────────────────────┘
//!     └── taken bit
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   tinyheap
//!   ├── align      - Rounding macros (align!, align_to!) and blocks_for
//!   ├── header     - Header codec and block addressing (internal Region)
//!   ├── arena      - Arena: init/clear/reset, acquire/resize/zero_acquire/release
//!   ├── inspect    - Section walk, Summary, printing
//!   ├── operation  - Last-operation record
//!   ├── config     - ArenaConfig
//!   └── error      - AllocError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tinyheap::Arena;
//!
//! let mut buffer = [0u8; 1024];
//! let mut arena = Arena::new();
//! arena.init(&mut buffer);
//!
//! let data = arena.acquire(24) as *mut u64;
//! assert!(!data.is_null());
//!
//! unsafe {
//!   *data = 42;
//!   assert_eq!(*data, 42);
//!   arena.release(data as *mut u8);
//! }
//!
//! assert!(arena.last_operation().success);
//! ```
//!
//! ## Allocation Policy
//!
//! - **Acquire** takes the first free section that fits. Leftover space
//!   becomes a new free section unless it could not carry its own header.
//! - **Release** frees the section and merges every run of adjacent free
//!   sections, so two free sections are never neighbours.
//! - **Resize** grows in place into a free neighbour when it can, and
//!   otherwise moves the payload to a fresh section.
//!
//! ## Limitations
//!
//! - **Single caller**: no synchronization; an arena is neither `Send` nor `Sync`
//! - **One buffer**: the arena never grows beyond the buffer it was given
//! - **Linear scans**: acquire and release walk the whole section chain
//!
//! ## Safety
//!
//! `acquire` and `zero_acquire` are safe and return raw pointers into the
//! buffer. `resize` and `release` are `unsafe`: the pointer must come from
//! the same arena. Headers are trusted; there is no corruption check.

pub mod align;
mod arena;
mod config;
mod error;
mod header;
mod inspect;
mod operation;

pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::{AllocError, AllocResult};
pub use header::{BLOCK_SIZE, HEADER_BLOCKS, Header, MAX_SECTION_BLOCKS, TAKEN_BIT};
pub use inspect::{Section, SectionCounts, Sections, Size, Summary, print_arena};
pub use operation::{Operation, OperationKind};
