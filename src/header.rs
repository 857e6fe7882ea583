use std::{mem, ptr::NonNull};

use libc::max_align_t;

use crate::align_to;

/// Size in bytes of one arena block: the platform's maximum natural alignment.
pub const BLOCK_SIZE: usize = mem::align_of::<max_align_t>();

/// Blocks occupied by one section header.
pub const HEADER_BLOCKS: usize = align_to!(mem::size_of::<usize>(), BLOCK_SIZE) / BLOCK_SIZE;

/// Top bit of a header word. Set when the section is taken.
pub const TAKEN_BIT: usize = !(usize::MAX >> 1);

/// Largest payload, in blocks, a single header can describe.
pub const MAX_SECTION_BLOCKS: usize = !TAKEN_BIT;

/// Decoded section header: a taken flag plus the payload length in blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
  pub taken: bool,
  pub size: usize,
}

impl Header {
  pub fn new(
    taken: bool,
    size: usize,
  ) -> Self {
    Self { taken, size }
  }

  pub fn free(size: usize) -> Self {
    Self::new(false, size)
  }

  pub fn taken(size: usize) -> Self {
    Self::new(true, size)
  }

  /// The zero-length taken section closing every chain.
  pub fn sentinel() -> Self {
    Self::taken(0)
  }

  pub fn encode(self) -> usize {
    debug_assert!(self.size <= MAX_SECTION_BLOCKS);

    if self.taken { TAKEN_BIT | self.size } else { self.size }
  }

  pub fn decode(word: usize) -> Self {
    Self {
      taken: word & TAKEN_BIT != 0,
      size: word & !TAKEN_BIT,
    }
  }
}

/// A block-aligned run of memory addressed by block index.
///
/// Index `0` holds the first section header and [`Region::sentinel`] the
/// closing sentinel. This is the only place block indices become addresses.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Region {
  base: NonNull<u8>,
  capacity: usize,
}

impl Region {
  /// # Safety
  ///
  /// `base` must be aligned to [`BLOCK_SIZE`] and valid for reads and writes
  /// of `(capacity + 2 * HEADER_BLOCKS) * BLOCK_SIZE` bytes for as long as the
  /// region is used.
  pub unsafe fn new(
    base: NonNull<u8>,
    capacity: usize,
  ) -> Self {
    debug_assert_eq!(base.as_ptr() as usize % BLOCK_SIZE, 0);

    Self { base, capacity }
  }

  /// Lays out one free section spanning the whole capacity, then the sentinel.
  pub fn format(&self) {
    self.write(0, Header::free(self.capacity));
    self.write(self.sentinel(), Header::sentinel());
  }

  pub fn base(&self) -> NonNull<u8> {
    self.base
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn sentinel(&self) -> usize {
    HEADER_BLOCKS + self.capacity
  }

  pub fn next(
    &self,
    at: usize,
    header: Header,
  ) -> usize {
    at + HEADER_BLOCKS + header.size
  }

  pub fn read(
    &self,
    at: usize,
  ) -> Header {
    debug_assert!(at <= self.sentinel());

    // SAFETY: `at` is a header index inside the region and header slots are
    // block aligned, so the word is in bounds and aligned.
    let word = unsafe { self.header_ptr(at).cast::<usize>().read() };

    Header::decode(word)
  }

  pub fn write(
    &self,
    at: usize,
    header: Header,
  ) {
    debug_assert!(at <= self.sentinel());

    // SAFETY: see `read`.
    unsafe { self.header_ptr(at).cast::<usize>().write(header.encode()) }
  }

  pub fn header_ptr(
    &self,
    at: usize,
  ) -> NonNull<u8> {
    // SAFETY: `at * BLOCK_SIZE` stays within the allocation for in-range
    // indices, which every caller upholds.
    unsafe { self.base.add(at * BLOCK_SIZE) }
  }

  pub fn data_ptr(
    &self,
    at: usize,
  ) -> NonNull<u8> {
    self.header_ptr(at + HEADER_BLOCKS)
  }

  /// Header index of the section whose payload starts at `data`.
  ///
  /// # Safety
  ///
  /// `data` must have been returned by [`Region::data_ptr`] for a live
  /// section of this region.
  pub unsafe fn index_of_data(
    &self,
    data: NonNull<u8>,
  ) -> usize {
    (data.as_ptr() as usize - self.base.as_ptr() as usize) / BLOCK_SIZE - HEADER_BLOCKS
  }

  /// Header index for `header`, if it names a header slot before the sentinel.
  pub fn index_of_header(
    &self,
    header: *const u8,
  ) -> Option<usize> {
    let offset = (header as usize).checked_sub(self.base.as_ptr() as usize)?;

    if offset % BLOCK_SIZE != 0 || offset / BLOCK_SIZE >= self.sentinel() {
      return None;
    }

    Some(offset / BLOCK_SIZE)
  }

  /// Copies `blocks` payload blocks from section `from` to section `to`.
  pub fn copy_payload(
    &self,
    from: usize,
    to: usize,
    blocks: usize,
  ) {
    debug_assert!(from + HEADER_BLOCKS + blocks <= self.sentinel());
    debug_assert!(to + HEADER_BLOCKS + blocks <= self.sentinel());

    // SAFETY: both payloads are in bounds, and distinct sections never
    // overlap because the chain is contiguous and gap free.
    unsafe {
      std::ptr::copy_nonoverlapping(
        self.data_ptr(from).as_ptr(),
        self.data_ptr(to).as_ptr(),
        blocks * BLOCK_SIZE,
      )
    }
  }

  /// Zeroes the first `bytes` bytes of the payload of section `at`.
  pub fn zero_payload(
    &self,
    at: usize,
    bytes: usize,
  ) {
    // SAFETY: callers pass at most the payload length of a live section.
    unsafe { std::ptr::write_bytes(self.data_ptr(at).as_ptr(), 0, bytes) }
  }
}
