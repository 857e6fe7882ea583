use std::{
  alloc::{self, Layout},
  marker::PhantomData,
  ptr::{self, NonNull},
};

use crate::{
  AllocError, AllocResult, ArenaConfig, BLOCK_SIZE, HEADER_BLOCKS, MAX_SECTION_BLOCKS,
  Operation, OperationKind,
  align::blocks_for,
  header::{Header, Region},
  inspect::{Section, SectionCounts, Sections, Size, Summary},
};

/// Block-aligned buffer owned by an arena built with a static region.
#[derive(Debug)]
struct StaticRegion {
  base: NonNull<u8>,
  layout: Layout,
}

impl StaticRegion {
  fn allocate(bytes: usize) -> AllocResult<Self> {
    let layout = blocks_for(bytes)
      .and_then(|blocks| blocks.checked_mul(BLOCK_SIZE))
      .and_then(|size| Layout::from_size_align(size, BLOCK_SIZE).ok())
      .ok_or(AllocError::SizeOverflow(bytes))?;

    if layout.size() == 0 {
      return Err(AllocError::BufferTooSmall { size: bytes });
    }

    // SAFETY: the layout has a non-zero size.
    let base = unsafe { alloc::alloc_zeroed(layout) };

    match NonNull::new(base) {
      Some(base) => Ok(Self { base, layout }),
      None => alloc::handle_alloc_error(layout),
    }
  }

  fn size(&self) -> usize {
    self.layout.size()
  }
}

impl Drop for StaticRegion {
  fn drop(&mut self) {
    // SAFETY: `base` came from `alloc_zeroed` with this exact layout.
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
  }
}

/// First-fit allocator over a single borrowed or owned buffer.
///
/// All bookkeeping lives in-band: every section starts with a one-word
/// header and the chain ends with a zero-length taken sentinel. See the
/// crate docs for the layout.
///
/// An arena is a single-caller object. It is neither `Send` nor `Sync`.
#[derive(Debug)]
pub struct Arena<'buf> {
  region: Option<Region>,
  backing: Option<StaticRegion>,
  out_of_memory: bool,
  last_operation: Operation,
  _buffer: PhantomData<&'buf mut [u8]>,
}

impl Default for Arena<'_> {
  fn default() -> Self {
    Self::new()
  }
}

impl<'buf> Arena<'buf> {
  /// Creates a detached arena. Allocations fail until [`Arena::init`].
  pub fn new() -> Self {
    Self::from_config(ArenaConfig::default())
  }

  /// Creates an arena attached to an owned region of at least `bytes` bytes.
  pub fn with_static_region(bytes: usize) -> Self {
    Self::from_config(ArenaConfig::new().static_region(bytes))
  }

  pub fn from_config(config: ArenaConfig) -> Self {
    let mut arena = Self {
      region: None,
      backing: None,
      out_of_memory: config.out_of_memory,
      last_operation: Operation::default(),
      _buffer: PhantomData,
    };

    if config.static_region > 0 {
      arena.load(config.static_region);
    }

    arena
  }

  /// Size in bytes of one block, the unit every section is measured in.
  pub fn block_size() -> usize {
    BLOCK_SIZE
  }

  /// Attaches the arena to `buffer`, discarding any previous arena contents.
  ///
  /// Fails, leaving the arena untouched, when the buffer cannot hold one
  /// block of payload plus a header and the sentinel once aligned.
  pub fn init(
    &mut self,
    buffer: &'buf mut [u8],
  ) {
    let size = buffer.len();
    let base = NonNull::from(buffer).cast::<u8>();

    // SAFETY: the buffer is exclusively borrowed for `'buf`.
    match unsafe { Self::attach(base, size) } {
      Ok(region) => {
        self.region = Some(region);
        self.store(Operation::succeeded(OperationKind::Init, size));
      }
      Err(error) => self.store(Operation::failed(OperationKind::Init, size, error)),
    }
  }

  /// Detaches the arena. Allocations fail until the next `init` or `reset`.
  pub fn clear(&mut self) {
    self.region = None;
    self.store(Operation::succeeded(OperationKind::Clear, 0));
  }

  /// Reattaches the owned static region with a fresh layout.
  ///
  /// Without a static region this detaches, like [`Arena::clear`].
  pub fn reset(&mut self) {
    let Some(backing) = &self.backing else {
      self.region = None;
      self.store(Operation::succeeded(OperationKind::Reset, 0));
      return;
    };

    // SAFETY: the static region is owned by `self` and outlives the region.
    match unsafe { Self::attach(backing.base, backing.size()) } {
      Ok(region) => {
        self.region = Some(region);
        self.store(Operation::succeeded(
          OperationKind::Reset,
          region.capacity(),
        ));
      }
      Err(error) => {
        self.region = None;
        self.store(Operation::failed(OperationKind::Reset, 0, error));
      }
    }
  }

  /// Forces every allocating operation to fail while `flag` is set.
  pub fn set_out_of_memory(
    &mut self,
    flag: bool,
  ) {
    self.out_of_memory = flag;
  }

  pub fn out_of_memory(&self) -> bool {
    self.out_of_memory
  }

  pub fn last_operation(&self) -> Operation {
    self.last_operation
  }

  /// Allocates `size` bytes, block aligned. Returns null on failure.
  pub fn acquire(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    let result = self.try_acquire(size);
    self.finish(OperationKind::Acquire, size, result)
  }

  /// Allocates `count * size` zeroed bytes. Returns null on failure.
  pub fn zero_acquire(
    &mut self,
    count: usize,
    size: usize,
  ) -> *mut u8 {
    match self.try_zero_acquire(count, size) {
      Ok((data, total)) => {
        self.store(Operation::succeeded(OperationKind::ZeroAcquire, total));
        data.as_ptr()
      }
      Err(error) => {
        self.store(Operation::failed(OperationKind::ZeroAcquire, size, error));
        ptr::null_mut()
      }
    }
  }

  /// Resizes the allocation at `data` to `size` bytes.
  ///
  /// A null `data` behaves as [`Arena::acquire`]. Grows in place when the
  /// following section is free and large enough, otherwise moves the payload
  /// to a fresh section. On failure returns null and leaves `data` allocated.
  ///
  /// # Safety
  ///
  /// `data` must be null or a live pointer returned by this arena since its
  /// last `init`, `clear` or `reset`.
  pub unsafe fn resize(
    &mut self,
    data: *mut u8,
    size: usize,
  ) -> *mut u8 {
    let result = match NonNull::new(data) {
      None => self.try_acquire(size),
      Some(data) => unsafe { self.try_resize(data, size) },
    };

    self.finish(OperationKind::Resize, size, result)
  }

  /// Releases the allocation at `data` and coalesces adjacent free sections.
  ///
  /// A null `data` or a detached arena is a recorded no-op.
  ///
  /// # Safety
  ///
  /// `data` must be null or a live pointer returned by this arena since its
  /// last `init`, `clear` or `reset`.
  pub unsafe fn release(
    &mut self,
    data: *mut u8,
  ) {
    let result = NonNull::new(data)
      .ok_or(AllocError::NullPointer)
      .and_then(|data| {
        let region = self.region.ok_or(AllocError::Detached)?;
        // SAFETY: upheld by the caller.
        let at = unsafe { region.index_of_data(data) };
        Ok(Self::release_at(&region, at))
      });

    match result {
      Ok(blocks) => self.store(Operation::succeeded(OperationKind::Release, blocks)),
      Err(error) => self.store(Operation::failed(OperationKind::Release, 0, error)),
    }
  }

  /// Walks the section chain. `None` starts at the first section; otherwise
  /// `previous` is the `header` address of a [`Section`] from this arena.
  ///
  /// Returns `None` once only the sentinel remains, or when `previous` is not
  /// a block-aligned address inside the attached region. The chain is not
  /// walked to confirm it, so an aligned address inside a payload is read as
  /// a header.
  pub fn next_section(
    &self,
    previous: Option<*const u8>,
  ) -> Option<Section> {
    let region = self.region.as_ref()?;

    let at = match previous {
      None => 0,
      Some(header) => {
        let at = region.index_of_header(header)?;
        region.next(at, region.read(at))
      }
    };

    if at >= region.sentinel() {
      return None;
    }

    let header = region.read(at);

    Some(Section {
      taken: header.taken,
      header: region.header_ptr(at).as_ptr(),
      data: region.data_ptr(at).as_ptr(),
      size: Size::from_blocks(header.size),
    })
  }

  /// Iterates every section before the sentinel, in address order.
  pub fn sections(&self) -> Sections<'_, 'buf> {
    Sections::new(self)
  }

  /// Aggregates block, byte and section counts over the whole chain.
  pub fn inspect(&self) -> Summary {
    let mut summary = Summary {
      block_size: BLOCK_SIZE,
      static_buffer: self.backing.as_ref().map(|backing| backing.base),
      static_buffer_size: self.backing.as_ref().map_or(0, StaticRegion::size),
      out_of_memory: self.out_of_memory,
      buffer: self.region.map(|region| region.base()),
      total: Size::default(),
      free: Size::default(),
      taken: Size::default(),
      sections: SectionCounts::default(),
    };

    let mut total = 0;
    let mut free = 0;
    let mut taken = 0;

    for section in self.sections() {
      total += section.size.blocks + HEADER_BLOCKS;
      summary.sections.total += 1;

      if section.taken {
        taken += section.size.blocks;
        summary.sections.taken += 1;
      } else {
        free += section.size.blocks;
        summary.sections.free += 1;
      }
    }

    summary.total = Size::from_blocks(total.saturating_sub(HEADER_BLOCKS));
    summary.free = Size::from_blocks(free);
    summary.taken = Size::from_blocks(taken);

    summary
  }

  /// Aligns `base`, checks the space and lays out a fresh chain.
  ///
  /// # Safety
  ///
  /// `base` must be valid for reads and writes of `size` bytes for as long as
  /// the returned region is attached.
  unsafe fn attach(
    base: NonNull<u8>,
    size: usize,
  ) -> AllocResult<Region> {
    let lost = base.as_ptr().align_offset(BLOCK_SIZE);
    let blocks = size
      .checked_sub(lost)
      .map(|usable| usable / BLOCK_SIZE)
      .filter(|&blocks| blocks > 2 * HEADER_BLOCKS)
      .ok_or(AllocError::BufferTooSmall { size })?;

    let capacity = (blocks - 2 * HEADER_BLOCKS).min(MAX_SECTION_BLOCKS);

    // SAFETY: `lost < size`, so the aligned start is inside the buffer and the
    // region spans at most the remaining `size - lost` bytes.
    let region = unsafe { Region::new(base.add(lost), capacity) };
    region.format();

    tracing::debug!(
      "Attached arena of {} blocks at {:?} ({} bytes lost to alignment)",
      capacity,
      region.base(),
      lost
    );

    Ok(region)
  }

  fn load(
    &mut self,
    bytes: usize,
  ) {
    let result = StaticRegion::allocate(bytes).and_then(|backing| {
      // SAFETY: the static region is moved into `self` alongside the region.
      let region = unsafe { Self::attach(backing.base, backing.size()) }?;
      Ok((backing, region))
    });

    match result {
      Ok((backing, region)) => {
        self.backing = Some(backing);
        self.region = Some(region);
        self.store(Operation::succeeded(OperationKind::Load, bytes));
      }
      Err(error) => self.store(Operation::failed(OperationKind::Load, bytes, error)),
    }
  }

  /// The attached region, if allocation is currently allowed.
  fn writable(&self) -> AllocResult<Region> {
    if self.out_of_memory {
      return Err(AllocError::OutOfMemory);
    }

    self.region.ok_or(AllocError::Detached)
  }

  fn try_acquire(
    &self,
    size: usize,
  ) -> AllocResult<NonNull<u8>> {
    let region = self.writable()?;
    let at = Self::allocate(&region, size)?;

    Ok(region.data_ptr(at))
  }

  fn try_zero_acquire(
    &self,
    count: usize,
    size: usize,
  ) -> AllocResult<(NonNull<u8>, usize)> {
    if count == 0 || size == 0 {
      return Err(AllocError::ZeroSize);
    }

    let total = count
      .checked_mul(size)
      .ok_or(AllocError::CountOverflow { count, size })?;

    let region = self.writable()?;
    let at = Self::allocate(&region, total)?;
    region.zero_payload(at, total);

    Ok((region.data_ptr(at), total))
  }

  /// # Safety
  ///
  /// See [`Arena::resize`].
  unsafe fn try_resize(
    &self,
    data: NonNull<u8>,
    size: usize,
  ) -> AllocResult<NonNull<u8>> {
    // Checked before `data` is touched: it may belong to a detached buffer.
    let region = self.writable()?;

    if size == 0 {
      return Err(AllocError::ZeroSize);
    }

    let blocks = blocks_for(size).ok_or(AllocError::SizeOverflow(size))?;

    // SAFETY: upheld by the caller.
    let at = unsafe { region.index_of_data(data) };
    let current = region.read(at);
    let next = region.read(region.next(at, current));

    if !next.taken && current.size + next.size >= blocks + HEADER_BLOCKS {
      let merged = current.size + HEADER_BLOCKS + next.size;
      Self::split(&region, at, merged, blocks);

      return Ok(data);
    }

    let fresh = Self::allocate(&region, size)?;
    let copied = current.size.min(region.read(fresh).size);
    region.copy_payload(at, fresh, copied);
    Self::release_at(&region, at);

    Ok(region.data_ptr(fresh))
  }

  /// First-fit: takes the first free section with room for `size` bytes.
  /// Returns the header index of the now taken section.
  fn allocate(
    region: &Region,
    size: usize,
  ) -> AllocResult<usize> {
    if size == 0 {
      return Err(AllocError::ZeroSize);
    }

    let blocks = blocks_for(size).ok_or(AllocError::SizeOverflow(size))?;
    let at = Self::find_free_section(region, blocks).ok_or(AllocError::NoFit { blocks })?;

    Self::split(region, at, region.read(at).size, blocks);

    Ok(at)
  }

  fn find_free_section(
    region: &Region,
    blocks: usize,
  ) -> Option<usize> {
    let mut at = 0;

    while at < region.sentinel() {
      let header = region.read(at);

      if !header.taken && header.size >= blocks {
        return Some(at);
      }

      at = region.next(at, header);
    }

    None
  }

  /// Marks `blocks` of the `available` blocks at `at` taken. The rest becomes
  /// a trailing free section unless it is too small to carry its own header.
  fn split(
    region: &Region,
    at: usize,
    available: usize,
    blocks: usize,
  ) {
    let leftover = available - blocks;

    if leftover <= HEADER_BLOCKS {
      region.write(at, Header::taken(available));
    } else {
      region.write(at, Header::taken(blocks));
      region.write(
        at + HEADER_BLOCKS + blocks,
        Header::free(leftover - HEADER_BLOCKS),
      );
    }
  }

  /// Frees the section at `at` and coalesces. Returns its payload blocks.
  fn release_at(
    region: &Region,
    at: usize,
  ) -> usize {
    let size = region.read(at).size;
    region.write(at, Header::free(size));
    Self::coalesce(region);

    size
  }

  /// Merges every run of adjacent free sections, scanning from the start.
  fn coalesce(region: &Region) {
    let mut at = 0;

    while at < region.sentinel() {
      let header = region.read(at);
      let next = region.next(at, header);

      if !header.taken {
        let following = region.read(next);

        if !following.taken {
          region.write(
            at,
            Header::free(header.size + HEADER_BLOCKS + following.size),
          );
          continue;
        }
      }

      at = next;
    }
  }

  fn finish(
    &mut self,
    kind: OperationKind,
    size: usize,
    result: AllocResult<NonNull<u8>>,
  ) -> *mut u8 {
    match result {
      Ok(data) => {
        self.store(Operation::succeeded(kind, size));
        data.as_ptr()
      }
      Err(error) => {
        self.store(Operation::failed(kind, size, error));
        ptr::null_mut()
      }
    }
  }

  fn store(
    &mut self,
    operation: Operation,
  ) {
    match operation.error {
      None => tracing::trace!(
        "{} succeeded with size {}",
        operation.kind.name(),
        operation.size
      ),
      Some(error) => tracing::debug!(
        "{} failed with size {}: {}",
        operation.kind.name(),
        operation.size,
        error
      ),
    }

    self.last_operation = operation;
  }
}
