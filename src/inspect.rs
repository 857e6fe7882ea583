//! Read-only views of an arena and their human-readable rendering.

use std::{fmt, iter::FusedIterator, ptr::NonNull};

use crate::{Arena, BLOCK_SIZE};

/// A length expressed both in blocks and in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
  pub blocks: usize,
  pub bytes: usize,
}

impl Size {
  pub fn from_blocks(blocks: usize) -> Self {
    Self {
      blocks,
      bytes: blocks * BLOCK_SIZE,
    }
  }
}

/// One section of the chain, as returned by [`Arena::next_section`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Section {
  pub taken: bool,
  pub header: *mut u8,
  pub data: *mut u8,
  pub size: Size,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectionCounts {
  pub total: usize,
  pub free: usize,
  pub taken: usize,
}

/// Aggregate state of an arena, as returned by [`Arena::inspect`].
///
/// `total` counts every block between the first header and the sentinel, so
/// it includes the headers of all sections but the first. `free` and `taken`
/// count payload blocks only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
  pub block_size: usize,
  pub static_buffer: Option<NonNull<u8>>,
  pub static_buffer_size: usize,
  pub out_of_memory: bool,
  pub buffer: Option<NonNull<u8>>,
  pub total: Size,
  pub free: Size,
  pub taken: Size,
  pub sections: SectionCounts,
}

/// Iterator over the sections of an arena, in address order.
pub struct Sections<'a, 'buf> {
  arena: &'a Arena<'buf>,
  previous: Option<*const u8>,
  done: bool,
}

impl<'a, 'buf> Sections<'a, 'buf> {
  pub(crate) fn new(arena: &'a Arena<'buf>) -> Self {
    Self {
      arena,
      previous: None,
      done: false,
    }
  }
}

impl Iterator for Sections<'_, '_> {
  type Item = Section;

  fn next(&mut self) -> Option<Section> {
    if self.done {
      return None;
    }

    match self.arena.next_section(self.previous) {
      Some(section) => {
        self.previous = Some(section.header.cast_const());
        Some(section)
      }
      None => {
        self.done = true;
        None
      }
    }
  }
}

impl FusedIterator for Sections<'_, '_> {}

impl fmt::Display for Size {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{} blocks ({} bytes)", self.blocks, self.bytes)
  }
}

impl fmt::Display for Section {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "{} section with {} at [{:?}]; data starts at [{:?}]",
      if self.taken { "Taken" } else { "Free" },
      self.size,
      self.header,
      self.data
    )
  }
}

impl fmt::Display for Summary {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "block size: {} bytes", self.block_size)?;

    match self.static_buffer {
      Some(base) => writeln!(
        f,
        "static buffer: [{:?}], {} bytes",
        base, self.static_buffer_size
      )?,
      None => writeln!(f, "static buffer: none")?,
    }

    writeln!(f, "out of memory override: {}", self.out_of_memory)?;

    let Some(buffer) = self.buffer else {
      return writeln!(f, "arena not attached");
    };

    writeln!(f, "buffer: [{:?}]", buffer)?;
    writeln!(f, "total: {}", self.total)?;
    writeln!(
      f,
      "free: {} in {} sections",
      self.free, self.sections.free
    )?;
    write!(
      f,
      "taken: {} in {} sections",
      self.taken, self.sections.taken
    )
  }
}

/// Prints the summary, the last operation and every section of `arena`.
pub fn print_arena(arena: &Arena) {
  println!("{}", arena.inspect());
  println!("last operation: {}", arena.last_operation());

  for section in arena.sections() {
    println!("{section}");
  }

  println!("No more sections to inspect");
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::HEADER_BLOCKS;

  #[repr(C, align(32))]
  struct Buffer([u8; 512]);

  #[test]
  fn test_size_from_blocks() {
    let size = Size::from_blocks(3);
    assert_eq!(size.blocks, 3);
    assert_eq!(size.bytes, 3 * BLOCK_SIZE);
  }

  #[test]
  fn test_sections_walk_chain() {
    let mut buffer = Buffer([0; 512]);
    let mut arena = Arena::new();
    arena.init(&mut buffer.0);

    let first = arena.acquire(BLOCK_SIZE);
    let second = arena.acquire(2 * BLOCK_SIZE);
    unsafe { arena.release(first) };

    let sections: Vec<Section> = arena.sections().collect();

    assert_eq!(sections.len(), 3);
    assert!(!sections[0].taken);
    assert_eq!(sections[0].data, first);
    assert!(sections[1].taken);
    assert_eq!(sections[1].data, second);
    assert_eq!(sections[1].size, Size::from_blocks(2));
    assert!(!sections[2].taken);
    for pair in sections.windows(2) {
      assert_eq!(
        pair[1].header as usize - pair[0].header as usize,
        (pair[0].size.blocks + HEADER_BLOCKS) * BLOCK_SIZE
      );
    }
  }

  #[test]
  fn test_summary_counts() {
    let mut buffer = Buffer([0; 512]);
    let mut arena = Arena::new();
    arena.init(&mut buffer.0);
    let capacity = arena.inspect().free.blocks;

    arena.acquire(BLOCK_SIZE);
    arena.acquire(BLOCK_SIZE);

    let summary = arena.inspect();

    assert_eq!(summary.total.blocks, capacity);
    assert_eq!(summary.taken, Size::from_blocks(2));
    assert_eq!(summary.free.blocks, capacity - 2 - 2 * HEADER_BLOCKS);
    assert_eq!(
      summary.sections,
      SectionCounts {
        total: 3,
        free: 1,
        taken: 2
      }
    );
  }

  #[test]
  fn test_detached_summary_is_empty() {
    let arena = Arena::new();
    let summary = arena.inspect();

    assert!(summary.buffer.is_none());
    assert!(summary.static_buffer.is_none());
    assert_eq!(summary.total, Size::default());
    assert_eq!(summary.sections, SectionCounts::default());
    assert_eq!(arena.sections().count(), 0);
    assert!(summary.to_string().ends_with("arena not attached\n"));
  }

  #[test]
  fn test_display_section() {
    let mut buffer = Buffer([0; 512]);
    let mut arena = Arena::new();
    arena.init(&mut buffer.0);
    arena.acquire(1);

    let section = arena.next_section(None).unwrap();
    let text = section.to_string();

    assert!(text.starts_with("Taken section with 1 blocks"));
  }
}
