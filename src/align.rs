/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two. The addition is unchecked; use
/// [`blocks_for`] when the value comes from a caller.
///
/// # Examples
///
/// ```rust
/// use tinyheap::align_to;
///
/// assert_eq!(align_to!(13, 8), 16);
/// assert_eq!(align_to!(16, 16), 16);
/// assert_eq!(align_to!(0, 4), 0);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + $alignment - 1) & !($alignment - 1)
  };
}

/// Rounds `value` up to a whole number of arena blocks, in bytes.
///
/// # Examples
///
/// ```rust
/// use tinyheap::{BLOCK_SIZE, align};
///
/// assert_eq!(align!(1), BLOCK_SIZE);
/// assert_eq!(align!(BLOCK_SIZE + 1), 2 * BLOCK_SIZE);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, $crate::BLOCK_SIZE)
  };
}

/// Number of whole blocks needed to hold `size` bytes.
///
/// Returns `None` when rounding `size` up to the block size would wrap.
pub fn blocks_for(size: usize) -> Option<usize> {
  size
    .checked_add(crate::BLOCK_SIZE - 1)
    .map(|rounded| rounded / crate::BLOCK_SIZE)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::BLOCK_SIZE;

  #[test]
  fn test_align() {
    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (BLOCK_SIZE * i + 1)..=(BLOCK_SIZE * (i + 1));

      let expected_alignment = BLOCK_SIZE * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align!(size));
        assert_eq!(Some(expected / BLOCK_SIZE), blocks_for(size));
      }
    }
  }

  #[test]
  fn test_align_to_word() {
    let word = std::mem::size_of::<usize>();

    assert_eq!(align_to!(1, word), word);
    assert_eq!(align_to!(word, word), word);
    assert_eq!(align_to!(word + 1, word), 2 * word);
  }

  #[test]
  fn test_blocks_for_overflow() {
    assert_eq!(blocks_for(0), Some(0));
    assert_eq!(blocks_for(usize::MAX), None);
    assert_eq!(blocks_for(usize::MAX - BLOCK_SIZE + 2), None);
    assert_eq!(
      blocks_for(usize::MAX - BLOCK_SIZE + 1),
      Some(usize::MAX / BLOCK_SIZE)
    );
  }
}
