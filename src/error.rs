//! Failure causes attached to the last-operation record.

use thiserror::Error;

/// Why an arena operation failed.
///
/// None of these are fatal: the public operations return a null pointer (or
/// do nothing, for release) and record the cause in
/// [`Operation::error`](crate::Operation::error).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  #[error("no arena is attached")]
  Detached,
  #[error("requested size is zero")]
  ZeroSize,
  #[error("out-of-memory override is set")]
  OutOfMemory,
  #[error("{0} bytes overflow when rounded up to whole blocks")]
  SizeOverflow(usize),
  #[error("{count} elements of {size} bytes overflow usize")]
  CountOverflow { count: usize, size: usize },
  #[error("no free section can hold {blocks} blocks")]
  NoFit { blocks: usize },
  #[error("buffer of {size} bytes cannot hold a section and the sentinel")]
  BufferTooSmall { size: usize },
  #[error("null pointer")]
  NullPointer,
}

pub type AllocResult<T> = Result<T, AllocError>;
