use std::fmt;

use crate::AllocError;

/// The arena entry point an [`Operation`] was recorded by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
  /// Nothing has been recorded yet.
  Nop,
  /// The owned static region was laid out at construction.
  Load,
  Init,
  Clear,
  Reset,
  Acquire,
  Resize,
  ZeroAcquire,
  Release,
}

impl OperationKind {
  pub fn name(self) -> &'static str {
    match self {
      Self::Nop => "nop",
      Self::Load => "load",
      Self::Init => "init",
      Self::Clear => "clear",
      Self::Reset => "reset",
      Self::Acquire => "acquire",
      Self::Resize => "resize",
      Self::ZeroAcquire => "zero_acquire",
      Self::Release => "release",
    }
  }
}

/// Outcome of the most recent arena call.
///
/// `size` is the size argument the caller gave, except for release, which
/// records the released payload length in blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operation {
  pub kind: OperationKind,
  pub success: bool,
  pub size: usize,
  pub error: Option<AllocError>,
}

impl Operation {
  pub fn succeeded(
    kind: OperationKind,
    size: usize,
  ) -> Self {
    Self {
      kind,
      success: true,
      size,
      error: None,
    }
  }

  pub fn failed(
    kind: OperationKind,
    size: usize,
    error: AllocError,
  ) -> Self {
    Self {
      kind,
      success: false,
      size,
      error: Some(error),
    }
  }
}

impl Default for Operation {
  fn default() -> Self {
    Self::succeeded(OperationKind::Nop, 0)
  }
}

impl fmt::Display for Operation {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "{}: {}; size: {}",
      self.kind.name(),
      if self.success { "success" } else { "failure" },
      self.size
    )?;

    if let Some(error) = self.error {
      write!(f, " ({error})")?;
    }

    Ok(())
  }
}
