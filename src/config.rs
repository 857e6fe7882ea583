//! Arena construction parameters.

/// Configuration for [`Arena::from_config`](crate::Arena::from_config).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArenaConfig {
  /// Bytes of owned static region to embed in the arena.
  ///
  /// Default: 0, meaning no static region. When non-zero the arena owns a
  /// block-aligned buffer of at least this many bytes, is attached to it at
  /// construction, and [`Arena::reset`](crate::Arena::reset) returns to it.
  pub static_region: usize,

  /// Initial state of the out-of-memory override.
  ///
  /// Default: false.
  pub out_of_memory: bool,
}

impl ArenaConfig {
  /// Static region size used by [`ArenaConfig::embedded`].
  pub const DEFAULT_STATIC_REGION: usize = 64 * 1024;

  pub fn new() -> Self {
    Self::default()
  }

  /// A configuration carrying a static region of the default size.
  pub fn embedded() -> Self {
    Self::new().static_region(Self::DEFAULT_STATIC_REGION)
  }

  pub fn static_region(
    mut self,
    bytes: usize,
  ) -> Self {
    self.static_region = bytes;
    self
  }

  pub fn out_of_memory(
    mut self,
    flag: bool,
  ) -> Self {
    self.out_of_memory = flag;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_has_no_static_region() {
    let config = ArenaConfig::default();
    assert_eq!(config.static_region, 0);
    assert!(!config.out_of_memory);
  }

  #[test]
  fn embedded_uses_default_size() {
    let config = ArenaConfig::embedded().out_of_memory(true);
    assert_eq!(config.static_region, ArenaConfig::DEFAULT_STATIC_REGION);
    assert!(config.out_of_memory);
  }
}
