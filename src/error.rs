use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The index stream could not be opened or read.
  #[error("cannot read {source_desc}: {cause}")]
  SourceUnavailable {
    source_desc: String,
    cause: String,
  },

  #[error("line {line}: could not parse {text:?}")]
  MalformedRecord { line: usize, text: String },

  #[error("line {line}: GBK pointer {pointer} is out of range")]
  PointerOutOfRange { line: usize, pointer: i64 },

  /// Only raised under `OrderPolicy::Strict`.
  #[error(
    "line {line}: GBK pointer {pointer} follows pointer {previous}, \
     index must be in ascending order"
  )]
  PointerOutOfOrder {
    line: usize,
    pointer: u16,
    previous: u16,
  },

  #[error("failed to write tables: {0}")]
  Io(#[from] io::Error),
}

impl Error {
  pub(crate) fn unavailable(
    source_desc: impl ToString,
    cause: impl ToString,
  ) -> Self {
    Self::SourceUnavailable {
      source_desc: source_desc.to_string(),
      cause: cause.to_string(),
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
