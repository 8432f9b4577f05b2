//! Generates the GBK decode and encode tables from the WHATWG index.
//!
//! The pipeline reads `<pointer> 0x<codepoint>` records from a [`Source`],
//! builds both directions with [`TableBuilder`] and writes them as Rust
//! statics with [`Emitter`].

pub mod builder;
pub mod emitter;
pub mod error;
pub mod source;

pub use self::builder::*;
pub use self::emitter::*;
pub use self::error::*;
pub use self::source::*;

/// Reads and builds the tables. The source stream is closed before this
/// returns.
pub fn build_tables(source: &Source, policy: OrderPolicy) -> Result<Tables> {
  let lines = source.open()?;
  log::debug!("building tables from {}", lines.description());
  TableBuilder::new(policy).build(lines)
}

/// Runs the whole pipeline, writing the generated source to `out`.
pub fn generate<W>(
  source: &Source,
  policy: OrderPolicy,
  options: &EmitOptions,
  out: W,
) -> Result<()>
where
  W: std::io::Write,
{
  let tables = build_tables(source, policy)?;
  log::info!("emitting tables built from {}", source);
  Emitter::new(options).emit(&tables, out)?;
  Ok(())
}
