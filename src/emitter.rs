use crate::builder::{Tables, POINTER_LIMIT};
use crate::source::DEFAULT_INDEX_URL;
use std::fmt::{self, Display, Formatter};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
  #[default]
  Pub,
  PubCrate,
  Private,
}

impl Display for Visibility {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Self::Pub => write!(f, "pub "),
      Self::PubCrate => write!(f, "pub(crate) "),
      Self::Private => Ok(()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
  pub decode_name: String,
  pub encode_name: String,
  pub visibility: Visibility,
  /// Named in the "generated by" header line.
  pub generator: String,
  /// Where the index is specified, cited above the decode table.
  pub spec_url: String,
}

impl Default for EmitOptions {
  fn default() -> Self {
    Self {
      decode_name: "GBK_DECODE".to_owned(),
      encode_name: "GBK_ENCODE".to_owned(),
      visibility: Visibility::Pub,
      generator: "gen_gbk".to_owned(),
      spec_url: DEFAULT_INDEX_URL.to_owned(),
    }
  }
}

pub struct Emitter<'a> {
  options: &'a EmitOptions,
}

impl<'a> Emitter<'a> {
  pub fn new(options: &'a EmitOptions) -> Self {
    Self { options }
  }

  /// Writes both tables as Rust source.
  pub fn emit<W>(&self, tables: &Tables, mut out: W) -> io::Result<()>
  where
    W: Write,
  {
    let opts = self.options;

    writeln!(out, "// generated by {}; DO NOT EDIT", opts.generator)?;
    writeln!(out)?;
    writeln!(out, "// GBK tables for Simplified Chinese text.")?;
    writeln!(out)?;

    writeln!(
      out,
      "/// {} is the decoding table from GBK pointer to Unicode.",
      opts.decode_name
    )?;
    writeln!(out, "/// It is defined at {}", opts.spec_url)?;
    write_array(
      &mut out,
      opts.visibility,
      &opts.decode_name,
      POINTER_LIMIT as usize,
      tables.forward_entries(),
    )?;
    writeln!(out)?;

    writeln!(
      out,
      "/// {} is the encoding table from Unicode to GBK code, lead byte high.",
      opts.encode_name
    )?;
    write_array(
      &mut out,
      opts.visibility,
      &opts.encode_name,
      65536,
      tables.reverse_entries(),
    )?;

    out.flush()
  }
}

fn write_array<W, I>(
  out: &mut W,
  visibility: Visibility,
  name: &str,
  len: usize,
  entries: I,
) -> io::Result<()>
where
  W: Write,
  I: Iterator<Item = (usize, u16)>,
{
  writeln!(out, "{}static {}: [u16; {}] = {{", visibility, name, len)?;
  writeln!(out, "  let mut t = [0u16; {}];", len)?;
  for (i, v) in entries {
    writeln!(out, "  t[{}] = 0x{:04X};", i, v)?;
  }
  writeln!(out, "  t")?;
  writeln!(out, "}};")
}
