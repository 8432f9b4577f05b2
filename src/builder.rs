use crate::error::{Error, Result};

pub const LEAD_COUNT: u16 = 126;
pub const TRAIL_COUNT: u16 = 190;
/// Number of pointers in the two-byte lattice.
pub const POINTER_LIMIT: u16 = LEAD_COUNT * TRAIL_COUNT;

pub const LEAD_BASE: u16 = 0x81;
pub const TRAIL_BASE: u16 = 0x40;
/// Trail offsets at or past this value skip the illegal trail byte 0x7F.
pub const TRAIL_GAP: u16 = 0x3f;

const TABLE_SIZE: usize = 65536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
  pub pointer: u16,
  pub codepoint: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
  /// Descending pointers are accepted with a warning.
  #[default]
  Lenient,
  /// Descending pointers are rejected.
  Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStats {
  pub records: usize,
  pub skipped: usize,
  /// Records whose codepoint already had an encoding.
  pub collisions: usize,
  pub duplicates: usize,
}

/// Packs a pointer into its canonical two-byte sequence, lead byte high.
/// `None` if the pointer is outside the lattice.
pub fn pack_pointer(pointer: u16) -> Option<u16> {
  if pointer >= POINTER_LIMIT {
    return None;
  }
  let lead = pointer / TRAIL_COUNT;
  let mut trail = pointer % TRAIL_COUNT;
  if trail >= TRAIL_GAP {
    trail += 1;
  }
  Some((LEAD_BASE + lead) << 8 | (TRAIL_BASE + trail))
}

fn check_pointer(line_no: usize, pointer: i64) -> Result<u16> {
  if (0..POINTER_LIMIT as i64).contains(&pointer) {
    Ok(pointer as u16)
  } else {
    Err(Error::PointerOutOfRange {
      line: line_no,
      pointer,
    })
  }
}

/// Parses one trimmed, non-comment record: `<decimal> 0x<hex>`, anything
/// after the second field is ignored.
fn parse_record(line_no: usize, s: &str) -> Result<IndexEntry> {
  let malformed = || Error::MalformedRecord {
    line: line_no,
    text: s.to_owned(),
  };

  let mut fields = s.split_whitespace();
  let pointer = fields
    .next()
    .and_then(|f| f.parse::<i64>().ok())
    .ok_or_else(malformed)?;
  let codepoint = fields
    .next()
    .and_then(|f| f.strip_prefix("0x"))
    .filter(|hex| !hex.starts_with(['+', '-']))
    .and_then(|hex| u16::from_str_radix(hex, 16).ok())
    .ok_or_else(malformed)?;

  Ok(IndexEntry {
    pointer: check_pointer(line_no, pointer)?,
    codepoint,
  })
}

pub struct TableBuilder {
  forward: Box<[u16; TABLE_SIZE]>,
  reverse: Box<[u16; TABLE_SIZE]>,
  policy: OrderPolicy,
  last_pointer: Option<u16>,
  stats: BuildStats,
}

impl Default for TableBuilder {
  fn default() -> Self {
    Self::new(OrderPolicy::default())
  }
}

impl TableBuilder {
  pub fn new(policy: OrderPolicy) -> Self {
    Self {
      forward: Box::new([0; TABLE_SIZE]),
      reverse: Box::new([0; TABLE_SIZE]),
      policy,
      last_pointer: None,
      stats: BuildStats::default(),
    }
  }

  pub fn stats(&self) -> BuildStats {
    self.stats
  }

  /// Feeds one raw input line. `line_no` is 1-based and only used in
  /// diagnostics.
  pub fn push_line(&mut self, line_no: usize, line: &str) -> Result<()> {
    let s = line.trim();
    if s.is_empty() || s.starts_with('#') {
      self.stats.skipped += 1;
      return Ok(());
    }

    let entry = parse_record(line_no, s)?;
    self.push_entry(line_no, entry)
  }

  pub fn push_entry(&mut self, line_no: usize, entry: IndexEntry) -> Result<()> {
    let IndexEntry { pointer, codepoint } = entry;
    let packed = pack_pointer(pointer).ok_or(Error::PointerOutOfRange {
      line: line_no,
      pointer: pointer as i64,
    })?;

    match self.last_pointer {
      Some(previous) if pointer < previous => match self.policy {
        OrderPolicy::Strict => {
          return Err(Error::PointerOutOfOrder {
            line: line_no,
            pointer,
            previous,
          });
        }
        OrderPolicy::Lenient => log::warn!(
          "line {}: pointer {} follows {}, encode table may not pick the lowest pointer",
          line_no,
          pointer,
          previous
        ),
      },
      _ => {}
    }

    let slot = &mut self.forward[pointer as usize];
    if *slot != 0 {
      self.stats.duplicates += 1;
      log::warn!(
        "line {}: pointer {} redefined from 0x{:04X} to 0x{:04X}",
        line_no,
        pointer,
        *slot,
        codepoint
      );
    }
    *slot = codepoint;

    let slot = &mut self.reverse[codepoint as usize];
    if *slot == 0 {
      *slot = packed;
    } else {
      self.stats.collisions += 1;
      log::debug!(
        "line {}: U+{:04X} already encoded as 0x{:04X}, keeping it",
        line_no,
        codepoint,
        *slot
      );
    }

    self.last_pointer = Some(self.last_pointer.map_or(pointer, |p| p.max(pointer)));
    self.stats.records += 1;
    Ok(())
  }

  /// Consumes every line, stopping at the first error.
  pub fn build<I>(mut self, lines: I) -> Result<Tables>
  where
    I: IntoIterator<Item = Result<String>>,
  {
    for (i, line) in lines.into_iter().enumerate() {
      self.push_line(i + 1, &line?)?;
    }
    Ok(self.finish())
  }

  pub fn finish(self) -> Tables {
    let stats = self.stats;
    log::info!(
      "built tables from {} records ({} skipped lines, {} shared codepoints)",
      stats.records,
      stats.skipped,
      stats.collisions
    );
    Tables {
      forward: self.forward,
      reverse: self.reverse,
      stats,
    }
  }
}

/// Finished decode and encode tables.
pub struct Tables {
  forward: Box<[u16; TABLE_SIZE]>,
  reverse: Box<[u16; TABLE_SIZE]>,
  stats: BuildStats,
}

impl Tables {
  /// Unicode codepoint for `pointer`, 0 if unmapped.
  pub fn decode(&self, pointer: u16) -> u16 {
    self.forward[pointer as usize]
  }

  /// Packed two-byte sequence for `codepoint`, 0 if unmapped.
  pub fn encode(&self, codepoint: u16) -> u16 {
    self.reverse[codepoint as usize]
  }

  /// `[lead, trail]` for `codepoint`.
  pub fn encode_bytes(&self, codepoint: u16) -> Option<[u8; 2]> {
    match self.encode(codepoint) {
      0 => None,
      packed => Some(packed.to_be_bytes()),
    }
  }

  pub fn stats(&self) -> BuildStats {
    self.stats
  }

  /// Non-zero decode entries in ascending pointer order.
  pub fn forward_entries(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
    nonzero(&self.forward[..POINTER_LIMIT as usize])
  }

  /// Non-zero encode entries in ascending codepoint order.
  pub fn reverse_entries(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
    nonzero(&self.reverse[..])
  }
}

fn nonzero(table: &[u16]) -> impl Iterator<Item = (usize, u16)> + '_ {
  table
    .iter()
    .copied()
    .enumerate()
    .filter(|&(_, v)| v != 0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use quickcheck::{Arbitrary, Gen};
  use quickcheck_macros::quickcheck;

  fn build_str(input: &str, policy: OrderPolicy) -> Result<Tables> {
    TableBuilder::new(policy)
      .build(input.lines().map(|l| Ok(l.to_owned())))
  }

  #[test]
  fn forward_table_is_complete() {
    let tables = build_str(
      "0 0x4E02\n1 0x4E04\n190 0x4E0C\n23939 0xE4C5\n",
      OrderPolicy::Strict,
    )
    .unwrap();

    assert_eq!(tables.decode(0), 0x4e02);
    assert_eq!(tables.decode(1), 0x4e04);
    assert_eq!(tables.decode(190), 0x4e0c);
    assert_eq!(tables.decode(23939), 0xe4c5);
    assert_eq!(tables.forward_entries().count(), 4);
  }

  #[test]
  fn first_pointer_wins_in_reverse_table() {
    let tables = build_str("0 0x4E00\n1 0x4E00\n", OrderPolicy::Strict).unwrap();

    assert_eq!(tables.decode(0), 0x4e00);
    assert_eq!(tables.decode(1), 0x4e00);
    assert_eq!(tables.encode(0x4e00), 0x8140);
    assert_eq!(tables.encode_bytes(0x4e00), Some([0x81, 0x40]));
    assert_eq!(tables.stats().collisions, 1);
  }

  #[test]
  fn trail_gap_is_skipped() {
    // pointer 63 is trail offset 0x3f, the first past the gap
    let tables = build_str("62 0x4E4F\n63 0x4E50\n", OrderPolicy::Strict).unwrap();

    assert_eq!(tables.encode(0x4e4f), 0x817e);
    assert_eq!(tables.encode(0x4e50), 0x8180);
  }

  #[test]
  fn pack_pointer_edges() {
    assert_eq!(pack_pointer(0), Some(0x8140));
    assert_eq!(pack_pointer(189), Some(0x81fe));
    assert_eq!(pack_pointer(190), Some(0x8240));
    assert_eq!(pack_pointer(POINTER_LIMIT - 1), Some(0xfefe));
    assert_eq!(pack_pointer(POINTER_LIMIT), None);
    assert_eq!(pack_pointer(u16::MAX), None);
  }

  #[test]
  fn pointer_range_is_checked() {
    assert!(build_str("23939 0x4E00", OrderPolicy::Strict).is_ok());

    match build_str("23940 0x4E00", OrderPolicy::Strict) {
      Err(Error::PointerOutOfRange { line, pointer }) => {
        assert_eq!((line, pointer), (1, 23940));
      }
      other => panic!("unexpected result: {:?}", other.err()),
    }

    assert!(matches!(
      build_str("-1 0x4E00", OrderPolicy::Strict),
      Err(Error::PointerOutOfRange { pointer: -1, .. })
    ));
  }

  #[test]
  fn malformed_record_is_rejected() {
    match build_str("# header\n\nabc 0xZZZZ\n", OrderPolicy::Strict) {
      Err(Error::MalformedRecord { line, text }) => {
        assert_eq!(line, 3);
        assert_eq!(text, "abc 0xZZZZ");
      }
      other => panic!("unexpected result: {:?}", other.err()),
    }

    for bad in ["12", "12 4E00", "12 0x", "12 0x10000", "12 0X4E00", "12 0x-1"] {
      assert!(
        matches!(
          build_str(bad, OrderPolicy::Strict),
          Err(Error::MalformedRecord { .. })
        ),
        "{:?} should be malformed",
        bad
      );
    }
  }

  #[test]
  fn comments_and_blank_lines_do_not_touch_tables() {
    let mut builder = TableBuilder::default();
    builder.push_line(1, "# foo").unwrap();
    builder.push_line(2, "").unwrap();
    builder.push_line(3, "   \t").unwrap();
    let stats = builder.stats();
    let tables = builder.finish();

    assert_eq!(stats.skipped, 3);
    assert_eq!(stats.records, 0);
    assert_eq!(tables.forward_entries().count(), 0);
    assert_eq!(tables.reverse_entries().count(), 0);
  }

  #[test]
  fn trailing_text_is_ignored() {
    let tables = build_str(
      "  0\t0x4E02\t\u{4e02} (<CJK Ideograph>)  \n",
      OrderPolicy::Strict,
    )
    .unwrap();
    assert_eq!(tables.decode(0), 0x4e02);
  }

  #[test]
  fn descending_pointer_depends_on_policy() {
    let input = "5 0x4E00\n3 0x4E00\n";

    let tables = build_str(input, OrderPolicy::Lenient).unwrap();
    assert_eq!(tables.decode(3), 0x4e00);
    assert_eq!(Some(tables.encode(0x4e00)), pack_pointer(5));

    match build_str(input, OrderPolicy::Strict) {
      Err(Error::PointerOutOfOrder {
        line,
        pointer,
        previous,
      }) => assert_eq!((line, pointer, previous), (2, 3, 5)),
      other => panic!("unexpected result: {:?}", other.err()),
    }
  }

  #[test]
  fn push_entry_checks_pointer_range() {
    let mut builder = TableBuilder::default();
    for pointer in [POINTER_LIMIT, 30000, u16::MAX] {
      match builder.push_entry(
        4,
        IndexEntry {
          pointer,
          codepoint: 0x4e00,
        },
      ) {
        Err(Error::PointerOutOfRange { line, pointer: p }) => {
          assert_eq!((line, p), (4, pointer as i64));
        }
        other => panic!("unexpected result: {:?}", other),
      }
    }

    let tables = builder.finish();
    assert_eq!(tables.encode(0x4e00), 0);
    assert_eq!(tables.stats().records, 0);
  }

  #[test]
  fn duplicate_pointer_overwrites_forward_entry() {
    let tables = build_str("7 0x4E00\n7 0x4E01\n", OrderPolicy::Strict).unwrap();

    assert_eq!(tables.decode(7), 0x4e01);
    assert_eq!(Some(tables.encode(0x4e00)), pack_pointer(7));
    assert_eq!(Some(tables.encode(0x4e01)), pack_pointer(7));
    assert_eq!(tables.stats().duplicates, 1);
  }

  #[test]
  fn read_error_aborts_build() {
    let lines = vec![
      Ok("0 0x4E02".to_owned()),
      Err(Error::unavailable("<test>", "connection reset")),
      Ok("1 0x4E04".to_owned()),
    ];
    assert!(matches!(
      TableBuilder::default().build(lines),
      Err(Error::SourceUnavailable { .. })
    ));
  }

  #[derive(Debug, Clone)]
  struct Pointer(u16);

  impl Arbitrary for Pointer {
    fn arbitrary(g: &mut Gen) -> Pointer {
      Pointer(u16::arbitrary(g) % POINTER_LIMIT)
    }
  }

  #[quickcheck]
  fn packed_bytes_are_legal_gbk(Pointer(pointer): Pointer) -> bool {
    let Some(packed) = pack_pointer(pointer) else {
      return false;
    };
    let [lead, trail] = packed.to_be_bytes();
    (0x81..=0xfe).contains(&lead)
      && ((0x40..=0x7e).contains(&trail) || (0x80..=0xfe).contains(&trail))
  }

  #[quickcheck]
  fn packing_preserves_pointer_order(Pointer(a): Pointer, Pointer(b): Pointer) -> bool {
    (a < b) == (pack_pointer(a) < pack_pointer(b))
  }
}
