//! Index array encoding.
//!
//! One [`IndexEntry`] per block from 0 through the last non-empty block. Entries
//! stay a tagged enum until serialization converts them to the signed wire
//! form: `-1` empty, `-2` full, otherwise the dedup position.

use crate::blocks::{BlockClass, BlockTable, DedupData, BLOCK_SIZE};

/// Wire value of an empty block.
pub const EMPTY_SENTINEL: i32 = -1;

/// Wire value of a full block.
pub const FULL_SENTINEL: i32 = -2;

/// Index entry for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEntry {
    /// All clear.
    Empty,
    /// All set.
    Full,
    /// Bit data lives at this dedup position.
    Mixed(usize),
}

impl IndexEntry {
    /// Signed wire encoding.
    #[must_use]
    pub fn to_wire(self) -> i32 {
        match self {
            IndexEntry::Empty => EMPTY_SENTINEL,
            IndexEntry::Full => FULL_SENTINEL,
            IndexEntry::Mixed(position) => position as i32,
        }
    }

    /// Decodes a wire value; anything below `-2` is invalid.
    #[must_use]
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            -1 => Some(IndexEntry::Empty),
            -2 => Some(IndexEntry::Full),
            n => usize::try_from(n).ok().map(IndexEntry::Mixed),
        }
    }
}

/// The block index, up to and including the last non-empty block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexArray {
    entries: Vec<IndexEntry>,
}

impl IndexArray {
    /// Creates an index from decoded entries.
    #[must_use]
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    /// Entries by block index.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries pointing into the dedup data.
    #[must_use]
    pub fn mixed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, IndexEntry::Mixed(_)))
            .count()
    }

    /// Largest wire value, used to size the emitted integer type.
    #[must_use]
    pub fn max_position(&self) -> Option<usize> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                IndexEntry::Mixed(p) => Some(*p),
                _ => None,
            })
            .max()
    }

    /// Two-level lookup: block entry first, then the bit inside the dedup entry.
    ///
    /// Code points past the last entry are implicitly clear, as are positions
    /// that do not exist in `data`.
    #[must_use]
    pub fn lookup(&self, data: &DedupData, codepoint: u32) -> bool {
        match self.entries.get((codepoint / BLOCK_SIZE) as usize) {
            None | Some(IndexEntry::Empty) => false,
            Some(IndexEntry::Full) => true,
            Some(IndexEntry::Mixed(position)) => data
                .get(*position)
                .is_some_and(|bits| bits.get(codepoint % BLOCK_SIZE)),
        }
    }
}

/// Builds the index from the scanned table.
#[must_use]
pub fn encode(table: &BlockTable) -> IndexArray {
    let Some(last) = table.last_non_empty() else {
        return IndexArray::default();
    };
    let mut next = 0;
    let entries = table.blocks()[..=last]
        .iter()
        .map(|block| match block.class() {
            BlockClass::Empty => IndexEntry::Empty,
            BlockClass::Full => IndexEntry::Full,
            BlockClass::Mixed => {
                next += 1;
                IndexEntry::Mixed(next - 1)
            }
        })
        .collect();
    IndexArray { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockBitmapBuilder;
    use unibitmap_test_helpers::ToyOracle;
    use unibitmap_ucd::PropertyOracle;

    fn scan(toy: &ToyOracle, end: u32) -> (BlockTable, DedupData) {
        let sel = toy.resolve("TOY").unwrap();
        BlockBitmapBuilder::new()
            .domain_end(end)
            .build(toy, &sel)
            .unwrap()
    }

    #[test]
    fn toy_scenario_index() {
        let (table, _) = scan(&ToyOracle::new().set(512..600), 2048);
        let index = encode(&table);
        let wire: Vec<i32> = index.entries().iter().map(|e| e.to_wire()).collect();
        assert_eq!(wire, [-1, 0]);
    }

    #[test]
    fn positions_ascend_in_block_order() {
        let toy = ToyOracle::new()
            .set(10..20)
            .set(1024..1536)
            .set(1600..1610)
            .set(3000..3001);
        let (table, data) = scan(&toy, 4096);
        let index = encode(&table);
        assert_eq!(
            index.entries(),
            [
                IndexEntry::Mixed(0),
                IndexEntry::Empty,
                IndexEntry::Full,
                IndexEntry::Mixed(1),
                IndexEntry::Empty,
                IndexEntry::Mixed(2),
            ]
        );
        assert_eq!(index.mixed_count(), table.mixed_count());
        assert_eq!(index.max_position(), Some(data.len() - 1));
    }

    #[test]
    fn empty_table_has_empty_index() {
        let (table, data) = scan(&ToyOracle::new(), 2048);
        let index = encode(&table);
        assert!(index.is_empty());
        assert!(!index.lookup(&data, 0));
    }

    #[test]
    fn lookup_beyond_the_index_is_false() {
        let toy = ToyOracle::new().set(100..200);
        let sel = toy.resolve("TOY").unwrap();
        let (table, data) = scan(&toy, 4096);
        let index = encode(&table);
        assert_eq!(index.len(), 1);
        for c in 0..4096 {
            assert_eq!(index.lookup(&data, c), toy.test_binary(c, &sel).unwrap());
        }
    }

    #[test]
    fn wire_round_trip() {
        for entry in [IndexEntry::Empty, IndexEntry::Full, IndexEntry::Mixed(7)] {
            assert_eq!(IndexEntry::from_wire(i64::from(entry.to_wire())), Some(entry));
        }
        assert_eq!(IndexEntry::from_wire(-3), None);
    }
}
