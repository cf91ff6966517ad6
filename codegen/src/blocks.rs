//! Block scanning and deduplication.
//!
//! The domain is cut into [`BLOCK_SIZE`]-wide windows. Each window is classified
//! as [`BlockClass::Empty`], [`BlockClass::Full`] or [`BlockClass::Mixed`]; only
//! mixed windows carry bit data into the [`DedupData`] array. Every window keeps
//! its slot in the [`BlockTable`] so that `codepoint / BLOCK_SIZE` stays a valid
//! index at lookup time.

use rayon::prelude::*;
use unibitmap_ucd::{OracleError, PropertyOracle, PropertySelector, CODEPOINT_END};

use crate::error::CodegenError;

/// Code points per block.
pub const BLOCK_SIZE: u32 = 0x200;

/// Bytes of bit data per block.
pub const BLOCK_BYTES: usize = BLOCK_SIZE as usize / 8;

/// 64-bit words of bit data per block.
pub const BLOCK_WORDS: usize = BLOCK_SIZE as usize / 64;

/// Classification of a block by population count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockClass {
    /// No code point has the property.
    Empty,
    /// Every code point has the property.
    Full,
    /// Some code points have the property; bit data must be stored.
    Mixed,
}

/// 512 bits, one per code point of a block. Bit `i` is offset `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BlockBits([u64; BLOCK_WORDS]);

impl BlockBits {
    /// Returns the bit at `offset`.
    #[must_use]
    pub fn get(&self, offset: u32) -> bool {
        let offset = offset as usize;
        self.0[offset / 64] & (1 << (offset % 64)) != 0
    }

    /// Sets the bit at `offset`, returning whether it was previously clear.
    pub fn set(&mut self, offset: u32) -> bool {
        let offset = offset as usize;
        let mask = 1 << (offset % 64);
        let was_clear = self.0[offset / 64] & mask == 0;
        self.0[offset / 64] |= mask;
        was_clear
    }

    /// Number of set bits.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }

    /// Byte view: bit `k` of byte `j` is offset `8 * j + k`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; BLOCK_BYTES] {
        let mut bytes = [0u8; BLOCK_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Rebuilds bits from the byte view of [`BlockBits::to_bytes`].
    #[must_use]
    pub fn from_bytes(bytes: &[u8; BLOCK_BYTES]) -> Self {
        let mut words = [0u64; BLOCK_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            *word = u64::from_le_bytes(le);
        }
        Self(words)
    }

    /// Word view: each word packs 8 consecutive bytes of the byte view, the
    /// lowest byte offset in the most significant position.
    #[must_use]
    pub fn to_packed_words(&self) -> [u64; BLOCK_WORDS] {
        let bytes = self.to_bytes();
        let mut words = [0u64; BLOCK_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut be = [0u8; 8];
            be.copy_from_slice(chunk);
            *word = u64::from_be_bytes(be);
        }
        words
    }

    /// Rebuilds bits from the word view of [`BlockBits::to_packed_words`].
    #[must_use]
    pub fn from_packed_words(words: &[u64; BLOCK_WORDS]) -> Self {
        let mut bytes = [0u8; BLOCK_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        Self::from_bytes(&bytes)
    }
}

/// One scanned window of the domain.
#[derive(Debug, Clone)]
pub struct Block {
    range_start: u32,
    population: u32,
    last_set: Option<u32>,
    class: BlockClass,
    bits: BlockBits,
}

impl Block {
    /// Queries the oracle once per code point of `[start, start + BLOCK_SIZE)`
    /// that lies below `domain_end`.
    fn scan<O: PropertyOracle>(
        oracle: &O,
        selector: &PropertySelector,
        start: u32,
        domain_end: u32,
    ) -> Result<Self, OracleError> {
        let end = start.saturating_add(BLOCK_SIZE).min(domain_end);
        let mut bits = BlockBits::default();
        let mut population = 0;
        let mut last_set = None;
        for c in start..end {
            if oracle.test_binary(c, selector)? {
                bits.set(c - start);
                population += 1;
                last_set = Some(c);
            }
        }
        let class = match population {
            0 => BlockClass::Empty,
            BLOCK_SIZE => BlockClass::Full,
            _ => BlockClass::Mixed,
        };
        Ok(Self {
            range_start: start,
            population,
            last_set,
            class,
            bits,
        })
    }

    /// First code point of the block.
    #[must_use]
    pub fn range_start(&self) -> u32 {
        self.range_start
    }

    /// Last code point of the block.
    #[must_use]
    pub fn range_end(&self) -> u32 {
        self.range_start + BLOCK_SIZE - 1
    }

    /// Number of set bits. May disagree with [`Block::class`] after forcing.
    #[must_use]
    pub fn population(&self) -> u32 {
        self.population
    }

    /// Highest code point that tested true during the scan.
    #[must_use]
    pub fn last_set(&self) -> Option<u32> {
        self.last_set
    }

    /// Classification fixed at scan time.
    #[must_use]
    pub fn class(&self) -> BlockClass {
        self.class
    }

    /// The block's bit data.
    #[must_use]
    pub fn bits(&self) -> &BlockBits {
        &self.bits
    }
}

/// All blocks covering the domain, in domain order.
#[derive(Debug, Clone)]
pub struct BlockTable {
    blocks: Vec<Block>,
    last_non_empty: Option<usize>,
    mixed_count: usize,
}

impl BlockTable {
    /// Blocks in domain order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Index of the last block with a nonzero population at scan time.
    #[must_use]
    pub fn last_non_empty(&self) -> Option<usize> {
        self.last_non_empty
    }

    /// `last_non_empty` in its signed wire form, `-1` when nothing is set.
    #[must_use]
    pub fn last_non_empty_index(&self) -> i64 {
        self.last_non_empty.map_or(-1, |i| i as i64)
    }

    /// Number of blocks classified as mixed.
    #[must_use]
    pub fn mixed_count(&self) -> usize {
        self.mixed_count
    }

    /// Highest code point covered by stored table entries, if any.
    #[must_use]
    pub fn covered_end(&self) -> Option<u32> {
        self.last_non_empty
            .map(|i| (i as u32 + 1) * BLOCK_SIZE - 1)
    }

    /// Value of `codepoint` according to the blocks' bit data and classes.
    #[must_use]
    pub fn lookup(&self, codepoint: u32) -> bool {
        let Some(block) = self.blocks.get((codepoint / BLOCK_SIZE) as usize) else {
            return false;
        };
        match block.class {
            BlockClass::Empty => false,
            BlockClass::Full => true,
            BlockClass::Mixed => block.bits.get(codepoint % BLOCK_SIZE),
        }
    }
}

/// Bit data of mixed blocks, in the order their blocks appear in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupData {
    entries: Vec<BlockBits>,
}

impl DedupData {
    /// Creates the array from already ordered entries.
    #[must_use]
    pub fn from_entries(entries: Vec<BlockBits>) -> Self {
        Self { entries }
    }

    /// Entries by dedup position.
    #[must_use]
    pub fn entries(&self) -> &[BlockBits] {
        &self.entries
    }

    /// Entry at dedup `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&BlockBits> {
        self.entries.get(position)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no block needed bit data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scans a binary property over the domain.
#[derive(Debug, Clone)]
pub struct BlockBitmapBuilder {
    domain_end: u32,
    forced: Vec<u32>,
}

impl Default for BlockBitmapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockBitmapBuilder {
    /// A builder over the full `[0, CODEPOINT_END)` domain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            domain_end: CODEPOINT_END,
            forced: Vec::new(),
        }
    }

    /// Restricts the scan to `[0, end)`.
    #[must_use]
    pub fn domain_end(mut self, end: u32) -> Self {
        self.domain_end = end;
        self
    }

    /// Code points OR-ed into block 0 after the scan.
    ///
    /// Only code points below [`BLOCK_SIZE`] are applied. Forcing updates block 0's
    /// bits and population count, but its class, the table counters and the
    /// dedup layout stay as scanned: a forced bit in a block scanned as empty or
    /// full is not represented by the encoded table.
    #[must_use]
    pub fn force(mut self, codepoints: impl IntoIterator<Item = u32>) -> Self {
        self.forced.extend(codepoints);
        self
    }

    /// Scans every block, then assigns dedup positions in domain order.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::InvalidDomain`] for an empty or oversized domain
    /// and [`CodegenError::Oracle`] if any oracle query fails.
    pub fn build<O: PropertyOracle + Sync>(
        &self,
        oracle: &O,
        selector: &PropertySelector,
    ) -> Result<(BlockTable, DedupData), CodegenError> {
        if self.domain_end == 0 || self.domain_end > CODEPOINT_END {
            return Err(CodegenError::InvalidDomain {
                end: self.domain_end,
            });
        }
        let count = self.domain_end.div_ceil(BLOCK_SIZE);
        let mut blocks: Vec<Block> = (0..count)
            .into_par_iter()
            .map(|i| Block::scan(oracle, selector, i * BLOCK_SIZE, self.domain_end))
            .collect::<Result<_, _>>()?;

        if let Some(first) = blocks.first_mut() {
            self.apply_forced(first);
        }

        let mut last_non_empty = None;
        let mut entries = Vec::new();
        for (i, block) in blocks.iter().enumerate() {
            if block.class != BlockClass::Empty {
                last_non_empty = Some(i);
            }
            if block.class == BlockClass::Mixed {
                log::debug!(
                    "block {i} 0x{:06x}-0x{:06x}: {} bits, last U+{:04X}, position {}",
                    block.range_start(),
                    block.range_end(),
                    block.population,
                    block.last_set.unwrap_or(block.range_start),
                    entries.len()
                );
                entries.push(block.bits.clone());
            }
        }

        let table = BlockTable {
            mixed_count: entries.len(),
            blocks,
            last_non_empty,
        };
        log::info!(
            "{selector}: {} blocks, last non-empty {}, {} mixed",
            table.blocks.len(),
            table.last_non_empty_index(),
            table.mixed_count
        );
        Ok((table, DedupData { entries }))
    }

    fn apply_forced(&self, block: &mut Block) {
        for &c in &self.forced {
            if c >= BLOCK_SIZE {
                log::warn!("forced code point U+{c:04X} is outside block 0, ignored");
                continue;
            }
            if block.bits.set(c) {
                block.population += 1;
                if block.class != BlockClass::Mixed {
                    log::warn!(
                        "forced U+{c:04X} into a block scanned as {:?}; the table will not carry it",
                        block.class
                    );
                }
            }
        }
    }
}
