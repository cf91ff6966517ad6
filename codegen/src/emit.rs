//! Table serialization into C declarations.
//!
//! The emitted text has four parts: a header comment naming the data source
//! and property, the data array (packed bytes or 64-bit words), the index
//! array of signed block entries, and a trailing comment giving the exclusive
//! code point bound of the stored data.

use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use unibitmap_ucd::PropertySelector;

use crate::blocks::{BlockTable, DedupData, BLOCK_BYTES, BLOCK_SIZE, BLOCK_WORDS};
use crate::index::{IndexArray, IndexEntry, EMPTY_SENTINEL};

/// Data array element width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packing {
    /// 64 `unsigned char` per block.
    #[default]
    Byte,
    /// 8 `unsigned long long` per block.
    Word,
}

impl FromStr for Packing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "byte" => Ok(Packing::Byte),
            "word" => Ok(Packing::Word),
            other => Err(format!("invalid packing: \"{other}\" (expected byte or word)")),
        }
    }
}

/// Whether the index array ends with an extra `-1` sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexLayout {
    /// Trailing `-1`; the bound comment is `(last + 1) * 512`.
    #[default]
    Terminated,
    /// No trailing sentinel; the bound comment is `last * 512`.
    Unterminated,
}

impl FromStr for IndexLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terminated" => Ok(IndexLayout::Terminated),
            "unterminated" => Ok(IndexLayout::Unterminated),
            other => Err(format!(
                "invalid index layout: \"{other}\" (expected terminated or unterminated)"
            )),
        }
    }
}

/// Serializer settings. Passed explicitly; there is no global packing state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Data array element width.
    pub packing: Packing,
    /// Index array termination.
    pub layout: IndexLayout,
}

/// A text buffer for one generated C fragment.
pub struct SourceFile {
    /// The accumulated text.
    pub buf: String,
}

impl SourceFile {
    /// Starts a file with a block comment holding `header` lines.
    #[must_use]
    pub fn new(header: &[&str]) -> Self {
        let mut buf = String::new();
        for (i, line) in header.iter().enumerate() {
            buf.push_str(if i == 0 { "/* " } else { " * " });
            buf.push_str(line);
            buf.push('\n');
        }
        if !header.is_empty() {
            buf.pop();
            buf.push_str(" */\n\n");
        }
        Self { buf }
    }

    /// Appends `s` and a newline.
    pub fn line(&mut self, s: &str) {
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    /// Appends an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Returns the text.
    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

/// Writes generated text to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be written.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Smallest signed C integer type holding every index wire value.
#[must_use]
pub fn index_c_type(index: &IndexArray) -> &'static str {
    match index.max_position().unwrap_or(0) {
        0..=0x7f => "signed char",
        0x80..=0x7fff => "short",
        _ => "int",
    }
}

/// Exclusive code point bound stated in the trailing comment.
#[must_use]
pub fn data_bound(table: &BlockTable, layout: IndexLayout) -> u32 {
    let Some(last) = table.last_non_empty() else {
        return 0;
    };
    match layout {
        IndexLayout::Terminated => (last as u32 + 1) * BLOCK_SIZE,
        IndexLayout::Unterminated => last as u32 * BLOCK_SIZE,
    }
}

/// Renders a compiled bitmap table.
pub struct TableSerializer {
    source: String,
    property: PropertySelector,
    options: SerializeOptions,
}

impl TableSerializer {
    /// `source` names the data source in the header comment.
    pub fn new(source: impl Into<String>, property: PropertySelector, options: SerializeOptions) -> Self {
        Self {
            source: source.into(),
            property,
            options,
        }
    }

    /// Stem of the emitted array names, e.g. `unicode_letter`.
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("unicode_{}", self.property.display_name().to_ascii_lowercase())
    }

    /// Renders the header, data array, index array and bound comment.
    #[must_use]
    pub fn serialize(&self, table: &BlockTable, data: &DedupData, index: &IndexArray) -> String {
        let source = format!("This data is generated from {}", self.source);
        let query = format!(
            "by testing each code point for the {} property",
            self.property.name()
        );
        let mut f = SourceFile::new(&[&source, &query]);
        let symbol = self.symbol();

        match self.options.packing {
            Packing::Byte => {
                let _ = writeln!(
                    f.buf,
                    "static const unsigned char {symbol}_data[{}*{BLOCK_BYTES} + 1] = {{",
                    data.len()
                );
            }
            Packing::Word => {
                let _ = writeln!(
                    f.buf,
                    "static const unsigned long long {symbol}_data[{}*{BLOCK_WORDS} + 1] = {{",
                    data.len()
                );
            }
        }
        self.write_data(&mut f, table, data, index);
        f.line("  0x00");
        f.line("};");
        f.blank();

        let mut wire: Vec<i32> = index.entries().iter().map(|e| e.to_wire()).collect();
        // C has no zero-length arrays, so an empty index keeps its terminator.
        if self.options.layout == IndexLayout::Terminated || wire.is_empty() {
            wire.push(EMPTY_SENTINEL);
        }
        let _ = writeln!(
            f.buf,
            "static const {} {symbol}_ind[{}] = {{",
            index_c_type(index),
            wire.len()
        );
        write_index_rows(&mut f, &wire, index.len());
        f.line("};");
        f.blank();
        f.blank();
        let _ = writeln!(
            f.buf,
            "/* c < 0x{:06x} */",
            data_bound(table, self.options.layout)
        );
        f.finish()
    }

    fn write_data(&self, f: &mut SourceFile, table: &BlockTable, data: &DedupData, index: &IndexArray) {
        for (block, entry) in table.blocks().iter().zip(index.entries()) {
            let IndexEntry::Mixed(position) = *entry else {
                continue;
            };
            let Some(bits) = data.get(position) else {
                continue;
            };
            let _ = writeln!(
                f.buf,
                "  /* 0x{:06x}-0x{:06x} | number of bits: {} */",
                block.range_start(),
                block.range_end(),
                block.population()
            );
            match self.options.packing {
                Packing::Byte => {
                    let bytes = bits.to_bytes();
                    for (row, chunk) in bytes.chunks(8).enumerate() {
                        let first = block.range_start() + row as u32 * 64;
                        f.buf.push_str(" ");
                        for byte in chunk {
                            let _ = write!(f.buf, " 0x{byte:02x},");
                        }
                        let _ = writeln!(f.buf, " /* 0x{first:06x}-0x{:06x} */", first + 63);
                    }
                }
                Packing::Word => {
                    let words = bits.to_packed_words();
                    for chunk in words.chunks(4) {
                        f.buf.push_str(" ");
                        for word in chunk {
                            let _ = write!(f.buf, " 0x{word:016x}ULL,");
                        }
                        f.buf.push('\n');
                    }
                }
            }
        }
    }
}

/// Index entries in rows of 8, each row followed by the code point range its
/// block entries cover. `blocks` is the number of real (non-terminator) entries.
fn write_index_rows(f: &mut SourceFile, wire: &[i32], blocks: usize) {
    let rows = wire.len().div_ceil(8);
    for (row, chunk) in wire.chunks(8).enumerate() {
        let cells: Vec<String> = chunk.iter().map(|v| format!("{v:>3}")).collect();
        f.buf.push_str("  ");
        f.buf.push_str(&cells.join(", "));
        if row + 1 < rows {
            f.buf.push(',');
        }
        let first_block = row * 8;
        let last_block = (first_block + chunk.len()).min(blocks);
        if last_block > first_block {
            let _ = write!(
                f.buf,
                " /* 0x{:06x}-0x{:06x} */",
                first_block as u32 * BLOCK_SIZE,
                last_block as u32 * BLOCK_SIZE - 1
            );
        }
        f.buf.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockBitmapBuilder;
    use crate::index::encode;
    use unibitmap_test_helpers::ToyOracle;
    use unibitmap_ucd::PropertyOracle;

    fn render(toy: &ToyOracle, end: u32, options: SerializeOptions) -> String {
        let sel = toy.resolve("TOY").unwrap();
        let (table, data) = BlockBitmapBuilder::new()
            .domain_end(end)
            .build(toy, &sel)
            .unwrap();
        let index = encode(&table);
        TableSerializer::new(toy.description(), sel, options).serialize(&table, &data, &index)
    }

    #[test]
    fn byte_packing_toy_scenario() {
        let text = render(
            &ToyOracle::new().set(512..600),
            2048,
            SerializeOptions::default(),
        );
        assert!(text.starts_with(
            "/* This data is generated from a synthetic toy oracle\n \
             * by testing each code point for the TOY property */\n\n"
        ));
        assert!(text.contains("static const unsigned char unicode_toy_data[1*64 + 1] = {\n"));
        assert!(text.contains("  /* 0x000200-0x0003ff | number of bits: 88 */\n"));
        assert!(text.contains(
            "  0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, /* 0x000200-0x00023f */\n"
        ));
        assert!(text.contains(
            "  0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, /* 0x000240-0x00027f */\n"
        ));
        assert!(text.contains(
            "static const signed char unicode_toy_ind[3] = {\n   -1,   0,  -1 /* 0x000000-0x0003ff */\n};\n"
        ));
        assert!(text.ends_with("/* c < 0x000400 */\n"));
    }

    #[test]
    fn unterminated_layout_drops_the_sentinel() {
        let options = SerializeOptions {
            packing: Packing::Byte,
            layout: IndexLayout::Unterminated,
        };
        let text = render(&ToyOracle::new().set(512..600), 2048, options);
        assert!(text.contains("unicode_toy_ind[2] = {\n   -1,   0 /* 0x000000-0x0003ff */\n};"));
        assert!(text.ends_with("/* c < 0x000200 */\n"));
    }

    #[test]
    fn empty_unterminated_index_keeps_one_entry() {
        let options = SerializeOptions {
            packing: Packing::Byte,
            layout: IndexLayout::Unterminated,
        };
        let text = render(&ToyOracle::new(), 2048, options);
        assert!(text.contains("static const signed char unicode_toy_ind[1] = {\n   -1\n};"));
        assert!(!text.contains("_ind[0]"));
        assert!(text.ends_with("/* c < 0x000000 */\n"));
    }

    #[test]
    fn word_packing_is_most_significant_byte_first() {
        let options = SerializeOptions {
            packing: Packing::Word,
            layout: IndexLayout::Terminated,
        };
        let text = render(&ToyOracle::new().set(512..600), 2048, options);
        assert!(text.contains("static const unsigned long long unicode_toy_data[1*8 + 1] = {\n"));
        assert!(text.contains(
            "  0xffffffffffffffffULL, 0xffffff0000000000ULL, 0x0000000000000000ULL, 0x0000000000000000ULL,\n"
        ));
    }

    #[test]
    fn index_rows_wrap_at_eight() {
        let toy = ToyOracle::new().set(0..1).set(9 * 512..9 * 512 + 1);
        let text = render(&toy, 8192, SerializeOptions::default());
        assert!(text.contains(
            "  0,  -1,  -1,  -1,  -1,  -1,  -1,  -1, /* 0x000000-0x000fff */\n   -1,   1,  -1 /* 0x001000-0x0013ff */\n"
        ));
    }

    #[test]
    fn full_blocks_are_sentinels_only() {
        let text = render(&ToyOracle::new().set(0..1024), 2048, SerializeOptions::default());
        assert!(text.contains("unicode_toy_data[0*64 + 1] = {\n  0x00\n};"));
        assert!(text.contains("  -2,  -2,  -1 /* 0x000000-0x0003ff */"));
        assert!(text.ends_with("/* c < 0x000400 */\n"));
    }

    #[test]
    fn index_type_grows_with_positions() {
        assert_eq!(
            index_c_type(&IndexArray::from_entries(vec![IndexEntry::Mixed(127)])),
            "signed char"
        );
        assert_eq!(
            index_c_type(&IndexArray::from_entries(vec![IndexEntry::Mixed(128)])),
            "short"
        );
        assert_eq!(
            index_c_type(&IndexArray::from_entries(vec![IndexEntry::Mixed(40_000)])),
            "int"
        );
    }

    #[test]
    fn packing_and_layout_parse() {
        assert_eq!("word".parse::<Packing>(), Ok(Packing::Word));
        assert!("nibble".parse::<Packing>().is_err());
        assert_eq!(
            "unterminated".parse::<IndexLayout>(),
            Ok(IndexLayout::Unterminated)
        );
    }
}
