//! Reads emitted C tables back into lookup structures.
//!
//! Only the shapes the serializer produces are accepted: one `_data` array of
//! hex literals, one `_ind` array of signed decimals and a `/* c < 0x...... */`
//! bound comment, or a single `int east_asian_width[N]` array.

use thiserror::Error;
use unibitmap_codegen::blocks::{BlockBits, BLOCK_BYTES, BLOCK_WORDS};
use unibitmap_codegen::{DedupData, IndexArray, IndexEntry, Packing, TransitionList, WIDTH_SYMBOL};

/// Malformed table text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A required array declaration is absent.
    #[error("no `{0}` array declaration found")]
    MissingArray(&'static str),
    /// The trailing `/* c < ... */` comment is absent or unreadable.
    #[error("missing or malformed bound comment")]
    MissingBound,
    /// A literal could not be read.
    #[error("invalid literal `{literal}`")]
    BadLiteral {
        /// The offending token.
        literal: String,
    },
    /// The data array is not whole blocks plus the padding element.
    #[error("data array holds {found} elements, expected {expected}")]
    DataLength {
        /// Elements present.
        found: usize,
        /// Elements implied by the declaration.
        expected: usize,
    },
    /// The index array length differs from its declaration.
    #[error("index array holds {found} entries, declared {declared}")]
    IndexLength {
        /// Entries present.
        found: usize,
        /// Declared length.
        declared: usize,
    },
    /// An index entry is neither a sentinel nor a position.
    #[error("index entry {0} is not -1, -2 or a position")]
    BadIndexEntry(i64),
}

/// A bitmap table read back from text.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Array name stem, e.g. `unicode_letter`.
    pub symbol: String,
    /// Packing detected from the data element type.
    pub packing: Packing,
    /// Whether the index carried a trailing `-1` terminator.
    pub terminated: bool,
    /// Index entries without the terminator.
    pub index: IndexArray,
    /// Block bits by position.
    pub data: DedupData,
    /// Exclusive bound from the trailing comment.
    pub bound: u32,
}

impl ParsedTable {
    /// Two-level lookup over the parsed arrays.
    #[must_use]
    pub fn lookup(&self, codepoint: u32) -> bool {
        self.index.lookup(&self.data, codepoint)
    }
}

/// Parses a serialized bitmap table. Text after the bound comment is ignored.
///
/// # Errors
///
/// Returns [`ParseError`] if an array or the bound comment is missing or malformed.
pub fn parse_table(text: &str) -> Result<ParsedTable, ParseError> {
    let bound = parse_bound(text)?;
    let code = strip_comments(text);

    let (data_decl, data_body) = find_array(&code, "_data[").ok_or(ParseError::MissingArray("_data"))?;
    let symbol = declared_symbol(data_decl, "_data[");
    let (packing, unit) = if data_decl.contains("unsigned long long") {
        (Packing::Word, BLOCK_WORDS)
    } else {
        (Packing::Byte, BLOCK_BYTES)
    };
    let literals = data_body
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_hex)
        .collect::<Result<Vec<u64>, _>>()?;
    let blocks = declared_blocks(data_decl)?;
    if literals.len() != blocks * unit + 1 {
        return Err(ParseError::DataLength {
            found: literals.len(),
            expected: blocks * unit + 1,
        });
    }
    let data = DedupData::from_entries(
        literals[..blocks * unit]
            .chunks(unit)
            .map(|chunk| block_bits(chunk, packing))
            .collect::<Result<_, _>>()?,
    );

    let (ind_decl, ind_body) = find_array(&code, "_ind[").ok_or(ParseError::MissingArray("_ind"))?;
    let mut wire = ind_body
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| ParseError::BadLiteral {
                literal: s.to_string(),
            })
        })
        .collect::<Result<Vec<i64>, _>>()?;
    let declared = declared_length(ind_decl, "_ind[")?;
    if wire.len() != declared {
        return Err(ParseError::IndexLength {
            found: wire.len(),
            declared,
        });
    }
    let terminated = wire.last() == Some(&-1);
    if terminated {
        wire.pop();
    }
    let entries = wire
        .into_iter()
        .map(|v| IndexEntry::from_wire(v).ok_or(ParseError::BadIndexEntry(v)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedTable {
        symbol,
        packing,
        terminated,
        index: IndexArray::from_entries(entries),
        data,
        bound,
    })
}

/// Parses the `int east_asian_width[N] = {...};` transition array.
///
/// # Errors
///
/// Returns [`ParseError`] if the array is missing, a literal is not hex, or the
/// element count differs from the declaration.
pub fn parse_transitions(text: &str) -> Result<TransitionList, ParseError> {
    let code = strip_comments(text);
    let marker = format!("{WIDTH_SYMBOL}[");
    let (decl, body) = find_array(&code, &marker).ok_or(ParseError::MissingArray(WIDTH_SYMBOL))?;
    let boundaries = body
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            parse_hex(s).and_then(|v| {
                u32::try_from(v).map_err(|_| ParseError::BadLiteral {
                    literal: s.to_string(),
                })
            })
        })
        .collect::<Result<Vec<u32>, _>>()?;
    let declared = declared_length(decl, &marker)?;
    if boundaries.len() != declared {
        return Err(ParseError::IndexLength {
            found: boundaries.len(),
            declared,
        });
    }
    Ok(TransitionList::from_boundaries(boundaries))
}

fn parse_bound(text: &str) -> Result<u32, ParseError> {
    let start = text.find("/* c < 0x").ok_or(ParseError::MissingBound)? + "/* c < 0x".len();
    let rest = &text[start..];
    let end = rest.find(' ').ok_or(ParseError::MissingBound)?;
    u32::from_str_radix(&rest[..end], 16).map_err(|_| ParseError::MissingBound)
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("/*") {
        out.push_str(&rest[..open]);
        match rest[open..].find("*/") {
            Some(close) => rest = &rest[open + close + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Returns the declaration line up to `{` and the text between the braces.
fn find_array<'a>(code: &'a str, marker: &str) -> Option<(&'a str, &'a str)> {
    let at = code.find(marker)?;
    let decl_start = code[..at].rfind('\n').map_or(0, |i| i + 1);
    let open = at + code[at..].find('{')?;
    let close = open + code[open..].find('}')?;
    Some((&code[decl_start..open], &code[open + 1..close]))
}

fn declared_symbol(decl: &str, marker: &str) -> String {
    let head = decl.find(marker).map_or(decl, |at| &decl[..at]);
    head.rsplit(' ').next().unwrap_or_default().to_string()
}

/// Text between `[` and `]` of the declaration.
fn declared_extent<'a>(decl: &'a str, marker: &str) -> Option<&'a str> {
    let start = decl.find(marker)? + marker.len();
    let end = start + decl[start..].find(']')?;
    Some(&decl[start..end])
}

fn declared_length(decl: &str, marker: &str) -> Result<usize, ParseError> {
    let extent = declared_extent(decl, marker).ok_or(ParseError::MissingArray("length"))?;
    extent.trim().parse().map_err(|_| ParseError::BadLiteral {
        literal: extent.to_string(),
    })
}

/// Reads `N` from the `[N*unit + 1]` data declaration.
fn declared_blocks(decl: &str) -> Result<usize, ParseError> {
    let extent = declared_extent(decl, "_data[").ok_or(ParseError::MissingArray("length"))?;
    let count = extent.split('*').next().unwrap_or_default().trim();
    count.parse().map_err(|_| ParseError::BadLiteral {
        literal: extent.to_string(),
    })
}

fn parse_hex(token: &str) -> Result<u64, ParseError> {
    let digits = token
        .strip_suffix("ULL")
        .unwrap_or(token)
        .strip_prefix("0x")
        .ok_or_else(|| ParseError::BadLiteral {
            literal: token.to_string(),
        })?;
    u64::from_str_radix(digits, 16).map_err(|_| ParseError::BadLiteral {
        literal: token.to_string(),
    })
}

fn block_bits(chunk: &[u64], packing: Packing) -> Result<BlockBits, ParseError> {
    match packing {
        Packing::Byte => {
            let mut bytes = [0u8; BLOCK_BYTES];
            for (slot, &value) in bytes.iter_mut().zip(chunk) {
                *slot = u8::try_from(value).map_err(|_| ParseError::BadLiteral {
                    literal: format!("0x{value:x}"),
                })?;
            }
            Ok(BlockBits::from_bytes(&bytes))
        }
        Packing::Word => {
            let mut words = [0u64; BLOCK_WORDS];
            words.copy_from_slice(chunk);
            Ok(BlockBits::from_packed_words(&words))
        }
    }
}
