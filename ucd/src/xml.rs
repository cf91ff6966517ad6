//! Oracle backed by the Unicode Character Database XML distribution.
//!
//! Accepts both the flat (`ucd.all.flat.xml`) and the grouped
//! (`ucd.nounihan.grouped.xml`) layouts. In the grouped layout a `<group>`
//! element carries attributes shared by its children; attributes on a child
//! override the group's.
//!
//! Download the grouped file at:
//!   <https://www.unicode.org/Public/UCD/latest/ucdxml/ucd.nounihan.grouped.zip>

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{binary_property_index, PropertySelector, WidthClass, BINARY_PROPERTIES};
use crate::oracle::{OracleError, PropertyOracle};

const UCD_NS: &str = "http://www.unicode.org/ns/2003/ucd/1.0";

/// Errors raised while loading a UCD XML file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The document is not well-formed XML.
    #[error("malformed UCD XML: {0}")]
    Xml(#[from] roxmltree::Error),
    /// A required element is missing.
    #[error("missing ucd {0}")]
    MissingElement(&'static str),
    /// An attribute holds a value the loader does not understand.
    #[error("unrecognized {attribute} {value:?}")]
    BadAttribute {
        /// Attribute name.
        attribute: &'static str,
        /// Offending value.
        value: String,
    },
}

/// How a nameless entry is labelled in extended names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Plain,
    Control,
    PrivateUse,
    Unassigned,
    Noncharacter,
    Surrogate,
}

#[derive(Debug)]
struct UcdEntry {
    first: u32,
    last: u32,
    /// Bit `i` is set when `BINARY_PROPERTIES[i]` is `Y`.
    binary: u64,
    width: WidthClass,
    block: Option<usize>,
    name: Box<str>,
    label: Label,
}

/// A [`PropertyOracle`] answering from a parsed UCD XML file.
#[derive(Debug)]
pub struct UcdXmlOracle {
    description: String,
    entries: Vec<UcdEntry>,
    blocks: Vec<String>,
}

/// Attribute lookup on an entry element with fallback to its enclosing group.
#[derive(Clone, Copy)]
struct Scope<'a, 'input> {
    node: roxmltree::Node<'a, 'input>,
    group: Option<roxmltree::Node<'a, 'input>>,
}

impl<'a, 'input> Scope<'a, 'input> {
    fn get(&self, name: &str) -> Option<&'a str> {
        self.node
            .attribute(name)
            .or_else(|| self.group.and_then(|g| g.attribute(name)))
    }
}

impl UcdXmlOracle {
    /// Loads and parses the UCD XML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a UCD XML document.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let input = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml_str(&input)
    }

    /// Parses a UCD XML document held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or carries unknown
    /// attribute values.
    pub fn from_xml_str(input: &str) -> Result<Self, LoadError> {
        let doc = roxmltree::Document::parse(input)?;
        let root = doc.root_element();
        let description = root
            .children()
            .find(|n| n.has_tag_name((UCD_NS, "description")))
            .and_then(|n| n.text())
            .unwrap_or_default()
            .trim()
            .to_string();
        let repertoire = root
            .children()
            .find(|n| n.has_tag_name((UCD_NS, "repertoire")))
            .ok_or(LoadError::MissingElement("repertoire"))?;

        let mut oracle = UcdXmlOracle {
            description,
            entries: Vec::new(),
            blocks: Vec::new(),
        };
        let mut block_ids: HashMap<String, usize> = HashMap::new();

        for node in repertoire.children().filter(|n| n.is_element()) {
            if node.tag_name().name() == "group" {
                for child in node.children().filter(|n| n.is_element()) {
                    let scope = Scope {
                        node: child,
                        group: Some(node),
                    };
                    oracle.push_entry(scope, &mut block_ids)?;
                }
            } else {
                let scope = Scope { node, group: None };
                oracle.push_entry(scope, &mut block_ids)?;
            }
        }

        oracle.entries.sort_by_key(|e| e.first);
        log::info!(
            "Loaded {} UCD entries in {} blocks ({})",
            oracle.entries.len(),
            oracle.blocks.len(),
            oracle.description
        );
        Ok(oracle)
    }

    fn push_entry(
        &mut self,
        scope: Scope<'_, '_>,
        block_ids: &mut HashMap<String, usize>,
    ) -> Result<(), LoadError> {
        let (first, last) = extract_range(&scope)?;

        let mut binary = 0u64;
        for (bit, (_, alias)) in BINARY_PROPERTIES.iter().enumerate() {
            if scope.get(alias) == Some("Y") {
                binary |= 1 << bit;
            }
        }

        let width = match scope.get("ea") {
            None => WidthClass::Neutral,
            Some(ea) => WidthClass::from_ucd(ea).ok_or_else(|| LoadError::BadAttribute {
                attribute: "ea",
                value: ea.to_string(),
            })?,
        };

        let block = scope.get("blk").map(|blk| {
            let next = self.blocks.len();
            *block_ids.entry(blk.to_string()).or_insert_with(|| {
                self.blocks.push(blk.replace('_', " "));
                next
            })
        });

        let label = match (scope.node.tag_name().name(), scope.get("gc")) {
            ("reserved", _) | (_, Some("Cn")) => Label::Unassigned,
            ("noncharacter", _) => Label::Noncharacter,
            ("surrogate", _) | (_, Some("Cs")) => Label::Surrogate,
            (_, Some("Cc")) => Label::Control,
            (_, Some("Co")) => Label::PrivateUse,
            _ => Label::Plain,
        };

        self.entries.push(UcdEntry {
            first,
            last,
            binary,
            width,
            block,
            name: scope.get("na").unwrap_or_default().into(),
            label,
        });
        Ok(())
    }

    fn entry(&self, codepoint: u32) -> Option<&UcdEntry> {
        let idx = self.entries.partition_point(|e| e.first <= codepoint);
        let entry = self.entries.get(idx.checked_sub(1)?)?;
        (codepoint <= entry.last).then_some(entry)
    }
}

fn extract_range(scope: &Scope<'_, '_>) -> Result<(u32, u32), LoadError> {
    let parse = |attribute: &'static str, value: &str| {
        u32::from_str_radix(value, 16).map_err(|_| LoadError::BadAttribute {
            attribute,
            value: value.to_string(),
        })
    };
    if let Some(cp) = scope.node.attribute("cp") {
        let cp = parse("cp", cp)?;
        return Ok((cp, cp));
    }
    let first = parse("first-cp", scope.node.attribute("first-cp").unwrap_or("0"))?;
    let last = parse("last-cp", scope.node.attribute("last-cp").unwrap_or("0"))?;
    Ok((first, last))
}

impl PropertyOracle for UcdXmlOracle {
    fn description(&self) -> &str {
        &self.description
    }

    fn resolve(&self, name: &str) -> Result<PropertySelector, OracleError> {
        binary_property_index(name)
            .map(|idx| PropertySelector::new(BINARY_PROPERTIES[idx].0, idx as u32))
            .ok_or_else(|| OracleError::UnknownProperty {
                name: name.to_string(),
            })
    }

    fn test_binary(&self, codepoint: u32, selector: &PropertySelector) -> Result<bool, OracleError> {
        let code = selector.code() as usize;
        if code >= BINARY_PROPERTIES.len() {
            return Err(OracleError::QueryFailure {
                codepoint,
                reason: format!("{selector} is not a UCD binary property"),
            });
        }
        Ok(self
            .entry(codepoint)
            .is_some_and(|e| e.binary & (1 << code) != 0))
    }

    fn width_class(&self, codepoint: u32) -> Result<WidthClass, OracleError> {
        Ok(self
            .entry(codepoint)
            .map_or(WidthClass::Neutral, |e| e.width))
    }

    fn block_name(&self, codepoint: u32) -> Option<&str> {
        let block = self.entry(codepoint)?.block?;
        self.blocks.get(block).map(String::as_str)
    }

    fn extended_name(&self, codepoint: u32) -> Option<String> {
        let entry = self.entry(codepoint)?;
        if !entry.name.is_empty() {
            return Some(entry.name.replace('#', &format!("{codepoint:04X}")));
        }
        let prefix = match entry.label {
            Label::Plain => return None,
            Label::Control => "control",
            Label::PrivateUse => "private-use",
            Label::Unassigned => "unassigned",
            Label::Noncharacter => "noncharacter",
            Label::Surrogate => "surrogate",
        };
        Some(format!("<{prefix}-{codepoint:04X}>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUPED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ucd xmlns="http://www.unicode.org/ns/2003/ucd/1.0">
  <description>Unicode 15.1.0</description>
  <repertoire>
    <group gc="Cc" blk="ASCII" ea="N" WSpace="N" Alpha="N">
      <char cp="0009" na="" WSpace="Y"/>
    </group>
    <group gc="Lu" blk="ASCII" ea="Na" Alpha="Y" Upper="Y">
      <char first-cp="0041" last-cp="005A" na=""/>
    </group>
    <group gc="Lo" blk="CJK_Compat_Ideographs" ea="W" Alpha="Y" Ideo="Y">
      <char cp="F900" na="CJK COMPATIBILITY IDEOGRAPH-#"/>
    </group>
    <reserved first-cp="F901" last-cp="F90F" gc="Cn" blk="CJK_Compat_Ideographs" ea="W"/>
    <char cp="00A1" na="INVERTED EXCLAMATION MARK" gc="Po" blk="Latin_1_Sup" ea="A"/>
  </repertoire>
</ucd>
"#;

    fn oracle() -> UcdXmlOracle {
        match UcdXmlOracle::from_xml_str(GROUPED) {
            Ok(o) => o,
            Err(e) => unreachable!("fixture must parse: {e}"),
        }
    }

    #[test]
    fn description_is_read() {
        assert_eq!(oracle().description(), "Unicode 15.1.0");
    }

    #[test]
    fn resolve_accepts_long_names_and_aliases() {
        let ucd = oracle();
        let by_name = ucd.resolve("alphabetic").unwrap();
        let by_alias = ucd.resolve("Alpha").unwrap();
        assert_eq!(by_name, by_alias);
        assert_eq!(by_name.name(), "ALPHABETIC");
        assert!(matches!(
            ucd.resolve("NO_SUCH_PROPERTY"),
            Err(OracleError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn resolve_accepts_icu_spellings() {
        let ucd = oracle();
        for (name, long) in [
            ("S_TERM", "S_TERM"),
            ("SENTENCE_TERMINAL", "S_TERM"),
            ("CHANGES_WHEN_LOWERCASED", "CHANGES_WHEN_LOWERCASED"),
            ("CWL", "CHANGES_WHEN_LOWERCASED"),
            ("HYPHEN", "HYPHEN"),
            ("GRAPHEME_LINK", "GRAPHEME_LINK"),
            ("EMOJI_MODIFIER", "EMOJI_MODIFIER"),
            ("REGIONAL_INDICATOR", "REGIONAL_INDICATOR"),
            ("PREPENDED_CONCATENATION_MARK", "PREPENDED_CONCATENATION_MARK"),
        ] {
            assert_eq!(ucd.resolve(name).unwrap().name(), long, "{name}");
        }
    }

    #[test]
    fn later_properties_read_their_own_attribute() {
        let xml = GROUPED.replace(
            r#"<char cp="00A1" na="INVERTED EXCLAMATION MARK""#,
            r#"<char cp="00A1" STerm="Y" CWL="Y" na="INVERTED EXCLAMATION MARK""#,
        );
        let ucd = UcdXmlOracle::from_xml_str(&xml).unwrap();
        let sterm = ucd.resolve("S_TERM").unwrap();
        let cwl = ucd.resolve("CWL").unwrap();
        let xidc = ucd.resolve("XID_CONTINUE").unwrap();
        assert!(ucd.test_binary(0xA1, &sterm).unwrap());
        assert!(ucd.test_binary(0xA1, &cwl).unwrap());
        assert!(!ucd.test_binary(0xA1, &xidc).unwrap());
        assert!(!ucd.test_binary(0x41, &sterm).unwrap());
    }

    #[test]
    fn group_attributes_are_inherited_and_overridden() {
        let ucd = oracle();
        let alpha = ucd.resolve("ALPHABETIC").unwrap();
        let space = ucd.resolve("WHITE_SPACE").unwrap();
        assert!(ucd.test_binary(0x41, &alpha).unwrap());
        assert!(ucd.test_binary(0x5A, &alpha).unwrap());
        assert!(!ucd.test_binary(0x5B, &alpha).unwrap());
        assert!(ucd.test_binary(0x09, &space).unwrap());
        assert!(!ucd.test_binary(0x09, &alpha).unwrap());
    }

    #[test]
    fn widths_default_to_neutral() {
        let ucd = oracle();
        assert_eq!(ucd.width_class(0x41).unwrap(), WidthClass::Narrow);
        assert_eq!(ucd.width_class(0xF905).unwrap(), WidthClass::Wide);
        assert_eq!(ucd.width_class(0xA1).unwrap(), WidthClass::Ambiguous);
        assert_eq!(ucd.width_class(0x10_FFFF).unwrap(), WidthClass::Neutral);
    }

    #[test]
    fn extended_names() {
        let ucd = oracle();
        assert_eq!(
            ucd.extended_name(0xF900).as_deref(),
            Some("CJK COMPATIBILITY IDEOGRAPH-F900")
        );
        assert_eq!(ucd.extended_name(0x09).as_deref(), Some("<control-0009>"));
        assert_eq!(ucd.extended_name(0xF903).as_deref(), Some("<unassigned-F903>"));
        assert_eq!(ucd.extended_name(0x41), None);
        assert_eq!(ucd.extended_name(0x1F_0000), None);
    }

    #[test]
    fn block_names_are_spelled_out() {
        let ucd = oracle();
        assert_eq!(ucd.block_name(0x41), Some("ASCII"));
        assert_eq!(ucd.block_name(0xA1), Some("Latin 1 Sup"));
        assert_eq!(ucd.block_name(0x3000), None);
    }

    #[test]
    fn foreign_selector_is_a_query_failure() {
        let ucd = oracle();
        let foreign = PropertySelector::new("TOY", 1000);
        assert!(matches!(
            ucd.test_binary(0x41, &foreign),
            Err(OracleError::QueryFailure { codepoint: 0x41, .. })
        ));
    }

    #[test]
    fn unknown_width_is_rejected() {
        let bad = GROUPED.replace(r#"ea="Na""#, r#"ea="Q""#);
        assert!(matches!(
            UcdXmlOracle::from_xml_str(&bad),
            Err(LoadError::BadAttribute { attribute: "ea", .. })
        ));
    }
}
