//! Value types exchanged between an oracle and the table compiler.

use std::fmt;

/// Exclusive end of the code point domain scanned by the compiler: `2^21 - 1`.
pub const CODEPOINT_END: u32 = (1 << 21) - 1;

/// Binary properties known by name, as `(long name, UCD short alias)`.
///
/// The position of an entry is the selector code used by [`crate::UcdXmlOracle`],
/// which stores one bit per entry in a `u64`. Long names are ICU's `UProperty`
/// constants without the `UCHAR_` prefix.
pub const BINARY_PROPERTIES: &[(&str, &str)] = &[
    ("ALPHABETIC", "Alpha"),
    ("ASCII_HEX_DIGIT", "AHex"),
    ("BIDI_CONTROL", "Bidi_C"),
    ("BIDI_MIRRORED", "Bidi_M"),
    ("CASED", "Cased"),
    ("CASE_IGNORABLE", "CI"),
    ("CHANGES_WHEN_CASEFOLDED", "CWCF"),
    ("CHANGES_WHEN_CASEMAPPED", "CWCM"),
    ("CHANGES_WHEN_LOWERCASED", "CWL"),
    ("CHANGES_WHEN_NFKC_CASEFOLDED", "CWKCF"),
    ("CHANGES_WHEN_TITLECASED", "CWT"),
    ("CHANGES_WHEN_UPPERCASED", "CWU"),
    ("DASH", "Dash"),
    ("DEFAULT_IGNORABLE_CODE_POINT", "DI"),
    ("DEPRECATED", "Dep"),
    ("DIACRITIC", "Dia"),
    ("EMOJI", "Emoji"),
    ("EMOJI_COMPONENT", "EComp"),
    ("EMOJI_MODIFIER", "EMod"),
    ("EMOJI_MODIFIER_BASE", "EBase"),
    ("EMOJI_PRESENTATION", "EPres"),
    ("EXTENDED_PICTOGRAPHIC", "ExtPict"),
    ("EXTENDER", "Ext"),
    ("FULL_COMPOSITION_EXCLUSION", "Comp_Ex"),
    ("GRAPHEME_BASE", "Gr_Base"),
    ("GRAPHEME_EXTEND", "Gr_Ext"),
    ("GRAPHEME_LINK", "Gr_Link"),
    ("HEX_DIGIT", "Hex"),
    ("HYPHEN", "Hyphen"),
    ("ID_COMPAT_MATH_CONTINUE", "ID_Compat_Math_Continue"),
    ("ID_COMPAT_MATH_START", "ID_Compat_Math_Start"),
    ("ID_CONTINUE", "IDC"),
    ("ID_START", "IDS"),
    ("IDEOGRAPHIC", "Ideo"),
    ("IDS_BINARY_OPERATOR", "IDSB"),
    ("IDS_TRINARY_OPERATOR", "IDST"),
    ("IDS_UNARY_OPERATOR", "IDSU"),
    ("JOIN_CONTROL", "Join_C"),
    ("LOGICAL_ORDER_EXCEPTION", "LOE"),
    ("LOWERCASE", "Lower"),
    ("MATH", "Math"),
    ("MODIFIER_COMBINING_MARK", "MCM"),
    ("NONCHARACTER_CODE_POINT", "NChar"),
    ("PATTERN_SYNTAX", "Pat_Syn"),
    ("PATTERN_WHITE_SPACE", "Pat_WS"),
    ("PREPENDED_CONCATENATION_MARK", "PCM"),
    ("QUOTATION_MARK", "QMark"),
    ("RADICAL", "Radical"),
    ("REGIONAL_INDICATOR", "RI"),
    ("S_TERM", "STerm"),
    ("SOFT_DOTTED", "SD"),
    ("TERMINAL_PUNCTUATION", "Term"),
    ("UNIFIED_IDEOGRAPH", "UIdeo"),
    ("UPPERCASE", "Upper"),
    ("VARIATION_SELECTOR", "VS"),
    ("WHITE_SPACE", "WSpace"),
    ("XID_CONTINUE", "XIDC"),
    ("XID_START", "XIDS"),
];

/// UCD long names that differ from the ICU constant, as `(UCD name, long name)`.
const EXTRA_SPELLINGS: &[(&str, &str)] = &[("SENTENCE_TERMINAL", "S_TERM")];

/// Position in [`BINARY_PROPERTIES`] of the property spelled `name`.
///
/// Matches the long name, the UCD alias or an extra spelling, ignoring ASCII
/// case.
#[must_use]
pub fn binary_property_index(name: &str) -> Option<usize> {
    let long = EXTRA_SPELLINGS
        .iter()
        .find(|(spelling, _)| spelling.eq_ignore_ascii_case(name))
        .map_or(name, |&(_, long)| long);
    BINARY_PROPERTIES
        .iter()
        .position(|(l, alias)| l.eq_ignore_ascii_case(long) || alias.eq_ignore_ascii_case(long))
}

/// East Asian Width class of a code point (UAX #11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidthClass {
    /// `N`: not East Asian.
    Neutral,
    /// `A`: wide or narrow depending on context.
    Ambiguous,
    /// `H`: halfwidth compatibility form.
    Halfwidth,
    /// `F`: fullwidth compatibility form.
    Fullwidth,
    /// `Na`: narrow.
    Narrow,
    /// `W`: wide.
    Wide,
}

impl WidthClass {
    /// Parses a UCD `ea` attribute value.
    #[must_use]
    pub fn from_ucd(value: &str) -> Option<Self> {
        match value {
            "N" => Some(WidthClass::Neutral),
            "A" => Some(WidthClass::Ambiguous),
            "H" => Some(WidthClass::Halfwidth),
            "F" => Some(WidthClass::Fullwidth),
            "Na" => Some(WidthClass::Narrow),
            "W" => Some(WidthClass::Wide),
            _ => None,
        }
    }

    /// Returns the upper case name used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WidthClass::Neutral => "NEUTRAL",
            WidthClass::Ambiguous => "AMBIGUOUS",
            WidthClass::Halfwidth => "HALFWIDTH",
            WidthClass::Fullwidth => "FULLWIDTH",
            WidthClass::Narrow => "NARROW",
            WidthClass::Wide => "WIDE",
        }
    }

    /// Whether the class occupies two columns.
    #[must_use]
    pub fn is_wide(self) -> bool {
        matches!(self, WidthClass::Wide | WidthClass::Fullwidth)
    }

    /// Folds `Ambiguous` onto the default `Neutral` class.
    #[must_use]
    pub fn reduced(self) -> Self {
        match self {
            WidthClass::Ambiguous => WidthClass::Neutral,
            other => other,
        }
    }
}

impl fmt::Display for WidthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An oracle-resolved reference to one binary property.
///
/// `code` is opaque to the compiler: each oracle assigns its own codes in
/// [`PropertyOracle::resolve`](crate::PropertyOracle::resolve).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertySelector {
    name: String,
    code: u32,
}

impl PropertySelector {
    /// Creates a selector with the canonical `name` and oracle-specific `code`.
    pub fn new(name: impl Into<String>, code: u32) -> Self {
        Self {
            name: name.into(),
            code,
        }
    }

    /// Canonical property name, e.g. `ALPHABETIC`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Oracle-specific property code.
    #[must_use]
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Name used in generated identifiers and test procedures.
    ///
    /// `ALPHABETIC` is spelled `Letter`; any other name is lower-cased with its
    /// first character capitalized (`WHITE_SPACE` becomes `White_space`).
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.name.eq_ignore_ascii_case("ALPHABETIC") {
            return "Letter".to_string();
        }
        let lower = self.name.to_ascii_lowercase();
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for PropertySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codepoint_end_is_two_to_the_21_minus_one() {
        assert_eq!(CODEPOINT_END, 0x1F_FFFF);
    }

    #[test]
    fn binary_property_names_unique() {
        let mut names = std::collections::HashSet::new();
        for (long, short) in BINARY_PROPERTIES {
            assert!(names.insert(long.to_ascii_lowercase()), "Duplicate name: {long}");
            if !short.eq_ignore_ascii_case(long) {
                assert!(names.insert(short.to_ascii_lowercase()), "Duplicate alias: {short}");
            }
        }
    }

    #[test]
    fn binary_properties_fit_the_oracle_mask() {
        assert!(BINARY_PROPERTIES.len() <= 64);
    }

    #[test]
    fn icu_and_ucd_spellings_resolve() {
        let long = |name: &str| binary_property_index(name).map(|i| BINARY_PROPERTIES[i].0);
        assert_eq!(long("S_TERM"), Some("S_TERM"));
        assert_eq!(long("STerm"), Some("S_TERM"));
        assert_eq!(long("Sentence_Terminal"), Some("S_TERM"));
        assert_eq!(long("CHANGES_WHEN_LOWERCASED"), Some("CHANGES_WHEN_LOWERCASED"));
        assert_eq!(long("CWL"), Some("CHANGES_WHEN_LOWERCASED"));
        assert_eq!(long("cwkcf"), Some("CHANGES_WHEN_NFKC_CASEFOLDED"));
        assert_eq!(long("HYPHEN"), Some("HYPHEN"));
        assert_eq!(long("GRAPHEME_LINK"), Some("GRAPHEME_LINK"));
        assert_eq!(long("Gr_Link"), Some("GRAPHEME_LINK"));
        assert_eq!(long("EMOJI_MODIFIER_BASE"), Some("EMOJI_MODIFIER_BASE"));
        assert_eq!(long("EComp"), Some("EMOJI_COMPONENT"));
        assert_eq!(long("RI"), Some("REGIONAL_INDICATOR"));
        assert_eq!(long("PCM"), Some("PREPENDED_CONCATENATION_MARK"));
        assert_eq!(long("NO_SUCH_PROPERTY"), None);
    }

    #[test]
    fn width_reduction_only_folds_ambiguous() {
        assert_eq!(WidthClass::Ambiguous.reduced(), WidthClass::Neutral);
        assert_eq!(WidthClass::Wide.reduced(), WidthClass::Wide);
        assert!(!WidthClass::Ambiguous.is_wide());
        assert!(WidthClass::Fullwidth.is_wide());
        assert!(!WidthClass::Halfwidth.is_wide());
    }

    #[test]
    fn ucd_width_values() {
        assert_eq!(WidthClass::from_ucd("Na"), Some(WidthClass::Narrow));
        assert_eq!(WidthClass::from_ucd("W"), Some(WidthClass::Wide));
        assert_eq!(WidthClass::from_ucd("X"), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(PropertySelector::new("ALPHABETIC", 0).display_name(), "Letter");
        assert_eq!(
            PropertySelector::new("WHITE_SPACE", 38).display_name(),
            "White_space"
        );
        assert_eq!(PropertySelector::new("Math", 26).display_name(), "Math");
    }
}
