//! Unicode property lookup and the named shorthand classes.
//!
//! The core never embeds Unicode tables. Property escapes (`\p{Nd}`,
//! `\pL`, ...) resolve through the [`PropertyProvider`] trait, so tests
//! can inject tiny synthetic tables and the data source stays swappable.
//! The default provider, [`UnicodeTables`], leans on `regex-syntax`: it
//! parses a one-class pattern and reads the code point ranges off the
//! compiled HIR.

use regex_syntax::hir::{self, HirKind};
use regex_syntax::ParserBuilder;

use crate::codeset::CodePointSet;
use crate::error::{Result, ScanError};

/// Source of Unicode property data, injected into the regex parser.
pub trait PropertyProvider {
    /// Code points carrying the property, or `None` for an unknown name.
    fn property(&self, name: &str) -> Option<CodePointSet>;
}

/// Default provider backed by the `regex-syntax` Unicode tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeTables;

impl PropertyProvider for UnicodeTables {
    fn property(&self, name: &str) -> Option<CodePointSet> {
        // POSIX-style alias for the cased letters.
        if name == "L&" {
            let lu = self.property("Lu")?;
            let ll = self.property("Ll")?;
            let lt = self.property("Lt")?;
            return Some(lu.union(&ll).union(&lt));
        }

        let pattern = format!("\\p{{{}}}", name);
        let hir = ParserBuilder::new().build().parse(&pattern).ok()?;
        match hir.kind() {
            HirKind::Class(hir::Class::Unicode(class)) => Some(CodePointSet::from_ranges(
                class
                    .iter()
                    .map(|r| (r.start() as u32, r.end() as u32 + 1)),
            )),
            _ => None,
        }
    }
}

fn lookup(props: &dyn PropertyProvider, name: &str) -> Result<CodePointSet> {
    props
        .property(name)
        .ok_or_else(|| ScanError::UnknownProperty(name.to_string()))
}

/// Horizontal white space: tab plus the Unicode space separators.
pub fn horizontal_space() -> CodePointSet {
    CodePointSet::from_ranges([
        (0x09, 0x0a),
        (0x20, 0x21),
        (0xa0, 0xa1),
        (0x1680, 0x1681),
        (0x180e, 0x180f),
        (0x2000, 0x200b),
        (0x202f, 0x2030),
        (0x205f, 0x2060),
        (0x3000, 0x3001),
    ])
}

/// Vertical white space: the line-break code points.
pub fn vertical_space() -> CodePointSet {
    CodePointSet::from_ranges([(0x0a, 0x0e), (0x85, 0x86), (0x2028, 0x202a)])
}

/// `\d`: decimal digits (general category Nd).
pub fn digit(props: &dyn PropertyProvider) -> Result<CodePointSet> {
    lookup(props, "Nd")
}

/// `\s`: separators plus horizontal and vertical space.
pub fn space(props: &dyn PropertyProvider) -> Result<CodePointSet> {
    Ok(lookup(props, "Z")?
        .union(&horizontal_space())
        .union(&vertical_space()))
}

/// `\w`: letters, numbers and the low line.
pub fn word(props: &dyn PropertyProvider) -> Result<CodePointSet> {
    let low_line = CodePointSet::from_ranges([(0x5f, 0x60)]);
    Ok(lookup(props, "L")?
        .union(&lookup(props, "N")?)
        .union(&low_line))
}
