//! Error types for the scanner-generator pipeline.

use std::fmt;
use std::io;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Everything that can go wrong between reading a token spec and
/// running the generated automaton.
#[derive(Debug)]
pub enum ScanError {
    /// Malformed code-point interval (empty, reversed, or out of range).
    InvalidRange { lo: u32, hi: u32 },
    /// Regular-expression syntax error, with a byte offset into the pattern.
    Syntax { message: String, position: usize },
    /// Unicode property lookup failed.
    UnknownProperty(String),
    /// Interpolation cycle among fragments/tokens.
    CyclicFragment(String),
    /// Interpolation of a name that was never declared.
    UndefinedReference(String),
    /// The scanner found input no token matches.
    UnmatchedInput { position: usize, codepoint: char },
    /// The expression interner ran out of identities.
    Overflow,
    /// Malformed spec or automaton file (outside the regex syntax).
    Config(String),
    Io(io::Error),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::InvalidRange { lo, hi } => {
                write!(f, "invalid code point range {:#x}..{:#x}", lo, hi)
            }
            ScanError::Syntax { message, position } => {
                write!(f, "syntax error at {}: {}", position, message)
            }
            ScanError::UnknownProperty(name) => {
                write!(f, "unknown unicode property '{}'", name)
            }
            ScanError::CyclicFragment(name) => {
                write!(f, "interpolation cycle through '{}'", name)
            }
            ScanError::UndefinedReference(name) => {
                write!(f, "reference to undefined name '{}'", name)
            }
            ScanError::UnmatchedInput { position, codepoint } => {
                write!(f, "no token matches {:?} at offset {}", codepoint, position)
            }
            ScanError::Overflow => write!(f, "expression interner exhausted"),
            ScanError::Config(msg) => write!(f, "bad spec file: {}", msg),
            ScanError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ScanError {
    fn from(e: io::Error) -> Self {
        ScanError::Io(e)
    }
}
