use crate::formats::FormatParser;
#[cfg(feature = "serde")]
use crate::formats::raw::RawLibrary;
use crate::{LoadError, PatternLibrary};

/// A parser implementation for RON (Rusty Object Notation) pattern files.
///
/// ```ron
/// (
///     rows: 3,
///     cols: 3,
///     patterns: [
///         (pat: ["...", "...", "..."], connections: ["N", "E", "S", "W"]),
///     ],
/// )
/// ```
pub struct RonFormatParser;

impl Default for RonFormatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RonFormatParser {
    /// Creates a new RON format parser
    pub const fn new() -> Self {
        Self
    }
}

impl FormatParser for RonFormatParser {
    fn format_name(&self) -> &'static str {
        "Rusty Object Notation (RON)"
    }

    #[cfg(feature = "serde")]
    fn parse(&self, ron_content: &str) -> Result<PatternLibrary, LoadError> {
        let raw: RawLibrary = ron::from_str(ron_content)
            .map_err(|e| LoadError::ParseError(format!("RON deserialization failed: {e}")))?;
        raw.into_library()
    }

    /// Stub implementation when the `serde` feature is not enabled.
    #[cfg(not(feature = "serde"))]
    fn parse(&self, _ron_content: &str) -> Result<PatternLibrary, LoadError> {
        Err(LoadError::FeatureNotEnabled(
            "serde (required for RON parsing)".to_string(),
        ))
    }
}
