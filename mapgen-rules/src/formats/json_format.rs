use crate::formats::FormatParser;
#[cfg(feature = "serde")]
use crate::formats::raw::RawLibrary;
use crate::{LoadError, PatternLibrary};

/// A parser implementation for JSON pattern files.
///
/// Accepts `max_rows`/`max_cols` as aliases for `rows`/`cols`.
pub struct JsonFormatParser;

impl Default for JsonFormatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormatParser {
    /// Creates a new JSON format parser
    pub const fn new() -> Self {
        Self
    }
}

impl FormatParser for JsonFormatParser {
    fn format_name(&self) -> &'static str {
        "JSON"
    }

    #[cfg(feature = "serde")]
    fn parse(&self, json_content: &str) -> Result<PatternLibrary, LoadError> {
        let raw: RawLibrary = serde_json::from_str(json_content)
            .map_err(|e| LoadError::ParseError(format!("JSON deserialization failed: {e}")))?;
        raw.into_library()
    }

    /// Stub implementation when the `serde` feature is not enabled.
    #[cfg(not(feature = "serde"))]
    fn parse(&self, _json_content: &str) -> Result<PatternLibrary, LoadError> {
        Err(LoadError::FeatureNotEnabled(
            "serde (required for JSON parsing)".to_string(),
        ))
    }
}
