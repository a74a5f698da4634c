use crate::{LoadError, PatternLibrary};

/// Trait defining the interface for format-specific pattern parsers.
///
/// Implementors of this trait can parse a pattern library from different file
/// formats (e.g., JSON or RON).
pub trait FormatParser {
    /// Parses content into a validated `PatternLibrary`.
    ///
    /// # Arguments
    ///
    /// * `content` - A string slice containing the pattern configuration
    ///
    /// # Returns
    ///
    /// * `Ok(PatternLibrary)` - Successfully parsed library
    /// * `Err(LoadError)` - Error encountered during parsing or validation
    fn parse(&self, content: &str) -> Result<PatternLibrary, LoadError>;

    /// Returns a descriptive name for this parser format.
    ///
    /// This can be used for debugging, logging, or user-facing error messages.
    fn format_name(&self) -> &'static str;
}
