use crate::formats::{json_format::JsonFormatParser, ron_format::RonFormatParser, FormatParser};
use crate::{LoadError, PatternLibrary};
use std::path::Path;

/// Picks the parser matching a file's extension.
///
/// `.json` selects JSON and `.ron` selects RON, case-insensitively.
pub fn parser_for_path(path: &Path) -> Result<Box<dyn FormatParser>, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => Ok(Box::new(JsonFormatParser::new())),
        Some("ron") => Ok(Box::new(RonFormatParser::new())),
        Some(other) => Err(LoadError::UnsupportedFormat(format!(".{other}"))),
        None => Err(LoadError::UnsupportedFormat(format!(
            "{} has no extension",
            path.display()
        ))),
    }
}

/// Loads a pattern library from a specified file.
///
/// # Arguments
///
/// * `path` - The path to the pattern definition file (a `.json` or `.ron` file).
///
/// # Returns
///
/// A `Result` containing the validated `PatternLibrary` on success,
/// or a `LoadError` on failure.
pub fn load_from_file(path: &Path) -> Result<PatternLibrary, LoadError> {
    let parser = parser_for_path(path)?;
    let content = std::fs::read_to_string(path)?;
    log::debug!(
        "Parsing pattern library {} as {}",
        path.display(),
        parser.format_name()
    );
    let library = parser.parse(&content)?;
    log::info!(
        "Loaded {} patterns ({}x{} blocks) from {}",
        library.len(),
        library.block_size(),
        library.block_size(),
        path.display()
    );
    Ok(library)
}
