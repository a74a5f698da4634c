use anyhow::{bail, Context, Result};
use colored::{ColoredString, Colorize};
use mapgen_core::symbols::{self, FixtureKind, EMPTY};
use mapgen_core::{AsciiGrid, GeneratedAscii};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Writes the grid one row per line.
///
/// Refuses grids that still hold unresolved `?` cells.
pub fn write_grid<W: Write>(grid: &AsciiGrid, writer: &mut W) -> Result<()> {
    for (row, line) in grid.rows().iter().enumerate() {
        if line.contains(&symbols::UNKNOWN) {
            bail!("Grid row {} still has unresolved cells, cannot save.", row);
        }
        writer
            .write_all(line)
            .and_then(|()| writer.write_all(b"\n"))
            .with_context(|| format!("Failed to write grid row {}", row))?;
    }
    Ok(())
}

/// Saves the accepted map to a file as plain ASCII.
pub fn save_map_to_file(map: &GeneratedAscii, output_path: &Path) -> Result<()> {
    log::info!("Attempting to save map to {:?}...", output_path);

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {:?}", output_path))?;
    let mut writer = io::BufWriter::new(file);
    write_grid(&map.grid, &mut writer)?;

    writer
        .flush()
        .context("Failed to flush writer for output file")?;
    log::info!("Successfully saved map to {:?}", output_path);

    Ok(())
}

/// Prints the map to stdout without colors.
pub fn print_map(map: &GeneratedAscii) -> Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_grid(&map.grid, &mut lock)?;
    lock.flush().context("Failed to flush stdout")
}

fn paint(ch: u8) -> ColoredString {
    let glyph = char::from(ch).to_string();
    if ch == EMPTY {
        return glyph.dimmed();
    }
    match FixtureKind::from_symbol(ch) {
        Some(FixtureKind::Wall | FixtureKind::AltWall) => glyph.bright_black(),
        Some(FixtureKind::Origin) => glyph.yellow().bold(),
        Some(FixtureKind::CustomerSpawner | FixtureKind::Register | FixtureKind::Customer) => {
            glyph.green().bold()
        }
        Some(FixtureKind::Table) => glyph.cyan(),
        Some(kind) if kind.facing().is_some() => glyph.blue(),
        Some(_) => glyph.magenta(),
        None => glyph.red(),
    }
}

/// Renders the grid with each cell colored by fixture class.
pub fn render_preview(grid: &AsciiGrid) -> String {
    let mut out = String::new();
    for line in grid.rows() {
        for &ch in line {
            out.push_str(&paint(ch).to_string());
        }
        out.push('\n');
    }
    out
}

/// Prints a colored preview with a one-line summary.
pub fn print_preview(map: &GeneratedAscii) {
    let (rows, cols) = map.grid.dims();
    println!(
        "{} {}x{} {} via {} after {} attempt(s)",
        map.seed.bold(),
        rows,
        cols,
        map.archetype,
        map.layout_source,
        map.attempts
    );
    print!("{}", render_preview(&map.grid));
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapgen_core::{generate_ascii, GenerationContext};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_save_map_round_trips_rows() {
        let map = generate_ascii("output-test", &GenerationContext::default(), None).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.txt");
        save_map_to_file(&map, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), map.grid.to_lines());
    }

    #[test]
    fn test_unresolved_cells_are_rejected() {
        let grid = AsciiGrid::parse("###\n#?#\n###");
        let mut sink = Vec::new();
        assert!(write_grid(&grid, &mut sink).is_err());
    }

    #[test]
    fn test_preview_keeps_layout() {
        colored::control::set_override(false);
        let grid = AsciiGrid::parse("####\n#0C#\n####");
        assert_eq!(render_preview(&grid), "####\n#0C#\n####\n");
    }
}
