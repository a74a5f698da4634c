use crate::config::{AppConfig, Settings, VisualizationMode};
use crate::error::AppError;
use crate::{logging, output, survey};
use clap::Parser;
use mapgen_core::pipeline::split_seed_prefix;
use mapgen_core::{generate_ascii, LayoutSource};
use mapgen_rules::formats::json_format::JsonFormatParser;
use mapgen_rules::formats::FormatParser;
use mapgen_rules::loader::load_from_file;
use mapgen_rules::PatternLibrary;

/// Pattern library shipped with the binary.
const DEFAULT_LIBRARY: &str = include_str!("../resources/map_generator_input.json");

/// Entry point for the `bar-forge` binary.
pub fn main() -> Result<(), AppError> {
    let config = AppConfig::parse();
    logging::init_logger(&config);
    log::info!("Bar Forge starting...");

    let settings = config.resolve()?;
    run(&config, &settings)
}

/// Generates one map, or surveys derived seeds, from resolved settings.
pub fn run(config: &AppConfig, settings: &Settings) -> Result<(), AppError> {
    let library = load_library(settings)?;
    let ctx = settings.generation_context();

    if let Some(count) = config.survey {
        let seeds = survey::survey_seeds(&settings.seed, count);
        log::info!("Surveying {} seeds derived from '{}'", seeds.len(), settings.seed);
        let results = survey::run_survey(&seeds, &ctx, library.as_ref());
        survey::log_summary(&results);
        if let Some(path) = &config.survey_csv {
            survey::write_survey_to_csv(&results, path)?;
        }
        return Ok(());
    }
    if config.survey_csv.is_some() {
        log::warn!("--survey-csv is ignored without --survey");
    }

    let map = generate_ascii(&settings.seed, &ctx, library.as_ref())?;

    if let Some(path) = &settings.output_path {
        output::save_map_to_file(&map, path)?;
    }
    match config.visualization_mode {
        VisualizationMode::Terminal => output::print_preview(&map),
        VisualizationMode::None if settings.output_path.is_none() => output::print_map(&map)?,
        VisualizationMode::None => {}
    }
    Ok(())
}

/// Loads the configured pattern library, or the bundled one when the
/// constraint-propagation layout may run.
fn load_library(settings: &Settings) -> Result<Option<PatternLibrary>, AppError> {
    if let Some(path) = &settings.pattern_file {
        return Ok(Some(load_from_file(path)?));
    }

    let (forced, _) = split_seed_prefix(&settings.seed);
    if forced.unwrap_or(settings.layout) != LayoutSource::Wfc {
        return Ok(None);
    }
    log::debug!("Using the bundled pattern library");
    Ok(Some(JsonFormatParser::new().parse(DEFAULT_LIBRARY)?))
}
