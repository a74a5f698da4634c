//! Seed survey: generate many derived seeds in parallel and tally the results.

use anyhow::{Context, Error};
use mapgen_core::{generate_ascii, GenerationContext};
use mapgen_rules::PatternLibrary;
use rayon::prelude::*;
use std::fs::File;
use std::path::Path;

/// Outcome of one surveyed seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyResult {
    pub seed: String,
    /// Archetype and layout, present when a map was accepted.
    pub archetype: Option<String>,
    pub layout: Option<String>,
    pub attempts: Option<usize>,
    /// Error message for rejected seeds.
    pub error: Option<String>,
}

impl SurveyResult {
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Seeds surveyed for a base seed: `"{base}-0"`, `"{base}-1"`, ...
pub fn survey_seeds(base: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{base}-{i}")).collect()
}

/// Runs the pipeline for every seed on the rayon pool.
///
/// Results come back in seed order and match a sequential run.
pub fn run_survey(
    seeds: &[String],
    ctx: &GenerationContext,
    library: Option<&PatternLibrary>,
) -> Vec<SurveyResult> {
    seeds
        .par_iter()
        .map(|seed| match generate_ascii(seed, ctx, library) {
            Ok(map) => SurveyResult {
                seed: seed.clone(),
                archetype: Some(map.archetype.to_string()),
                layout: Some(map.layout_source.to_string()),
                attempts: Some(map.attempts),
                error: None,
            },
            Err(e) => {
                log::warn!("Survey seed '{}' failed: {}", seed, e);
                SurveyResult {
                    seed: seed.clone(),
                    archetype: None,
                    layout: None,
                    attempts: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

/// Logs pass counts and the mean attempt count.
pub fn log_summary(results: &[SurveyResult]) {
    let passed: Vec<usize> = results.iter().filter_map(|r| r.attempts).collect();
    let mean = if passed.is_empty() {
        0.0
    } else {
        passed.iter().sum::<usize>() as f64 / passed.len() as f64
    };
    log::info!(
        "Survey finished: {}/{} seeds accepted, {:.2} attempts on average",
        passed.len(),
        results.len(),
        mean
    );
}

/// Writes survey results to a CSV file.
///
/// # Returns
///
/// * `Ok(())` if writing to CSV is successful.
/// * `Err(Error)` if there is an error creating the file or writing the data.
pub fn write_survey_to_csv(results: &[SurveyResult], path: &Path) -> Result<(), Error> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create survey CSV: {:?}", path))?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record(["Seed", "Status", "Archetype", "Layout", "Attempts", "Error"])?;

    for result in results {
        wtr.write_record([
            result.seed.clone(),
            if result.succeeded() { "ok" } else { "failed" }.to_string(),
            result.archetype.clone().unwrap_or_default(),
            result.layout.clone().unwrap_or_default(),
            result
                .attempts
                .map(|a| a.to_string())
                .unwrap_or_default(),
            result.error.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    log::info!("Survey results written to {:?}", path);
    Ok(())
}
