use crate::error::AppError;
use clap::{Parser, ValueEnum};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use mapgen_core::pipeline::{DEFAULT_REROLL_ATTEMPTS, DEFAULT_SEED};
use mapgen_core::{GenerationContext, LayoutSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "bar-forge.toml";

/// Prefix for environment overrides, e.g. `BAR_FORGE_ROWS=24`.
pub const ENV_PREFIX: &str = "BAR_FORGE_";

/// Represents the different visualization modes available.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum VisualizationMode {
    #[default]
    None,
    /// Colored preview of the accepted map on stdout.
    Terminal,
}

/// Global log level for every module.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Layout generator choice on the command line.
///
/// Serializes to the same names `LayoutSource` reads back.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutArg {
    /// Constraint propagation over the pattern library.
    Wfc,
    /// Carve-and-repair.
    Carve,
}

/// Command line for the bar floor-plan generator.
///
/// Generation settings left unset here fall through to the config file,
/// then to `BAR_FORGE_*` variables, then to built-in defaults.
#[derive(Parser, Debug, Default, Serialize)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Seed string. A `wfc:`, `carve:` or `simple:` prefix forces the layout.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,

    /// Rows of the output map.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,

    /// Columns of the output map.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols: Option<usize>,

    /// Layout generator.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutArg>,

    /// JSON or RON pattern library for the constraint-propagation layout.
    #[arg(long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_file: Option<PathBuf>,

    /// Attempts per layout generator before giving up.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reroll_attempts: Option<usize>,

    /// Do not fall back to carving when constraint propagation fails.
    #[arg(long, default_value_t = false)]
    #[serde(skip)]
    pub no_fallback: bool,

    /// Path to save the generated map. Printed to stdout when absent.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Choose the visualization mode.
    #[arg(long, value_enum, default_value_t = VisualizationMode::None)]
    #[serde(skip)]
    pub visualization_mode: VisualizationMode,

    /// TOML file with generation settings.
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Generate this many derived seeds in parallel and report the outcome.
    #[arg(long, value_name = "COUNT")]
    #[serde(skip)]
    pub survey: Option<usize>,

    /// Optional: Path to save survey results as a CSV file.
    /// Only used if survey is also enabled.
    #[arg(long, value_name = "CSV_FILE")]
    #[serde(skip)]
    pub survey_csv: Option<PathBuf>,

    /// Set the global log level.
    #[arg(long, value_enum, default_value_t = GlobalLogLevel::Info)]
    #[serde(skip)]
    pub global_log_level: GlobalLogLevel,
}

/// Generation settings after every layer has been merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "seed_from_any")]
    pub seed: String,
    pub rows: usize,
    pub cols: usize,
    pub layout: LayoutSource,
    pub pattern_file: Option<PathBuf>,
    pub reroll_attempts: usize,
    pub fallback_to_carve: bool,
    pub output_path: Option<PathBuf>,
}

/// `BAR_FORGE_SEED=42` and `seed = 42` arrive as numbers.
fn seed_from_any<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SeedValue {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }
    Ok(match SeedValue::deserialize(deserializer)? {
        SeedValue::Text(text) => text,
        SeedValue::Unsigned(n) => n.to_string(),
        SeedValue::Signed(n) => n.to_string(),
    })
}

impl Default for Settings {
    fn default() -> Self {
        let ctx = GenerationContext::default();
        Self {
            seed: DEFAULT_SEED.to_string(),
            rows: ctx.rows,
            cols: ctx.cols,
            layout: ctx.layout_source,
            pattern_file: None,
            reroll_attempts: DEFAULT_REROLL_ATTEMPTS,
            fallback_to_carve: ctx.fallback_to_carve,
            output_path: None,
        }
    }
}

impl Settings {
    /// The pipeline context these settings describe.
    pub fn generation_context(&self) -> GenerationContext {
        GenerationContext {
            rows: self.rows,
            cols: self.cols,
            layout_source: self.layout,
            reroll_attempts: self.reroll_attempts,
            fallback_to_carve: self.fallback_to_carve,
        }
    }
}

impl AppConfig {
    /// Merges defaults, the config file, the environment and this command line.
    pub fn resolve(&self) -> Result<Settings, AppError> {
        let file = match &self.config {
            Some(path) if !path.exists() => {
                return Err(AppError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )))
            }
            Some(path) => path.clone(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };
        self.resolve_with(&file, Env::prefixed(ENV_PREFIX))
    }

    fn resolve_with(&self, file: &Path, env: Env) -> Result<Settings, AppError> {
        let mut settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(file))
            .merge(env)
            .merge(Serialized::defaults(self))
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if self.no_fallback {
            settings.fallback_to_carve = false;
        }
        log::debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }
}
