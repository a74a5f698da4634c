use mapgen_core::MapGenError;
use mapgen_rules::LoadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern Library Error: {0}")]
    Load(#[from] LoadError),

    #[error("Map Generation Error: {0}")]
    MapGen(#[from] MapGenError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
