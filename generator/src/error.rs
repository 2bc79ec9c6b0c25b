use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong before or while a test case is produced.
///
/// Configuration variants are all detected before generation starts, so a
/// failing run never leaves partial output behind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("can't parse seed: {0}")]
    InvalidSeed(String),

    #[error("incompatible generator version in seed: {0}")]
    SeedVersionMismatch(String),

    #[error("can't recognize bit mode: {0}")]
    InvalidBitMode(String),

    #[error("can't recognize language standard: {0}")]
    UnknownStandard(String),

    #[error("empty {what} range: min {min} > max {max}")]
    EmptyRange {
        what: &'static str,
        min: u32,
        max: u32,
    },

    #[error("config file error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
