//! Error types for the zone/tile model.
//!
//! Loading distinguishes three families of failure so callers can react
//! differently: the file could not be read at all ([`ZoneError::Io`]), the
//! file was read but is not a zone file ([`ZoneError::Format`]), or an
//! editing call referenced something that does not exist. Per-cell and
//! per-flag problems never surface here; they are logged and skipped.

use std::path::PathBuf;
use thiserror::Error;

/// A textual tile reference (`A007`) could not be parsed or assigned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("empty mnemonic")]
    Empty,
    #[error("sheet letter '{0}' is out of range A-Z")]
    LetterOutOfRange(char),
    #[error("bad atlas index in mnemonic '{0}'")]
    BadIndex(String),
}

/// A single flag fragment carried a payload that is not a number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed flag '{flag}': {reason}")]
pub struct FlagError {
    pub flag: String,
    pub reason: String,
}

/// A required section of a `.zone` file is missing or unreadable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneFormatError {
    #[error("zone file does not have '# name:' defined")]
    MissingName,
    #[error("zone file does not have an 'IDX' table defined")]
    MissingIndexTable,
    #[error("could not find '# Base Tiles' header")]
    MissingBaseTiles,
    #[error("'# Base Tiles' section is empty")]
    EmptyBaseTiles,
    #[error("could not parse tile properties: {0}")]
    Properties(String),
}

/// Errors raised by zone load/store and zone editing.
#[derive(Error, Debug)]
pub enum ZoneError {
    #[error("zone i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("zone format error: {0}")]
    Format(#[from] ZoneFormatError),
    #[error("cell ({x},{y}) is outside the {width}x{height} zone")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("sheet letter '{0}' has no entry in the zone index table")]
    UnknownSheet(char),
    #[error("no sheet with uid {0} is loaded")]
    SheetNotLoaded(u64),
    #[error("sheet {uid} has no tile {index}")]
    UnknownTile { uid: u64, index: u32 },
    #[error("tile {0} has no sheet letter")]
    UnsetSheet(String),
    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),
}

/// Errors raised while building a [`SheetModel`](crate::resources::sheetmodel::SheetModel).
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("sheet i/o failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read sheet image: {0}")]
    Image(#[from] image::ImageError),
    #[error("could not parse sheet properties: {0}")]
    Properties(String),
    #[error("sheet property '{key}' has invalid value '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Errors raised by the editor configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("failed to save config file {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
