//! Crate-wide error type.
//!
//! Two families of failures, raised at different phases:
//!
//! * **configuration** — everything that can go wrong while turning an asset
//!   config document into a validated [`AssetTable`](crate::assets::AssetTable).
//!   These are only ever raised during the build phase.
//! * **lookup** — an unknown command name at synthesis time.  The command
//!   layer is expected to translate this into a user-facing message.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // ── Configuration (asset-table build phase) ──────────────────────────────
    #[error("asset config not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("line {line} of the asset config is malformed: {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("duplicate section: [{0}]")]
    DuplicateSection(String),

    #[error("name '{0}' is already taken")]
    NameCollision(String),

    #[error("name {0:?} is empty once whitespace is removed")]
    EmptyName(String),

    #[error("[{section}] key {key:?} is not a non-negative integer")]
    MalformedKey { section: String, key: String },

    #[error("asset file not found: {0}")]
    MissingAsset(PathBuf),

    #[error("failed to substitute a variable: ${0}")]
    UnresolvedVariable(String),

    #[error("[DEFAULT] may not define aliases")]
    DefaultSectionAliases,

    #[error("[{0}] has no tick clips")]
    NoTickClips(String),

    #[error("cannot decode {path}: {details}")]
    Decode { path: PathBuf, details: String },

    #[error("cannot resample {path}: {details}")]
    Resample { path: PathBuf, details: String },

    #[error("cannot read settings {path}: {details}")]
    Settings { path: PathBuf, details: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    // ── Lookup (synthesis phase) ─────────────────────────────────────────────
    #[error("the command ({0}) is not a stored asset")]
    UnknownCommand(String),
}

pub type Result<T> = std::result::Result<T, Error>;
