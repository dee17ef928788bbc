// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use std::path::PathBuf;

/// Error type for pair validation and annotation conversion.
///
/// Structural problems with the inputs (a malformed manifest, an unreadable
/// annotation, a missing metadata table) are reported through this type.
/// Referential problems such as missing frame files or unmatched metadata
/// rows are not errors; they are collected into the validation report and
/// the conversion summary instead.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred during file operations.
    IoError(std::io::Error),
    /// JSON serialization or deserialization error.
    JsonError(serde_json::Error),
    /// Configuration parsing or loading error.
    ConfigError(config::ConfigError),
    /// Raster decode or encode error.
    ImageError(image::ImageError),
    /// Polars dataframe operation error.
    PolarsError(polars::error::PolarsError),
    /// The pairing manifest is not a well-formed array of pairing records.
    ManifestParse { path: PathBuf, message: String },
    /// Statistics were requested over a manifest with no records.
    EmptyManifest,
    /// An annotation file does not have the expected LabelMe structure.
    AnnotationParse { path: PathBuf, message: String },
    /// The metadata table needed for the join does not exist.
    MissingMetadata(PathBuf),
    /// A required column is absent from a table.
    MissingColumn(String),
    /// The metadata table lists the same filename more than once.
    DuplicateMetadataKey(String),
    /// A thermal frame is not a readable NumPy array file.
    InvalidNpy(String),
    /// Invalid parameters provided to an operation.
    InvalidParameters(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigError(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageError(err)
    }
}

impl From<polars::error::PolarsError> for Error {
    fn from(err: polars::error::PolarsError) -> Self {
        Error::PolarsError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::JsonError(e) => write!(f, "JSON error: {}", e),
            Error::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Error::ImageError(e) => write!(f, "Image error: {}", e),
            Error::PolarsError(e) => write!(f, "Polars error: {}", e),
            Error::ManifestParse { path, message } => {
                write!(f, "Invalid pairing manifest {}: {}", path.display(), message)
            }
            Error::EmptyManifest => write!(f, "Pairing manifest contains no records"),
            Error::AnnotationParse { path, message } => {
                write!(f, "Invalid annotation {}: {}", path.display(), message)
            }
            Error::MissingMetadata(path) => {
                write!(f, "Metadata table not found: {}", path.display())
            }
            Error::MissingColumn(s) => write!(f, "Missing column: {}", s),
            Error::DuplicateMetadataKey(s) => {
                write!(f, "Metadata table lists filename more than once: {}", s)
            }
            Error::InvalidNpy(s) => write!(f, "Invalid NumPy file: {}", s),
            Error::InvalidParameters(s) => write!(f, "Invalid parameters: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            Error::ConfigError(e) => Some(e),
            Error::ImageError(e) => Some(e),
            Error::PolarsError(e) => Some(e),
            _ => None,
        }
    }
}
