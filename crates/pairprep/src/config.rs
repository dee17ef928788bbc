// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Layered settings.
//!
//! Sources are applied in order, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file, either given explicitly or `pairprep.toml` in the user's
//!    config directory (e.g. `~/.config/pairprep/pairprep.toml` on Linux)
//! 3. `PAIRPREP__SECTION__KEY` environment variables, e.g.
//!    `PAIRPREP__VALIDATOR__INSPECTION_WINDOW=10`
//!
//! ```toml
//! [frames]
//! prefix = "frame_"
//! width = 5
//!
//! [validator]
//! inspection_window = 10
//! high_quality_ms = 4.0
//!
//! [converter]
//! masks_dir = "person_masks"
//!
//! [classes]
//! standing = 5
//! ```
//!
//! Entries under `[classes]` are merged into the default pose table.

use crate::{
    Error,
    labels::{ClassMapping, ConvertOptions},
    pairs::{FrameNaming, ValidatorOptions},
};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "pairprep.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorSettings {
    /// Leading records probed and shown in detail.
    pub inspection_window: usize,
    /// Missing file names listed per modality in the report.
    pub example_limit: usize,
    /// Default threshold for the high-quality subset.
    pub high_quality_ms: f64,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            inspection_window: 5,
            example_limit: 5,
            high_quality_ms: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
    pub masks_dir: String,
    pub table_name: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        let options = ConvertOptions::default();
        Self {
            masks_dir: options.masks_dir_name,
            table_name: options.table_name,
        }
    }
}

/// Settings shared by the validator and the converter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub frames: FrameNaming,
    pub validator: ValidatorSettings,
    pub converter: ConverterSettings,
    pub classes: ClassMapping,
}

impl Settings {
    /// Default location of the settings file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("ai", "EdgeFirst", "pairprep")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load settings from defaults, a settings file and the environment.
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// used when present and silently skipped otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        match path {
            Some(path) => {
                debug!("Loading settings from {:?}", path);
                builder = builder.add_source(
                    File::from(path.to_path_buf())
                        .format(FileFormat::Toml)
                        .required(true),
                );
            }
            None => {
                if let Some(default_path) = Self::default_path()
                    && default_path.is_file()
                {
                    debug!("Loading settings from {:?}", default_path);
                    builder = builder.add_source(
                        File::from(default_path)
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("PAIRPREP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        if settings.frames.prefix.contains(['/', '\\']) {
            return Err(Error::InvalidParameters(format!(
                "frame prefix must not contain a path separator: {:?}",
                settings.frames.prefix
            )));
        }
        Ok(settings)
    }

    /// Validator options derived from these settings.
    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            naming: self.frames.clone(),
            inspection_window: self.validator.inspection_window,
            example_limit: self.validator.example_limit,
        }
    }

    /// Converter options derived from these settings.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            masks_dir_name: self.converter.masks_dir.clone(),
            table_name: self.converter.table_name.clone(),
            classes: self.classes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        let options = settings.validator_options();
        assert_eq!(options.inspection_window, 5);
        assert_eq!(options.naming.rgb_file_name(3), "frame_00003.jpg");

        let convert = settings.convert_options();
        assert_eq!(convert.masks_dir_name, "person_masks");
        assert_eq!(convert.table_name, "pose_labels.csv");
        assert_eq!(convert.classes.class_of("fallen"), 2);
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pairprep.toml");
        std::fs::write(
            &path,
            r#"
            [frames]
            width = 6
            rgb_extension = "png"

            [validator]
            inspection_window = 2
            high_quality_ms = 4.5

            [converter]
            table_name = "labels.csv"

            [classes]
            standing = 5
            "#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.frames.rgb_file_name(7), "frame_000007.png");
        assert_eq!(settings.frames.thermal_extension, "npy");
        assert_eq!(settings.validator.inspection_window, 2);
        assert_eq!(settings.validator.example_limit, 5);
        assert_eq!(settings.validator.high_quality_ms, 4.5);
        assert_eq!(settings.converter.table_name, "labels.csv");
        assert_eq!(settings.converter.masks_dir, "person_masks");
        assert_eq!(settings.classes.class_of("standing"), 5);
        assert_eq!(settings.classes.class_of("lying"), 0);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = Settings::load(Some(&temp_dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_prefix_with_separator_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pairprep.toml");
        std::fs::write(&path, "[frames]\nprefix = \"../frame_\"\n").unwrap();
        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));
    }
}
