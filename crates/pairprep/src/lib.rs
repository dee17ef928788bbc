// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # pairprep
//!
//! Dataset preparation for paired thermal/RGB person-pose capture.
//!
//! The library covers two independent stages of the pipeline:
//!
//! - [`pairs`]: validate a pairing manifest against the thermal and RGB frame
//!   directories, summarise the timing error between modalities and select
//!   high-quality pairs
//! - [`labels`]: convert LabelMe polygon annotations into per-region binary
//!   masks and a pose label table joined to the per-image metadata
//!
//! Both stages are synchronous and single-threaded. Settings are layered
//! from defaults, an optional TOML file and the environment through
//! [`Settings`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairprep::{
//!     Error, Settings,
//!     labels::MaskConverter,
//!     pairs::{ManifestReader, PairValidator},
//! };
//!
//! fn main() -> Result<(), Error> {
//!     let settings = Settings::load(None)?;
//!
//!     let manifest = ManifestReader::new().read_json("pairs_mapping_v3.json")?;
//!     let validator =
//!         PairValidator::with_options("thermal", "images", settings.validator_options());
//!     println!("{}", validator.validate(&manifest));
//!
//!     let summary = MaskConverter::with_options(
//!         "annotations",
//!         "image_metadata.csv",
//!         "person_pose_dataset",
//!         settings.convert_options(),
//!     )
//!     .convert()?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `profiling`: emits `tracing` spans around validation and conversion

mod config;
mod error;
pub mod labels;
pub mod pairs;

pub use crate::{
    config::{ConverterSettings, Settings, ValidatorSettings},
    error::Error,
};

#[cfg(test)]
mod tests {
    #[ctor::ctor]
    fn init() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
}
