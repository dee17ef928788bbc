// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # Thermal/RGB Pair Integrity Validation
//!
//! Validates a pairing manifest that matches thermal frames (`.npy` arrays)
//! to RGB frames (`.jpg` images) captured at slightly different times.
//!
//! ## Checks
//!
//! 1. **Census**: number of frame files per modality
//! 2. **Inspection window**: full detail plus array/image probes for the
//!    first few pairs
//! 3. **Statistics**: mean, max and min timing error and a 4-bucket histogram
//! 4. **Duplicates**: RGB frames matched to more than one thermal frame
//! 5. **Completeness**: every missing thermal and RGB file across the manifest
//!
//! Missing files are reported, never raised. Only a malformed manifest is an
//! error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pairprep::pairs::{ManifestReader, PairValidator};
//!
//! let manifest = ManifestReader::new().read_json("pairs_mapping_v3.json")?;
//! let report = PairValidator::new("thermal", "images").validate(&manifest);
//! println!("{}", report);
//!
//! let high_quality = manifest.below_error(5.0);
//! println!("{} pairs under 5 ms", high_quality.len());
//! # Ok::<(), pairprep::Error>(())
//! ```

mod probe;
mod reader;
mod stats;
mod types;
mod verify;

pub use probe::{ProbeOutcome, RgbProbe, ThermalProbe, probe_rgb, probe_thermal};
pub use reader::{ManifestReader, write_manifest};
pub use stats::{
    BUCKET_LABELS, DuplicateReport, ErrorHistogram, ErrorStatistics, ExtremeRecord, ReusedFrame,
    bucket_index,
};
pub use types::{FrameNaming, PairingManifest, PairingRecord, Timestamp};
pub use verify::{
    CompletenessReport, FileCensus, FrameInspection, PairValidator, ValidationReport,
    ValidatorOptions,
};
