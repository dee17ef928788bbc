// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Pairing manifest data structures.

use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, path::PathBuf};

/// Wall-clock value attached to a pairing record or metadata row.
///
/// Manifests written by different capture tools store either epoch seconds or
/// a formatted string; both are kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Seconds(f64),
    Text(String),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Seconds(s) => write!(f, "{}", s),
            Timestamp::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One matched thermal/RGB frame pair.
///
/// `thermal_frame_idx` is always explicit once a manifest is loaded. Older
/// manifests relied on array position for the thermal index; the reader fills
/// in the position for those at load time so that filtering or reordering
/// records afterwards can never shift a record onto the wrong thermal frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingRecord {
    /// Identifier joining this pair to its metadata row and mask.
    pub pair_id: String,
    /// Index into the thermal frame sequence.
    pub thermal_frame_idx: u64,
    /// Index into the RGB frame sequence.
    pub rgb_frame_idx: u64,
    /// Capture time of the pair.
    pub timestamp: Timestamp,
    /// Time offset between the two modalities when the pair was made.
    pub rgb_error_ms: f64,
    /// Free-text activity tag.
    pub label: String,
    /// Pairing source tag.
    pub modality: String,
}

/// Manifest record as it appears on disk, before the thermal index is
/// resolved.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPairingRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub pair_id: String,
    #[serde(default)]
    pub thermal_frame_idx: Option<u64>,
    pub rgb_frame_idx: u64,
    pub timestamp: Timestamp,
    pub rgb_error_ms: f64,
    pub label: String,
    pub modality: String,
}

impl RawPairingRecord {
    pub(crate) fn resolve(self, position: usize) -> PairingRecord {
        PairingRecord {
            pair_id: self.pair_id,
            thermal_frame_idx: self.thermal_frame_idx.unwrap_or(position as u64),
            rgb_frame_idx: self.rgb_frame_idx,
            timestamp: self.timestamp,
            rgb_error_ms: self.rgb_error_ms,
            label: self.label,
            modality: self.modality,
        }
    }
}

/// Accept pair ids written either as strings or as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Float(n) => n.to_string(),
    })
}

/// An ordered, loaded pairing manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairingManifest {
    /// File the manifest was read from, if any.
    pub source: Option<PathBuf>,
    records: Vec<PairingRecord>,
}

impl PairingManifest {
    /// Build a manifest from already-resolved records.
    pub fn new(records: Vec<PairingRecord>) -> Self {
        Self {
            source: None,
            records,
        }
    }

    pub(crate) fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }

    /// Records in manifest order.
    pub fn records(&self) -> &[PairingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PairingRecord> {
        self.records.iter()
    }

    /// Select the records matching `predicate`, preserving manifest order.
    ///
    /// The manifest itself is left untouched; the selected records are
    /// cloned into a new vector.
    ///
    /// # Example
    /// ```
    /// use pairprep::pairs::{PairingManifest, PairingRecord, Timestamp};
    ///
    /// let record = |id: &str, err: f64| PairingRecord {
    ///     pair_id: id.to_string(),
    ///     thermal_frame_idx: 0,
    ///     rgb_frame_idx: 0,
    ///     timestamp: Timestamp::Seconds(0.0),
    ///     rgb_error_ms: err,
    ///     label: "sitting".to_string(),
    ///     modality: "thermal_rgb".to_string(),
    /// };
    /// let manifest = PairingManifest::new(vec![record("a", 2.0), record("b", 9.0)]);
    /// let sitting = manifest.select(|r| r.label == "sitting");
    /// assert_eq!(sitting.len(), 2);
    /// ```
    pub fn select<F>(&self, predicate: F) -> Vec<PairingRecord>
    where
        F: Fn(&PairingRecord) -> bool,
    {
        self.records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// Records whose timing error is strictly below `threshold_ms`.
    pub fn below_error(&self, threshold_ms: f64) -> Vec<PairingRecord> {
        self.select(|r| r.rgb_error_ms < threshold_ms)
    }
}

impl<'a> IntoIterator for &'a PairingManifest {
    type Item = &'a PairingRecord;
    type IntoIter = std::slice::Iter<'a, PairingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// File naming convention shared by the frame directories.
///
/// Frames are named by a zero-padded index, e.g. `frame_00042.npy` for the
/// thermal array and `frame_00042.jpg` for the RGB image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameNaming {
    /// Filename prefix before the index.
    pub prefix: String,
    /// Zero-padded width of the index.
    pub width: usize,
    /// Extension of thermal frames (numeric arrays).
    pub thermal_extension: String,
    /// Extension of RGB frames (compressed images).
    pub rgb_extension: String,
}

impl Default for FrameNaming {
    fn default() -> Self {
        Self {
            prefix: "frame_".to_string(),
            width: 5,
            thermal_extension: "npy".to_string(),
            rgb_extension: "jpg".to_string(),
        }
    }
}

impl FrameNaming {
    fn file_name(&self, index: u64, extension: &str) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            index,
            extension,
            width = self.width
        )
    }

    /// Expected thermal file name for a frame index.
    pub fn thermal_file_name(&self, index: u64) -> String {
        self.file_name(index, &self.thermal_extension)
    }

    /// Expected RGB file name for a frame index.
    pub fn rgb_file_name(&self, index: u64) -> String {
        self.file_name(index, &self.rgb_extension)
    }
}
