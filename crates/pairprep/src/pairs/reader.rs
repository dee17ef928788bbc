// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Pairing manifest reader.

use super::types::{PairingManifest, PairingRecord, RawPairingRecord};
use crate::Error;
use log::debug;
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Reader for JSON pairing manifests.
///
/// A manifest is a JSON array of objects carrying `pair_id`,
/// `rgb_frame_idx`, `timestamp`, `rgb_error_ms`, `label` and `modality`.
/// `thermal_frame_idx` is optional and defaults to the record's position.
///
/// # Example
///
/// ```rust,no_run
/// use pairprep::pairs::ManifestReader;
///
/// let manifest = ManifestReader::new().read_json("pairs_mapping_v3.json")?;
/// println!("Loaded {} pairs", manifest.len());
/// # Ok::<(), pairprep::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManifestReader;

impl ManifestReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a manifest from a JSON file.
    pub fn read_json<P: AsRef<Path>>(&self, path: P) -> Result<PairingManifest, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::ManifestParse {
            path: path.to_path_buf(),
            message: format!("cannot open file: {}", e),
        })?;
        let reader = BufReader::with_capacity(64 * 1024, file);
        let raw: Vec<RawPairingRecord> =
            serde_json::from_reader(reader).map_err(|e| Error::ManifestParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let manifest = resolve(raw, path)?.with_source(path.to_path_buf());
        debug!("Read {} pairs from {:?}", manifest.len(), path);
        Ok(manifest)
    }

    /// Parse a manifest from an in-memory JSON string.
    pub fn read_str(&self, json: &str) -> Result<PairingManifest, Error> {
        let path = PathBuf::from("<memory>");
        let raw: Vec<RawPairingRecord> =
            serde_json::from_str(json).map_err(|e| Error::ManifestParse {
                path: path.clone(),
                message: e.to_string(),
            })?;
        resolve(raw, &path)
    }
}

/// Assign positional thermal indices and check per-record invariants.
fn resolve(raw: Vec<RawPairingRecord>, path: &Path) -> Result<PairingManifest, Error> {
    let mut records = Vec::with_capacity(raw.len());
    for (position, record) in raw.into_iter().enumerate() {
        if !record.rgb_error_ms.is_finite() || record.rgb_error_ms < 0.0 {
            return Err(Error::ManifestParse {
                path: path.to_path_buf(),
                message: format!(
                    "record {} ({}) has invalid rgb_error_ms {}",
                    position, record.pair_id, record.rgb_error_ms
                ),
            });
        }
        records.push(record.resolve(position));
    }
    Ok(PairingManifest::new(records))
}

/// Write records as a JSON manifest with explicit thermal indices.
///
/// Used to persist a filtered subset; the explicit `thermal_frame_idx` keeps
/// the subset aligned with the thermal frames when it is read back.
pub fn write_manifest<P: AsRef<Path>>(path: P, records: &[PairingRecord]) -> Result<(), Error> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, records)?;
    file.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairs::Timestamp;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"[
        {"pair_id": "p0", "rgb_frame_idx": 3, "timestamp": 1.0,
         "rgb_error_ms": 3.2, "label": "lying", "modality": "thermal_rgb"},
        {"pair_id": "p1", "rgb_frame_idx": 5, "timestamp": "2024-04-05T12:00:00",
         "rgb_error_ms": 12.0, "label": "sitting", "modality": "thermal_rgb"}
    ]"#;

    #[test]
    fn test_positional_thermal_index() {
        let manifest = ManifestReader::new().read_str(MANIFEST).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.records()[0].thermal_frame_idx, 0);
        assert_eq!(manifest.records()[1].thermal_frame_idx, 1);
        assert_eq!(
            manifest.records()[1].timestamp,
            Timestamp::Text("2024-04-05T12:00:00".to_string())
        );
    }

    #[test]
    fn test_explicit_thermal_index_wins() {
        let json = r#"[{"pair_id": 17, "thermal_frame_idx": 40, "rgb_frame_idx": 3,
            "timestamp": 1.0, "rgb_error_ms": 1.0, "label": "x", "modality": "m"}]"#;
        let manifest = ManifestReader::new().read_str(json).unwrap();
        assert_eq!(manifest.records()[0].thermal_frame_idx, 40);
        assert_eq!(manifest.records()[0].pair_id, "17");
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let json = r#"[{"pair_id": "p0", "timestamp": 1.0, "rgb_error_ms": 1.0,
            "label": "x", "modality": "m"}]"#;
        let err = ManifestReader::new().read_str(json).unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }), "{}", err);
        assert!(err.to_string().contains("rgb_frame_idx"));
    }

    #[test]
    fn test_not_an_array_is_parse_error() {
        let err = ManifestReader::new()
            .read_str(r#"{"pairs": []}"#)
            .unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }));
    }

    #[test]
    fn test_negative_error_rejected() {
        let json = r#"[{"pair_id": "p0", "rgb_frame_idx": 0, "timestamp": 1.0,
            "rgb_error_ms": -0.5, "label": "x", "modality": "m"}]"#;
        let err = ManifestReader::new().read_str(json).unwrap_err();
        assert!(err.to_string().contains("rgb_error_ms"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = ManifestReader::new()
            .read_json("/nonexistent/pairs.json")
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pairs.json"));
    }

    #[test]
    fn test_write_filtered_subset_stays_aligned() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = ManifestReader::new().read_str(MANIFEST).unwrap();

        // Keep only the second record; its thermal frame is still 1.
        let subset = manifest.select(|r| r.pair_id == "p1");
        let out = temp_dir.path().join("subset").join("pairs.json");
        write_manifest(&out, &subset).unwrap();

        let reloaded = ManifestReader::new().read_json(&out).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.records()[0].thermal_frame_idx, 1);
        assert_eq!(reloaded.records()[0].rgb_frame_idx, 5);
        assert_eq!(reloaded.source.as_deref(), Some(out.as_path()));
    }
}
