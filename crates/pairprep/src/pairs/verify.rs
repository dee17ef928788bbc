// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Pair integrity validation.
//!
//! Cross-checks a pairing manifest against the thermal and RGB frame
//! directories. Missing files are collected into the report rather than
//! raised, so a single run enumerates every problem in the dataset.

use super::{
    probe::{ProbeOutcome, RgbProbe, ThermalProbe, probe_rgb, probe_thermal},
    stats::{DuplicateReport, ErrorStatistics},
    types::{FrameNaming, PairingManifest, PairingRecord, Timestamp},
};
use log::{debug, info, warn};
use std::{
    fmt,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Options for pair validation.
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Frame naming convention for both directories.
    pub naming: FrameNaming,
    /// Number of leading records probed and rendered in full detail.
    pub inspection_window: usize,
    /// Number of missing file names shown in the rendered report.
    pub example_limit: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            naming: FrameNaming::default(),
            inspection_window: 5,
            example_limit: 5,
        }
    }
}

/// Validator for a thermal/RGB pairing manifest.
///
/// # Example
///
/// ```rust,no_run
/// use pairprep::pairs::{ManifestReader, PairValidator};
///
/// let manifest = ManifestReader::new().read_json("pairs_mapping_v3.json")?;
/// let validator = PairValidator::new("aligned_dataset/thermal", "labelme_project/images");
/// let report = validator.validate(&manifest);
/// println!("{}", report);
/// # Ok::<(), pairprep::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PairValidator {
    thermal_dir: PathBuf,
    rgb_dir: PathBuf,
    options: ValidatorOptions,
}

impl PairValidator {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(thermal_dir: P, rgb_dir: Q) -> Self {
        Self::with_options(thermal_dir, rgb_dir, ValidatorOptions::default())
    }

    pub fn with_options<P: Into<PathBuf>, Q: Into<PathBuf>>(
        thermal_dir: P,
        rgb_dir: Q,
        options: ValidatorOptions,
    ) -> Self {
        Self {
            thermal_dir: thermal_dir.into(),
            rgb_dir: rgb_dir.into(),
            options,
        }
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Expected thermal frame path for a record.
    pub fn thermal_path(&self, record: &PairingRecord) -> PathBuf {
        self.thermal_dir
            .join(self.options.naming.thermal_file_name(record.thermal_frame_idx))
    }

    /// Expected RGB frame path for a record.
    pub fn rgb_path(&self, record: &PairingRecord) -> PathBuf {
        self.rgb_dir
            .join(self.options.naming.rgb_file_name(record.rgb_frame_idx))
    }

    /// Count the frame files present in each directory.
    pub fn census(&self) -> FileCensus {
        FileCensus {
            thermal_files: count_files(&self.thermal_dir, &self.options.naming.thermal_extension),
            rgb_files: count_files(&self.rgb_dir, &self.options.naming.rgb_extension),
        }
    }

    /// Probe the frames of the first records for manual review.
    ///
    /// Probe failures are recorded on the entry and never abort the run.
    pub fn inspect(&self, records: &[PairingRecord]) -> Vec<FrameInspection> {
        records
            .iter()
            .take(self.options.inspection_window)
            .enumerate()
            .map(|(position, record)| {
                let thermal_path = self.thermal_path(record);
                let rgb_path = self.rgb_path(record);

                let thermal = probe(&thermal_path, |p| probe_thermal(p));
                let rgb = probe(&rgb_path, |p| probe_rgb(p));

                FrameInspection {
                    position,
                    pair_id: record.pair_id.clone(),
                    thermal_frame_idx: record.thermal_frame_idx,
                    rgb_frame_idx: record.rgb_frame_idx,
                    timestamp: record.timestamp.clone(),
                    rgb_error_ms: record.rgb_error_ms,
                    label: record.label.clone(),
                    modality: record.modality.clone(),
                    thermal_path,
                    rgb_path,
                    thermal,
                    rgb,
                }
            })
            .collect()
    }

    /// Check every record for its thermal and RGB files.
    ///
    /// Each modality is checked independently; one missing file per
    /// offending record is listed, in manifest order.
    pub fn completeness(&self, records: &[PairingRecord]) -> CompletenessReport {
        let mut report = CompletenessReport {
            checked: records.len(),
            ..Default::default()
        };

        for record in records {
            if !self.thermal_path(record).exists() {
                report.missing_thermal.push(
                    self.options
                        .naming
                        .thermal_file_name(record.thermal_frame_idx),
                );
            }
            if !self.rgb_path(record).exists() {
                report
                    .missing_rgb
                    .push(self.options.naming.rgb_file_name(record.rgb_frame_idx));
            }
        }

        debug!(
            "Completeness: {} records, {} thermal missing, {} rgb missing",
            report.checked,
            report.missing_thermal.len(),
            report.missing_rgb.len()
        );
        report
    }

    /// Run every check over the manifest.
    ///
    /// An empty manifest yields a report without statistics; the other
    /// checks still run.
    #[cfg_attr(feature = "profiling", tracing::instrument(skip_all))]
    pub fn validate(&self, manifest: &PairingManifest) -> ValidationReport {
        let records = manifest.records();
        info!(
            "Validating {} pairs against {:?} and {:?}",
            records.len(),
            self.thermal_dir,
            self.rgb_dir
        );

        let statistics = match ErrorStatistics::compute(records) {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("Skipping statistics: {}", e);
                None
            }
        };

        let duplicates = DuplicateReport::from_records(records);
        if duplicates.has_duplicates() {
            warn!(
                "RGB frames reused: {} pairs share {} distinct frames",
                duplicates.total, duplicates.unique
            );
        }

        ValidationReport {
            total_pairs: records.len(),
            census: self.census(),
            inspections: self.inspect(records),
            statistics,
            duplicates,
            completeness: self.completeness(records),
            example_limit: self.options.example_limit,
        }
    }
}

fn probe<T, F>(path: &Path, f: F) -> ProbeOutcome<T>
where
    F: FnOnce(&Path) -> Result<T, crate::Error>,
{
    if !path.exists() {
        return ProbeOutcome::Missing;
    }
    match f(path) {
        Ok(info) => ProbeOutcome::Found(info),
        Err(e) => {
            warn!("Failed to probe {:?}: {}", path, e);
            ProbeOutcome::Unreadable(e.to_string())
        }
    }
}

/// Count files directly inside `dir` with the given extension.
fn count_files(dir: &Path, extension: &str) -> usize {
    if !dir.is_dir() {
        warn!("Frame directory not found: {:?}", dir);
        return 0;
    }

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
        })
        .count()
}

/// Number of frame files found per modality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCensus {
    pub thermal_files: usize,
    pub rgb_files: usize,
}

/// Full detail for one record in the inspection window.
#[derive(Debug, Clone)]
pub struct FrameInspection {
    pub position: usize,
    pub pair_id: String,
    pub thermal_frame_idx: u64,
    pub rgb_frame_idx: u64,
    pub timestamp: Timestamp,
    pub rgb_error_ms: f64,
    pub label: String,
    pub modality: String,
    pub thermal_path: PathBuf,
    pub rgb_path: PathBuf,
    pub thermal: ProbeOutcome<ThermalProbe>,
    pub rgb: ProbeOutcome<RgbProbe>,
}

impl fmt::Display for FrameInspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "║ Pair {}", self.pair_id)?;
        writeln!(
            f,
            "║   Thermal frame: {} ({})",
            self.thermal_frame_idx,
            file_name(&self.thermal_path)
        )?;
        writeln!(
            f,
            "║   RGB frame:     {} ({})",
            self.rgb_frame_idx,
            file_name(&self.rgb_path)
        )?;
        writeln!(f, "║   Timestamp:     {}", self.timestamp)?;
        writeln!(f, "║   Time error:    {:.2} ms", self.rgb_error_ms)?;
        writeln!(f, "║   Label:         {}", self.label)?;
        writeln!(f, "║   Modality:      {}", self.modality)?;
        write_probe(f, "Thermal", &self.thermal_path, &self.thermal)?;
        write_probe(f, "RGB", &self.rgb_path, &self.rgb)?;
        Ok(())
    }
}

fn write_probe<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    path: &Path,
    outcome: &ProbeOutcome<T>,
) -> fmt::Result {
    let mark = if outcome.exists() { "✓" } else { "✗" };
    writeln!(f, "║   {} file: {} {}", name, mark, path.display())?;
    match outcome {
        ProbeOutcome::Missing => Ok(()),
        ProbeOutcome::Found(info) => writeln!(f, "║     {}", info),
        ProbeOutcome::Unreadable(e) => writeln!(f, "║     unreadable: {}", e),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Missing frame files over the whole manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletenessReport {
    /// Number of records checked.
    pub checked: usize,
    pub missing_thermal: Vec<String>,
    pub missing_rgb: Vec<String>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.missing_thermal.is_empty() && self.missing_rgb.is_empty()
    }
}

/// Result of validating a pairing manifest.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub total_pairs: usize,
    pub census: FileCensus,
    pub inspections: Vec<FrameInspection>,
    /// `None` when the manifest is empty.
    pub statistics: Option<ErrorStatistics>,
    pub duplicates: DuplicateReport,
    pub completeness: CompletenessReport,
    example_limit: usize,
}

impl ValidationReport {
    /// True when every referenced file exists and no RGB frame is reused.
    pub fn is_valid(&self) -> bool {
        self.completeness.is_complete() && !self.duplicates.has_duplicates()
    }

    fn write_missing(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        missing: &[String],
    ) -> fmt::Result {
        if missing.is_empty() {
            return writeln!(f, "║ ✓ All {} files present", name);
        }
        writeln!(f, "║ ✗ Missing {} {} files", missing.len(), name)?;
        for file in missing.iter().take(self.example_limit) {
            writeln!(f, "║     - {}", file)?;
        }
        if missing.len() > self.example_limit {
            writeln!(f, "║     ... and {} more", missing.len() - self.example_limit)?;
        }
        Ok(())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "╔══════════════════════════════════════════════════════════════╗"
        )?;
        writeln!(
            f,
            "║                 THERMAL/RGB PAIR VALIDATION                  ║"
        )?;
        writeln!(
            f,
            "╠══════════════════════════════════════════════════════════════╣"
        )?;
        writeln!(f, "║ Pairs:         {}", self.total_pairs)?;
        writeln!(f, "║ Thermal files: {}", self.census.thermal_files)?;
        writeln!(f, "║ RGB files:     {}", self.census.rgb_files)?;
        if !self.inspections.is_empty() {
            writeln!(
                f,
                "╠══════════════════════════════════════════════════════════════╣"
            )?;
            writeln!(f, "║ First {} pairs:", self.inspections.len())?;
            for inspection in &self.inspections {
                write!(f, "{}", inspection)?;
            }
        }
        writeln!(
            f,
            "╠══════════════════════════════════════════════════════════════╣"
        )?;
        match &self.statistics {
            Some(stats) => write!(f, "{}", stats)?,
            None => writeln!(f, "║ No statistics: manifest is empty")?,
        }
        writeln!(
            f,
            "╠══════════════════════════════════════════════════════════════╣"
        )?;
        if self.duplicates.has_duplicates() {
            writeln!(f, "║ ⚠ RGB frames reused across pairs")?;
            writeln!(f, "║   Total pairs:       {}", self.duplicates.total)?;
            writeln!(f, "║   Unique RGB frames: {}", self.duplicates.unique)?;
            for reused in self.duplicates.reused.iter().take(self.example_limit) {
                writeln!(
                    f,
                    "║     - frame {} used by {}",
                    reused.rgb_frame_idx,
                    reused.pair_ids.join(", ")
                )?;
            }
        } else {
            writeln!(f, "║ ✓ All RGB frames are unique")?;
        }
        writeln!(
            f,
            "╠══════════════════════════════════════════════════════════════╣"
        )?;
        self.write_missing(f, "thermal", &self.completeness.missing_thermal)?;
        self.write_missing(f, "RGB", &self.completeness.missing_rgb)?;
        writeln!(
            f,
            "╚══════════════════════════════════════════════════════════════╝"
        )?;
        Ok(())
    }
}
