// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Annotation to mask conversion.
//!
//! Joins LabelMe annotations to the metadata table by image filename,
//! rasterizes every region into its own mask PNG and collects one label row
//! per region into the output table.

use super::{
    classes::ClassMapping,
    raster::rasterize_polygon,
    reader::{MetadataIndex, list_annotations, read_annotation},
    table::{label_counts, write_label_table},
    types::{AnnotationRecord, LabelAssignment, MetadataRecord},
};
use crate::Error;
use log::{debug, info, warn};
use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

/// Options for annotation conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Mask directory name inside the output directory.
    pub masks_dir_name: String,
    /// Label table file name inside the output directory.
    pub table_name: String,
    /// Label to class mapping.
    pub classes: ClassMapping,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            masks_dir_name: "person_masks".to_string(),
            table_name: "pose_labels.csv".to_string(),
            classes: ClassMapping::default(),
        }
    }
}

/// Conversion progress, one step per annotation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// Why an annotation file produced no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be parsed.
    Unparseable(String),
    /// No metadata row matches the image filename.
    NoMetadata(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unparseable(e) => write!(f, "{}", e),
            SkipReason::NoMetadata(image) => write!(f, "no metadata for {}", image),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAnnotation {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of a conversion run.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    /// Number of annotation files found.
    pub annotation_files: usize,
    /// Label rows in processing order.
    pub assignments: Vec<LabelAssignment>,
    pub skipped: Vec<SkippedAnnotation>,
    pub masks_dir: PathBuf,
    pub table_path: PathBuf,
    /// `pose_label` frequencies, most common first.
    pub label_counts: Vec<(String, usize)>,
    /// Mask files written more than once in this run; later regions
    /// replaced earlier ones.
    pub overwritten_masks: Vec<PathBuf>,
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Annotation files: {}", self.annotation_files)?;
        writeln!(f, "Regions:          {}", self.assignments.len())?;
        writeln!(f, "Skipped files:    {}", self.skipped.len())?;
        for skipped in &self.skipped {
            writeln!(f, "  - {}: {}", skipped.path.display(), skipped.reason)?;
        }
        writeln!(f, "Masks:            {}", self.masks_dir.display())?;
        if !self.overwritten_masks.is_empty() {
            writeln!(f, "Overwritten masks: {}", self.overwritten_masks.len())?;
            for path in &self.overwritten_masks {
                writeln!(f, "  - {}", path.display())?;
            }
        }
        writeln!(f, "Labels table:     {}", self.table_path.display())?;
        writeln!(f, "Label counts:")?;
        for (label, count) in &self.label_counts {
            writeln!(f, "  {:<12} {}", label, count)?;
        }
        Ok(())
    }
}

/// Mask file name for one region.
///
/// A single-region annotation writes `{pair_id}_mask.png`. When an image has
/// several regions each gets its index, `{pair_id}_{index:02}_mask.png`, so
/// no region overwrites another.
pub fn mask_file_name(pair_id: &str, region_index: usize, region_count: usize) -> String {
    if region_count <= 1 {
        format!("{}_mask.png", pair_id)
    } else {
        format!("{}_{:02}_mask.png", pair_id, region_index)
    }
}

/// Rasterize and label every region of one joined annotation.
///
/// Masks are written into `masks_dir`, which must exist.
pub fn convert_annotation(
    annotation: &AnnotationRecord,
    metadata: &MetadataRecord,
    masks_dir: &Path,
    classes: &ClassMapping,
) -> Result<Vec<LabelAssignment>, Error> {
    let region_count = annotation.regions.len();
    let mut assignments = Vec::with_capacity(region_count);

    for (index, region) in annotation.regions.iter().enumerate() {
        if region.polygon.len() < 3 {
            warn!(
                "Region {} of {} has {} points; mask will be degenerate",
                index,
                annotation.image_file_name(),
                region.polygon.len()
            );
        }

        let mask = rasterize_polygon(
            &region.polygon,
            annotation.image_width,
            annotation.image_height,
        );
        let mask_file = mask_file_name(&metadata.pair_id, index, region_count);
        let mask_path = masks_dir.join(&mask_file);
        mask.save_png(&mask_path)?;
        debug!(
            "Wrote {:?} ({} pixels, label {})",
            mask_path,
            mask.filled_count(),
            region.label
        );

        let pose_class = classes.class_of(&region.label);
        if pose_class == super::UNKNOWN_CLASS {
            warn!(
                "Label {:?} in {} is not in the class table",
                region.label,
                annotation.image_file_name()
            );
        }

        assignments.push(LabelAssignment {
            pair_id: metadata.pair_id.clone(),
            timestamp: metadata.timestamp.clone(),
            image_file: annotation.image_file_name().to_string(),
            mask_file,
            pose_label: region.label.clone(),
            pose_class,
            mask_path: mask_path.to_string_lossy().to_string(),
        });
    }

    Ok(assignments)
}

/// Converter from a LabelMe annotation directory to masks and a label table.
///
/// # Example
///
/// ```rust,no_run
/// use pairprep::labels::MaskConverter;
///
/// let converter = MaskConverter::new(
///     "labelme_project/annotations",
///     "labelme_project/image_metadata.csv",
///     "person_pose_dataset",
/// );
/// let summary = converter.convert()?;
/// println!("{}", summary);
/// # Ok::<(), pairprep::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MaskConverter {
    annotations_dir: PathBuf,
    metadata_path: PathBuf,
    output_dir: PathBuf,
    options: ConvertOptions,
}

impl MaskConverter {
    pub fn new<A, M, O>(annotations_dir: A, metadata_path: M, output_dir: O) -> Self
    where
        A: Into<PathBuf>,
        M: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        Self::with_options(
            annotations_dir,
            metadata_path,
            output_dir,
            ConvertOptions::default(),
        )
    }

    pub fn with_options<A, M, O>(
        annotations_dir: A,
        metadata_path: M,
        output_dir: O,
        options: ConvertOptions,
    ) -> Self
    where
        A: Into<PathBuf>,
        M: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        Self {
            annotations_dir: annotations_dir.into(),
            metadata_path: metadata_path.into(),
            output_dir: output_dir.into(),
            options,
        }
    }

    pub fn masks_dir(&self) -> PathBuf {
        self.output_dir.join(&self.options.masks_dir_name)
    }

    pub fn table_path(&self) -> PathBuf {
        self.output_dir.join(&self.options.table_name)
    }

    /// Run the conversion.
    pub fn convert(&self) -> Result<ConversionSummary, Error> {
        self.convert_with_progress(|_| {})
    }

    /// Run the conversion, reporting progress after each annotation file.
    ///
    /// # Errors
    /// Fails when the metadata table is missing or invalid, when the
    /// annotation directory does not exist, or when writing masks or the
    /// table fails. Unparseable annotations and unmatched images are
    /// skipped and listed in [`ConversionSummary::skipped`].
    #[cfg_attr(feature = "profiling", tracing::instrument(skip_all))]
    pub fn convert_with_progress<F>(&self, mut progress: F) -> Result<ConversionSummary, Error>
    where
        F: FnMut(Progress),
    {
        let metadata = MetadataIndex::read_csv(&self.metadata_path)?;
        let files = list_annotations(&self.annotations_dir)?;
        if files.is_empty() {
            warn!("No annotation files found in {:?}", self.annotations_dir);
        }
        info!(
            "Converting {} annotation files against {} metadata rows",
            files.len(),
            metadata.len()
        );

        let masks_dir = self.masks_dir();
        std::fs::create_dir_all(&masks_dir)?;

        let total = files.len();
        let mut assignments = Vec::new();
        let mut skipped = Vec::new();
        let mut written = HashSet::new();
        let mut overwritten_masks = Vec::new();

        for (i, path) in files.iter().enumerate() {
            match read_annotation(path) {
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    skipped.push(SkippedAnnotation {
                        path: path.clone(),
                        reason: SkipReason::Unparseable(e.to_string()),
                    });
                }
                Ok(annotation) => match metadata.get(annotation.image_file_name()) {
                    None => {
                        warn!(
                            "Skipping {:?}: no metadata for {}",
                            path,
                            annotation.image_file_name()
                        );
                        skipped.push(SkippedAnnotation {
                            path: path.clone(),
                            reason: SkipReason::NoMetadata(
                                annotation.image_file_name().to_string(),
                            ),
                        });
                    }
                    Some(row) => {
                        let rows =
                            convert_annotation(&annotation, row, &masks_dir, &self.options.classes)?;
                        for assignment in &rows {
                            let mask_path = PathBuf::from(&assignment.mask_path);
                            if !written.insert(mask_path.clone()) {
                                warn!(
                                    "Mask {:?} written more than once; {} replaced an earlier region",
                                    mask_path,
                                    path.display()
                                );
                                overwritten_masks.push(mask_path);
                            }
                        }
                        assignments.extend(rows);
                    }
                },
            }

            progress(Progress {
                current: i + 1,
                total,
            });
        }

        let table_path = self.table_path();
        write_label_table(&table_path, &assignments)?;
        info!(
            "Wrote {} label rows to {:?} ({} files skipped)",
            assignments.len(),
            table_path,
            skipped.len()
        );

        Ok(ConversionSummary {
            annotation_files: total,
            label_counts: label_counts(&assignments),
            assignments,
            skipped,
            masks_dir,
            table_path,
            overwritten_masks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::Region;
    use tempfile::TempDir;

    fn metadata(pair_id: &str) -> MetadataRecord {
        MetadataRecord {
            filename: "frame_00001.jpg".to_string(),
            pair_id: pair_id.to_string(),
            timestamp: "12.5".to_string(),
        }
    }

    fn annotation(regions: Vec<Region>) -> AnnotationRecord {
        AnnotationRecord {
            image_path: "images/frame_00001.jpg".to_string(),
            image_height: 20,
            image_width: 30,
            regions,
        }
    }

    fn region(label: &str, x0: i32) -> Region {
        Region {
            label: label.to_string(),
            polygon: vec![(x0, 2), (x0 + 4, 2), (x0 + 4, 6), (x0, 6)],
        }
    }

    #[test]
    fn test_mask_file_name() {
        assert_eq!(mask_file_name("p7", 0, 1), "p7_mask.png");
        assert_eq!(mask_file_name("p7", 0, 0), "p7_mask.png");
        assert_eq!(mask_file_name("p7", 0, 3), "p7_00_mask.png");
        assert_eq!(mask_file_name("p7", 2, 3), "p7_02_mask.png");
    }

    #[test]
    fn test_multi_region_masks_kept_separately() {
        let temp_dir = TempDir::new().unwrap();
        let rows = convert_annotation(
            &annotation(vec![region("lying", 1), region("standing", 20)]),
            &metadata("p3"),
            temp_dir.path(),
            &ClassMapping::default(),
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mask_file, "p3_00_mask.png");
        assert_eq!(rows[0].pose_class, 0);
        assert_eq!(rows[1].mask_file, "p3_01_mask.png");
        assert_eq!(rows[1].pose_class, -1);
        assert_eq!(rows[1].image_file, "frame_00001.jpg");
        assert_eq!(rows[1].timestamp, "12.5");

        let first = image::open(temp_dir.path().join("p3_00_mask.png"))
            .unwrap()
            .to_luma8();
        let second = image::open(temp_dir.path().join("p3_01_mask.png"))
            .unwrap()
            .to_luma8();
        assert_eq!(first.get_pixel(3, 4).0, [255]);
        assert_eq!(first.get_pixel(22, 4).0, [0]);
        assert_eq!(second.get_pixel(22, 4).0, [255]);
        assert_eq!(second.get_pixel(3, 4).0, [0]);
    }

    #[test]
    fn test_annotation_without_regions_yields_no_rows() {
        let temp_dir = TempDir::new().unwrap();
        let rows = convert_annotation(
            &annotation(vec![]),
            &metadata("p1"),
            temp_dir.path(),
            &ClassMapping::default(),
        )
        .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_metadata_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let converter = MaskConverter::new(
            temp_dir.path(),
            temp_dir.path().join("image_metadata.csv"),
            temp_dir.path().join("out"),
        );
        let err = converter.convert().unwrap_err();
        assert!(matches!(err, Error::MissingMetadata(_)));
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_oversized_annotation_skipped_and_run_continues() {
        let temp_dir = TempDir::new().unwrap();
        let annotations = temp_dir.path().join("annotations");
        std::fs::create_dir(&annotations).unwrap();
        std::fs::write(
            annotations.join("a.json"),
            r#"{"imagePath": "a.jpg", "imageHeight": 4294967295,
                "imageWidth": 4294967295,
                "shapes": [{"label": "lying", "points": [[0, 0], [4, 0], [4, 4]]}]}"#,
        )
        .unwrap();
        std::fs::write(
            annotations.join("b.json"),
            r#"{"imagePath": "b.jpg", "imageHeight": 8, "imageWidth": 8,
                "shapes": [{"label": "lying", "points": [[0, 0], [4, 0], [4, 4]]}]}"#,
        )
        .unwrap();
        let metadata = temp_dir.path().join("image_metadata.csv");
        std::fs::write(&metadata, "filename,pair_id,timestamp
a.jpg,pa,1
b.jpg,pb,2
").unwrap();

        let summary = MaskConverter::new(&annotations, &metadata, temp_dir.path().join("out"))
            .convert()
            .unwrap();

        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].path, annotations.join("a.json"));
        assert!(matches!(summary.skipped[0].reason, SkipReason::Unparseable(_)));
        assert_eq!(summary.assignments.len(), 1);
        assert_eq!(summary.assignments[0].mask_file, "pb_mask.png");
    }

    #[test]
    fn test_repeated_mask_path_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let annotations = temp_dir.path().join("annotations");
        std::fs::create_dir(&annotations).unwrap();
        for name in ["a", "b"] {
            std::fs::write(
                annotations.join(format!("{}.json", name)),
                format!(
                    r#"{{"imagePath": "{}.jpg", "imageHeight": 8, "imageWidth": 8,
                        "shapes": [{{"label": "lying", "points": [[0, 0], [4, 0], [4, 4]]}}]}}"#,
                    name
                ),
            )
            .unwrap();
        }
        let metadata = temp_dir.path().join("image_metadata.csv");
        std::fs::write(&metadata, "filename,pair_id,timestamp
a.jpg,p1,1
b.jpg,p1,2
").unwrap();

        let summary = MaskConverter::new(&annotations, &metadata, temp_dir.path().join("out"))
            .convert()
            .unwrap();

        assert_eq!(summary.assignments.len(), 2);
        assert_eq!(
            summary.overwritten_masks,
            vec![summary.masks_dir.join("p1_mask.png")]
        );
        assert!(summary.to_string().contains("Overwritten masks: 1"));
    }

    #[test]
    fn test_progress_reports_every_file() {
        let temp_dir = TempDir::new().unwrap();
        let annotations = temp_dir.path().join("annotations");
        std::fs::create_dir(&annotations).unwrap();
        std::fs::write(annotations.join("a.json"), "not json").unwrap();
        std::fs::write(annotations.join("b.json"), "[]").unwrap();
        let metadata = temp_dir.path().join("image_metadata.csv");
        std::fs::write(&metadata, "filename,pair_id,timestamp\n").unwrap();

        let mut seen = Vec::new();
        let summary = MaskConverter::new(&annotations, &metadata, temp_dir.path().join("out"))
            .convert_with_progress(|p| seen.push(p))
            .unwrap();

        assert_eq!(
            seen,
            vec![
                Progress {
                    current: 1,
                    total: 2
                },
                Progress {
                    current: 2,
                    total: 2
                },
            ]
        );
        assert_eq!(summary.skipped.len(), 2);
        assert!(summary.assignments.is_empty());
        assert!(summary.table_path.exists());
    }
}
