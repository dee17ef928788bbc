// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Annotation, metadata and label row structures.

use serde::{Deserialize, Serialize};

/// One labelled polygon inside an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Free-text semantic label as drawn by the annotator.
    pub label: String,
    /// Closed polygon ring in integer pixel coordinates.
    pub polygon: Vec<(i32, i32)>,
}

/// Polygon annotations for a single RGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    /// Image reference as stored by the annotation tool, possibly relative.
    pub image_path: String,
    pub image_height: u32,
    pub image_width: u32,
    pub regions: Vec<Region>,
}

impl AnnotationRecord {
    /// Base filename of the referenced image, used as the metadata join key.
    pub fn image_file_name(&self) -> &str {
        base_file_name(&self.image_path)
    }
}

/// Strip any directory part from an image reference.
///
/// Annotation tools on Windows write `..\\images\\frame_00001.jpg`, so both
/// separators are honoured regardless of the host platform.
pub fn base_file_name(image_path: &str) -> &str {
    image_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(image_path)
}

/// LabelMe JSON layout.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LabelMeFile {
    #[serde(rename = "imagePath")]
    pub image_path: String,
    #[serde(rename = "imageHeight")]
    pub image_height: i64,
    #[serde(rename = "imageWidth")]
    pub image_width: i64,
    pub shapes: Vec<LabelMeShape>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LabelMeShape {
    pub label: String,
    pub points: Vec<[f64; 2]>,
}

/// One row of the per-image metadata table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    /// RGB image filename; unique across the table.
    pub filename: String,
    pub pair_id: String,
    pub timestamp: String,
}

/// One row of the output label table, created once per region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelAssignment {
    pub pair_id: String,
    pub timestamp: String,
    pub image_file: String,
    pub mask_file: String,
    pub pose_label: String,
    /// Class from the configured table, or [`UNKNOWN_CLASS`](super::UNKNOWN_CLASS).
    pub pose_class: i32,
    pub mask_path: String,
}
