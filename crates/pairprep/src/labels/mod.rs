// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # Annotation to Mask Conversion
//!
//! Turns LabelMe polygon annotations into per-region binary masks and a
//! pose label table.
//!
//! ## Pipeline
//!
//! 1. Load the metadata table (`filename, pair_id, timestamp`); a missing
//!    table or a duplicated filename aborts the run
//! 2. Parse every `*.json` annotation, skipping unreadable files
//! 3. Join on the base filename of `imagePath`, skipping unmatched images
//! 4. Rasterize each region into `<out>/person_masks/`
//! 5. Write one row per region to `<out>/pose_labels.csv`
//!
//! ## Mask Naming
//!
//! | Regions | File name                          |
//! |---------|------------------------------------|
//! | 1       | `{pair_id}_mask.png`               |
//! | N > 1   | `{pair_id}_{index:02}_mask.png`    |
//!
//! ## Example
//!
//! ```rust,no_run
//! use pairprep::labels::{ClassMapping, ConvertOptions, MaskConverter};
//!
//! let options = ConvertOptions {
//!     classes: ClassMapping::from_pairs([("standing", 0), ("lying", 1)]),
//!     ..Default::default()
//! };
//! let summary = MaskConverter::with_options(
//!     "annotations",
//!     "image_metadata.csv",
//!     "dataset",
//!     options,
//! )
//! .convert()?;
//! for (label, count) in &summary.label_counts {
//!     println!("{}: {}", label, count);
//! }
//! # Ok::<(), pairprep::Error>(())
//! ```

mod classes;
mod convert;
mod raster;
mod reader;
mod table;
mod types;

pub use classes::{ClassMapping, UNKNOWN_CLASS};
pub use convert::{
    ConversionSummary, ConvertOptions, MaskConverter, Progress, SkipReason, SkippedAnnotation,
    convert_annotation, mask_file_name,
};
pub use raster::{MASK_FOREGROUND, Mask, rasterize_polygon};
pub use reader::{MAX_MASK_PIXELS, MetadataIndex, list_annotations, read_annotation};
pub use table::{
    LABEL_COLUMNS, assignments_dataframe, label_counts, read_label_table, write_label_table,
};
pub use types::{
    AnnotationRecord, LabelAssignment, MetadataRecord, Region, base_file_name,
};
