// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! LabelMe annotation and metadata table readers.

use super::types::{AnnotationRecord, LabelMeFile, MetadataRecord, Region};
use crate::Error;
use log::{debug, warn};
use polars::{io::SerReader as _, prelude::*};
use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Largest mask, in pixels, an annotation may declare.
pub const MAX_MASK_PIXELS: u64 = 1 << 28;

/// Read one LabelMe annotation file.
///
/// Point coordinates are truncated toward zero to integer pixels. Declared
/// sizes above [`MAX_MASK_PIXELS`] are rejected. Polygons
/// with fewer than three points are kept; they rasterize to a line or a
/// point.
pub fn read_annotation<P: AsRef<Path>>(path: P) -> Result<AnnotationRecord, Error> {
    let path = path.as_ref();
    let parse_error = |message: String| Error::AnnotationParse {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|e| parse_error(format!("cannot open file: {}", e)))?;
    let raw: LabelMeFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| parse_error(e.to_string()))?;

    let image_height = positive_dimension(raw.image_height)
        .ok_or_else(|| parse_error(format!("invalid imageHeight {}", raw.image_height)))?;
    let image_width = positive_dimension(raw.image_width)
        .ok_or_else(|| parse_error(format!("invalid imageWidth {}", raw.image_width)))?;
    if image_width as u64 * image_height as u64 > MAX_MASK_PIXELS {
        return Err(parse_error(format!(
            "image size {}x{} exceeds {} pixels",
            image_width, image_height, MAX_MASK_PIXELS
        )));
    }

    let regions = raw
        .shapes
        .into_iter()
        .map(|shape| Region {
            label: shape.label,
            polygon: shape
                .points
                .iter()
                .map(|[x, y]| (*x as i32, *y as i32))
                .collect(),
        })
        .collect();

    Ok(AnnotationRecord {
        image_path: raw.image_path,
        image_height,
        image_width,
        regions,
    })
}

fn positive_dimension(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v > 0)
}

/// List the `*.json` annotation files directly inside `dir`, sorted by name.
pub fn list_annotations<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, Error> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::InvalidParameters(format!(
            "annotation directory not found: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort();

    debug!("Found {} annotation files in {:?}", files.len(), dir);
    Ok(files)
}

/// Metadata rows keyed by image filename.
///
/// Filenames must be unique; the join would otherwise be ambiguous.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    by_filename: HashMap<String, MetadataRecord>,
}

impl MetadataIndex {
    /// Index records by filename.
    ///
    /// # Errors
    /// [`Error::DuplicateMetadataKey`] when a filename appears twice.
    pub fn from_records<I>(records: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = MetadataRecord>,
    {
        let mut by_filename = HashMap::new();
        for record in records {
            let filename = record.filename.clone();
            if by_filename.insert(filename.clone(), record).is_some() {
                return Err(Error::DuplicateMetadataKey(filename));
            }
        }
        Ok(Self { by_filename })
    }

    /// Load the metadata CSV.
    ///
    /// Requires the `filename`, `pair_id` and `timestamp` columns; extra
    /// columns are ignored. Rows with an empty `pair_id` are dropped with a
    /// warning. Every value is read as text so identifiers such
    /// as `007` keep their leading zeros.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingMetadata(path.to_path_buf()));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        let filenames = string_column(&df, "filename")?;
        let pair_ids = string_column(&df, "pair_id")?;
        let timestamps = string_column(&df, "timestamp")?;

        let index = Self::from_records(
            filenames
                .into_iter()
                .zip(pair_ids)
                .zip(timestamps)
                .enumerate()
                .filter_map(|(row, ((filename, pair_id), timestamp))| {
                    if pair_id.trim().is_empty() {
                        warn!(
                            "Ignoring metadata row {} ({}): empty pair_id",
                            row + 1,
                            filename
                        );
                        return None;
                    }
                    Some(MetadataRecord {
                        filename,
                        pair_id,
                        timestamp,
                    })
                }),
        )?;
        debug!("Read {} metadata rows from {:?}", index.len(), path);
        Ok(index)
    }

    pub fn get(&self, filename: &str) -> Option<&MetadataRecord> {
        self.by_filename.get(filename)
    }

    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }
}

/// Extract a column as owned strings; nulls become empty strings.
pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>, Error> {
    let column = df
        .column(name)
        .map_err(|_| Error::MissingColumn(name.to_string()))?;
    Ok(column
        .cast(&DataType::String)?
        .str()?
        .into_iter()
        .map(|s| s.unwrap_or_default().to_string())
        .collect())
}
