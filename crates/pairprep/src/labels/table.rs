// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Label table persistence.

use super::{reader::string_column, types::LabelAssignment};
use crate::Error;
use itertools::Itertools;
use polars::{
    io::{SerReader as _, SerWriter as _},
    prelude::*,
};
use std::{fs::File, path::Path};

/// Column order of the label table.
pub const LABEL_COLUMNS: [&str; 7] = [
    "pair_id",
    "timestamp",
    "image_file",
    "mask_file",
    "pose_label",
    "pose_class",
    "mask_path",
];

/// Build a DataFrame with one row per label assignment.
pub fn assignments_dataframe(assignments: &[LabelAssignment]) -> Result<DataFrame, Error> {
    let (pair_ids, timestamps, image_files, mask_files, pose_labels, pose_classes, mask_paths) =
        assignments
            .iter()
            .map(|a| {
                (
                    a.pair_id.as_str(),
                    a.timestamp.as_str(),
                    a.image_file.as_str(),
                    a.mask_file.as_str(),
                    a.pose_label.as_str(),
                    a.pose_class,
                    a.mask_path.as_str(),
                )
            })
            .multiunzip::<(
                Vec<&str>, // pair_id
                Vec<&str>, // timestamp
                Vec<&str>, // image_file
                Vec<&str>, // mask_file
                Vec<&str>, // pose_label
                Vec<i32>,  // pose_class
                Vec<&str>, // mask_path
            )>();

    Ok(DataFrame::new(vec![
        Series::new(LABEL_COLUMNS[0].into(), pair_ids).into(),
        Series::new(LABEL_COLUMNS[1].into(), timestamps).into(),
        Series::new(LABEL_COLUMNS[2].into(), image_files).into(),
        Series::new(LABEL_COLUMNS[3].into(), mask_files).into(),
        Series::new(LABEL_COLUMNS[4].into(), pose_labels).into(),
        Series::new(LABEL_COLUMNS[5].into(), pose_classes).into(),
        Series::new(LABEL_COLUMNS[6].into(), mask_paths).into(),
    ])?)
}

/// Write the label table as CSV, replacing any existing file.
pub fn write_label_table<P: AsRef<Path>>(
    path: P,
    assignments: &[LabelAssignment],
) -> Result<(), Error> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut df = assignments_dataframe(assignments)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}

/// Read a label table written by [`write_label_table`].
pub fn read_label_table<P: AsRef<Path>>(path: P) -> Result<Vec<LabelAssignment>, Error> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;

    let mut columns = LABEL_COLUMNS
        .iter()
        .map(|name| string_column(&df, name))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(Vec::into_iter)
        .collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(df.height());
    for _ in 0..df.height() {
        let mut next = |i: usize| columns[i].next().unwrap_or_default();
        let pair_id = next(0);
        let timestamp = next(1);
        let image_file = next(2);
        let mask_file = next(3);
        let pose_label = next(4);
        let pose_class = next(5);
        let mask_path = next(6);
        rows.push(LabelAssignment {
            pose_class: pose_class.trim().parse().map_err(|e| {
                Error::InvalidParameters(format!("pose_class {:?}: {}", pose_class, e))
            })?,
            pair_id,
            timestamp,
            image_file,
            mask_file,
            pose_label,
            mask_path,
        });
    }
    Ok(rows)
}

/// Frequency of each `pose_label`, most common first, ties by label.
pub fn label_counts(assignments: &[LabelAssignment]) -> Vec<(String, usize)> {
    assignments
        .iter()
        .map(|a| a.pose_label.clone())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn assignment(pair_id: &str, label: &str, class: i32) -> LabelAssignment {
        LabelAssignment {
            pair_id: pair_id.to_string(),
            timestamp: "1712345678.5".to_string(),
            image_file: format!("{}.jpg", pair_id),
            mask_file: format!("{}_mask.png", pair_id),
            pose_label: label.to_string(),
            pose_class: class,
            mask_path: format!("out/person_masks/{}_mask.png", pair_id),
        }
    }

    #[test]
    fn test_dataframe_schema() {
        let df = assignments_dataframe(&[assignment("p1", "lying", 0)]).unwrap();
        assert_eq!(df.height(), 1);
        let names: Vec<_> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, LABEL_COLUMNS);
        assert_eq!(df.column("pose_class").unwrap().dtype(), &DataType::Int32);
    }

    #[test]
    fn test_write_replaces_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pose_labels.csv");

        write_label_table(
            &path,
            &[assignment("p1", "lying", 0), assignment("p2", "dancing", -1)],
        )
        .unwrap();
        write_label_table(&path, &[assignment("007", "fallen", 2)]).unwrap();

        let rows = read_label_table(&path).unwrap();
        assert_eq!(rows, vec![assignment("007", "fallen", 2)]);
    }

    #[test]
    fn test_header_written_for_empty_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pose_labels.csv");
        write_label_table(&path, &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next().unwrap(), LABEL_COLUMNS.join(","));
    }

    #[test]
    fn test_label_counts_order() {
        let rows = vec![
            assignment("a", "sitting", 1),
            assignment("b", "lying", 0),
            assignment("c", "sitting", 1),
            assignment("d", "fallen", 2),
        ];
        assert_eq!(
            label_counts(&rows),
            vec![
                ("sitting".to_string(), 2),
                ("fallen".to_string(), 1),
                ("lying".to_string(), 1),
            ]
        );
    }
}
