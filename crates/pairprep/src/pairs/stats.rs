// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Timing-error statistics and duplicate frame detection.

use super::types::PairingRecord;
use crate::Error;
use std::{collections::BTreeMap, fmt};

/// Labels of the fixed error buckets `[0,5) [5,10) [10,15) [15,∞)` ms.
pub const BUCKET_LABELS: [&str; 4] = ["< 5 ms", "5-10 ms", "10-15 ms", ">= 15 ms"];

/// Bucket index for a timing error in milliseconds.
pub fn bucket_index(error_ms: f64) -> usize {
    if error_ms < 5.0 {
        0
    } else if error_ms < 10.0 {
        1
    } else if error_ms < 15.0 {
        2
    } else {
        3
    }
}

/// Histogram of timing errors over the fixed buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorHistogram {
    /// Count per bucket, in [`BUCKET_LABELS`] order.
    pub counts: [usize; 4],
    /// Number of records the histogram was built from.
    pub total: usize,
}

impl ErrorHistogram {
    pub fn from_records(records: &[PairingRecord]) -> Self {
        let mut counts = [0usize; 4];
        for record in records {
            counts[bucket_index(record.rgb_error_ms)] += 1;
        }
        Self {
            counts,
            total: records.len(),
        }
    }

    /// Share of records in `bucket`, in percent of the total record count.
    pub fn percentage(&self, bucket: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.counts[bucket] as f64 / self.total as f64 * 100.0
        }
    }

    /// `(label, count, percentage)` for each bucket.
    pub fn buckets(&self) -> impl Iterator<Item = (&'static str, usize, f64)> + '_ {
        BUCKET_LABELS
            .iter()
            .enumerate()
            .map(|(i, label)| (*label, self.counts[i], self.percentage(i)))
    }
}

/// A record singled out by the arg-max/arg-min search.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremeRecord {
    /// Position in the manifest.
    pub position: usize,
    pub pair_id: String,
    pub rgb_error_ms: f64,
}

impl ExtremeRecord {
    fn new(position: usize, record: &PairingRecord) -> Self {
        Self {
            position,
            pair_id: record.pair_id.clone(),
            rgb_error_ms: record.rgb_error_ms,
        }
    }
}

/// Aggregate timing-error statistics over a whole manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorStatistics {
    pub count: usize,
    pub mean_ms: f64,
    /// Largest error; the first record wins ties.
    pub max: ExtremeRecord,
    /// Smallest error; the first record wins ties.
    pub min: ExtremeRecord,
    pub histogram: ErrorHistogram,
}

impl ErrorStatistics {
    /// Compute statistics over every record.
    ///
    /// # Errors
    /// [`Error::EmptyManifest`] when `records` is empty, since the mean is
    /// undefined.
    pub fn compute(records: &[PairingRecord]) -> Result<Self, Error> {
        let first = records.first().ok_or(Error::EmptyManifest)?;

        let mut sum = 0.0;
        let mut max = (0usize, first);
        let mut min = (0usize, first);
        for (position, record) in records.iter().enumerate() {
            sum += record.rgb_error_ms;
            // Strict comparisons keep the earliest record on ties.
            if record.rgb_error_ms > max.1.rgb_error_ms {
                max = (position, record);
            }
            if record.rgb_error_ms < min.1.rgb_error_ms {
                min = (position, record);
            }
        }

        Ok(Self {
            count: records.len(),
            mean_ms: sum / records.len() as f64,
            max: ExtremeRecord::new(max.0, max.1),
            min: ExtremeRecord::new(min.0, min.1),
            histogram: ErrorHistogram::from_records(records),
        })
    }
}

impl fmt::Display for ErrorStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "║ Mean error:  {:.2} ms", self.mean_ms)?;
        writeln!(
            f,
            "║ Max error:   {:.2} ms (pair {})",
            self.max.rgb_error_ms, self.max.pair_id
        )?;
        writeln!(
            f,
            "║ Min error:   {:.2} ms (pair {})",
            self.min.rgb_error_ms, self.min.pair_id
        )?;
        writeln!(f, "║ Error distribution:")?;
        for (label, count, pct) in self.histogram.buckets() {
            writeln!(f, "║   {:<9} {} pairs ({:.1}%)", label, count, pct)?;
        }
        Ok(())
    }
}

/// An RGB frame used by more than one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReusedFrame {
    pub rgb_frame_idx: u64,
    /// Pairs sharing the frame, in manifest order.
    pub pair_ids: Vec<String>,
}

/// RGB frame reuse across the manifest.
///
/// Reuse is a warning, not an error: the pairing step may deliberately match
/// one RGB frame to several thermal frames when the RGB camera runs slower.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Number of records.
    pub total: usize,
    /// Number of distinct `rgb_frame_idx` values.
    pub unique: usize,
    /// Frames used more than once, ordered by frame index.
    pub reused: Vec<ReusedFrame>,
}

impl DuplicateReport {
    pub fn from_records(records: &[PairingRecord]) -> Self {
        let mut usage: BTreeMap<u64, Vec<String>> = BTreeMap::new();
        for record in records {
            usage
                .entry(record.rgb_frame_idx)
                .or_default()
                .push(record.pair_id.clone());
        }

        let unique = usage.len();
        let reused = usage
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(rgb_frame_idx, pair_ids)| ReusedFrame {
                rgb_frame_idx,
                pair_ids,
            })
            .collect();

        Self {
            total: records.len(),
            unique,
            reused,
        }
    }

    pub fn has_duplicates(&self) -> bool {
        self.unique < self.total
    }
}
