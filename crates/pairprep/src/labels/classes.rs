// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Class assigned to labels that are not in the mapping.
pub const UNKNOWN_CLASS: i32 = -1;

/// Closed mapping from free-text pose labels to integer classes.
///
/// The mapping is passed to the converter rather than baked in, so other
/// label taxonomies can reuse the pipeline. Lookups are exact and case
/// sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassMapping(BTreeMap<String, i32>);

impl Default for ClassMapping {
    /// The pose taxonomy: lying, sitting, fallen, empty, uncertain.
    fn default() -> Self {
        Self::from_pairs([
            ("lying", 0),
            ("sitting", 1),
            ("fallen", 2),
            ("empty", 3),
            ("uncertain", 4),
        ])
    }
}

impl ClassMapping {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Class of `label`, or [`UNKNOWN_CLASS`] when the label is not mapped.
    pub fn class_of(&self, label: &str) -> i32 {
        self.0.get(label).copied().unwrap_or(UNKNOWN_CLASS)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
