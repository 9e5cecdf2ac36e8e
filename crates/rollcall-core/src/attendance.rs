//! Attendance status and confidence thresholds.
//!
//! Two thresholds are in use and they are on different scales: batch marking
//! takes fractional confidences (0.0-1.0) while face recognition reports
//! percentages (0-100).

use crate::types::Recognition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Batch marking: fractional confidence at or above which a student is present.
pub const DEFAULT_PRESENT_THRESHOLD: f64 = 0.5;

/// Face-based marking: percentage confidence at or above which a match counts.
pub const DEFAULT_FACE_PRESENT_THRESHOLD: f32 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn from_flag(present: bool) -> Self {
        if present {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Absent
        }
    }

    pub fn is_present(self) -> bool {
        self == AttendanceStatus::Present
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            _ => Err(format!("{s:?} is not a valid attendance status")),
        }
    }
}

/// One externally recognized student with a fractional confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceEntry {
    pub id: i64,
    pub confidence: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub present: Vec<i64>,
    pub unidentifiable: Vec<i64>,
}

/// Split entries into present (`confidence >= threshold`) and unidentifiable.
///
/// Every id lands in exactly one list, in first-seen order. An id with any
/// qualifying entry is present.
pub fn partition(entries: &[ConfidenceEntry], threshold: f64) -> Partition {
    let mut seen = HashSet::new();
    let mut first_seen = Vec::new();
    let mut present_ids = HashSet::new();
    let mut present = Vec::new();

    for entry in entries {
        if seen.insert(entry.id) {
            first_seen.push(entry.id);
        }
        if entry.confidence >= threshold && present_ids.insert(entry.id) {
            present.push(entry.id);
        }
    }

    let unidentifiable = first_seen
        .into_iter()
        .filter(|id| !present_ids.contains(id))
        .collect();
    Partition { present, unidentifiable }
}

/// Recognitions that identify a student with at least `threshold_pct` confidence.
pub fn qualifying_matches(results: &[Recognition], threshold_pct: f32) -> Vec<&Recognition> {
    results
        .iter()
        .filter(|r| r.is_known() && r.confidence >= threshold_pct)
        .collect()
}
