//! Dense rating grid for the per-topic radial histogram.
//!
//! The chart sweeps a fixed rating axis, so the grid always covers
//! 800..=3500 in steps of 100; ratings with no tasks for the selected
//! topic become zero cells rather than gaps. Fractions are relative to
//! the topic's busiest rating so the radial bars normalize per topic.

use serde::{Deserialize, Serialize};

use crate::normalize::TopicRatingRecord;

pub const RATING_MIN: i64 = 800;
pub const RATING_MAX: i64 = 3500;
pub const RATING_STEP: i64 = 100;

/// Preselected topic when the dataset carries it.
pub const DEFAULT_TOPIC: &str = "bitmasks";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub rating: i64,
    pub count: f64,
    /// Count relative to the topic's maximum cell, in [0, 1].
    pub fraction: f64,
}

/// Sorted unique topic list for the selector.
pub fn topics(records: &[TopicRatingRecord]) -> Vec<String> {
    let mut names: Vec<String> = records.iter().map(|r| r.topic.clone()).collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// The topic to preselect: `bitmasks` when present, else the first.
pub fn default_topic(topics: &[String]) -> Option<&str> {
    if topics.iter().any(|t| t == DEFAULT_TOPIC) {
        Some(DEFAULT_TOPIC)
    } else {
        topics.first().map(|s| s.as_str())
    }
}

/// Dense grid for one topic. A topic with no rows yields all-zero cells.
pub fn grid(records: &[TopicRatingRecord], topic: &str) -> Vec<GridCell> {
    let rows: Vec<&TopicRatingRecord> =
        records.iter().filter(|r| r.topic == topic).collect();
    let max_count = rows
        .iter()
        .map(|r| r.number_of_tasks)
        .fold(0.0_f64, f64::max);

    (RATING_MIN..=RATING_MAX)
        .step_by(RATING_STEP as usize)
        .map(|rating| {
            let count = rows
                .iter()
                .find(|r| r.rating == rating as f64)
                .map(|r| r.number_of_tasks)
                .unwrap_or(0.0);
            let fraction = if max_count > 0.0 { count / max_count } else { 0.0 };
            GridCell {
                rating,
                count,
                fraction,
            }
        })
        .collect()
}
