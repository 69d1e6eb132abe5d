//! Bucketing and five-number summaries for rating-distribution boxplots.
//!
//! Each strategy is a fixed policy mapping a record's grouping value to a
//! bucket. Buckets partition the normalized input exactly; each bucket
//! carries a numeric sort key distinct from its display label so range
//! labels like "4400+" can sort after every numeric range. Quantiles use
//! linear interpolation (R-7, the d3.quantile estimator) so results are
//! reproducible bucket to bucket.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::RatingRecord;

const SOLVED_BUCKET_WIDTH: f64 = 400.0;
const SOLVED_OVERFLOW: f64 = 4400.0;
const RATING_BUCKET_WIDTH: f64 = 150.0;
const RATING_FLOOR: f64 = 800.0;
const SOLVABILITY_STEPS: f64 = 50.0; // 0.02 resolution

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStrategy {
    /// Whole-number years since registration, no range merging.
    Experience,
    /// Width-400 solved-count ranges; everything above 4400 collapses
    /// into one terminal "4400+" bucket.
    SolvedCount,
    /// Width-150 average-solved-rating ranges with floor 800; values
    /// below the floor clamp into the first bucket.
    SolvedRating,
    /// Average solvability floored to the nearest 1/50.
    Solvability,
}

impl BucketStrategy {
    /// Grouping column this strategy reads from the dataset.
    pub fn group_field(&self) -> &'static str {
        match self {
            BucketStrategy::Experience => "time_registration_years",
            BucketStrategy::SolvedCount => "number_of_solved_problems",
            BucketStrategy::SolvedRating => "avg_rating_of_solved_problems",
            BucketStrategy::Solvability => "avg_solvability_of_solved_problems",
        }
    }

    /// Endpoint suffix serving this strategy's dataset.
    pub fn endpoint(&self) -> &'static str {
        match self {
            BucketStrategy::Experience => "users_rating_distribution_by_experience",
            BucketStrategy::SolvedCount => "users_rating_distribution_by_solutions_amount",
            BucketStrategy::SolvedRating => "users_rating_distribution_by_solutions_rating",
            BucketStrategy::Solvability => "users_rating_distribution_by_solutions_solvability",
        }
    }

    fn key(&self, group: f64) -> BucketKey {
        match self {
            BucketStrategy::Experience => BucketKey {
                sort: group,
                label: fmt_number(group),
            },
            BucketStrategy::SolvedCount => {
                if group > SOLVED_OVERFLOW {
                    BucketKey {
                        sort: f64::INFINITY,
                        label: format!("{}+", SOLVED_OVERFLOW as i64),
                    }
                } else {
                    let start = (group / SOLVED_BUCKET_WIDTH).floor() * SOLVED_BUCKET_WIDTH;
                    BucketKey {
                        sort: start,
                        label: format!(
                            "{}-{}",
                            start as i64,
                            (start + SOLVED_BUCKET_WIDTH) as i64 - 1
                        ),
                    }
                }
            }
            BucketStrategy::SolvedRating => {
                // Bucket index clamps at zero so sub-floor values land in
                // the first range instead of a negative one.
                let idx = ((group - RATING_FLOOR) / RATING_BUCKET_WIDTH).floor().max(0.0);
                let start = idx * RATING_BUCKET_WIDTH + RATING_FLOOR;
                BucketKey {
                    sort: start,
                    label: format!(
                        "{}-{}",
                        start as i64,
                        (start + RATING_BUCKET_WIDTH) as i64 - 1
                    ),
                }
            }
            BucketStrategy::Solvability => {
                let snapped = (group * SOLVABILITY_STEPS).floor() / SOLVABILITY_STEPS;
                BucketKey {
                    sort: snapped,
                    label: format!("{:.2}", snapped),
                }
            }
        }
    }
}

/// Ordered bucket identity: numeric sort key plus display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketKey {
    pub sort: f64,
    pub label: String,
}

/// A bucket and the rating values that fell into it, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: BucketKey,
    pub ratings: Vec<f64>,
}

/// Five-number summary of one non-empty bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxplotSummary {
    pub key: f64,
    pub label: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Group records into buckets. Exhaustive and disjoint: every record
/// lands in exactly one bucket. Result is sorted by numeric key
/// ascending, overflow last.
pub fn partition(records: &[RatingRecord], strategy: BucketStrategy) -> Vec<Bucket> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();

    for rec in records {
        let key = strategy.key(rec.group);
        let slot = *index.entry(key.label.clone()).or_insert_with(|| {
            buckets.push(Bucket {
                key,
                ratings: Vec::new(),
            });
            buckets.len() - 1
        });
        buckets[slot].ratings.push(rec.rating);
    }

    buckets.sort_by(|a, b| {
        a.key
            .sort
            .partial_cmp(&b.key.sort)
            .unwrap_or(Ordering::Equal)
    });
    buckets
}

/// Five-number summaries per bucket, sorted by bucket key ascending.
/// Empty input yields an empty vec; empty buckets never exist by
/// construction, so no summary carries a null quartile.
pub fn summarize(records: &[RatingRecord], strategy: BucketStrategy) -> Vec<BoxplotSummary> {
    partition(records, strategy)
        .into_iter()
        .map(|bucket| {
            let mut values = bucket.ratings;
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            BoxplotSummary {
                key: bucket.key.sort,
                label: bucket.key.label,
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            }
        })
        .collect()
}

/// R-7 quantile over an ascending-sorted, non-empty slice.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (h - lo as f64)
}

fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
