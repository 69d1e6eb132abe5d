//! Record normalization: raw API JSON to typed rows.
//!
//! Every endpoint returns either a bare JSON array or an envelope object
//! whose `data` field holds the array. A row missing a required field, or
//! carrying a null or non-numeric value where a number is required, is
//! dropped; one bad row never fails the batch. Empty or malformed input
//! yields an empty batch so charts can render a "no data" state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging::{log, obj, v_num, v_str, Domain, Level};

/// A normalized batch plus the count of rows dropped on the way in.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Normalized<T> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One user-rating observation: the metric plus whichever grouping value
/// the dataset carries (experience years, solved count, average solved
/// rating, or average solvability).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub rating: f64,
    pub group: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogTopicRecord {
    pub supertopic: String,
    pub topic: String,
    pub number_of_blogs: f64,
    pub avg_number_of_comments: Option<f64>,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub topic1: String,
    pub topic2: String,
    pub number_of_tasks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvabilityRecord {
    pub topic: String,
    pub solvability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRatingRecord {
    pub topic: String,
    pub rating: f64,
    pub number_of_tasks: f64,
}

/// The record array, whether bare or wrapped in a `{data: [...]}` envelope.
pub fn rows(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items,
            _ => &[],
        },
        _ => &[],
    }
}

/// A top-level numeric field on an envelope object (e.g. the
/// `<metric>_correlation` coefficient the rating endpoints attach).
pub fn envelope_metric(value: &Value, key: &str) -> Option<f64> {
    value.as_object().and_then(|map| finite(map.get(key)?))
}

fn finite(value: &Value) -> Option<f64> {
    let n = value.as_f64()?;
    n.is_finite().then_some(n)
}

fn num_field(row: &Value, key: &str) -> Option<f64> {
    finite(row.get(key)?)
}

/// Trimmed, non-empty string field. No case folding: topic identity is
/// whatever the source says.
fn str_field(row: &Value, key: &str) -> Option<String> {
    let s = row.get(key)?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn collect<T>(value: &Value, dataset: &str, parse: impl Fn(&Value) -> Option<T>) -> Normalized<T> {
    let raw = rows(value);
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;
    for row in raw {
        match parse(row) {
            Some(rec) => records.push(rec),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log(
            Level::Warn,
            Domain::Normalize,
            "rows_skipped",
            obj(&[
                ("dataset", v_str(dataset)),
                ("skipped", v_num(skipped as f64)),
                ("kept", v_num(records.len() as f64)),
            ]),
        );
    }
    Normalized { records, skipped }
}

/// Rating-distribution rows. `group_field` names the dataset's grouping
/// column (`time_registration_years`, `number_of_solved_problems`, ...).
pub fn ratings(value: &Value, group_field: &str) -> Normalized<RatingRecord> {
    collect(value, group_field, |row| {
        Some(RatingRecord {
            rating: num_field(row, "rating")?,
            group: num_field(row, group_field)?,
        })
    })
}

pub fn blog_topics(value: &Value) -> Normalized<BlogTopicRecord> {
    collect(value, "blogs_topics_data", |row| {
        Some(BlogTopicRecord {
            supertopic: str_field(row, "supertopic")?,
            topic: str_field(row, "topic")?,
            number_of_blogs: num_field(row, "number_of_blogs")?,
            avg_number_of_comments: num_field(row, "avg_number_of_comments"),
            avg_rating: num_field(row, "avg_rating"),
        })
    })
}

pub fn correlations(value: &Value) -> Normalized<CorrelationRecord> {
    collect(value, "topics_correlation", |row| {
        Some(CorrelationRecord {
            topic1: str_field(row, "topic1")?,
            topic2: str_field(row, "topic2")?,
            number_of_tasks: num_field(row, "number_of_tasks")?,
        })
    })
}

pub fn solvabilities(value: &Value) -> Normalized<SolvabilityRecord> {
    collect(value, "topics_solvability", |row| {
        Some(SolvabilityRecord {
            topic: str_field(row, "topic")?,
            solvability: num_field(row, "solvability")?,
        })
    })
}

pub fn topic_ratings(value: &Value) -> Normalized<TopicRatingRecord> {
    collect(value, "topics_distribution_by_rating", |row| {
        Some(TopicRatingRecord {
            topic: str_field(row, "topic")?,
            rating: num_field(row, "rating")?,
            number_of_tasks: num_field(row, "number_of_tasks")?,
        })
    })
}
