//! End-to-end pipeline tests: raw API-shaped JSON through normalization
//! into each aggregator, checking the invariants a renderer relies on.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use aggviz::api::{self, DataSource, Generation};
use aggviz::boxplot::{self, BucketStrategy};
use aggviz::{correlation, flow, heatmap, normalize, radial};

/// Serves one canned body per endpoint, with an optional per-endpoint
/// delay to simulate slow responses.
struct FakeApi {
    responses: Vec<(&'static str, Value, u64)>,
}

#[async_trait]
impl DataSource for FakeApi {
    async fn get_json(&self, endpoint: &str) -> Result<Value> {
        for (name, body, delay_ms) in &self.responses {
            if *name == endpoint {
                if *delay_ms > 0 {
                    tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                }
                return Ok(body.clone());
            }
        }
        anyhow::bail!("no response for {}", endpoint)
    }
}

fn rating_rows() -> Value {
    json!({
        "data": [
            {"rating": 1600, "number_of_solved_problems": 120},
            {"rating": 1450, "number_of_solved_problems": 380},
            {"rating": 2100, "number_of_solved_problems": 4399},
            {"rating": 2900, "number_of_solved_problems": 4401},
            {"rating": 3100, "number_of_solved_problems": 9000},
            {"rating": null, "number_of_solved_problems": 10},
        ],
        "solutions_amount_correlation": 0.81,
    })
}

#[tokio::test]
async fn boxplot_pipeline_from_raw_json() {
    let api = FakeApi {
        responses: vec![(
            "users_rating_distribution_by_solutions_amount",
            rating_rows(),
            0,
        )],
    };

    let dataset = api::rating_dataset(&api, BucketStrategy::SolvedCount)
        .await
        .unwrap();
    assert_eq!(dataset.records.skipped, 1);
    assert_eq!(dataset.correlation, Some(0.81));

    let summaries = boxplot::summarize(&dataset.records.records, BucketStrategy::SolvedCount);

    // 120 and 380 share [0,399]; 4399 sits in [4000,4399]; 4401 and 9000
    // share the overflow bucket, which sorts last.
    let labels: Vec<&str> = summaries.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["0-399", "4000-4399", "4400+"]);
    assert!(summaries.last().unwrap().key.is_infinite());

    for s in &summaries {
        assert!(s.min <= s.q1 && s.q1 <= s.median && s.median <= s.q3 && s.q3 <= s.max);
    }
    assert_eq!(summaries[0].median, 1525.0);

    // Partition covers every normalized record exactly once.
    let buckets = boxplot::partition(&dataset.records.records, BucketStrategy::SolvedCount);
    let total: usize = buckets.iter().map(|b| b.ratings.len()).sum();
    assert_eq!(total, dataset.records.records.len());
}

#[tokio::test]
async fn flow_pipeline_from_raw_json() {
    let api = FakeApi {
        responses: vec![(
            "blogs_topics_data",
            json!([
                {"supertopic": "X", "topic": "Y", "number_of_blogs": 3},
                {"supertopic": "X", "topic": "Z", "number_of_blogs": 2},
                {"supertopic": "W", "topic": "Y2", "number_of_blogs": 7},
                {"supertopic": "bad row"},
            ]),
            0,
        )],
    };

    let batch = api::blog_dataset(&api).await.unwrap();
    assert_eq!(batch.skipped, 1);

    let graph = flow::build(&batch.records);
    assert_eq!(graph.nodes().len(), 5);
    assert_eq!(graph.links().len(), 3);

    let collapsed = graph.view(None);
    assert_eq!(collapsed.nodes.len(), 2);
    assert!(collapsed.links.is_empty());

    let expanded = graph.view(Some("X"));
    let names: Vec<&str> = expanded.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["X", "Y", "Z", "W"]);
    assert_eq!(expanded.links.len(), 2);
}

#[tokio::test]
async fn correlation_pipeline_drops_mirrored_pairs() {
    let api = FakeApi {
        responses: vec![(
            "topics_correlation",
            json!([
                {"topic1": "dp", "topic2": "dp", "number_of_tasks": 900},
                {"topic1": "dp", "topic2": "graphs", "number_of_tasks": 400},
                {"topic1": "graphs", "topic2": "dp", "number_of_tasks": 400},
                {"topic1": "graphs", "topic2": "trees", "number_of_tasks": 150},
            ]),
            0,
        )],
    };

    let batch = api::correlation_dataset(&api).await.unwrap();
    let graph = correlation::build(&batch.records);

    // The mirrored {graphs,dp} row is dropped: one edge, no double count.
    assert_eq!(graph.edges().len(), 2);
    let dp = &graph.nodes()[graph.node_id("dp").unwrap()];
    assert_eq!(dp.weight, 1300.0); // 900 self + 400 edge, counted once

    let graphs_id = graph.node_id("graphs").unwrap();
    let top = graph.top_neighbors(graphs_id, correlation::DEFAULT_NEIGHBORS);
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].value, 400.0);
}

#[tokio::test]
async fn heatmap_pipeline_excludes_sentinel() {
    let api = FakeApi {
        responses: vec![(
            "topics_solvability",
            json!([
                {"topic": "*special", "solvability": 0.99},
                {"topic": "dp", "solvability": 0.55},
                {"topic": "greedy", "solvability": 0.83},
            ]),
            0,
        )],
    };

    let batch = api::solvability_dataset(&api).await.unwrap();
    let ranked = heatmap::rank(&batch.records);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].label, "greedy");
    assert_eq!(ranked[0].rank, 1);

    // Ramp output stays inside the endpoint colors for in-domain values.
    let color = heatmap::ramp(ranked[1].value);
    assert!(color.r >= heatmap::RAMP_LOW.r && color.r <= heatmap::RAMP_HIGH.r);
}

#[tokio::test]
async fn radial_pipeline_builds_dense_grid() {
    let api = FakeApi {
        responses: vec![(
            "topics_distribution_by_rating",
            json!([
                {"topic": "bitmasks", "rating": 1200, "number_of_tasks": 40},
                {"topic": "bitmasks", "rating": 1800, "number_of_tasks": 10},
                {"topic": "dp", "rating": 900, "number_of_tasks": 5},
            ]),
            0,
        )],
    };

    let batch = api::topic_rating_dataset(&api).await.unwrap();
    let topics = radial::topics(&batch.records);
    let selected = radial::default_topic(&topics).unwrap();
    assert_eq!(selected, "bitmasks");

    let grid = radial::grid(&batch.records, selected);
    assert_eq!(grid.len(), 28);
    let busiest = grid.iter().find(|c| c.rating == 1200).unwrap();
    assert_eq!(busiest.fraction, 1.0);
    let quiet = grid.iter().find(|c| c.rating == 1800).unwrap();
    assert_eq!(quiet.fraction, 0.25);
    assert_eq!(grid.iter().filter(|c| c.count > 0.0).count(), 2);
}

#[tokio::test]
async fn stale_response_loses_to_newer_fetch() {
    // Two overlapping fetches of the same chart: the one started later
    // resolves first and must win; the slow earlier response is stale.
    let slow = FakeApi {
        responses: vec![("topics_solvability", json!([{"topic": "old", "solvability": 0.6}]), 80)],
    };
    let fast = FakeApi {
        responses: vec![("topics_solvability", json!([{"topic": "new", "solvability": 0.7}]), 0)],
    };

    let generation = Generation::new();
    let first_stamp = generation.begin();
    let first = api::solvability_dataset(&slow);
    let second_stamp = generation.begin();
    let second = api::solvability_dataset(&fast);

    let mut applied: Vec<String> = Vec::new();
    let (first_res, second_res) = tokio::join!(first, second);
    // Responses apply in arrival order; stamps decide acceptance.
    if generation.is_current(second_stamp) {
        applied.push(second_res.unwrap().records[0].topic.clone());
    }
    if generation.is_current(first_stamp) {
        applied.push(first_res.unwrap().records[0].topic.clone());
    }

    assert_eq!(applied, ["new"]);
}

#[tokio::test]
async fn dataset_failures_are_isolated() {
    let api = FakeApi {
        responses: vec![(
            "topics_solvability",
            json!([{"topic": "dp", "solvability": 0.6}]),
            0,
        )],
    };

    // The correlation endpoint is missing and fails; solvability still loads.
    assert!(api::correlation_dataset(&api).await.is_err());
    let batch = api::solvability_dataset(&api).await.unwrap();
    assert_eq!(batch.records.len(), 1);
}

#[test]
fn aggregators_idempotent_over_shared_input() {
    let value = json!([
        {"topic1": "a", "topic2": "b", "number_of_tasks": 10},
        {"topic1": "b", "topic2": "a", "number_of_tasks": 10},
    ]);
    let batch = normalize::correlations(&value);
    assert_eq!(
        correlation::build(&batch.records),
        correlation::build(&batch.records)
    );
}
