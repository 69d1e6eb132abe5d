//! Fetch every dashboard dataset once, run the aggregation pipeline,
//! and emit the chart-ready structures as JSON lines on stdout.
//!
//! Each dataset failure is isolated: it is logged and its chart is
//! skipped, the rest still emit.

use anyhow::Result;
use serde_json::{json, Value};

use aggviz::api::{self, ApiClient};
use aggviz::boxplot::{self, BucketStrategy};
use aggviz::config::Config;
use aggviz::logging::{log, obj, v_num, v_str, Domain, Level};
use aggviz::{correlation, flow, heatmap, radial};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "start",
        obj(&[("api_base", v_str(&cfg.api_base))]),
    );
    let client = ApiClient::new(cfg);

    let (blogs, correlations, solvabilities, topic_ratings) = tokio::join!(
        api::blog_dataset(&client),
        api::correlation_dataset(&client),
        api::solvability_dataset(&client),
        api::topic_rating_dataset(&client),
    );

    if let Some(batch) = report("blogs_flow", blogs) {
        let graph = flow::build(&batch.records);
        log(
            Level::Info,
            Domain::Graph,
            "flow_built",
            obj(&[
                ("nodes", v_num(graph.nodes().len() as f64)),
                ("links", v_num(graph.links().len() as f64)),
            ]),
        );
        emit(
            "blogs_flow",
            json!({"nodes": graph.nodes(), "links": graph.links()}),
        );
    }

    if let Some(batch) = report("topics_correlation", correlations) {
        let graph = correlation::build(&batch.records);
        log(
            Level::Info,
            Domain::Graph,
            "correlation_built",
            obj(&[
                ("nodes", v_num(graph.nodes().len() as f64)),
                ("edges", v_num(graph.edges().len() as f64)),
            ]),
        );
        emit(
            "topics_correlation",
            json!({"nodes": graph.nodes(), "edges": graph.edges()}),
        );
    }

    if let Some(batch) = report("topics_solvability", solvabilities) {
        let ranked = heatmap::rank(&batch.records);
        let cells: Vec<Value> = ranked
            .iter()
            .map(|r| {
                json!({
                    "label": r.label,
                    "value": r.value,
                    "rank": r.rank,
                    "color": heatmap::ramp(r.value).hex(),
                })
            })
            .collect();
        emit("topics_solvability", json!(cells));
    }

    if let Some(batch) = report("topics_distribution_by_rating", topic_ratings) {
        let topics = radial::topics(&batch.records);
        if let Some(topic) = radial::default_topic(&topics) {
            let grid = radial::grid(&batch.records, topic);
            emit(
                "topics_distribution_by_rating",
                json!({"topics": topics, "selected": topic, "grid": grid}),
            );
        } else {
            emit(
                "topics_distribution_by_rating",
                json!({"topics": [], "selected": null, "grid": []}),
            );
        }
    }

    for strategy in [
        BucketStrategy::Experience,
        BucketStrategy::SolvedCount,
        BucketStrategy::SolvedRating,
        BucketStrategy::Solvability,
    ] {
        let fetched = api::rating_dataset(&client, strategy).await;
        if let Some(dataset) = report(strategy.endpoint(), fetched) {
            let summaries = boxplot::summarize(&dataset.records.records, strategy);
            log(
                Level::Info,
                Domain::Aggregate,
                "boxplots_built",
                obj(&[
                    ("dataset", v_str(strategy.endpoint())),
                    ("buckets", v_num(summaries.len() as f64)),
                ]),
            );
            emit(
                strategy.endpoint(),
                json!({"buckets": summaries, "correlation": dataset.correlation}),
            );
        }
    }

    log(Level::Info, Domain::System, "done", obj(&[]));
    Ok(())
}

/// Log a dataset failure and keep going; one chart never takes down the rest.
fn report<T>(chart: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log(
                Level::Error,
                Domain::Fetch,
                "dataset_failed",
                obj(&[("chart", v_str(chart)), ("error", v_str(&err.to_string()))]),
            );
            None
        }
    }
}

fn emit(chart: &str, payload: Value) {
    println!("{}", json!({"chart": chart, "payload": payload}));
}
