//! Analytics aggregation and graph shaping for dashboard charts.
//!
//! Raw JSON record arrays come in from the dashboard API; chart-ready
//! structures come out: bucketed five-number summaries for boxplots,
//! node/link sets for flow and correlation diagrams, ranked heat-map
//! entries, and dense radial-histogram grids. Every aggregator is a pure
//! function over an input snapshot; nothing here touches a rendering
//! surface.

pub mod api;
pub mod boxplot;
pub mod config;
pub mod correlation;
pub mod flow;
pub mod heatmap;
pub mod logging;
pub mod normalize;
pub mod radial;
