//! Artifact encoding
//!
//! This module encodes chart datasets as Vega-Lite documents and pipeline
//! reports as JSON. Every artifact carries producer metadata so files from the
//! same run can be matched up.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::charts::{ChartKind, ChartSet};
use crate::error::SiftError;
use crate::pipeline::PipelineReport;
use crate::{PRODUCER_NAME, SIFT_VERSION};

/// Vega-Lite schema the chart documents conform to
pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Producer metadata embedded in every artifact
#[derive(Debug, Clone, Serialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub run_id: String,
}

/// Run report as written next to prepared output
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub producer: Producer,
    pub computed_at_utc: String,
    pub pipeline: &'a PipelineReport,
}

/// Encoder for chart documents and run reports
pub struct ArtifactEncoder {
    run_id: String,
}

impl Default for ArtifactEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactEncoder {
    /// Create an encoder with a fresh run ID
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific run ID
    pub fn with_run_id(run_id: String) -> Self {
        Self { run_id }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn producer(&self) -> Producer {
        Producer {
            name: PRODUCER_NAME.to_string(),
            version: SIFT_VERSION.to_string(),
            run_id: self.run_id.clone(),
        }
    }

    /// Encode one chart as a Vega-Lite document
    pub fn encode_chart(&self, kind: ChartKind, charts: &ChartSet) -> Value {
        let mut spec = match kind {
            ChartKind::ScreenTimeHistogram => histogram_spec(charts),
            ChartKind::ScreenTimeVsAnxiety => scatter_spec(charts),
            ChartKind::SleepByScreenTime => box_plot_spec(charts),
            ChartKind::SeverityByPlatform => count_plot_spec(charts),
        };

        if let Value::Object(map) = &mut spec {
            map.insert("$schema".to_string(), Value::from(VEGA_LITE_SCHEMA));
            map.insert("title".to_string(), Value::from(kind.title()));
            let meta = map
                .entry("usermeta")
                .or_insert_with(|| Value::Object(Default::default()));
            if let Value::Object(meta) = meta {
                meta.insert("chart".to_string(), json!(kind));
                meta.insert("producer".to_string(), json!(self.producer()));
                meta.insert(
                    "computed_at_utc".to_string(),
                    Value::from(Utc::now().to_rfc3339()),
                );
            }
        }

        spec
    }

    /// Encode one chart as pretty-printed JSON
    pub fn encode_chart_to_json(
        &self,
        kind: ChartKind,
        charts: &ChartSet,
    ) -> Result<String, SiftError> {
        serde_json::to_string_pretty(&self.encode_chart(kind, charts)).map_err(SiftError::JsonError)
    }

    /// Encode a pipeline report as pretty-printed JSON
    pub fn encode_report(&self, report: &PipelineReport) -> Result<String, SiftError> {
        let run_report = RunReport {
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            pipeline: report,
        };
        serde_json::to_string_pretty(&run_report).map_err(SiftError::JsonError)
    }
}

fn histogram_spec(charts: &ChartSet) -> Value {
    let hist = &charts.histogram;
    let values: Vec<Value> = hist
        .bins
        .iter()
        .map(|b| json!({ "bin_start": b.start, "bin_end": b.end, "count": b.count }))
        .collect();

    json!({
        "width": 400,
        "height": 300,
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "x": {
                "field": "bin_start",
                "type": "quantitative",
                "bin": { "binned": true },
                "title": hist.x_label,
            },
            "x2": { "field": "bin_end" },
            "y": { "field": "count", "type": "quantitative", "title": "Count" },
        },
    })
}

fn scatter_spec(charts: &ChartSet) -> Value {
    let scatter = &charts.scatter;
    let values: Vec<Value> = scatter
        .points
        .iter()
        .map(|p| {
            let mut row = serde_json::Map::new();
            row.insert(scatter.x_label.clone(), Value::from(p.x));
            row.insert(scatter.y_label.clone(), Value::from(p.y));
            Value::Object(row)
        })
        .collect();

    json!({
        "width": 400,
        "height": 300,
        "data": { "values": values },
        "mark": "point",
        "encoding": {
            "x": { "field": scatter.x_label, "type": "quantitative" },
            "y": { "field": scatter.y_label, "type": "quantitative" },
        },
    })
}

fn box_plot_spec(charts: &ChartSet) -> Value {
    let plot = &charts.box_plot;
    let order: Vec<&str> = plot.groups.iter().map(|g| g.label.as_str()).collect();

    let mut values = Vec::new();
    for group in &plot.groups {
        for v in &group.values {
            let mut row = serde_json::Map::new();
            row.insert(plot.x_label.clone(), Value::from(group.label.as_str()));
            row.insert(plot.y_label.clone(), Value::from(*v));
            values.push(Value::Object(row));
        }
    }

    let stats: Vec<Value> = plot
        .groups
        .iter()
        .map(|g| json!({ "label": g.label, "count": g.values.len(), "stats": g.stats }))
        .collect();

    json!({
        "width": 400,
        "height": 300,
        "data": { "values": values },
        "mark": { "type": "boxplot", "extent": 1.5 },
        "encoding": {
            "x": { "field": plot.x_label, "type": "ordinal", "sort": order },
            "y": { "field": plot.y_label, "type": "quantitative" },
        },
        "usermeta": { "groups": stats },
    })
}

fn count_plot_spec(charts: &ChartSet) -> Value {
    let plot = &charts.count_plot;
    let values: Vec<Value> = plot
        .counts
        .iter()
        .map(|c| {
            let mut row = serde_json::Map::new();
            row.insert(plot.x_label.clone(), Value::from(c.category.as_str()));
            row.insert(plot.hue_label.clone(), Value::from(c.hue.as_str()));
            row.insert("count".to_string(), Value::from(c.count));
            Value::Object(row)
        })
        .collect();

    json!({
        "width": 600,
        "height": 300,
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "x": {
                "field": plot.x_label,
                "type": "nominal",
                "sort": plot.categories,
                "axis": { "labelAngle": -45 },
            },
            "xOffset": { "field": plot.hue_label, "sort": plot.hues },
            "y": { "field": "count", "type": "quantitative", "title": "Count" },
            "color": { "field": plot.hue_label, "type": "nominal", "sort": plot.hues },
        },
    })
}
