//! Chart datasets
//!
//! Computes the data behind the four descriptive charts of the study:
//! - Distribution of daily screen time (histogram)
//! - Screen time vs anxiety score (scatter)
//! - Sleep duration across screen time levels (box plot)
//! - Anxiety severity across platforms (grouped counts)
//!
//! Every chart tolerates an empty table.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::ReportConfig;
use crate::types::{PreparedTable, ScreenTimeCategory};

/// The four charts of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    ScreenTimeHistogram,
    ScreenTimeVsAnxiety,
    SleepByScreenTime,
    SeverityByPlatform,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::ScreenTimeHistogram,
        ChartKind::ScreenTimeVsAnxiety,
        ChartKind::SleepByScreenTime,
        ChartKind::SeverityByPlatform,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::ScreenTimeHistogram => "Distribution of Daily Screen Time",
            ChartKind::ScreenTimeVsAnxiety => "Screen Time vs Anxiety Score",
            ChartKind::SleepByScreenTime => "Sleep Duration Across Screen Time Levels",
            ChartKind::SeverityByPlatform => "Anxiety Severity Across Platforms",
        }
    }

    /// File name stem for the rendered artifact
    pub fn file_stem(&self) -> &'static str {
        match self {
            ChartKind::ScreenTimeHistogram => "screen_time_distribution",
            ChartKind::ScreenTimeVsAnxiety => "screen_time_vs_anxiety",
            ChartKind::SleepByScreenTime => "sleep_by_screen_time",
            ChartKind::SeverityByPlatform => "severity_by_platform",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub x_label: String,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Equal-width bins spanning `[min, max]`; the last bin is closed on the right
    pub fn of(values: &[f64], bin_count: usize, x_label: &str) -> Self {
        let bins = match min_max(values) {
            Some((min, max)) if bin_count > 0 => {
                let (lo, hi) = if min == max {
                    (min - 0.5, max + 0.5)
                } else {
                    (min, max)
                };
                let width = (hi - lo) / bin_count as f64;

                let mut counts = vec![0usize; bin_count];
                for v in values {
                    let idx = (((v - lo) / width).floor() as usize).min(bin_count - 1);
                    counts[idx] += 1;
                }

                counts
                    .into_iter()
                    .enumerate()
                    .map(|(i, count)| HistogramBin {
                        start: lo + width * i as f64,
                        end: if i + 1 == bin_count {
                            hi
                        } else {
                            lo + width * (i + 1) as f64
                        },
                        count,
                    })
                    .collect()
            }
            _ => Vec::new(),
        };

        Self {
            x_label: x_label.to_string(),
            bins,
        }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPlot {
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ScatterPoint>,
}

/// Box plot geometry for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within 1.5 IQR below q1
    pub whisker_low: f64,
    /// Highest value within 1.5 IQR above q3
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let inside = sorted.iter().filter(|v| **v >= low_fence && **v <= high_fence);
        let whisker_low = inside.clone().next().copied().unwrap_or(q1);
        let whisker_high = inside.last().copied().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub label: String,
    pub values: Vec<f64>,
    /// `None` for a group without values
    pub stats: Option<BoxStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlot {
    pub x_label: String,
    pub y_label: String,
    pub groups: Vec<BoxGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountCell {
    pub category: String,
    pub hue: String,
    pub count: usize,
}

/// Counts grouped by category (x axis) and hue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountPlot {
    pub x_label: String,
    pub hue_label: String,
    /// Categories in first-appearance order
    pub categories: Vec<String>,
    /// Hues in first-appearance order
    pub hues: Vec<String>,
    /// One cell per (category, hue) pair, category-major
    pub counts: Vec<CountCell>,
}

impl CountPlot {
    /// Count `(category, hue)` pairs in a single pass
    pub fn of<'a>(
        pairs: impl Iterator<Item = (&'a str, &'a str)>,
        x_label: &str,
        hue_label: &str,
    ) -> Self {
        let mut category_index: HashMap<&str, usize> = HashMap::new();
        let mut hue_index: HashMap<&str, usize> = HashMap::new();
        let mut tally: BTreeMap<(usize, usize), usize> = BTreeMap::new();

        for (category, hue) in pairs {
            let next = category_index.len();
            let c = *category_index.entry(category).or_insert(next);
            let next = hue_index.len();
            let h = *hue_index.entry(hue).or_insert(next);
            *tally.entry((c, h)).or_insert(0) += 1;
        }

        let categories = in_appearance_order(category_index);
        let hues = in_appearance_order(hue_index);

        let mut counts = Vec::with_capacity(categories.len() * hues.len());
        for (c, category) in categories.iter().enumerate() {
            for (h, hue) in hues.iter().enumerate() {
                counts.push(CountCell {
                    category: category.clone(),
                    hue: hue.clone(),
                    count: tally.get(&(c, h)).copied().unwrap_or(0),
                });
            }
        }

        Self {
            x_label: x_label.to_string(),
            hue_label: hue_label.to_string(),
            categories,
            hues,
            counts,
        }
    }

    pub fn count(&self, category: &str, hue: &str) -> usize {
        self.counts
            .iter()
            .find(|c| c.category == category && c.hue == hue)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

fn in_appearance_order(index: HashMap<&str, usize>) -> Vec<String> {
    let mut labels = vec![String::new(); index.len()];
    for (label, i) in index {
        labels[i] = label.to_string();
    }
    labels
}

/// Data for all four charts of a prepared table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub histogram: Histogram,
    pub scatter: ScatterPlot,
    pub box_plot: BoxPlot,
    pub count_plot: CountPlot,
}

impl ChartSet {
    pub fn from_table(table: &PreparedTable, config: &ReportConfig) -> Self {
        let records = table.records();

        let screen_times: Vec<f64> = records
            .iter()
            .map(|r| r.record.daily_screen_time_hours)
            .collect();
        let histogram = Histogram::of(
            &screen_times,
            config.histogram_bins,
            "Daily_Screen_Time_Hours",
        );

        let scatter = ScatterPlot {
            x_label: "Daily_Screen_Time_Hours".to_string(),
            y_label: "GAD_7_Score".to_string(),
            points: records
                .iter()
                .map(|r| ScatterPoint {
                    x: r.record.daily_screen_time_hours,
                    y: r.record.gad_7_score,
                })
                .collect(),
        };

        let groups = ScreenTimeCategory::ALL
            .iter()
            .map(|category| {
                let values: Vec<f64> = records
                    .iter()
                    .filter(|r| r.screen_time_category == Some(*category))
                    .map(|r| r.record.sleep_duration_hours)
                    .collect();
                BoxGroup {
                    label: category.label().to_string(),
                    stats: BoxStats::of(&values),
                    values,
                }
            })
            .collect();
        let box_plot = BoxPlot {
            x_label: "Screen_Time_Category".to_string(),
            y_label: "Sleep_Duration_Hours".to_string(),
            groups,
        };

        let count_plot = CountPlot::of(
            records
                .iter()
                .map(|r| (r.record.primary_platform.as_str(), r.record.gad_7_severity.as_str())),
            "Primary_Platform",
            "GAD_7_Severity",
        );

        Self {
            histogram,
            scatter,
            box_plot,
            count_plot,
        }
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// Linearly interpolated quantile of sorted, non-empty values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiftConfig;
    use crate::ingest::TableReader;
    use crate::pipeline::prepare;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.5, 1.0, 2.0, 2.0, 3.5, 10.0];
        let hist = Histogram::of(&values, 30, "x");

        assert_eq!(hist.bins.len(), 30);
        assert_eq!(hist.total(), 6);
        assert_eq!(hist.bins[0].start, 0.5);
        assert_eq!(hist.bins[29].end, 10.0);
        // Maximum lands in the closed last bin
        assert_eq!(hist.bins[29].count, 1);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let hist = Histogram::of(&[4.0, 4.0], 2, "x");
        assert_eq!(hist.bins[0].start, 3.5);
        assert_eq!(hist.bins[1].end, 4.5);
        assert_eq!(hist.bins[1].count, 2);
    }

    #[test]
    fn test_histogram_empty() {
        let hist = Histogram::of(&[], 30, "x");
        assert!(hist.bins.is_empty());
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn test_box_stats() {
        let stats = BoxStats::of(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 4.0);
        assert_eq!(stats.outliers, vec![100.0]);
    }

    #[test]
    fn test_box_stats_interpolates() {
        let stats = BoxStats::of(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn test_box_stats_empty() {
        assert_eq!(BoxStats::of(&[]), None);
    }

    #[test]
    fn test_count_plot_orders_by_appearance() {
        let pairs = [
            ("TikTok", "Mild"),
            ("Instagram", "Severe"),
            ("TikTok", "Mild"),
            ("TikTok", "Severe"),
        ];
        let plot = CountPlot::of(pairs.iter().copied(), "p", "s");

        assert_eq!(plot.categories, vec!["TikTok", "Instagram"]);
        assert_eq!(plot.hues, vec!["Mild", "Severe"]);
        assert_eq!(plot.counts.len(), 4);
        assert_eq!(plot.count("TikTok", "Mild"), 2);
        assert_eq!(plot.count("Instagram", "Mild"), 0);
        assert_eq!(plot.count("Instagram", "Severe"), 1);
    }

    #[test]
    fn test_count_plot_consumes_pairs_once() {
        let platforms = ["A", "B", "C"];
        let severities = ["Mild", "Severe"];
        let mut n = 0usize;
        // from_fn is not Clone, so the pairs can only be walked once
        let pairs = std::iter::from_fn(|| {
            if n == 600 {
                return None;
            }
            let pair = (platforms[n % 3], severities[n % 2]);
            n += 1;
            Some(pair)
        });

        let plot = CountPlot::of(pairs, "p", "s");

        assert_eq!(plot.categories, vec!["A", "B", "C"]);
        assert_eq!(plot.hues, vec!["Mild", "Severe"]);
        assert_eq!(
            plot.counts.iter().map(|c| c.category.as_str()).collect::<Vec<_>>(),
            vec!["A", "A", "B", "B", "C", "C"]
        );
        assert_eq!(plot.counts.iter().map(|c| c.count).sum::<usize>(), 600);
        assert_eq!(plot.count("A", "Mild"), 100);
        assert_eq!(plot.count("B", "Severe"), 100);
    }

    #[test]
    fn test_chart_set_from_prepared() {
        let raw = TableReader::parse_str(
            "\
Age,Daily_Screen_Time_Hours,Sleep_Duration_Hours,GAD_7_Score,PHQ_9_Score,Primary_Platform,GAD_7_Severity
21,1.5,8,3,2,YouTube,Minimal
22,4,7,6,5,Instagram,Mild
23,4.5,6.5,8,7,Instagram,Mild
24,0,9,1,1,YouTube,Minimal
",
            &SiftConfig::default(),
        )
        .unwrap();
        let charts = ChartSet::from_table(&prepare(&raw), &Default::default());

        assert_eq!(charts.histogram.total(), 4);
        assert_eq!(charts.scatter.points.len(), 4);
        assert_eq!(charts.scatter.points[1], ScatterPoint { x: 4.0, y: 6.0 });

        let labels: Vec<&str> = charts.box_plot.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Low", "Moderate", "High", "Very High"]);
        assert_eq!(charts.box_plot.groups[0].values, vec![8.0]);
        assert_eq!(charts.box_plot.groups[1].values, vec![7.0, 6.5]);
        assert!(charts.box_plot.groups[2].stats.is_none());

        assert_eq!(charts.count_plot.count("YouTube", "Minimal"), 2);
        assert_eq!(charts.count_plot.count("Instagram", "Mild"), 2);
    }

    #[test]
    fn test_chart_set_empty_table() {
        let raw = TableReader::parse_str(
            "Age,Daily_Screen_Time_Hours,Sleep_Duration_Hours,GAD_7_Score,PHQ_9_Score,Primary_Platform,GAD_7_Severity\n",
            &SiftConfig::default(),
        )
        .unwrap();
        let charts = ChartSet::from_table(&prepare(&raw), &Default::default());

        assert!(charts.histogram.bins.is_empty());
        assert!(charts.scatter.points.is_empty());
        assert_eq!(charts.box_plot.groups.len(), 4);
        assert!(charts.box_plot.groups.iter().all(|g| g.stats.is_none()));
        assert!(charts.count_plot.counts.is_empty());
    }
}
