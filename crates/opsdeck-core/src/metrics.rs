//! Metrics query engine.
//!
//! Translates (source, metric, range) into a scoped backend query, fetches
//! the latest gauges and the time-series concurrently, and normalizes point
//! ordering for the chart. Axis/value formatting lives here too so the
//! rendering layer stays data-only.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use opsdeck_api::HubClient;
use opsdeck_api::types::{MetricLatest, MetricPoint, SourceType};

/// Gauge metrics rendered as 0-100% progress bars.
pub const GAUGE_METRICS: [&str; 3] = ["cpu_percent", "ram_percent", "disk_percent"];

// ── Range ────────────────────────────────────────────────────────────

/// Query window for the metrics tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricsRange {
    OneHour,
    SixHours,
    #[default]
    TwentyFourHours,
    SevenDays,
    ThirtyDays,
}

impl MetricsRange {
    pub const ALL: [MetricsRange; 5] = [
        Self::OneHour,
        Self::SixHours,
        Self::TwentyFourHours,
        Self::SevenDays,
        Self::ThirtyDays,
    ];

    /// Window size in hours.
    pub fn hours(self) -> i64 {
        match self {
            Self::OneHour => 1,
            Self::SixHours => 6,
            Self::TwentyFourHours => 24,
            Self::SevenDays => 168,
            Self::ThirtyDays => 720,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::TwentyFourHours => "24h",
            Self::SevenDays => "7d",
            Self::ThirtyDays => "30d",
        }
    }

    /// Long ranges switch the x-axis from time-of-day to month/day.
    pub fn is_long(self) -> bool {
        matches!(self, Self::SevenDays | Self::ThirtyDays)
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&r| r == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

// ── View ─────────────────────────────────────────────────────────────

/// What one metrics fetch produces: latest gauges keyed by metric name,
/// plus the chart series in oldest-first order.
#[derive(Debug, Clone, Default)]
pub struct MetricsView {
    pub latest_by_name: BTreeMap<String, MetricLatest>,
    pub series: Vec<MetricPoint>,
}

impl MetricsView {
    pub fn is_empty(&self) -> bool {
        self.latest_by_name.is_empty() && self.series.is_empty()
    }

    /// Gauge value for a metric name, if the latest fetch carried one.
    pub fn gauge(&self, metric_name: &str) -> Option<f64> {
        self.latest_by_name.get(metric_name).map(|m| m.value)
    }
}

// ── Fetch ────────────────────────────────────────────────────────────

/// Fetch the latest gauges and the time-series for one metric.
///
/// Both requests run concurrently. Either failing yields empty data — the
/// engine does not retry; the surrounding controller decides whether to
/// reload.
pub async fn fetch_metrics(
    client: &HubClient,
    source_type: SourceType,
    source_id: i64,
    metric_name: &str,
    range: MetricsRange,
) -> MetricsView {
    let to = Utc::now();
    let from = to - ChronoDuration::hours(range.hours());

    let (latest_res, series_res) = tokio::join!(
        client.metrics_latest(source_type, source_id),
        client.metrics_query(source_type, source_id, metric_name, from, to, "auto"),
    );

    let latest_by_name = match latest_res {
        Ok(latest) => latest
            .into_iter()
            .map(|m| (m.metric_name.clone(), m))
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "latest-gauges fetch failed");
            BTreeMap::new()
        }
    };

    let series = match series_res {
        Ok(points) => normalize_series(points),
        Err(e) => {
            tracing::debug!(error = %e, "time-series fetch failed");
            Vec::new()
        }
    };

    MetricsView {
        latest_by_name,
        series,
    }
}

/// Normalize wire order to oldest-first.
///
/// The backend answers newest-first; the only evidence is observed
/// behavior, so the check is on the data itself: reverse only when the
/// first point is newer than the last.
pub fn normalize_series(mut points: Vec<MetricPoint>) -> Vec<MetricPoint> {
    if points.len() >= 2 && points[0].recorded_at > points[points.len() - 1].recorded_at {
        points.reverse();
    }
    points
}

// ── Formatting ───────────────────────────────────────────────────────

/// X-axis tick label: "HH:mm" for intraday ranges, "MMM d" for 7d/30d.
pub fn format_x_label(ts: DateTime<Utc>, range: MetricsRange) -> String {
    if range.is_long() {
        ts.format("%b %-d").to_string()
    } else {
        ts.format("%H:%M").to_string()
    }
}

/// Full timestamp for the focused point: seconds for short ranges,
/// month/day/hour/minute for long.
pub fn format_timestamp(ts: DateTime<Utc>, range: MetricsRange) -> String {
    if range.is_long() {
        ts.format("%b %-d %H:%M").to_string()
    } else {
        ts.format("%H:%M:%S").to_string()
    }
}

/// Y-axis / gauge value formatting by metric name: percent metrics use
/// `%`, byte metrics auto-scale, everything else gets two decimals.
pub fn format_metric_value(metric_name: &str, value: f64) -> String {
    if metric_name.ends_with("_percent") {
        format!("{value:.1}%")
    } else if metric_name.contains("bytes") {
        format_bytes(value)
    } else {
        format!("{value:.2}")
    }
}

/// Auto-scaled byte display: whole bytes below 1 KB, one decimal above.
pub fn format_bytes(value: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    if value >= GB {
        format!("{:.1} GB", value / GB)
    } else if value >= MB {
        format!("{:.1} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{value:.0} B")
    }
}

/// Whether a metric renders as a 0-100% progress bar.
pub fn is_gauge_metric(metric_name: &str) -> bool {
    GAUGE_METRICS.contains(&metric_name)
}

/// Progress-bar ratio in `[0, 1]`, clamped from a 0-100 value.
pub fn gauge_ratio(value: f64) -> f64 {
    (value / 100.0).clamp(0.0, 1.0)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn point(hour: u32, value: f64) -> MetricPoint {
        MetricPoint {
            recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            value,
        }
    }

    #[test]
    fn range_hours_table() {
        assert_eq!(MetricsRange::OneHour.hours(), 1);
        assert_eq!(MetricsRange::SixHours.hours(), 6);
        assert_eq!(MetricsRange::TwentyFourHours.hours(), 24);
        assert_eq!(MetricsRange::SevenDays.hours(), 168);
        assert_eq!(MetricsRange::ThirtyDays.hours(), 720);
    }

    #[test]
    fn normalize_reverses_newest_first_keeping_length() {
        let wire = vec![point(3, 30.0), point(2, 20.0), point(1, 10.0)];
        let series = normalize_series(wire);

        assert_eq!(series.len(), 3);
        assert!(series.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));
        assert_eq!(series[0].value, 10.0);
        assert_eq!(series[2].value, 30.0);
    }

    #[test]
    fn normalize_keeps_already_ordered_series() {
        let wire = vec![point(1, 10.0), point(2, 20.0)];
        let series = normalize_series(wire);
        assert_eq!(series[0].value, 10.0);
    }

    #[test]
    fn normalize_handles_trivial_series() {
        assert!(normalize_series(Vec::new()).is_empty());
        assert_eq!(normalize_series(vec![point(1, 1.0)]).len(), 1);
    }

    #[test]
    fn x_labels_switch_with_range() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();

        assert_eq!(format_x_label(ts, MetricsRange::TwentyFourHours), "14:30");
        assert_eq!(format_x_label(ts, MetricsRange::OneHour), "14:30");
        assert_eq!(format_x_label(ts, MetricsRange::SevenDays), "May 1");
        assert_eq!(format_x_label(ts, MetricsRange::ThirtyDays), "May 1");
    }

    #[test]
    fn timestamps_carry_seconds_only_for_short_ranges() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 45).unwrap();

        assert_eq!(
            format_timestamp(ts, MetricsRange::OneHour),
            "14:30:45"
        );
        assert_eq!(
            format_timestamp(ts, MetricsRange::ThirtyDays),
            "May 1 14:30"
        );
    }

    #[test]
    fn percent_metrics_format_with_suffix() {
        assert_eq!(format_metric_value("cpu_percent", 42.35), "42.4%");
        assert_eq!(format_metric_value("disk_percent", 0.0), "0.0%");
    }

    #[test]
    fn byte_metrics_auto_scale() {
        assert_eq!(format_metric_value("net_rx_bytes", 512.0), "512 B");
        assert_eq!(format_metric_value("net_rx_bytes", 2048.0), "2.0 KB");
        assert_eq!(format_metric_value("mem_used_bytes", 5_242_880.0), "5.0 MB");
        assert_eq!(
            format_metric_value("disk_used_bytes", 2_147_483_648.0),
            "2.0 GB"
        );
    }

    #[test]
    fn other_metrics_use_two_decimals() {
        assert_eq!(format_metric_value("load_avg_1m", 1.5), "1.50");
    }

    #[test]
    fn gauge_detection_and_clamping() {
        assert!(is_gauge_metric("cpu_percent"));
        assert!(is_gauge_metric("ram_percent"));
        assert!(is_gauge_metric("disk_percent"));
        assert!(!is_gauge_metric("net_rx_bytes"));

        assert_eq!(gauge_ratio(50.0), 0.5);
        assert_eq!(gauge_ratio(-10.0), 0.0);
        assert_eq!(gauge_ratio(250.0), 1.0);
    }

    #[test]
    fn view_gauge_lookup() {
        let mut view = MetricsView::default();
        view.latest_by_name.insert(
            "cpu_percent".into(),
            MetricLatest {
                source_type: SourceType::Host,
                source_id: 5,
                metric_name: "cpu_percent".into(),
                value: 61.2,
                recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            },
        );

        assert_eq!(view.gauge("cpu_percent"), Some(61.2));
        assert_eq!(view.gauge("ram_percent"), None);
        assert!(!view.is_empty());
    }
}
