//! Chart rendering
//!
//! Consumes the analysis views and renders one SVG line chart per view,
//! one series per domain over months. Fully decoupled from the pipeline:
//! it only knows view names and their measure column.

use crate::store::AnalyticsStore;
use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info, warn};

/// Plotly's default category palette, matching the original chart styling.
const SERIES_COLORS: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// One data point read from a view: (domain, month, measure).
type ViewRow = (String, String, f64);

/// Render charts for every analysis view. Per-chart failures are logged and
/// do not stop the remaining charts.
pub fn render_all(db_path: &Path, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create chart directory: {}", output_dir.display()))?;

    // Rank charts flip the y-axis: rank 1 belongs at the top.
    let charts = [
        ("monthly_visit_changes", "visits", "Month-over-Month Website Visits", "mom_visits.svg", false),
        ("monthly_rank_changes", "rank", "Month-over-Month Global Rank (Lower is Better)", "mom_rank.svg", true),
        ("relative_ranking", "relative_score", "Relative Traffic Score", "relative_ranking.svg", false),
    ];

    let store = AnalyticsStore::open(db_path)?;

    for (view, measure, title, file_name, invert_y) in charts {
        let output = output_dir.join(file_name);
        match render_view(&store, view, measure, title, invert_y, &output) {
            Ok(true) => info!(view, chart = %output.display(), "saved chart"),
            Ok(false) => warn!(view, "no data available for chart"),
            Err(e) => error!(view, error = %e, "failed to render chart"),
        }
    }

    Ok(())
}

fn render_view(
    store: &AnalyticsStore,
    view: &str,
    measure: &str,
    title: &str,
    invert_y: bool,
    output: &Path,
) -> Result<bool> {
    let sql = format!(
        "SELECT \"Domain\", month, \"{measure}\" FROM {view} ORDER BY \"Domain\", month"
    );
    let rows: Vec<ViewRow> = store
        .query_rows(&sql, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?
        .into_iter()
        .filter_map(|(domain, month, value)| value.map(|v| (domain, month, v)))
        .collect();

    if rows.is_empty() {
        return Ok(false);
    }

    let (months, series) = series_by_month_index(&rows);
    draw_line_chart(&months, &series, title, measure, invert_y, output)?;
    Ok(true)
}

/// Pivot view rows into per-domain series over a shared, sorted month axis.
fn series_by_month_index(
    rows: &[ViewRow],
) -> (Vec<String>, BTreeMap<String, Vec<(usize, f64)>>) {
    let mut months: Vec<String> = rows.iter().map(|(_, m, _)| m.clone()).collect();
    months.sort();
    months.dedup();

    let mut series: BTreeMap<String, Vec<(usize, f64)>> = BTreeMap::new();
    for (domain, month, value) in rows {
        // Months are deduped and sorted, so the lookup cannot fail.
        if let Ok(idx) = months.binary_search(month) {
            series.entry(domain.clone()).or_default().push((idx, *value));
        }
    }

    (months, series)
}

fn draw_line_chart(
    months: &[String],
    series: &BTreeMap<String, Vec<(usize, f64)>>,
    title: &str,
    y_label: &str,
    invert_y: bool,
    output: &Path,
) -> Result<()> {
    let values: Vec<f64> = series.values().flatten().map(|(_, v)| *v).collect();
    let y_min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let y_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let pad = ((y_max - y_min) * 0.05).max(1.0);
    let y_range = if invert_y {
        (y_max + pad)..(y_min - pad)
    } else {
        (y_min - pad)..(y_max + pad)
    };
    let x_max = (months.len().saturating_sub(1)).max(1) as f64;

    let root = SVGBackend::new(output, (1024, 640)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("chart fill failed: {e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24).into_font())
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(72)
        .build_cartesian_2d(0f64..x_max, y_range)
        .map_err(|e| anyhow!("chart layout failed: {e}"))?;

    chart
        .configure_mesh()
        .x_labels(months.len().min(12))
        .x_label_formatter(&|x| {
            months
                .get(x.round() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .x_desc("Month")
        .y_desc(y_label)
        .draw()
        .map_err(|e| anyhow!("chart mesh failed: {e}"))?;

    for (i, (domain, points)) in series.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        chart
            .draw_series(LineSeries::new(
                points.iter().map(|(idx, v)| (*idx as f64, *v)),
                &color,
            ))
            .map_err(|e| anyhow!("chart series failed: {e}"))?
            .label(domain.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], &color));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| anyhow!("chart legend failed: {e}"))?;

    root.present().map_err(|e| anyhow!("chart save failed: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(domain: &str, month: &str, value: f64) -> ViewRow {
        (domain.to_string(), month.to_string(), value)
    }

    #[test]
    fn test_series_pivot_shares_month_axis() {
        let rows = vec![
            row("a.com", "2024-02", 120.0),
            row("a.com", "2024-01", 100.0),
            row("b.com", "2024-02", 90.0),
        ];

        let (months, series) = series_by_month_index(&rows);

        assert_eq!(months, vec!["2024-01", "2024-02"]);
        assert_eq!(series["a.com"], vec![(1, 120.0), (0, 100.0)]);
        assert_eq!(series["b.com"], vec![(1, 90.0)]);
    }

    #[test]
    fn test_draw_line_chart_writes_svg() {
        let rows = vec![
            row("a.com", "2024-01", 100.0),
            row("a.com", "2024-02", 120.0),
        ];
        let (months, series) = series_by_month_index(&rows);

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chart.svg");
        draw_line_chart(&months, &series, "Test", "visits", false, &output).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_inverted_axis_puts_best_rank_on_top() {
        // Two points: rank 1 (best) and rank 100 (worst). With the axis
        // flipped, the rank-1 point must sit above the rank-100 point, i.e.
        // have the smaller SVG y coordinate.
        let rows = vec![row("a.com", "2024-01", 1.0), row("a.com", "2024-02", 100.0)];
        let (months, series) = series_by_month_index(&rows);

        let dir = tempfile::tempdir().unwrap();
        let normal = dir.path().join("normal.svg");
        let inverted = dir.path().join("inverted.svg");
        draw_line_chart(&months, &series, "Rank", "rank", false, &normal).unwrap();
        draw_line_chart(&months, &series, "Rank", "rank", true, &inverted).unwrap();

        // The data line is the only polyline in the series color whose two
        // endpoints sit at different heights (grid lines are grey, the
        // legend marker is horizontal).
        let series_polyline_ys = |path: &std::path::Path| -> (f64, f64) {
            let content = std::fs::read_to_string(path).unwrap().to_lowercase();
            for chunk in content.split("<polyline").skip(1) {
                if !chunk.contains("1f77b4") {
                    continue;
                }
                let Some(points) = chunk
                    .split("points=\"")
                    .nth(1)
                    .and_then(|s| s.split('"').next())
                else {
                    continue;
                };
                let ys: Vec<f64> = points
                    .split_whitespace()
                    .filter_map(|pair| pair.split(',').nth(1))
                    .filter_map(|y| y.parse().ok())
                    .collect();
                if ys.len() == 2 && (ys[0] - ys[1]).abs() > 1.0 {
                    return (ys[0], ys[1]);
                }
            }
            panic!("series polyline not found in {}", path.display());
        };

        let (normal_first, normal_second) = series_polyline_ys(&normal);
        let (inverted_first, inverted_second) = series_polyline_ys(&inverted);

        // Normal axis: rank 1 draws near the bottom (larger y); inverted
        // axis: rank 1 draws near the top (smaller y).
        assert!(normal_first > normal_second);
        assert!(inverted_first < inverted_second);
    }

    #[test]
    fn test_render_all_without_views_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("empty.db");
        AnalyticsStore::open(&db_path).unwrap();

        // Views don't exist; every chart logs and is skipped.
        render_all(&db_path, &dir.path().join("charts")).unwrap();
    }
}
