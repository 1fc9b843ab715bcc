// Inline SVG charts: grouped horizontal bars with optional error bars
//
// One group per category (benchmark), one bar per series (interpreter build).
// Missing values leave a gap in their group.

use std::fmt::Write;

use crate::escape::escape;

const COLORS: [&str; 6] = [
    "#757575", "#64b5f6", "#ffb74d", "#81c784", "#e57373", "#ba68c8",
];

const LABEL_WIDTH: f64 = 240.0;
const PLOT_WIDTH: f64 = 480.0;
const RIGHT_MARGIN: f64 = 60.0;
const TOP: f64 = 56.0;
const BOTTOM: f64 = 48.0;
const BAR_HEIGHT: f64 = 12.0;
const GROUP_GAP: f64 = 10.0;
const TICKS: usize = 5;

/// One series of a bar chart
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub name: String,
    /// One value per category
    pub values: Vec<Option<f64>>,
    /// Error bar half-widths, one per category
    pub errors: Option<Vec<Option<f64>>>,
}

/// Grouped horizontal bar chart
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

impl BarChart {
    fn error(&self, series: usize, category: usize) -> Option<f64> {
        self.series[series]
            .errors
            .as_ref()
            .and_then(|e| e.get(category).copied().flatten())
            .filter(|e| e.is_finite() && *e > 0.0)
    }

    fn value(&self, series: usize, category: usize) -> Option<f64> {
        self.series[series]
            .values
            .get(category)
            .copied()
            .flatten()
            .filter(|v| v.is_finite() && *v >= 0.0)
    }

    /// Largest extent (value plus error) across the chart
    fn x_max(&self) -> f64 {
        let mut max: f64 = 0.0;
        for s in 0..self.series.len() {
            for c in 0..self.categories.len() {
                if let Some(v) = self.value(s, c) {
                    max = max.max(v + self.error(s, c).unwrap_or(0.0));
                }
            }
        }
        if max > 0.0 {
            max * 1.05
        } else {
            1.0
        }
    }

    /// Render as a standalone `<svg>` element
    pub fn render(&self) -> String {
        let group_height = BAR_HEIGHT * self.series.len().max(1) as f64 + GROUP_GAP;
        let plot_height = group_height * self.categories.len().max(1) as f64;
        let width = LABEL_WIDTH + PLOT_WIDTH + RIGHT_MARGIN;
        let height = TOP + plot_height + BOTTOM;
        let x_max = self.x_max();
        let scale = |v: f64| LABEL_WIDTH + v / x_max * PLOT_WIDTH;

        let mut svg = String::new();
        // Writing into a String cannot fail
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="chart" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}" role="img">"#
        );
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="18" text-anchor="middle" class="chart-title">{}</text>"#,
            width / 2.0,
            escape(&self.title)
        );

        // Legend
        for (i, series) in self.series.iter().enumerate() {
            let x = LABEL_WIDTH + i as f64 * 110.0;
            let _ = write!(
                svg,
                r#"<rect y="30" x="{x:.1}" width="10" height="10" fill="{}"/><text x="{:.1}" y="39" class="legend">{}</text>"#,
                COLORS[i % COLORS.len()],
                x + 14.0,
                escape(&series.name)
            );
        }

        // Grid and ticks
        for t in 0..=TICKS {
            let value = x_max * t as f64 / TICKS as f64;
            let x = scale(value);
            let _ = write!(
                svg,
                r##"<line x1="{x:.1}" y1="{TOP:.1}" x2="{x:.1}" y2="{:.1}" stroke="#e0e0e0"/><text x="{x:.1}" y="{:.1}" text-anchor="middle" class="tick">{}</text>"##,
                TOP + plot_height,
                TOP + plot_height + 14.0,
                format_tick(value)
            );
        }
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" class="axis-label">{}</text>"#,
            LABEL_WIDTH + PLOT_WIDTH / 2.0,
            height - 8.0,
            escape(&self.x_label)
        );

        for (c, category) in self.categories.iter().enumerate() {
            let group_top = TOP + c as f64 * group_height + GROUP_GAP / 2.0;
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" class="category">{}</text>"#,
                LABEL_WIDTH - 8.0,
                group_top + (group_height - GROUP_GAP) / 2.0 + 4.0,
                escape(category)
            );

            for s in 0..self.series.len() {
                let Some(value) = self.value(s, c) else {
                    continue;
                };
                let y = group_top + s as f64 * BAR_HEIGHT;
                let _ = write!(
                    svg,
                    r#"<rect x="{LABEL_WIDTH:.1}" y="{y:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}: {}</title></rect>"#,
                    scale(value) - LABEL_WIDTH,
                    BAR_HEIGHT - 2.0,
                    COLORS[s % COLORS.len()],
                    escape(&self.series[s].name),
                    format_tick(value)
                );
                if let Some(error) = self.error(s, c) {
                    let mid = y + (BAR_HEIGHT - 2.0) / 2.0;
                    let x1 = scale((value - error).max(0.0));
                    let x2 = scale(value + error);
                    let _ = write!(
                        svg,
                        r##"<path d="M{x1:.1},{mid:.1}H{x2:.1}M{x1:.1},{:.1}V{:.1}M{x2:.1},{:.1}V{:.1}" stroke="#212121" fill="none" class="error-bar"/>"##,
                        mid - 3.0,
                        mid + 3.0,
                        mid - 3.0,
                        mid + 3.0
                    );
                }
            }
        }

        svg.push_str("</svg>");
        svg
    }
}

fn format_tick(value: f64) -> String {
    if value >= 100.0 {
        format!("{value:.0}")
    } else if value >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.4}")
    }
}
