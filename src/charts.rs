//! Chart descriptions for a BMI analysis and their SVG renderings.

use crate::bmi::{BmiAnalysis, BmiCategory};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_svg::SVGBackend;
use serde::Serialize;
use thiserror::Error;

pub const GAUGE_MAX_BMI: f64 = 40.0;
const DEGREES_PER_BMI: f64 = 4.5;

const HEALTHY_COLOR: &str = "#51cf66";
const RISK_COLOR: &str = "#ff6b6b";

impl BmiCategory {
    /// Upper bar height in the category chart.
    pub fn chart_threshold(&self) -> f64 {
        match self {
            BmiCategory::Underweight => 18.5,
            BmiCategory::Normal => 24.9,
            BmiCategory::Overweight => 29.9,
            BmiCategory::Obese => 40.0,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "#74c0fc",
            BmiCategory::Normal => "#51cf66",
            BmiCategory::Overweight => "#fcc419",
            BmiCategory::Obese => "#ff6b6b",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    pub label: &'static str,
    pub value: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub title: &'static str,
    pub y_label: &'static str,
    pub bars: Vec<Bar>,
    pub marker: f64,
    pub marker_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GaugeSegment {
    pub start_deg: f64,
    pub end_deg: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Gauge {
    pub title: &'static str,
    pub segments: Vec<GaugeSegment>,
    pub needle_angle: f64,
    /// Needle marker position in unit axes coordinates, origin bottom-left.
    pub needle_x: f64,
    pub needle_y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieSlice {
    pub label: &'static str,
    pub fraction: f64,
    pub color: &'static str,
    pub percent_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieChart {
    pub title: &'static str,
    pub slices: Vec<PieSlice>,
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to render chart: {0}")]
    Render(String),
}

fn render_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> ChartError {
    ChartError::Render(e.to_string())
}

fn rgb(hex: &str) -> RGBColor {
    let channel = |range: std::ops::Range<usize>| {
        hex.trim_start_matches('#')
            .get(range)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(0)
    };
    RGBColor(channel(0..2), channel(2..4), channel(4..6))
}

fn render_svg<F>(size: (u32, u32), draw: F) -> Result<String, ChartError>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<(), DrawingAreaErrorKind<std::io::Error>>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        draw(&root).map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

/// SVG documents for the three BMI charts.
#[derive(Debug, Clone)]
pub struct RenderedCharts {
    pub bar: String,
    pub gauge: String,
    pub pie: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BmiCharts {
    pub bar: BarChart,
    pub gauge: Gauge,
    pub pie: PieChart,
}

impl BmiCharts {
    pub fn new(analysis: &BmiAnalysis) -> Self {
        Self {
            bar: BarChart::new(analysis.bmi),
            gauge: Gauge::new(analysis.bmi),
            pie: PieChart::new(analysis.category),
        }
    }

    pub fn render(&self) -> Result<RenderedCharts, ChartError> {
        Ok(RenderedCharts {
            bar: self.bar.to_svg()?,
            gauge: self.gauge.to_svg()?,
            pie: self.pie.to_svg()?,
        })
    }
}

pub fn needle_angle(bmi: f64) -> f64 {
    bmi.min(GAUGE_MAX_BMI) * DEGREES_PER_BMI
}

impl BarChart {
    pub fn new(bmi: f64) -> Self {
        let bars = BmiCategory::all()
            .iter()
            .map(|category| Bar {
                label: category.short_name(),
                value: category.chart_threshold(),
                color: category.color(),
            })
            .collect();

        Self {
            title: "BMI Categories",
            y_label: "BMI Value",
            bars,
            marker: bmi,
            marker_label: format!("Your BMI: {}", bmi),
        }
    }

    pub fn to_svg(&self) -> Result<String, ChartError> {
        render_svg((600, 400), |root| self.draw(root))
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let slots = self.bars.len().max(1) as f64;
        let y_max = self
            .bars
            .iter()
            .map(|bar| bar.value)
            .fold(self.marker, f64::max)
            * 1.15;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(10)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..slots, 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|_| String::new())
            .y_desc(self.y_label)
            .draw()?;

        chart.draw_series(self.bars.iter().enumerate().map(|(i, bar)| {
            let x = i as f64;
            Rectangle::new(
                [(x + 0.1, 0.0), (x + 0.9, bar.value)],
                rgb(bar.color).mix(0.7).filled(),
            )
        }))?;

        let label_style =
            TextStyle::from(("sans-serif", 14).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(self.bars.iter().enumerate().map(|(i, bar)| {
            Text::new(bar.label, (i as f64 + 0.5, bar.value), label_style.clone())
        }))?;

        chart
            .draw_series(DashedLineSeries::new(
                vec![(0.0, self.marker), (slots, self.marker)],
                10,
                5,
                BLACK.stroke_width(2),
            ))?
            .label(self.marker_label.as_str())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        Ok(())
    }
}

impl Gauge {
    pub fn new(bmi: f64) -> Self {
        let segments = BmiCategory::all()
            .iter()
            .enumerate()
            .map(|(i, category)| GaugeSegment {
                start_deg: 180.0 - 45.0 * (i + 1) as f64,
                end_deg: 180.0 - 45.0 * i as f64,
                color: category.color(),
            })
            .collect();

        let needle_angle = needle_angle(bmi);
        let radians = (needle_angle + 180.0).to_radians();

        Self {
            title: "BMI Dial (0-40 Scale)",
            segments,
            needle_angle,
            needle_x: 0.5 + 0.3 * radians.cos(),
            needle_y: 0.3 + 0.3 * radians.sin(),
        }
    }

    pub fn to_svg(&self) -> Result<String, ChartError> {
        render_svg((600, 300), |root| self.draw(root))
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        const ARC_STEPS: usize = 45;

        let (width, height) = root.dim_in_pixel();
        let (cx, cy) = (width as i32 / 2, height as i32 - 20);
        let radius = 0.4 * width as f64;
        let point = |deg: f64, r: f64| {
            let rad = deg.to_radians();
            (
                cx + (r * rad.cos()).round() as i32,
                cy - (r * rad.sin()).round() as i32,
            )
        };

        for segment in &self.segments {
            let span = segment.end_deg - segment.start_deg;
            let mut wedge = vec![(cx, cy)];
            wedge.extend((0..=ARC_STEPS).map(|step| {
                point(
                    segment.start_deg + span * step as f64 / ARC_STEPS as f64,
                    radius,
                )
            }));
            root.draw(&Polygon::new(wedge, rgb(segment.color).filled()))?;
        }

        // The dial runs from the underweight side on the left to obese on the right.
        let tip = point(180.0 - self.needle_angle, radius * 0.9);
        root.draw(&PathElement::new(vec![(cx, cy), tip], BLACK.stroke_width(4)))?;
        root.draw(&Circle::new((cx, cy), 8, BLACK.filled()))?;
        root.draw(&Text::new(
            self.title,
            (cx, 10),
            TextStyle::from(("sans-serif", 16).into_font()).pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;

        Ok(())
    }
}

impl PieChart {
    pub fn new(category: BmiCategory) -> Self {
        let split = category.risk_split();
        let total = split.healthy + split.risk;
        let slice = |label, fraction: f64, color| PieSlice {
            label,
            fraction,
            color,
            percent_label: format!("{:.0}%", fraction / total * 100.0),
        };

        Self {
            title: "BMI Risk Chart",
            slices: vec![
                slice("Healthy Zone", split.healthy, HEALTHY_COLOR),
                slice("Risk Zone", split.risk, RISK_COLOR),
            ],
        }
    }

    pub fn to_svg(&self) -> Result<String, ChartError> {
        render_svg((400, 400), |root| self.draw(root))
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (width, height) = root.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2 + 10);
        let radius = 120.0;

        // Empty slices stay in the data but are not drawn.
        let drawn: Vec<&PieSlice> = self
            .slices
            .iter()
            .filter(|slice| slice.fraction > 0.0)
            .collect();
        let sizes: Vec<f64> = drawn.iter().map(|slice| slice.fraction).collect();
        let colors: Vec<RGBColor> = drawn.iter().map(|slice| rgb(slice.color)).collect();
        let labels: Vec<&str> = drawn.iter().map(|slice| slice.label).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style(("sans-serif", 14).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 12).into_font().color(&BLACK));
        root.draw(&pie)?;

        root.draw(&Text::new(
            self.title,
            (width as i32 / 2, 10),
            TextStyle::from(("sans-serif", 16).into_font()).pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmi::{analyze, BmiRecord};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_needle_angle_saturates() {
        assert!(approx(needle_angle(0.0), 0.0));
        assert!(approx(needle_angle(20.0), 90.0));
        assert!(approx(needle_angle(40.0), 180.0));
        assert!(approx(needle_angle(55.3), 180.0));
    }

    #[test]
    fn test_gauge_layout() {
        let gauge = Gauge::new(20.0);
        let spans: Vec<(f64, f64)> = gauge
            .segments
            .iter()
            .map(|s| (s.start_deg, s.end_deg))
            .collect();
        assert_eq!(
            spans,
            vec![(135.0, 180.0), (90.0, 135.0), (45.0, 90.0), (0.0, 45.0)]
        );
        assert!(approx(gauge.needle_x, 0.5));
        assert!(approx(gauge.needle_y, 0.0));

        let gauge = Gauge::new(0.0);
        assert!(approx(gauge.needle_x, 0.2));
        assert!(approx(gauge.needle_y, 0.3));
    }

    #[test]
    fn test_bar_chart() {
        let chart = BarChart::new(24.22);
        let values: Vec<(&str, f64)> = chart.bars.iter().map(|b| (b.label, b.value)).collect();
        assert_eq!(
            values,
            vec![
                ("Underweight", 18.5),
                ("Normal", 24.9),
                ("Overweight", 29.9),
                ("Obese", 40.0)
            ]
        );
        assert_eq!(chart.marker_label, "Your BMI: 24.22");

        let svg = chart.to_svg().unwrap();
        assert!(svg.contains("Your BMI: 24.22"));
        assert!(svg.contains("BMI Categories"));
        assert!(svg.contains("Overweight"));
    }

    #[test]
    fn test_pie_percent_labels() {
        let pie = PieChart::new(BmiCategory::Overweight);
        let labels: Vec<&str> = pie.slices.iter().map(|s| s.percent_label.as_str()).collect();
        assert_eq!(labels, vec!["40%", "60%"]);

        let pie = PieChart::new(BmiCategory::Normal);
        let labels: Vec<&str> = pie.slices.iter().map(|s| s.percent_label.as_str()).collect();
        assert_eq!(labels, vec!["100%", "0%"]);

        let svg = pie.to_svg().unwrap();
        assert!(svg.contains("Healthy Zone"));
        assert!(svg.contains("BMI Risk Chart"));
        assert!(!svg.contains("Risk Zone"));
    }

    #[test]
    fn test_charts_for_analysis() {
        let analysis = analyze(BmiRecord {
            height_cm: 160.0,
            weight_kg: 100.0,
        });
        let charts = BmiCharts::new(&analysis);
        assert_eq!(charts.bar.marker, 39.06);
        assert!(approx(charts.gauge.needle_angle, 39.06 * 4.5));
        assert_eq!(charts.pie.slices[0].fraction, 0.1);
        assert_eq!(charts.pie.slices[1].fraction, 0.9);

        let rendered = charts.render().unwrap();
        for svg in [&rendered.bar, &rendered.gauge, &rendered.pie] {
            assert!(svg.contains("<svg"));
            assert!(svg.trim_end().ends_with("</svg>"));
        }
        assert!(rendered.gauge.contains("BMI Dial (0-40 Scale)"));
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(rgb("#74c0fc"), RGBColor(0x74, 0xc0, 0xfc));
        assert_eq!(rgb("#ff6b6b"), RGBColor(0xff, 0x6b, 0x6b));
        assert_eq!(rgb("#zzzzzz"), RGBColor(0, 0, 0));
    }
}
