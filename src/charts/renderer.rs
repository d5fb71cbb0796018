//! Static Chart Renderer
//! Draws the three report charts with plotters and saves them as PNG files.
//!
//! Charts:
//! 1. global_new_cases.png: daily new cases summed over all locations (line)
//! 2. top_10_countries_total_cases.png: ten highest peak totals (bars + value labels)
//! 3. monthly_trend.png: mean daily new cases per calendar month (line + markers)
//!
//! Figures are sized in inches and rasterized at the configured DPI, so font
//! sizes are given in points and scaled to pixels.

use crate::charts::series::{
    daily_new_cases, monthly_mean_new_cases, top_locations_by_total_cases, YearMonth,
};
use crate::stats::format_grouped;
use anyhow::Context;
use chrono::{NaiveDate, TimeDelta};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::{DataFrame, PolarsError};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const LINE_BLUE: RGBColor = RGBColor(31, 119, 180);
const BAR_ORANGE: RGBColor = RGBColor(255, 165, 0);
const GRID: RGBColor = RGBColor(176, 176, 176);

/// Number of locations in the bar chart.
pub const TOP_N: usize = 10;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("No data for {0}")]
    NoData(&'static str),
    #[error("Polars error: {0}")]
    Data(#[from] PolarsError),
    #[error("Drawing failed: {0:#}")]
    Draw(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    GlobalNewCases,
    TopCountries,
    MonthlyTrend,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::GlobalNewCases,
        ChartKind::TopCountries,
        ChartKind::MonthlyTrend,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::GlobalNewCases => "global_new_cases.png",
            ChartKind::TopCountries => "top_10_countries_total_cases.png",
            ChartKind::MonthlyTrend => "monthly_trend.png",
        }
    }

    /// Progress line printed before the chart is drawn.
    pub fn progress_label(self) -> &'static str {
        match self {
            ChartKind::GlobalNewCases => "Generating global new cases trend chart...",
            ChartKind::TopCountries => "Generating top 10 countries chart...",
            ChartKind::MonthlyTrend => "Generating monthly trend chart...",
        }
    }

    /// Figure size in inches.
    fn figure_inches(self) -> (f64, f64) {
        match self {
            ChartKind::TopCountries => (12.0, 7.0),
            _ => (12.0, 6.0),
        }
    }
}

/// Result of one chart.
#[derive(Debug)]
pub struct ChartOutcome {
    pub kind: ChartKind,
    pub result: Result<PathBuf, ChartError>,
}

impl ChartOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Pixel geometry for one figure.
#[derive(Debug, Clone, Copy)]
struct Canvas {
    width: u32,
    height: u32,
    dpi: u32,
}

impl Canvas {
    fn new(kind: ChartKind, dpi: u32) -> Self {
        let (w, h) = kind.figure_inches();
        Self {
            width: (w * dpi as f64).round() as u32,
            height: (h * dpi as f64).round() as u32,
            dpi,
        }
    }

    /// Points to pixels.
    fn pt(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    fn px(&self, points: f64) -> u32 {
        self.pt(points).round() as u32
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn buffer(&self) -> Vec<u8> {
        vec![0u8; self.width as usize * self.height as usize * 3]
    }
}

/// Writes chart images into one output directory.
pub struct ChartRenderer {
    output_dir: PathBuf,
    dpi: u32,
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            dpi,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if needed. An existing directory is fine.
    pub fn prepare_output_dir(&self) -> Result<(), ChartError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ChartError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Render every chart. Each chart fails on its own; only a missing output
    /// directory stops all of them.
    pub fn render_all(&self, df: &DataFrame) -> Result<Vec<ChartOutcome>, ChartError> {
        self.render_all_with(df, |_| {})
    }

    /// Like [`render_all`](Self::render_all), calling `before` ahead of each chart.
    pub fn render_all_with(
        &self,
        df: &DataFrame,
        mut before: impl FnMut(ChartKind),
    ) -> Result<Vec<ChartOutcome>, ChartError> {
        self.prepare_output_dir()?;
        Ok(ChartKind::ALL
            .iter()
            .map(|&kind| {
                before(kind);
                let result = self.render(kind, df);
                if let Err(e) = &result {
                    warn!(chart = kind.file_name(), error = %e, "chart failed");
                }
                ChartOutcome { kind, result }
            })
            .collect())
    }

    /// Render a single chart into the output directory.
    pub fn render(&self, kind: ChartKind, df: &DataFrame) -> Result<PathBuf, ChartError> {
        let canvas = Canvas::new(kind, self.dpi);
        let mut pixels = canvas.buffer();

        match kind {
            ChartKind::GlobalNewCases => {
                let series = daily_new_cases(df)?;
                if series.is_empty() {
                    return Err(ChartError::NoData("global new cases"));
                }
                draw_global_new_cases(&mut pixels, canvas, &series).map_err(ChartError::Draw)?;
            }
            ChartKind::TopCountries => {
                let top = top_locations_by_total_cases(df, TOP_N)?;
                if top.is_empty() {
                    return Err(ChartError::NoData("top countries"));
                }
                draw_top_countries(&mut pixels, canvas, &top).map_err(ChartError::Draw)?;
            }
            ChartKind::MonthlyTrend => {
                let monthly = monthly_mean_new_cases(df)?;
                if monthly.is_empty() {
                    return Err(ChartError::NoData("monthly trend"));
                }
                draw_monthly_trend(&mut pixels, canvas, &monthly).map_err(ChartError::Draw)?;
            }
        }

        let path = self.output_dir.join(kind.file_name());
        write_png(&path, &pixels, canvas.size(), self.dpi)?;
        debug!(path = %path.display(), "chart saved");
        Ok(path)
    }
}

/// Upper bound of the value axis with some headroom.
fn value_ceiling(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn draw_global_new_cases(
    pixels: &mut [u8],
    canvas: Canvas,
    series: &[(NaiveDate, f64)],
) -> anyhow::Result<()> {
    let root = BitMapBackend::with_buffer(pixels, canvas.size()).into_drawing_area();
    root.fill(&WHITE)?;

    let start = series[0].0;
    let points: Vec<(i64, f64)> = series
        .iter()
        .map(|(date, value)| ((*date - start).num_days(), *value))
        .collect();
    let last_day = points.last().map(|p| p.0).unwrap_or(0).max(1);
    let y_max = value_ceiling(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Global Daily COVID-19 New Cases",
            ("sans-serif", canvas.pt(14.0)),
        )
        .margin(canvas.px(20.0))
        .x_label_area_size(canvas.px(70.0))
        .y_label_area_size(canvas.px(80.0))
        .build_cartesian_2d(0i64..last_day, 0f64..y_max)
        .context("building chart axes")?;

    let date_label = |offset: &i64| {
        (start + TimeDelta::days(*offset))
            .format("%Y-%m-%d")
            .to_string()
    };
    let value_label = |v: &f64| format_grouped(*v, 0);
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("New Cases")
        .axis_desc_style(("sans-serif", canvas.pt(12.0)))
        .x_labels(12)
        .x_label_formatter(&date_label)
        .y_label_formatter(&value_label)
        .x_label_style(
            ("sans-serif", canvas.pt(10.0))
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_style(("sans-serif", canvas.pt(10.0)))
        .bold_line_style(GRID.mix(0.7))
        .light_line_style(TRANSPARENT)
        .draw()?;

    chart.draw_series(LineSeries::new(
        points,
        LINE_BLUE.stroke_width(canvas.px(2.0)),
    ))?;

    root.present()?;
    Ok(())
}

fn draw_top_countries(
    pixels: &mut [u8],
    canvas: Canvas,
    top: &[(String, f64)],
) -> anyhow::Result<()> {
    let root = BitMapBackend::with_buffer(pixels, canvas.size()).into_drawing_area();
    root.fill(&WHITE)?;

    let n = top.len() as u32;
    let y_max = value_ceiling(top.iter().map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Top 10 Countries by Total COVID-19 Cases",
            ("sans-serif", canvas.pt(14.0)),
        )
        .margin(canvas.px(20.0))
        .x_label_area_size(canvas.px(110.0))
        .y_label_area_size(canvas.px(90.0))
        .build_cartesian_2d((0u32..n).into_segmented(), 0f64..y_max)
        .context("building chart axes")?;

    let name_label = |segment: &SegmentValue<u32>| match segment {
        SegmentValue::CenterOf(i) => top
            .get(*i as usize)
            .map(|(name, _)| name.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };
    let value_label = |v: &f64| format_grouped(*v, 0);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Country")
        .y_desc("Total Cases")
        .axis_desc_style(("sans-serif", canvas.pt(12.0)))
        .x_labels(top.len())
        .x_label_formatter(&name_label)
        .y_label_formatter(&value_label)
        .x_label_style(
            ("sans-serif", canvas.pt(10.0))
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_style(("sans-serif", canvas.pt(10.0)))
        .bold_line_style(GRID.mix(0.7))
        .light_line_style(TRANSPARENT)
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_ORANGE.filled())
            .margin(canvas.px(12.0))
            .data(top.iter().enumerate().map(|(i, (_, v))| (i as u32, *v))),
    )?;

    let annotation = TextStyle::from(("sans-serif", canvas.pt(10.0)).into_font())
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(top.iter().enumerate().map(|(i, (_, v))| {
        Text::new(
            format_grouped(*v, 0),
            (SegmentValue::CenterOf(i as u32), *v),
            annotation.clone(),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn draw_monthly_trend(
    pixels: &mut [u8],
    canvas: Canvas,
    monthly: &[(YearMonth, f64)],
) -> anyhow::Result<()> {
    let root = BitMapBackend::with_buffer(pixels, canvas.size()).into_drawing_area();
    root.fill(&WHITE)?;

    let n = monthly.len() as u32;
    let y_max = value_ceiling(monthly.iter().map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Average Daily Cases by Month",
            ("sans-serif", canvas.pt(14.0)),
        )
        .margin(canvas.px(20.0))
        .x_label_area_size(canvas.px(60.0))
        .y_label_area_size(canvas.px(80.0))
        .build_cartesian_2d((0u32..n).into_segmented(), 0f64..y_max)
        .context("building chart axes")?;

    let month_label = |segment: &SegmentValue<u32>| match segment {
        SegmentValue::CenterOf(i) => monthly
            .get(*i as usize)
            .map(|(month, _)| month.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };
    let value_label = |v: &f64| format_grouped(*v, 0);
    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Average Daily Cases")
        .axis_desc_style(("sans-serif", canvas.pt(12.0)))
        .x_labels(monthly.len())
        .x_label_formatter(&month_label)
        .y_label_formatter(&value_label)
        .x_label_style(
            ("sans-serif", canvas.pt(10.0))
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_style(("sans-serif", canvas.pt(10.0)))
        .bold_line_style(GRID.mix(0.7))
        .light_line_style(TRANSPARENT)
        .draw()?;

    let points: Vec<(SegmentValue<u32>, f64)> = monthly
        .iter()
        .enumerate()
        .map(|(i, (_, v))| (SegmentValue::CenterOf(i as u32), *v))
        .collect();
    chart.draw_series(LineSeries::new(
        points.clone(),
        LINE_BLUE.stroke_width(canvas.px(1.5)),
    ))?;
    chart.draw_series(
        points
            .into_iter()
            .map(|p| Circle::new(p, canvas.px(4.0), LINE_BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Encode an RGB buffer as PNG with the pixel density recorded in a pHYs chunk.
pub fn write_png(
    path: &Path,
    pixels: &[u8],
    (width, height): (u32, u32),
    dpi: u32,
) -> Result<(), ChartError> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let pixels_per_meter = (dpi as f64 / 0.0254).round() as u32;
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: pixels_per_meter,
        yppu: pixels_per_meter,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder.write_header()?;
    writer.write_image_data(pixels)?;
    writer.finish()?;
    Ok(())
}
