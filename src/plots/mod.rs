pub mod echarts;

use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::{AnalysisError, Result};
use crate::series::{LineDash, Point, SeriesColor, SeriesData};

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 900;

/// Right of and below the anchor, clear of the marker.
pub const ANNOTATION_OFFSET: PixelOffset = PixelOffset { dx: 5.0, dy: -10.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    Linear,
    #[default]
    #[serde(alias = "log")]
    Logarithmic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLines {
    Major,
    MajorAndMinor,
}

impl GridLines {
    pub fn for_scale(scale: AxisScale) -> Self {
        match scale {
            AxisScale::Linear => GridLines::Major,
            AxisScale::Logarithmic => GridLines::MajorAndMinor,
        }
    }
}

/// Screen offset in pixels, `dy` grows upwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelOffset {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub label: String,
    pub scale: AxisScale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub name: String,
    pub title: String,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub size: ImageSize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub text: String,
    pub anchor: Point,
    pub color: SeriesColor,
}

/// Which point(s) of every series get a text annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationPoint {
    #[default]
    #[serde(alias = "none")]
    Off,
    First,
    Last,
    SecondToLast,
    /// clamped to the last point of shorter series
    Index(usize),
    Each,
}

impl AnnotationPoint {
    /// The annotation text is the point's own label if it has one, else the
    /// series label.
    pub fn annotations(&self, series: &[SeriesData]) -> Vec<Annotation> {
        let mut annotations = Vec::new();

        for s in series {
            let num_points = s.points().len();
            if num_points == 0 {
                continue;
            }
            let last = num_points - 1;

            let indices = match *self {
                AnnotationPoint::Off => 0..0,
                AnnotationPoint::First => 0..1,
                AnnotationPoint::Last => last..num_points,
                AnnotationPoint::SecondToLast => {
                    let index = last.saturating_sub(1);
                    index..index + 1
                }
                AnnotationPoint::Index(index) => {
                    let index = index.min(last);
                    index..index + 1
                }
                AnnotationPoint::Each => 0..num_points,
            };

            for index in indices {
                annotations.push(Annotation {
                    text: s.point_label(index).unwrap_or(s.label()).to_owned(),
                    anchor: s.points()[index],
                    color: s.color().clone(),
                });
            }
        }

        annotations
    }
}

/// The drawing surface charts are rendered onto.
pub trait Canvas {
    fn set_axis_scale(&mut self, axis: AxisKind, scale: AxisScale);

    fn set_labels(&mut self, x_label: &str, y_label: &str, title: &str);

    fn set_grid(&mut self, axis: AxisKind, lines: GridLines);

    fn draw_line(
        &mut self,
        points: &[Point],
        color: &SeriesColor,
        dash: LineDash,
        label: Option<&str>,
    );

    fn draw_annotation(
        &mut self,
        text: &str,
        anchor: Point,
        offset: PixelOffset,
        color: &SeriesColor,
    );

    fn save(&mut self, path: &Path, size: ImageSize) -> Result<()>;
}

pub struct ChartRenderer {
    annotation_offset: PixelOffset,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self {
            annotation_offset: ANNOTATION_OFFSET,
        }
    }
}

impl ChartRenderer {
    /// Draws `series` in the given order, then the reference line, then the
    /// annotations, and saves the result to `path`.
    pub fn render<C: Canvas>(
        &self,
        canvas: &mut C,
        series: &[SeriesData],
        reference: Option<&SeriesData>,
        annotations: &[Annotation],
        layout: &ChartLayout,
        path: &Path,
    ) -> Result<()> {
        if series.is_empty() && reference.is_none() {
            return Err(AnalysisError::EmptyChart(layout.name.clone()));
        }

        canvas.set_labels(&layout.x_axis.label, &layout.y_axis.label, &layout.title);

        for (axis, spec) in [(AxisKind::X, &layout.x_axis), (AxisKind::Y, &layout.y_axis)] {
            canvas.set_axis_scale(axis, spec.scale);
            canvas.set_grid(axis, GridLines::for_scale(spec.scale));
        }

        for s in series.iter().chain(reference) {
            canvas.draw_line(s.points(), s.color(), s.dash(), Some(s.label()));
        }

        for annotation in annotations {
            canvas.draw_annotation(
                &annotation.text,
                annotation.anchor,
                self.annotation_offset,
                &annotation.color,
            );
        }

        debug!(
            "chart {}: {} series, reference: {}, {} annotations",
            layout.name,
            series.len(),
            reference.is_some(),
            annotations.len()
        );

        canvas.save(path, layout.size)
    }
}
