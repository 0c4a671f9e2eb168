use std::path::Path;

use charming::{
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisType, ItemStyle, LineStyle, LineStyleType, NameLocation, SplitLine, Symbol,
        TextStyle,
    },
    series::Line,
    Chart, ImageRenderer,
};

use super::{AxisKind, AxisScale, Canvas, GridLines, ImageSize, PixelOffset};
use crate::error::{AnalysisError, Result};
use crate::series::{LineDash, Point, SeriesColor};

const TITLE_FONT_SIZE: i32 = 22;
const LABEL_FONT_SIZE: i32 = 18;
const TICK_FONT_SIZE: i32 = 14;
const LEGEND_FONT_SIZE: i32 = 14;
const ANNOTATION_FONT_SIZE: i32 = 12;
const AXIS_NAME_GAP: i32 = 35;
const SYMBOL_SIZE: i32 = 7;
const LINE_WIDTH: i32 = 2;
const MINOR_GRID_COLOR: &str = "#e6e6e6";
// linear axes over at most this many whole numbers get one tick per number
const MAX_UNIT_TICKS: f64 = 20.0;

// grid offsets in pixels, so data coordinates can be mapped onto the image
const GRID_LEFT: f64 = 90.0;
const GRID_RIGHT: f64 = 40.0;
const GRID_TOP: f64 = 110.0;
const GRID_BOTTOM: f64 = 70.0;
const LEGEND_TOP: f64 = 45.0;

struct DrawnLine {
    points: Vec<Point>,
    color: SeriesColor,
    dash: LineDash,
    label: Option<String>,
}

struct PlacedAnnotation {
    text: String,
    anchor: Point,
    offset: PixelOffset,
    color: SeriesColor,
}

/// Canvas that collects everything that is drawn and renders it with the
/// ECharts server side renderer on `save`.
pub struct EchartsCanvas {
    title: String,
    x_label: String,
    y_label: String,
    x_scale: AxisScale,
    y_scale: AxisScale,
    x_grid: GridLines,
    y_grid: GridLines,
    lines: Vec<DrawnLine>,
    annotations: Vec<PlacedAnnotation>,
}

impl Default for EchartsCanvas {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            x_scale: AxisScale::Logarithmic,
            y_scale: AxisScale::Logarithmic,
            x_grid: GridLines::MajorAndMinor,
            y_grid: GridLines::MajorAndMinor,
            lines: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

impl EchartsCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_chart(&self, size: ImageSize) -> Chart {
        let x_range = AxisRange::covering(
            self.lines.iter().flat_map(|l| l.points.iter().map(|p| p.x)),
            self.x_scale,
        );
        let y_range = AxisRange::covering(
            self.lines.iter().flat_map(|l| l.points.iter().map(|p| p.y)),
            self.y_scale,
        );
        let plot_area = PlotArea::new(size);
        let legend_labels: Vec<&str> = self
            .lines
            .iter()
            .filter_map(|line| line.label.as_deref())
            .collect();

        let mut chart = Chart::new()
            .background_color("white")
            .title(
                Title::new()
                    .text(self.title.as_str())
                    .left("center")
                    .text_style(TextStyle::new().font_size(TITLE_FONT_SIZE).color("black")),
            )
            .legend(
                Legend::new()
                    .data(legend_labels)
                    .top(pixels(LEGEND_TOP).as_str())
                    .text_style(TextStyle::new().font_size(LEGEND_FONT_SIZE).color("black")),
            )
            .grid(
                Grid::new()
                    .left(pixels(GRID_LEFT).as_str())
                    .right(pixels(GRID_RIGHT).as_str())
                    .top(pixels(GRID_TOP).as_str())
                    .bottom(pixels(GRID_BOTTOM).as_str()),
            )
            .x_axis(create_axis(&self.x_label, x_range))
            .y_axis(create_axis(&self.y_label, y_range));

        // minor gridlines go first, so the data is drawn on top of them
        if self.x_grid == GridLines::MajorAndMinor {
            for x in x_range.minor_values() {
                chart = chart.series(create_grid_series(
                    [x, y_range.min],
                    [x, y_range.max],
                ));
            }
        }
        if self.y_grid == GridLines::MajorAndMinor {
            for y in y_range.minor_values() {
                chart = chart.series(create_grid_series(
                    [x_range.min, y],
                    [x_range.max, y],
                ));
            }
        }

        for line in &self.lines {
            chart = chart.series(create_line_series(line));
        }

        for annotation in &self.annotations {
            let (left, top) = annotation_box(&plot_area, annotation, x_range, y_range);

            chart = chart.title(
                Title::new()
                    .text(annotation.text.as_str())
                    .left(pixels(left).as_str())
                    .top(pixels(top).as_str())
                    .text_style(
                        TextStyle::new()
                            .font_size(ANNOTATION_FONT_SIZE)
                            .color(annotation.color.as_str()),
                    ),
            );
        }

        chart
    }
}

impl Canvas for EchartsCanvas {
    fn set_axis_scale(&mut self, axis: AxisKind, scale: AxisScale) {
        match axis {
            AxisKind::X => self.x_scale = scale,
            AxisKind::Y => self.y_scale = scale,
        }
    }

    fn set_labels(&mut self, x_label: &str, y_label: &str, title: &str) {
        x_label.clone_into(&mut self.x_label);
        y_label.clone_into(&mut self.y_label);
        title.clone_into(&mut self.title);
    }

    fn set_grid(&mut self, axis: AxisKind, lines: GridLines) {
        match axis {
            AxisKind::X => self.x_grid = lines,
            AxisKind::Y => self.y_grid = lines,
        }
    }

    fn draw_line(
        &mut self,
        points: &[Point],
        color: &SeriesColor,
        dash: LineDash,
        label: Option<&str>,
    ) {
        self.lines.push(DrawnLine {
            points: points.to_vec(),
            color: color.clone(),
            dash,
            label: label.map(str::to_owned),
        });
    }

    fn draw_annotation(
        &mut self,
        text: &str,
        anchor: Point,
        offset: PixelOffset,
        color: &SeriesColor,
    ) {
        self.annotations.push(PlacedAnnotation {
            text: text.to_owned(),
            anchor,
            offset,
            color: color.clone(),
        });
    }

    fn save(&mut self, path: &Path, size: ImageSize) -> Result<()> {
        let chart = self.build_chart(size);

        let mut renderer = ImageRenderer::new(size.width, size.height);
        renderer
            .save(&chart, path)
            .map_err(|err| AnalysisError::Render(format!("{}: {err:?}", path.display())))
    }
}

/// Top left corner of the title box that shows `annotation`.
fn annotation_box(
    plot_area: &PlotArea,
    annotation: &PlacedAnnotation,
    x_range: AxisRange,
    y_range: AxisRange,
) -> (f64, f64) {
    let (left, top) = plot_area.position(annotation.anchor, x_range, y_range);

    // title boxes are placed by their top edge
    (
        left + annotation.offset.dx,
        top - annotation.offset.dy - ANNOTATION_FONT_SIZE as f64 / 2.0,
    )
}

fn create_axis(name: &str, range: AxisRange) -> Axis {
    let axis_type = match range.scale {
        AxisScale::Linear => AxisType::Value,
        AxisScale::Logarithmic => AxisType::Log,
    };

    let axis = Axis::new()
        .type_(axis_type)
        .name(name)
        .name_location(NameLocation::Middle)
        .name_gap(AXIS_NAME_GAP)
        .name_text_style(TextStyle::new().font_size(LABEL_FONT_SIZE).color("black"))
        .axis_label(AxisLabel::new().font_size(TICK_FONT_SIZE).color("black"))
        .min(range.min)
        .max(range.max)
        .split_line(
            SplitLine::new()
                .show(true)
                .line_style(LineStyle::new().type_(LineStyleType::Dashed)),
        );

    match range.interval {
        Some(interval) => axis.interval(interval),
        None => axis,
    }
}

/// An unlabeled, thin segment spanning the plot, used as a minor gridline.
fn create_grid_series(from: [f64; 2], to: [f64; 2]) -> Line {
    Line::new()
        .data(vec![from.to_vec(), to.to_vec()])
        .symbol(Symbol::None)
        .line_style(
            LineStyle::new()
                .color(MINOR_GRID_COLOR)
                .width(1)
                .type_(LineStyleType::Dashed),
        )
}

fn create_line_series(line: &DrawnLine) -> Line {
    let line_type = match line.dash {
        LineDash::Solid => LineStyleType::Solid,
        LineDash::Dashed => LineStyleType::Dashed,
        LineDash::Dotted => LineStyleType::Dotted,
    };

    let data: Vec<Vec<f64>> = line.points.iter().map(|p| vec![p.x, p.y]).collect();

    let mut series = Line::new()
        .data(data)
        .symbol(Symbol::Circle)
        .symbol_size(SYMBOL_SIZE)
        .item_style(ItemStyle::new().color(line.color.as_str()))
        .line_style(
            LineStyle::new()
                .color(line.color.as_str())
                .width(LINE_WIDTH)
                .type_(line_type),
        );

    if let Some(label) = &line.label {
        series = series.name(label.as_str());
    }

    series
}

fn is_whole(value: f64) -> bool {
    value.fract() == 0.0
}

fn pixels(value: f64) -> String {
    format!("{}", value.round())
}

/// Axis bounds set explicitly on the chart. Logarithmic axes span whole
/// decades. Linear axes over a few whole numbers (node counts) end at the
/// data and tick every number, other linear axes get 5% padding.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisRange {
    min: f64,
    max: f64,
    scale: AxisScale,
    interval: Option<f64>,
}

impl AxisRange {
    fn covering(values: impl IntoIterator<Item = f64>, scale: AxisScale) -> Self {
        let (min, max) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
                (min.min(value), max.max(value))
            });

        if min > max {
            return match scale {
                AxisScale::Linear => Self::new(0.0, 1.0, scale),
                AxisScale::Logarithmic => Self::new(1.0, 10.0, scale),
            };
        }

        match scale {
            AxisScale::Linear if is_whole(min) && is_whole(max) && max > min => {
                if max - min <= MAX_UNIT_TICKS {
                    Self {
                        interval: Some(1.0),
                        ..Self::new(min, max, scale)
                    }
                } else {
                    Self::new(min, max, scale)
                }
            }
            AxisScale::Linear => {
                let padding = if max > min {
                    (max - min) * 0.05
                } else {
                    (max.abs() * 0.05).max(0.5)
                };
                Self::new(min - padding, max + padding, scale)
            }
            AxisScale::Logarithmic => {
                let lower = 10f64.powf(min.log10().floor());
                let mut upper = 10f64.powf(max.log10().ceil());
                if upper <= lower {
                    upper = lower * 10.0;
                }
                Self::new(lower, upper, scale)
            }
        }
    }

    fn new(min: f64, max: f64, scale: AxisScale) -> Self {
        Self {
            min,
            max,
            scale,
            interval: None,
        }
    }

    /// 2..9 times every power of ten strictly inside a logarithmic range.
    /// Linear axes have no minor lines.
    fn minor_values(&self) -> Vec<f64> {
        if self.scale == AxisScale::Linear {
            return Vec::new();
        }

        let first_decade = self.min.log10().floor() as i32;
        let last_decade = self.max.log10().ceil() as i32;

        (first_decade..last_decade)
            .flat_map(|decade| (2..10).map(move |k| k as f64 * 10f64.powi(decade)))
            .filter(|&value| value > self.min && value < self.max)
            .collect()
    }

    /// Relative position of `value` between the bounds, 0 at `min`, 1 at `max`.
    fn fraction(&self, value: f64) -> f64 {
        match self.scale {
            AxisScale::Linear => (value - self.min) / (self.max - self.min),
            AxisScale::Logarithmic => {
                (value.log10() - self.min.log10()) / (self.max.log10() - self.min.log10())
            }
        }
    }
}

struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn new(size: ImageSize) -> Self {
        Self {
            left: GRID_LEFT,
            top: GRID_TOP,
            width: (size.width as f64 - GRID_LEFT - GRID_RIGHT).max(1.0),
            height: (size.height as f64 - GRID_TOP - GRID_BOTTOM).max(1.0),
        }
    }

    /// Pixel position (left, top) of a data point.
    fn position(&self, point: Point, x_range: AxisRange, y_range: AxisRange) -> (f64, f64) {
        (
            self.left + x_range.fraction(point.x) * self.width,
            self.top + (1.0 - y_range.fraction(point.y)) * self.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plots::ANNOTATION_OFFSET;

    #[test]
    fn logarithmic_range_spans_decades() {
        let range = AxisRange::covering([1.0, 2.0, 64.0, 128.0], AxisScale::Logarithmic);

        assert_eq!(range.min, 1.0);
        assert!((range.max - 1000.0).abs() < 1e-9);
        assert!((range.fraction(10.0) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_value_ranges_are_not_degenerate() {
        let log = AxisRange::covering([1.0], AxisScale::Logarithmic);
        assert_eq!((log.min, log.max), (1.0, 10.0));

        let linear = AxisRange::covering([3.0], AxisScale::Linear);
        assert!(linear.min < 3.0 && linear.max > 3.0);
    }

    #[test]
    fn linear_range_is_padded() {
        let range = AxisRange::covering([0.5, 1.0, 1.5, 2.5], AxisScale::Linear);

        assert!((range.min - 0.4).abs() < 1e-12);
        assert!((range.max - 2.6).abs() < 1e-12);
        assert!((range.fraction(1.5) - 0.5).abs() < 1e-12);
        assert_eq!(range.interval, None);
    }

    #[test]
    fn node_count_range_ticks_every_node() {
        let range = AxisRange::covering([1.0, 2.0, 3.0, 4.0], AxisScale::Linear);
        assert_eq!((range.min, range.max, range.interval), (1.0, 4.0, Some(1.0)));

        let contigs = AxisRange::covering([1.0, 5736.0], AxisScale::Linear);
        assert_eq!((contigs.min, contigs.max, contigs.interval), (1.0, 5736.0, None));
    }

    #[test]
    fn minor_values_fill_the_decades() {
        let range = AxisRange::covering([1.0, 64.0], AxisScale::Logarithmic);

        let minor = range.minor_values();
        assert_eq!(minor.len(), 16);
        assert_eq!(minor[0], 2.0);
        assert!((minor[15] - 90.0).abs() < 1e-9);
        assert!(AxisRange::covering([1.0, 4.0], AxisScale::Linear)
            .minor_values()
            .is_empty());
    }

    #[test]
    fn plot_area_maps_corners() {
        let size = ImageSize {
            width: 1130,
            height: 1080,
        };
        let area = PlotArea::new(size);
        let x_range = AxisRange::covering([1.0, 4.0], AxisScale::Linear);
        let y_range = AxisRange::covering([1.0, 100.0], AxisScale::Logarithmic);

        let (left, top) = area.position(Point::new(x_range.min, 100.0), x_range, y_range);
        assert_eq!((left, top), (GRID_LEFT, GRID_TOP));

        let (_, bottom) = area.position(Point::new(4.0, 1.0), x_range, y_range);
        assert_eq!(bottom, 1080.0 - GRID_BOTTOM);
    }

    #[test]
    fn chart_contains_series_styles_and_annotations() {
        let mut canvas = EchartsCanvas::new();
        canvas.set_labels("Node Count (N)", "Speedup", "Speedup vs. Node Count");
        canvas.set_axis_scale(AxisKind::X, AxisScale::Linear);
        canvas.set_grid(AxisKind::X, GridLines::Major);
        canvas.draw_line(
            &[Point::new(1.0, 3.0), Point::new(2.0, 4.2)],
            &SeriesColor::new("blue"),
            LineDash::Dotted,
            Some("human-chr14-synthetic.txt (Tasks=64)"),
        );
        canvas.draw_annotation(
            "human-chr14-synthetic.txt (Tasks=64)",
            Point::new(2.0, 4.2),
            ANNOTATION_OFFSET,
            &SeriesColor::new("blue"),
        );

        let json = canvas.build_chart(ImageSize::default()).to_string();

        assert!(json.contains("Speedup vs. Node Count"));
        assert!(json.contains("\"log\""));
        assert!(json.contains("\"dotted\""));
        assert!(json.contains("\"interval\""));
        // series name, legend entry and annotation
        assert_eq!(json.matches("human-chr14-synthetic.txt (Tasks=64)").count(), 3);
    }

    fn canvas_with_grid(lines: GridLines) -> EchartsCanvas {
        let mut canvas = EchartsCanvas::new();
        for axis in [AxisKind::X, AxisKind::Y] {
            canvas.set_axis_scale(axis, AxisScale::Logarithmic);
            canvas.set_grid(axis, lines);
        }
        canvas.draw_line(
            &[Point::new(1.0, 0.9378), Point::new(128.0, 16.152)],
            &SeriesColor::new("blue"),
            LineDash::Solid,
            Some("test.txt"),
        );
        canvas
    }

    #[test]
    fn minor_gridlines_only_where_requested() {
        let with_minor = canvas_with_grid(GridLines::MajorAndMinor)
            .build_chart(ImageSize::default())
            .to_string();
        let major_only = canvas_with_grid(GridLines::Major)
            .build_chart(ImageSize::default())
            .to_string();

        // x: 1..1000 has 8 minor values in each of 3 decades, y: 0.1..100 as well
        assert_eq!(with_minor.matches(MINOR_GRID_COLOR).count(), 48);
        assert!(!major_only.contains(MINOR_GRID_COLOR));
        assert!(with_minor.contains("splitLine") && major_only.contains("splitLine"));
    }

    #[test]
    fn annotations_are_offset_from_their_anchor() {
        let size = ImageSize::default();
        let area = PlotArea::new(size);
        let x_range = AxisRange::covering([1.0, 4.0], AxisScale::Linear);
        let y_range = AxisRange::covering([1.0, 100.0], AxisScale::Logarithmic);
        let annotation = PlacedAnnotation {
            text: "test.txt (Tasks=64)".into(),
            anchor: Point::new(1.0, 1.0),
            offset: ANNOTATION_OFFSET,
            color: SeriesColor::new("blue"),
        };

        let (anchor_left, anchor_top) = area.position(annotation.anchor, x_range, y_range);
        assert_eq!((anchor_left, anchor_top), (GRID_LEFT, 900.0 - GRID_BOTTOM));

        let (left, top) = annotation_box(&area, &annotation, x_range, y_range);
        assert_eq!(left, anchor_left + ANNOTATION_OFFSET.dx);
        assert_eq!(
            top,
            anchor_top - ANNOTATION_OFFSET.dy - ANNOTATION_FONT_SIZE as f64 / 2.0
        );
        assert_eq!((left, top), (95.0, 834.0));

        let mut canvas = EchartsCanvas::new();
        canvas.set_axis_scale(AxisKind::X, AxisScale::Linear);
        canvas.draw_line(
            &[Point::new(1.0, 1.0), Point::new(4.0, 100.0)],
            &SeriesColor::new("blue"),
            LineDash::Solid,
            None,
        );
        canvas.draw_annotation(
            &annotation.text,
            annotation.anchor,
            annotation.offset,
            &annotation.color,
        );
        let json = canvas.build_chart(size).to_string();

        assert!(json.contains("\"95\""));
        assert!(json.contains("\"834\""));
    }
}
