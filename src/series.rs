use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Any color string the renderer understands, e.g. `"blue"` or `"#1f77b4"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct SeriesColor(String);

impl SeriesColor {
    pub fn new(color: impl Into<String>) -> Self {
        Self(color.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDash {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// One plot-ready curve. Only built by the speedup engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    label: String,
    points: Vec<Point>,
    point_labels: Vec<String>,
    color: SeriesColor,
    dash: LineDash,
}

impl SeriesData {
    pub(crate) fn new(
        label: String,
        points: Vec<Point>,
        color: SeriesColor,
        dash: LineDash,
    ) -> Self {
        Self {
            label,
            points,
            point_labels: Vec::new(),
            color,
            dash,
        }
    }

    /// `point_labels` has to be empty or as long as `points`.
    pub(crate) fn with_point_labels(mut self, point_labels: Vec<String>) -> Self {
        debug_assert!(point_labels.is_empty() || point_labels.len() == self.points.len());
        self.point_labels = point_labels;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point_label(&self, index: usize) -> Option<&str> {
        self.point_labels.get(index).map(String::as_str)
    }

    pub fn color(&self) -> &SeriesColor {
        &self.color
    }

    pub fn dash(&self) -> LineDash {
        self.dash
    }

    pub fn first_value(&self) -> Option<f64> {
        self.points.first().map(|point| point.y)
    }

    pub fn final_value(&self) -> Option<f64> {
        self.points.last().map(|point| point.y)
    }
}
