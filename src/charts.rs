use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use log::{debug, error, info};
use serde::Deserialize;
use strum::{Display, EnumIter};

use crate::config::AnalysisConfig;
use crate::folder_structure::{chart_file, RunFolder};
use crate::measurements::{MeasurementStore, Parallelism, ProfileMetric};
use crate::plots::echarts::EchartsCanvas;
use crate::plots::{
    Annotation, AnnotationPoint, AxisScale, AxisSpec, ChartLayout, ChartRenderer, ImageSize,
};
use crate::series::SeriesData;
use crate::speedup::{ideal_speedup, order_by_final_value, Selection, SpeedupEngine, StylePolicy};

const SPEEDUP_AXIS_NAME: &str = "Speedup (Tref / Talg)";
const TIME_AXIS_NAME: &str = "Assembled Time (s)";

#[derive(Debug, Clone, Copy, EnumIter, ValueEnum, Display, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ChartKind {
    /// speedup against the serial baseline, with an ideal speedup reference
    Speedup,
    /// measured times as they are
    RawPerformance,
    AssemblyTimeVsContigs,
    FileSizeVsContigs,
}

impl ChartKind {
    fn profile_metrics(&self) -> Option<(ProfileMetric, ProfileMetric)> {
        match self {
            ChartKind::AssemblyTimeVsContigs => {
                Some((ProfileMetric::Contigs, ProfileMetric::AssemblyTime))
            }
            ChartKind::FileSizeVsContigs => Some((ProfileMetric::FileSize, ProfileMetric::Contigs)),
            ChartKind::Speedup | ChartKind::RawPerformance => None,
        }
    }
}

/// One chart of the config file. Everything besides name, kind and title
/// has a default that depends on the kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    /// output file name without extension
    pub name: String,
    pub kind: ChartKind,
    pub title: String,
    pub select: Option<Selection>,
    #[serde(default)]
    pub style: StylePolicy,
    pub annotate: Option<AnnotationPoint>,
    pub ideal_reference: Option<bool>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_scale: Option<AxisScale>,
    pub y_scale: Option<AxisScale>,
    pub image: Option<ImageSize>,
}

impl ChartConfig {
    fn selection(&self) -> Result<&Selection> {
        self.select.as_ref().with_context(|| {
            format!(
                "chart {} of kind {} needs a `select` table",
                self.name, self.kind
            )
        })
    }

    fn annotation_point(&self) -> AnnotationPoint {
        self.annotate.unwrap_or(match self.kind {
            ChartKind::Speedup | ChartKind::RawPerformance => AnnotationPoint::Off,
            ChartKind::AssemblyTimeVsContigs | ChartKind::FileSizeVsContigs => AnnotationPoint::Each,
        })
    }

    pub fn layout(&self, default_size: ImageSize) -> ChartLayout {
        let (default_x_label, default_y_label) = match self.kind.profile_metrics() {
            Some((x, y)) => (x.to_string(), y.to_string()),
            None => {
                let x_label = self
                    .select
                    .as_ref()
                    .map(|selection| selection.varies.axis_name())
                    .unwrap_or_default();
                let y_label = match self.kind {
                    ChartKind::Speedup => SPEEDUP_AXIS_NAME,
                    _ => TIME_AXIS_NAME,
                };
                (x_label.to_owned(), y_label.to_owned())
            }
        };

        // node counts are few and small, the source plots keep them linear
        let default_x_scale = match &self.select {
            Some(selection) if selection.varies == Parallelism::NodeCount => AxisScale::Linear,
            _ => AxisScale::Logarithmic,
        };

        ChartLayout {
            name: self.name.clone(),
            title: self.title.clone(),
            x_axis: AxisSpec {
                label: self.x_label.clone().unwrap_or(default_x_label),
                scale: self.x_scale.unwrap_or(default_x_scale),
            },
            y_axis: AxisSpec {
                label: self.y_label.clone().unwrap_or(default_y_label),
                scale: self.y_scale.unwrap_or(AxisScale::Logarithmic),
            },
            size: self.image.unwrap_or(default_size),
        }
    }
}

/// Everything a chart draws, in drawing order.
#[derive(Debug)]
pub struct ChartSeries {
    pub series: Vec<SeriesData>,
    pub reference: Option<SeriesData>,
    pub annotations: Vec<Annotation>,
}

pub fn build_chart_series(chart: &ChartConfig, engine: &SpeedupEngine) -> Result<ChartSeries> {
    let (series, reference) = match chart.kind {
        ChartKind::Speedup => {
            let series =
                order_by_final_value(engine.speedup_series(chart.selection()?, &chart.style)?);
            let reference = if chart.ideal_reference.unwrap_or(true) {
                Some(ideal_speedup(&series)?)
            } else {
                None
            };
            (series, reference)
        }
        ChartKind::RawPerformance => (engine.time_series(chart.selection()?, &chart.style)?, None),
        ChartKind::AssemblyTimeVsContigs | ChartKind::FileSizeVsContigs => {
            let (x, y) = chart
                .kind
                .profile_metrics()
                .context("profile chart without metrics")?;
            (engine.profile_series(x, y), None)
        }
    };

    let annotations = chart.annotation_point().annotations(&series);

    debug!(
        "chart {}: {} series with {} points",
        chart.name,
        series.len(),
        series.iter().map(|s| s.points().len()).sum::<usize>()
    );

    Ok(ChartSeries {
        series,
        reference,
        annotations,
    })
}

pub fn plot_chart(
    chart: &ChartConfig,
    engine: &SpeedupEngine,
    run_folder: &RunFolder,
    config: &AnalysisConfig,
) -> Result<PathBuf> {
    let ChartSeries {
        series,
        reference,
        annotations,
    } = build_chart_series(chart, engine)?;
    let layout = chart.layout(config.image);

    let in_run_folder = run_folder.chart_path(&chart.name)?;

    ChartRenderer::default().render(
        &mut EchartsCanvas::new(),
        &series,
        reference.as_ref(),
        &annotations,
        &layout,
        &in_run_folder,
    )?;

    let in_all_plots_folder = chart_file(&config.all_plots_folder(), &chart.name);
    fs::copy(&in_run_folder, &in_all_plots_folder).with_context(|| {
        format!("failed to copy chart to {}", in_all_plots_folder.display())
    })?;

    info!("wrote {}", in_run_folder.display());

    Ok(in_run_folder)
}

/// Plots every chart. A failing chart doesn't stop the others, the run as a
/// whole fails at the end.
pub fn run_charts<'a>(
    charts: impl IntoIterator<Item = &'a ChartConfig>,
    store: &MeasurementStore,
    run_folder: &RunFolder,
    config: &AnalysisConfig,
) -> Result<()> {
    let palette = config.palette();
    let engine = SpeedupEngine::new(store, &palette);

    let mut num_charts = 0;
    let mut num_error_charts = 0;
    for chart in charts {
        num_charts += 1;

        if let Err(err) = plot_chart(chart, &engine, run_folder, config) {
            error!("chart {} failed: {:#}", chart.name, err);
            num_error_charts += 1;
        }
    }

    if num_error_charts != 0 {
        bail!("errors occurred in {num_error_charts} of {num_charts} chart(s)")
    }

    info!("plotted {num_charts} chart(s) into {}", run_folder.get().display());

    Ok(())
}
