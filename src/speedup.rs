use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{AnalysisError, Result};
use crate::measurements::{
    BaselineRecord, Configuration, MeasurementRecord, MeasurementStore, Parallelism, ProfileMetric,
};
use crate::series::{LineDash, Point, SeriesColor, SeriesData};

pub const IDEAL_SPEEDUP_LABEL: &str = "O(n) Ideal Speedup (Shifted)";
const REFERENCE_COLOR: &str = "gray";

// matplotlib's tab10 without its gray, which is reserved for the reference line
const PALETTE: [&str; 9] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#bcbd22",
    "#17becf",
];

pub fn speedup(baseline_seconds: f64, parallel_seconds: f64) -> f64 {
    baseline_seconds / parallel_seconds
}

/// Speedup of every measured point of `record` against the serial baseline.
pub fn speedups(baseline: &BaselineRecord, record: &MeasurementRecord) -> Vec<f64> {
    debug_assert_eq!(baseline.dataset(), record.dataset());

    record
        .times()
        .iter()
        .map(|&parallel_seconds| speedup(baseline.serial_seconds(), parallel_seconds))
        .collect()
}

/// A line of unit slope in log-log space, anchored at the lowest starting
/// speedup of all `series`. The x values are the union of all x values.
pub fn ideal_speedup(series: &[SeriesData]) -> Result<SeriesData> {
    let min_initial_speedup = series
        .iter()
        .filter_map(SeriesData::first_value)
        .min_by(f64::total_cmp)
        .ok_or(AnalysisError::EmptySeriesSet)?;

    let mut x_values: Vec<f64> = series
        .iter()
        .flat_map(|s| s.points().iter().map(|point| point.x))
        .collect();
    x_values.sort_by(f64::total_cmp);
    x_values.dedup();

    let first_x = x_values[0];
    let points = x_values
        .iter()
        .map(|&x| Point::new(x, (x / first_x) * min_initial_speedup))
        .collect();

    Ok(SeriesData::new(
        IDEAL_SPEEDUP_LABEL.to_owned(),
        points,
        SeriesColor::new(REFERENCE_COLOR),
        LineDash::Dashed,
    ))
}

/// Sorts by the value of the last point, highest first. Ties keep their order.
pub fn order_by_final_value(mut series: Vec<SeriesData>) -> Vec<SeriesData> {
    let final_value = |s: &SeriesData| s.final_value().unwrap_or(f64::NEG_INFINITY);
    series.sort_by(|a, b| final_value(b).total_cmp(&final_value(a)));
    series
}

/// Maps a dataset to a color. Explicit overrides win, every other name is
/// hashed into a fixed palette, so the same dataset gets the same color in
/// every chart.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    overrides: BTreeMap<String, SeriesColor>,
}

impl Palette {
    pub fn new(overrides: BTreeMap<String, SeriesColor>) -> Self {
        Self { overrides }
    }

    pub fn color_for(&self, dataset: &str) -> SeriesColor {
        self.overrides
            .get(dataset)
            .cloned()
            .unwrap_or_else(|| SeriesColor::new(PALETTE[palette_index(dataset)]))
    }

    pub fn color_at(&self, position: usize) -> SeriesColor {
        SeriesColor::new(PALETTE[position % PALETTE.len()])
    }
}

fn palette_index(name: &str) -> usize {
    // FNV-1a, the std hasher is not stable between releases
    let hash = name.bytes().fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0000_0100_0000_01b3)
    });
    (hash % PALETTE.len() as u64) as usize
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorBy {
    #[default]
    Dataset,
    /// i-th series of the chart gets the i-th palette color
    Position,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylePolicy {
    pub color_by: ColorBy,
    /// series with a matching configuration are drawn with `dash`
    pub dashed: Option<Configuration>,
    pub dash: Option<LineDash>,
}

impl StylePolicy {
    pub fn dash_for(&self, configuration: &Configuration) -> LineDash {
        match &self.dashed {
            Some(filter) if configuration.matches(filter) => {
                self.dash.unwrap_or(LineDash::Dotted)
            }
            _ => LineDash::Solid,
        }
    }
}

/// Which records end up in a chart.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selection {
    pub varies: Parallelism,
    #[serde(default)]
    pub datasets: Option<Vec<String>>,
    /// a record is selected if it matches any of these, or if there are none
    #[serde(default)]
    pub configurations: Vec<Configuration>,
}

impl Selection {
    pub fn new(varies: Parallelism) -> Self {
        Self {
            varies,
            datasets: None,
            configurations: Vec::new(),
        }
    }

    fn includes(&self, record: &MeasurementRecord) -> bool {
        record.varies() == self.varies
            && self
                .datasets
                .as_ref()
                .map_or(true, |datasets| datasets.iter().any(|d| d == record.dataset()))
            && (self.configurations.is_empty()
                || self
                    .configurations
                    .iter()
                    .any(|filter| record.configuration().matches(filter)))
    }
}

/// Derives plot series from the measurements. Holds no state besides the
/// borrowed inputs, so every call is independent.
pub struct SpeedupEngine<'a> {
    store: &'a MeasurementStore,
    palette: &'a Palette,
}

impl<'a> SpeedupEngine<'a> {
    pub fn new(store: &'a MeasurementStore, palette: &'a Palette) -> Self {
        Self { store, palette }
    }

    /// One speedup series per selected record, in input order.
    pub fn speedup_series(
        &self,
        selection: &Selection,
        style: &StylePolicy,
    ) -> Result<Vec<SeriesData>> {
        let records = self.select(selection)?;

        let values = records
            .iter()
            .map(|record| {
                let baseline = self.store.baseline(record.dataset())?;
                Ok(speedups(baseline, record))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.build_series(&records, values, style))
    }

    /// The measured times themselves, one series per selected record.
    pub fn time_series(&self, selection: &Selection, style: &StylePolicy) -> Result<Vec<SeriesData>> {
        let records = self.select(selection)?;
        let values = records
            .iter()
            .map(|record| record.times().to_vec())
            .collect();

        Ok(self.build_series(&records, values, style))
    }

    /// A single series over all dataset profiles, or none if there are no
    /// profiles. Points keep the input order and are labeled with the
    /// dataset names.
    pub fn profile_series(&self, x: ProfileMetric, y: ProfileMetric) -> Vec<SeriesData> {
        let profiles: Vec<_> = self.store.profiles().collect();
        if profiles.is_empty() {
            return Vec::new();
        }

        let points = profiles
            .iter()
            .map(|profile| Point::new(profile.metric(x), profile.metric(y)))
            .collect();
        let names = profiles
            .iter()
            .map(|profile| profile.name.clone())
            .collect();

        let series = SeriesData::new(
            format!("{y} vs. {x}"),
            points,
            self.palette.color_at(0),
            LineDash::Solid,
        )
        .with_point_labels(names);

        vec![series]
    }

    fn select(&self, selection: &Selection) -> Result<Vec<&'a MeasurementRecord>> {
        for dataset in selection.datasets.iter().flatten() {
            self.store.measurements(dataset)?;
        }

        Ok(self
            .store
            .records()
            .filter(|record| selection.includes(record))
            .collect())
    }

    fn build_series(
        &self,
        records: &[&MeasurementRecord],
        values: Vec<Vec<f64>>,
        style: &StylePolicy,
    ) -> Vec<SeriesData> {
        let labels = series_labels(records);

        records
            .iter()
            .zip(values)
            .zip(labels)
            .enumerate()
            .map(|(position, ((record, values), label))| {
                let points = record
                    .x()
                    .iter()
                    .zip(values)
                    .map(|(&x, y)| Point::new(x, y))
                    .collect();

                let color = match style.color_by {
                    ColorBy::Dataset => self.palette.color_for(record.dataset()),
                    ColorBy::Position => self.palette.color_at(position),
                };

                SeriesData::new(
                    label,
                    points,
                    color,
                    style.dash_for(record.configuration()),
                )
            })
            .collect()
    }
}

/// Dataset names, qualified with the configuration fields that differ
/// between the records, e.g. `test.txt (Tasks=64)`.
fn series_labels(records: &[&MeasurementRecord]) -> Vec<String> {
    let Some(first) = records.first().map(|record| *record.configuration()) else {
        return Vec::new();
    };

    let differs = |field: fn(&Configuration) -> Option<u32>| {
        records
            .iter()
            .any(|record| field(record.configuration()) != field(&first))
    };
    let kmer_size_differs = differs(|c: &Configuration| c.kmer_size);
    let node_count_differs = differs(|c: &Configuration| c.node_count);
    let tasks_per_node_differs = differs(|c: &Configuration| c.tasks_per_node);

    records
        .iter()
        .map(|record| {
            let configuration = record.configuration();
            let shown = Configuration {
                kmer_size: configuration.kmer_size.filter(|_| kmer_size_differs),
                node_count: configuration.node_count.filter(|_| node_count_differs),
                tasks_per_node: configuration
                    .tasks_per_node
                    .filter(|_| tasks_per_node_differs),
            };

            if shown.is_empty() {
                record.dataset().to_owned()
            } else {
                format!("{} ({shown})", record.dataset())
            }
        })
        .collect()
}
