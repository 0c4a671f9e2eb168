use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Deserialize;
use strum::Display;

use crate::error::{AnalysisError, Result};

/// The dimension a measurement record varies along its x-axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Parallelism {
    TasksPerNode,
    NodeCount,
}

impl Parallelism {
    pub fn axis_name(&self) -> &'static str {
        match self {
            Parallelism::TasksPerNode => "Number of Tasks per Node",
            Parallelism::NodeCount => "Node Count (N)",
        }
    }
}

/// The fixed parameters of a benchmark run. Also used as a filter, where
/// every field that is set has to match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    pub kmer_size: Option<u32>,
    pub node_count: Option<u32>,
    pub tasks_per_node: Option<u32>,
}

impl Configuration {
    pub fn matches(&self, filter: &Configuration) -> bool {
        fn field_matches(value: Option<u32>, wanted: Option<u32>) -> bool {
            wanted.is_none() || value == wanted
        }

        field_matches(self.kmer_size, filter.kmer_size)
            && field_matches(self.node_count, filter.node_count)
            && field_matches(self.tasks_per_node, filter.tasks_per_node)
    }

    pub fn is_empty(&self) -> bool {
        *self == Configuration::default()
    }

    fn fixes(&self, parallelism: Parallelism) -> bool {
        match parallelism {
            Parallelism::TasksPerNode => self.tasks_per_node.is_some(),
            Parallelism::NodeCount => self.node_count.is_some(),
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = [
            self.kmer_size.map(|k| format!("k={k}")),
            self.node_count.map(|n| format!("N={n}")),
            self.tasks_per_node.map(|t| format!("Tasks={t}")),
        ]
        .into_iter()
        .flatten()
        .collect();

        write!(f, "{}", parts.join(", "))
    }
}

/// Elapsed times of one dataset under one configuration, aligned with the
/// values of the varied dimension.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasurementRecord {
    dataset: String,
    varies: Parallelism,
    #[serde(default)]
    configuration: Configuration,
    x: Vec<f64>,
    times: Vec<f64>,
}

impl MeasurementRecord {
    pub fn new(
        dataset: impl Into<String>,
        varies: Parallelism,
        configuration: Configuration,
        x: Vec<f64>,
        times: Vec<f64>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            varies,
            configuration,
            x,
            times,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn varies(&self) -> Parallelism {
        self.varies
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    fn validate(&self) -> Result<()> {
        if self.times.is_empty() {
            return Err(AnalysisError::malformed(&self.dataset, "no measured times"));
        }

        if self.x.len() != self.times.len() {
            return Err(AnalysisError::malformed(
                &self.dataset,
                format!(
                    "{} x values but {} measured times",
                    self.x.len(),
                    self.times.len()
                ),
            ));
        }

        if let Some((index, time)) = self
            .times
            .iter()
            .enumerate()
            .find(|&(_, &t)| !is_positive_finite(t))
        {
            return Err(AnalysisError::malformed(
                &self.dataset,
                format!("time #{index} ({time}) is not a positive finite number"),
            ));
        }

        if let Some((index, x)) = self
            .x
            .iter()
            .enumerate()
            .find(|&(_, &x)| !is_positive_finite(x))
        {
            return Err(AnalysisError::malformed(
                &self.dataset,
                format!("x value #{index} ({x}) is not a positive finite number"),
            ));
        }

        if self.x.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(AnalysisError::malformed(
                &self.dataset,
                "x values are not strictly increasing",
            ));
        }

        if self.configuration.fixes(self.varies) {
            return Err(AnalysisError::malformed(
                &self.dataset,
                format!(
                    "configuration ({}) fixes {}, which the record varies over",
                    self.configuration, self.varies
                ),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineRecord {
    dataset: String,
    serial_seconds: f64,
}

impl BaselineRecord {
    pub fn new(dataset: impl Into<String>, serial_seconds: f64) -> Self {
        Self {
            dataset: dataset.into(),
            serial_seconds,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn serial_seconds(&self) -> f64 {
        self.serial_seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMetric {
    #[strum(serialize = "File Size (bytes)")]
    FileSize,
    #[strum(serialize = "Number of Contigs")]
    Contigs,
    #[strum(serialize = "Assembly Time (s)")]
    AssemblyTime,
}

/// Static facts about an input dataset of the assembler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetProfile {
    pub name: String,
    pub file_size_bytes: u64,
    pub contigs: u64,
    pub assembly_seconds: f64,
}

impl DatasetProfile {
    pub fn metric(&self, metric: ProfileMetric) -> f64 {
        match metric {
            ProfileMetric::FileSize => self.file_size_bytes as f64,
            ProfileMetric::Contigs => self.contigs as f64,
            ProfileMetric::AssemblyTime => self.assembly_seconds,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.file_size_bytes == 0 || self.contigs == 0 {
            return Err(AnalysisError::malformed(
                &self.name,
                "file size and number of contigs must be positive",
            ));
        }

        if !is_positive_finite(self.assembly_seconds) {
            return Err(AnalysisError::malformed(
                &self.name,
                format!(
                    "assembly time ({}) is not a positive finite number",
                    self.assembly_seconds
                ),
            ));
        }

        Ok(())
    }
}

/// All benchmark inputs of one analysis run. Everything is validated on
/// construction and read-only afterwards.
#[derive(Debug, Default)]
pub struct MeasurementStore {
    baselines: BTreeMap<String, BaselineRecord>,
    records: Vec<MeasurementRecord>,
    profiles: Vec<DatasetProfile>,
}

impl MeasurementStore {
    pub fn new(
        baselines: impl IntoIterator<Item = BaselineRecord>,
        records: impl IntoIterator<Item = MeasurementRecord>,
        profiles: impl IntoIterator<Item = DatasetProfile>,
    ) -> Result<Self> {
        let mut baselines_by_dataset = BTreeMap::new();
        for baseline in baselines {
            if !is_positive_finite(baseline.serial_seconds) {
                return Err(AnalysisError::malformed(
                    &baseline.dataset,
                    format!(
                        "serial baseline ({}) is not a positive finite number",
                        baseline.serial_seconds
                    ),
                ));
            }

            if baselines_by_dataset.contains_key(&baseline.dataset) {
                return Err(AnalysisError::malformed(
                    &baseline.dataset,
                    "more than one serial baseline",
                ));
            }

            baselines_by_dataset.insert(baseline.dataset.clone(), baseline);
        }

        let records: Vec<_> = records.into_iter().collect();
        let mut seen = HashSet::new();
        for record in &records {
            record.validate()?;

            if !seen.insert((record.dataset(), record.varies, record.configuration)) {
                return Err(AnalysisError::malformed(
                    &record.dataset,
                    format!(
                        "duplicate record for configuration ({}) varying {}",
                        record.configuration, record.varies
                    ),
                ));
            }
        }

        let profiles: Vec<_> = profiles.into_iter().collect();
        let mut seen_profiles = HashSet::new();
        for profile in &profiles {
            profile.validate()?;

            if !seen_profiles.insert(profile.name.as_str()) {
                return Err(AnalysisError::malformed(
                    &profile.name,
                    "more than one dataset profile",
                ));
            }
        }

        Ok(Self {
            baselines: baselines_by_dataset,
            records,
            profiles,
        })
    }

    pub fn baseline(&self, dataset: &str) -> Result<&BaselineRecord> {
        self.baselines
            .get(dataset)
            .ok_or_else(|| AnalysisError::MissingBaseline(dataset.to_owned()))
    }

    /// Records of one dataset in input order. (varied dimension, configuration)
    /// is unique among them.
    pub fn measurements(&self, dataset: &str) -> Result<Vec<&MeasurementRecord>> {
        if !self.contains_dataset(dataset) {
            return Err(AnalysisError::DatasetNotFound(dataset.to_owned()));
        }

        Ok(self
            .records
            .iter()
            .filter(|record| record.dataset == dataset)
            .collect())
    }

    pub fn records(&self) -> impl Iterator<Item = &MeasurementRecord> {
        self.records.iter()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &DatasetProfile> {
        self.profiles.iter()
    }

    pub fn contains_dataset(&self, dataset: &str) -> bool {
        self.baselines.contains_key(dataset)
            || self.records.iter().any(|record| record.dataset == dataset)
            || self.profiles.iter().any(|profile| profile.name == dataset)
    }
}

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(times: Vec<f64>) -> MeasurementRecord {
        let x = (0..times.len()).map(|i| 2f64.powi(i as i32)).collect();
        MeasurementRecord::new(
            "test.txt",
            Parallelism::TasksPerNode,
            Configuration {
                node_count: Some(1),
                ..Default::default()
            },
            x,
            times,
        )
    }

    fn store_with(records: Vec<MeasurementRecord>) -> Result<MeasurementStore> {
        MeasurementStore::new([BaselineRecord::new("test.txt", 4.729069)], records, [])
    }

    fn assert_malformed(result: Result<MeasurementStore>) {
        assert!(
            matches!(result, Err(AnalysisError::MalformedRecord { .. })),
            "expected MalformedRecord, got {result:?}"
        );
    }

    #[test]
    fn accepts_valid_records() {
        let store = store_with(vec![record(vec![5.042901, 6.043239, 4.510081])]).unwrap();

        assert_eq!(store.baseline("test.txt").unwrap().serial_seconds(), 4.729069);
        assert_eq!(store.measurements("test.txt").unwrap().len(), 1);
        assert_eq!(store.records().count(), 1);
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut bad = record(vec![1.0, 2.0]);
        bad.x.push(4.0);
        bad.x.push(8.0);

        assert_malformed(store_with(vec![bad]));
    }

    #[test]
    fn rejects_non_positive_and_non_finite_times() {
        for time in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_malformed(store_with(vec![record(vec![1.0, time])]));
        }
    }

    #[test]
    fn rejects_empty_and_unordered_x() {
        assert_malformed(store_with(vec![record(vec![])]));

        let mut unordered = record(vec![1.0, 2.0]);
        unordered.x = vec![2.0, 1.0];
        assert_malformed(store_with(vec![unordered]));
    }

    #[test]
    fn rejects_configuration_fixing_the_varied_dimension() {
        let mut bad = record(vec![1.0]);
        bad.configuration.tasks_per_node = Some(64);

        assert_malformed(store_with(vec![bad]));
    }

    #[test]
    fn rejects_duplicate_records_and_baselines() {
        assert_malformed(store_with(vec![record(vec![1.0]), record(vec![2.0])]));

        let duplicate_baselines = MeasurementStore::new(
            [
                BaselineRecord::new("test.txt", 1.0),
                BaselineRecord::new("test.txt", 2.0),
            ],
            [],
            [],
        );
        assert_malformed(duplicate_baselines);
    }

    #[test]
    fn rejects_non_positive_baseline() {
        let result = MeasurementStore::new([BaselineRecord::new("test.txt", 0.0)], [], []);
        assert_malformed(result);
    }

    #[test]
    fn missing_baseline_is_reported_on_lookup() {
        let store = MeasurementStore::new(
            [],
            [MeasurementRecord::new(
                "kmer51",
                Parallelism::TasksPerNode,
                Configuration::default(),
                vec![1.0],
                vec![136.002856],
            )],
            [],
        )
        .unwrap();

        assert!(matches!(
            store.baseline("kmer51"),
            Err(AnalysisError::MissingBaseline(name)) if name == "kmer51"
        ));
        assert_eq!(store.measurements("kmer51").unwrap().len(), 1);
    }

    #[test]
    fn unknown_dataset_is_not_found() {
        let store = store_with(vec![]).unwrap();

        assert!(matches!(
            store.measurements("huge.txt"),
            Err(AnalysisError::DatasetNotFound(_))
        ));
        assert!(store.measurements("test.txt").unwrap().is_empty());
    }

    #[test]
    fn configuration_filter_and_display() {
        let configuration = Configuration {
            kmer_size: Some(19),
            node_count: None,
            tasks_per_node: Some(64),
        };

        assert!(configuration.matches(&Configuration::default()));
        assert!(configuration.matches(&Configuration {
            tasks_per_node: Some(64),
            ..Default::default()
        }));
        assert!(!configuration.matches(&Configuration {
            node_count: Some(2),
            ..Default::default()
        }));
        assert_eq!(configuration.to_string(), "k=19, Tasks=64");
    }

    #[test]
    fn rejects_degenerate_profiles() {
        let profile = DatasetProfile {
            name: "tiny.txt".into(),
            file_size_bytes: 82340,
            contigs: 0,
            assembly_seconds: 0.001006,
        };

        assert_malformed(MeasurementStore::new([], [], [profile]));
    }
}
