use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::charts::ChartConfig;
use crate::error;
use crate::measurements::{BaselineRecord, DatasetProfile, MeasurementRecord, MeasurementStore};
use crate::plots::ImageSize;
use crate::series::SeriesColor;
use crate::speedup::Palette;

// config that is read from a file.
// it holds the benchmark results as well as the charts to draw from them
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub output_folder: PathBuf,
    #[serde(default)]
    pub image: ImageSize,
    /// serial execution time in seconds per dataset
    #[serde(default)]
    pub baselines: BTreeMap<String, f64>,
    #[serde(default)]
    pub colors: BTreeMap<String, SeriesColor>,
    #[serde(default)]
    pub measurements: Vec<MeasurementRecord>,
    #[serde(default)]
    pub datasets: Vec<DatasetProfile>,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
}

impl AnalysisConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_file_str = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_toml(&config_file_str)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        Ok(toml::from_str(config_str)?)
    }

    pub fn all_plots_folder(&self) -> PathBuf {
        let mut base_output_folder = self.output_folder.clone();
        base_output_folder.push("all_plots");
        base_output_folder
    }

    pub fn setup(&self) -> Result<()> {
        let all_plots_dir = self.all_plots_folder();
        if !all_plots_dir.exists() {
            fs::create_dir_all(all_plots_dir)?;
        }

        Ok(())
    }

    pub fn measurement_store(&self) -> error::Result<MeasurementStore> {
        MeasurementStore::new(
            self.baselines
                .iter()
                .map(|(dataset, &seconds)| BaselineRecord::new(dataset.as_str(), seconds)),
            self.measurements.iter().cloned(),
            self.datasets.iter().cloned(),
        )
    }

    pub fn palette(&self) -> Palette {
        Palette::new(self.colors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartKind;
    use crate::error::AnalysisError;
    use crate::measurements::Parallelism;
    use crate::plots::AnnotationPoint;

    const SAMPLE_CONFIG: &str = include_str!("../speedup_config.toml");

    #[test]
    fn sample_config_builds_a_store() {
        let config = AnalysisConfig::from_toml(SAMPLE_CONFIG).unwrap();

        assert_eq!(config.output_folder, PathBuf::from("speedup_output"));
        assert_eq!(config.baselines.len(), 6);
        assert_eq!(config.measurements.len(), 21);
        assert_eq!(config.charts.len(), 8);

        let store = config.measurement_store().unwrap();
        assert_eq!(store.baseline("test.txt").unwrap().serial_seconds(), 4.729069);
        assert_eq!(store.profiles().count(), 6);

        let human = store.measurements("human-chr14-synthetic.txt").unwrap();
        assert_eq!(human.len(), 6);
        assert_eq!(human[0].varies(), Parallelism::TasksPerNode);
        assert_eq!(human[0].configuration().node_count, Some(1));
        assert_eq!(human[0].x()[7], 128.0);
    }

    #[test]
    fn sample_charts_are_parsed() {
        let config = AnalysisConfig::from_toml(SAMPLE_CONFIG).unwrap();

        let vs_nodes = config
            .charts
            .iter()
            .find(|chart| chart.name == "kmer51_speedup_vs_nodes")
            .unwrap();
        assert_eq!(vs_nodes.kind, ChartKind::Speedup);
        assert_eq!(vs_nodes.annotate, Some(AnnotationPoint::Index(1)));
        assert_eq!(vs_nodes.ideal_reference, Some(false));
        assert_eq!(
            vs_nodes.style.dashed.unwrap().tasks_per_node,
            Some(64)
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let config = r#"
            output_folder = "out"

            [[measurements]]
            dataset = "test.txt"
            varies = "tasks_per_node"
            x = [1]
            times = [5.0]
            threads = 4
        "#;

        assert!(AnalysisConfig::from_toml(config).is_err());
    }

    #[test]
    fn malformed_measurements_fail_on_store_construction() {
        let config = r#"
            output_folder = "out"

            [baselines]
            "test.txt" = 4.729069

            [[measurements]]
            dataset = "test.txt"
            varies = "tasks_per_node"
            x = [1, 2]
            times = [5.042901]
        "#;

        let config = AnalysisConfig::from_toml(config).unwrap();
        assert!(matches!(
            config.measurement_store(),
            Err(AnalysisError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn colors_override_the_palette() {
        let config = AnalysisConfig::from_toml(SAMPLE_CONFIG).unwrap();

        assert_eq!(
            config.palette().color_for("tiny.txt"),
            SeriesColor::new("orange")
        );
    }
}
