use jiff::Zoned;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

const CHART_EXTENSION: &str = "svg";

/// Where the charts of one analysis run go:
/// `<output folder>/<run name>/<timestamp>/plots/<chart>.svg`.
pub struct RunFolder {
    run_folder: PathBuf,
}

impl RunFolder {
    pub fn new<P: AsRef<Path>>(output_folder: P, run_name: &str) -> Self {
        let timestamp = Zoned::now().strftime("%F--%H-%M-%S").to_string();
        let run_folder = output_folder.as_ref().join(run_name).join(timestamp);

        Self { run_folder }
    }

    pub fn get(&self) -> &Path {
        &self.run_folder
    }

    pub fn plot_folder(&self) -> PathBuf {
        self.run_folder.join("plots")
    }

    /// Output file of the chart `name`. The plot folder is created on demand.
    pub fn chart_path(&self, name: &str) -> Result<PathBuf> {
        let plot_folder = self.plot_folder();
        fs::create_dir_all(&plot_folder)?;

        Ok(chart_file(&plot_folder, name))
    }
}

/// `<folder>/<name>.svg`
pub fn chart_file(folder: &Path, name: &str) -> PathBuf {
    folder.join(format!("{name}.{CHART_EXTENSION}"))
}
