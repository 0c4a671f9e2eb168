use clap::Parser;
use std::path::PathBuf;

use assembly_speedup_plots::charts::{ChartConfig, ChartKind};

/// Speedup and scaling charts for parallel assembly benchmarks
#[derive(Parser)]
#[command()]
pub struct Args {
    #[arg(default_value = "speedup_config.toml")]
    pub config_file: PathBuf,

    /// Only plot charts of these kinds
    #[arg(short, long, value_enum)]
    pub kind: Vec<ChartKind>,

    /// Only plot the charts with these names
    #[arg(short, long)]
    pub chart: Vec<String>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn selects(&self, chart: &ChartConfig) -> bool {
        (self.kind.is_empty() || self.kind.contains(&chart.kind))
            && (self.chart.is_empty() || self.chart.contains(&chart.name))
    }
}
