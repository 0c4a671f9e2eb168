mod cli;

use anyhow::Result;
use clap::Parser;

use assembly_speedup_plots::{charts, config::AnalysisConfig, folder_structure::RunFolder};

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = AnalysisConfig::from_file(&args.config_file)?;
    config.setup()?;

    let store = config.measurement_store()?;

    let run_name = args
        .config_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("speedup_analysis");
    let run_folder = RunFolder::new(&config.output_folder, run_name);

    charts::run_charts(
        config.charts.iter().filter(|chart| args.selects(chart)),
        &store,
        &run_folder,
        &config,
    )
}
