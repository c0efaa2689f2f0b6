use chrono::NaiveDate;
use clap::Parser;
use generator::profile::build_seasons;
use gui_bridge::bridge::{GuiBridge, DEFAULT_PORT};
use gui_bridge::model::VisualizationModel;
use phenocore::series::StageLabel;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::{Runner, WorkflowResult};

mod export;
mod generator;
mod gui_bridge;
mod ingest;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Per-plot index slopes and phenology stages")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Input CSV; skips discovery in the input directory
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    input_dir: Option<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Slope window width in days
    #[arg(long)]
    window_days: Option<u32>,
    /// Rolling-median width applied before classification
    #[arg(long)]
    roll_window: Option<usize>,
    /// Also write the stage snapshot for this date (YYYY-MM-DD)
    #[arg(long)]
    snapshot_date: Option<NaiveDate>,
    /// Classify this many synthetic plots instead of reading a CSV
    #[arg(long)]
    synthetic: Option<usize>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Keep the JSON bridge alive after the run
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

impl Args {
    fn workflow_config(&self) -> anyhow::Result<WorkflowConfig> {
        let mut config = match &self.workflow {
            Some(path) => WorkflowConfig::load(path)?,
            None => WorkflowConfig::default(),
        };
        config.apply_overrides(self.window_days, self.roll_window);
        if let Some(input) = &self.input {
            config.input = Some(input.clone());
        }
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.snapshot_date.is_some() {
            config.snapshot_date = self.snapshot_date;
        }
        Ok(config)
    }
}

fn print_summary(result: &WorkflowResult) {
    let summary = &result.summary;
    let range = match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => format!("{} .. {}", first, last),
        _ => "n/a".to_string(),
    };
    println!(
        "Processed {} plots, {} rows, dates {}",
        summary.plots, summary.rows, range
    );
    let counts: Vec<String> = StageLabel::ALL
        .iter()
        .map(|&stage| format!("{}={}", stage, result.output.metrics.count_for(stage)))
        .collect();
    println!("Stage rows: {}", counts.join(" "));
    println!("Transitions: {}", result.output.transitions.len());
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let runner = Runner::new(args.workflow_config()?)?;
    let result = match args.synthetic {
        Some(plots) => runner.execute(build_seasons(plots, args.seed)?)?,
        None => runner.execute_csv()?,
    };

    let files = runner.export(&result)?;
    println!("Saved {}", files.records.display());
    println!("Saved {}", files.transitions.display());
    if let Some(path) = &files.snapshot {
        println!("Saved {}", path.display());
    }
    print_summary(&result);

    if args.serve {
        let gui_bridge = GuiBridge::new();
        gui_bridge.publish(VisualizationModel::from_result(&result));
        gui_bridge.serve(args.port)?;
    }

    Ok(())
}
