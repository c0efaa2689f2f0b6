use crate::export::{export_all, ExportedFiles};
use crate::ingest::{discover_input, load_csv, CleaningReport, ExtraColumns};
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use phenocore::engine::{summarize, RunSummary};
use phenocore::prelude::Observation;
use phenocore::{Pipeline, PipelineOutput};
use std::path::PathBuf;

pub struct WorkflowResult {
    /// Input table, absent for synthetic runs.
    pub source: Option<PathBuf>,
    pub cleaning: Option<CleaningReport>,
    /// Input columns passed through to the records export.
    pub extra: ExtraColumns,
    pub output: PipelineOutput,
    pub summary: RunSummary,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    pipeline: Pipeline,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> anyhow::Result<Self> {
        let pipeline =
            Pipeline::new(config.to_pipeline_config()).context("validating pipeline config")?;
        Ok(Self { config, pipeline })
    }

    /// Configured input file, or the first suitable CSV in `input_dir`.
    pub fn resolve_input(&self) -> anyhow::Result<PathBuf> {
        match &self.config.input {
            Some(path) => Ok(path.clone()),
            None => discover_input(&self.config.input_dir),
        }
    }

    pub fn execute(&self, observations: Vec<Observation>) -> anyhow::Result<WorkflowResult> {
        let output = self
            .pipeline
            .run(observations)
            .context("running phenology pipeline")?;
        let summary = summarize(&output.records);
        Ok(WorkflowResult {
            source: None,
            cleaning: None,
            extra: ExtraColumns::default(),
            output,
            summary,
        })
    }

    pub fn execute_csv(&self) -> anyhow::Result<WorkflowResult> {
        let path = self.resolve_input()?;
        log::info!("reading {}", path.display());
        let input = load_csv(&path)?;
        let mut result = self.execute(input.observations)?;
        result.source = Some(path);
        result.cleaning = Some(input.report);
        result.extra = input.extra;
        Ok(result)
    }

    pub fn export(&self, result: &WorkflowResult) -> anyhow::Result<ExportedFiles> {
        export_all(
            &self.config.output_dir,
            &result.output.records,
            &result.extra,
            &result.output.transitions,
            self.config.snapshot_date,
        )
        .with_context(|| format!("exporting to {}", self.config.output_dir.display()))
    }
}
