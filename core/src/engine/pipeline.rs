use crate::engine::transitions::{first_occurrences, run_starts};
use crate::prelude::{
    AnnotatedRecord, Observation, PipelineConfig, PlotFrame, PlotSeries, ProcessingStage,
    StageError, StageResult,
};
use crate::processing::{ClassifierStage, FeatureStage, SlopeStage, SmoothingStage};
use crate::series::{group_by_plot, StageTransition};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use rayon::prelude::*;

/// Scratch buffers kept by each worker's slope stage.
const SLOPE_POOL_SIZE: usize = 2;

/// Slope, feature, smoothing and classifier stages, initialized and run in
/// that order over one plot at a time.
pub struct StageChain {
    stages: Vec<Box<dyn ProcessingStage + Send>>,
}

impl StageChain {
    pub fn new(config: &PipelineConfig) -> StageResult<Self> {
        Self::with_stages(
            vec![
                Box::new(SlopeStage::new(SLOPE_POOL_SIZE)),
                Box::new(FeatureStage::new()),
                Box::new(SmoothingStage::new()),
                Box::new(ClassifierStage::new()),
            ],
            config,
        )
    }

    pub fn with_stages(
        mut stages: Vec<Box<dyn ProcessingStage + Send>>,
        config: &PipelineConfig,
    ) -> StageResult<Self> {
        for stage in stages.iter_mut() {
            stage.initialize(config)?;
        }
        Ok(Self { stages })
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run(&mut self, series: PlotSeries) -> StageResult<PlotFrame> {
        self.stages
            .iter_mut()
            .try_fold(PlotFrame::new(series), |frame, stage| stage.execute(frame))
    }

    pub fn cleanup(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.cleanup();
        }
    }
}

/// Per-worker chains in the parallel path are only ever dropped.
impl Drop for StageChain {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Annotated rows ordered by plot id, then date.
    pub records: Vec<AnnotatedRecord>,
    /// First date of every stage per plot.
    pub transitions: Vec<StageTransition>,
    pub metrics: MetricsSnapshot,
}

/// Runs every plot through the stage chain, one independent task per plot.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> StageResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, observations: Vec<Observation>) -> StageResult<PipelineOutput> {
        self.run_series(group_by_plot(observations)?)
    }

    pub fn run_series(&self, series: Vec<PlotSeries>) -> StageResult<PipelineOutput> {
        let metrics = MetricsRecorder::new();
        let logger = LogManager::new();
        logger.record(&format!(
            "processing {} plots (window {} days, rolling median over {})",
            series.len(),
            self.config().slope.window_days,
            self.config().classification.roll_window
        ));

        let per_plot = series
            .into_par_iter()
            .map_init(
                || StageChain::new(&self.config),
                |chain, series| -> StageResult<Vec<AnnotatedRecord>> {
                    let plot_id = series.plot_id();
                    let chain = chain
                        .as_mut()
                        .map_err(|err| StageError::Internal(format!("stage chain: {}", err)))?;
                    match chain.run(series).and_then(PlotFrame::into_records) {
                        Ok(records) => {
                            let stages: Vec<_> = records.iter().map(|r| r.stage).collect();
                            metrics.record_plot(&stages);
                            log_run_starts(plot_id, &records);
                            Ok(records)
                        }
                        Err(err) => {
                            metrics.record_error();
                            LogManager::for_plot(plot_id).warn(&format!("failed: {}", err));
                            Err(err)
                        }
                    }
                },
            )
            .collect::<StageResult<Vec<Vec<AnnotatedRecord>>>>()?;

        let records: Vec<AnnotatedRecord> = per_plot.into_iter().flatten().collect();
        let transitions = first_occurrences(&records);
        let metrics = metrics.snapshot();
        logger.record(&format!(
            "classified {} rows across {} plots",
            metrics.rows_classified, metrics.plots_processed
        ));

        Ok(PipelineOutput {
            records,
            transitions,
            metrics,
        })
    }

    /// Sequential single-plot run, for callers that schedule plots themselves.
    pub fn process_plot(&self, series: PlotSeries) -> StageResult<Vec<AnnotatedRecord>> {
        let mut chain = StageChain::new(&self.config)?;
        chain.run(series).and_then(PlotFrame::into_records)
    }
}

fn log_run_starts(plot_id: i64, records: &[AnnotatedRecord]) {
    let logger = LogManager::for_plot(plot_id);
    for start in run_starts(records) {
        logger.detail(&format!("{} -> {}", start.date, start.stage));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{ClassificationParams, StageLabel};
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn obs(plot_id: i64, day: i64, ndvi: f64, savi: f64, ndwi: f64) -> Observation {
        let origin = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        Observation::new(plot_id, origin + Duration::days(day), ndvi, savi, ndwi)
    }

    fn season(plot_id: i64) -> Vec<Observation> {
        let curve = [
            0.12, 0.14, 0.19, 0.27, 0.36, 0.46, 0.55, 0.62, 0.66, 0.67, 0.66, 0.60, 0.48, 0.35,
        ];
        curve
            .iter()
            .enumerate()
            .map(|(i, &ndvi)| obs(plot_id, i as i64 * 6, ndvi, ndvi * 0.8, 0.1))
            .collect()
    }

    struct CountingStage {
        cleanups: Arc<AtomicUsize>,
    }

    impl ProcessingStage for CountingStage {
        fn name(&self) -> &'static str {
            "CountingStage"
        }

        fn initialize(&mut self, _config: &PipelineConfig) -> StageResult<()> {
            Ok(())
        }

        fn execute(&mut self, frame: PlotFrame) -> StageResult<PlotFrame> {
            Ok(frame)
        }

        fn cleanup(&mut self) {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn dropping_a_chain_cleans_up_its_stages() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let chain = StageChain::with_stages(
            vec![Box::new(CountingStage {
                cleanups: cleanups.clone(),
            })],
            &PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(chain.stage_names(), vec!["CountingStage"]);
        drop(chain);
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn chain_runs_stages_in_order() {
        let chain = StageChain::new(&PipelineConfig::default()).unwrap();
        assert_eq!(
            chain.stage_names(),
            vec!["SlopeStage", "FeatureStage", "SmoothingStage", "ClassifierStage"]
        );
    }

    #[test]
    fn rising_low_greenness_pair_is_seedling() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let output = pipeline
            .run(vec![obs(5, 0, 0.20, 0.10, 0.0), obs(5, 8, 0.36, 0.26, 0.0)])
            .unwrap();

        let first = &output.records[0];
        assert!((first.ndvi_slope - 0.02).abs() < 1e-12);
        assert!((first.savi_slope - 0.02).abs() < 1e-12);
        assert!((first.g - 0.16).abs() < 1e-12);
        // both rows smooth to the median of G = 0.16 and G = 0.32
        assert!((first.g_sm - 0.24).abs() < 1e-12);
        for record in &output.records {
            assert_eq!(record.stage, StageLabel::Seedling);
            assert_eq!(record.stage_code, 1);
        }
    }

    #[test]
    fn ten_day_gap_falls_outside_the_slope_window() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let output = pipeline
            .run(vec![obs(5, 0, 0.20, 0.20, 0.0), obs(5, 10, 0.40, 0.40, 0.0)])
            .unwrap();

        for record in &output.records {
            assert_eq!(record.ndvi_slope, 0.0);
            assert_eq!(record.savi_slope, 0.0);
            assert_eq!(record.stage, StageLabel::Bare);
        }
    }

    #[test]
    fn isolated_observations_are_bare() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let output = pipeline
            .run(vec![obs(1, 0, 0.1, 0.1, 0.0), obs(1, 30, 0.15, 0.1, 0.0)])
            .unwrap();
        assert!(output.records.iter().all(|r| r.ndvi_slope == 0.0));
        assert!(output.records.iter().all(|r| r.stage == StageLabel::Bare));
    }

    #[test]
    fn records_come_back_sorted_by_plot_then_date() {
        let mut observations = season(9);
        observations.extend(season(2));
        observations.reverse();

        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let output = pipeline.run(observations).unwrap();

        assert_eq!(output.records.len(), 28);
        assert!(output
            .records
            .windows(2)
            .all(|w| (w[0].plot_id, w[0].date) < (w[1].plot_id, w[1].date)));
        assert_eq!(output.metrics.plots_processed, 2);
        assert_eq!(output.metrics.rows_classified, 28);
    }

    #[test]
    fn full_season_passes_through_growth_and_ripening() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let output = pipeline.run(season(1)).unwrap();

        let stages: Vec<StageLabel> = output.transitions.iter().map(|t| t.stage).collect();
        assert!(stages.contains(&StageLabel::Growth));
        assert!(stages.contains(&StageLabel::Ripening));
        assert_eq!(output.records.last().map(|r| r.stage), Some(StageLabel::Ripening));
    }

    #[test]
    fn rerunning_on_raw_columns_is_idempotent() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let mut observations = season(1);
        observations.extend(season(4));
        let first = pipeline.run(observations).unwrap();

        let raw: Vec<Observation> = first
            .records
            .iter()
            .map(|r| Observation::new(r.plot_id, r.date, r.ndvi, r.savi, r.ndwi))
            .collect();
        let second = pipeline.run(raw).unwrap();

        assert_eq!(first.records, second.records);
        assert_eq!(first.transitions, second.transitions);
    }

    #[test]
    fn plots_do_not_influence_each_other() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let alone = pipeline.run(season(1)).unwrap();

        let mut mixed = season(1);
        mixed.extend(season(3).into_iter().map(|mut o| {
            o.ndvi = 0.9;
            o
        }));
        let together = pipeline.run(mixed).unwrap();

        let plot_one: Vec<_> = together
            .records
            .into_iter()
            .filter(|r| r.plot_id == 1)
            .collect();
        assert_eq!(alone.records, plot_one);
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let result = pipeline.run(vec![obs(1, 0, 0.1, 0.1, 0.0), obs(1, 0, 0.2, 0.1, 0.0)]);
        assert!(matches!(result, Err(StageError::InvalidInput(_))));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = PipelineConfig {
            classification: ClassificationParams {
                roll_window: 0,
                ..ClassificationParams::default()
            },
            ..PipelineConfig::default()
        };
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn single_plot_run_matches_parallel_run() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let series = PlotSeries::new(1, season(1)).unwrap();
        let sequential = pipeline.process_plot(series).unwrap();
        let parallel = pipeline.run(season(1)).unwrap();
        assert_eq!(sequential, parallel.records);
    }
}
