use crate::math::pairwise::{median_pairwise_slope, window_bounds};
use crate::math::stats::StatsHelper;
use crate::prelude::{
    PipelineConfig, PlotFrame, ProcessingStage, SlopeAnnotation, SlopeConfig, StageError,
    StageResult,
};
use crate::processing::buffer_pool::BufferPool;
use crate::series::{IndexColumn, PlotSeries};
use crate::telemetry::log::LogManager;

/// Robust local slope of `values` at every point.
///
/// For each point, every neighbour within `half_window` days (inclusive)
/// forms the window; the slope is the median of all pairwise slopes in it.
/// Windows with fewer than two points, and non-finite medians, give 0.
pub fn temporal_slopes(
    days: &[i64],
    values: &[f64],
    half_window: f64,
    scratch: &mut Vec<f64>,
) -> Vec<f64> {
    (0..days.len())
        .map(|i| {
            let (start, end) = window_bounds(days, i, half_window);
            if end - start < 2 {
                return 0.0;
            }
            median_pairwise_slope(&days[start..end], &values[start..end], scratch)
                .map(StatsHelper::finite_or_zero)
                .unwrap_or(0.0)
        })
        .collect()
}

/// Slopes of one index column of a plot series.
pub fn column_slopes(series: &PlotSeries, column: IndexColumn, config: &SlopeConfig) -> Vec<f64> {
    let mut scratch = Vec::new();
    temporal_slopes(
        &series.day_offsets(),
        &series.column(column),
        config.half_window(),
        &mut scratch,
    )
}

/// Stage computing NDVI, SAVI and NDWI slopes independently.
pub struct SlopeStage {
    pool: BufferPool,
    config: Option<SlopeConfig>,
    logger: LogManager,
}

impl SlopeStage {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool: BufferPool::with_capacity(pool_size.max(1)),
            config: None,
            logger: LogManager::new(),
        }
    }
}

impl ProcessingStage for SlopeStage {
    fn name(&self) -> &'static str {
        "SlopeStage"
    }

    fn initialize(&mut self, config: &PipelineConfig) -> StageResult<()> {
        self.config = Some(config.slope.clone());
        Ok(())
    }

    fn execute(&mut self, mut frame: PlotFrame) -> StageResult<PlotFrame> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let days = frame.series.day_offsets();
        let half_window = config.half_window();
        let mut scratch = self.pool.checkout(days.len())?;

        let logger = &self.logger;
        let [ndvi, savi, ndwi] = IndexColumn::ALL.map(|column| {
            let slopes = temporal_slopes(
                &days,
                &frame.series.column(column),
                half_window,
                &mut scratch,
            );
            let flat = slopes.iter().filter(|&&slope| slope == 0.0).count();
            logger.detail(&format!(
                "plot {} {}: {} of {} slopes are zero",
                frame.plot_id(),
                column.name(),
                flat,
                slopes.len()
            ));
            slopes
        });
        self.pool.release(scratch);

        let slopes = ndvi
            .into_iter()
            .zip(savi)
            .zip(ndwi)
            .map(|((ndvi, savi), ndwi)| SlopeAnnotation { ndvi, savi, ndwi })
            .collect::<Vec<_>>();

        self.logger.detail(&format!(
            "plot {} slopes over {} observations (+/-{} days)",
            frame.plot_id(),
            slopes.len(),
            half_window
        ));
        frame.slopes = Some(slopes);
        Ok(frame)
    }

    fn cleanup(&mut self) {
        self.pool.reset();
        self.config = None;
    }
}
