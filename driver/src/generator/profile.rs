use crate::generator::template::{double_logistic, logistic};
use anyhow::{bail, Context};
use chrono::{Duration, NaiveDate};
use phenocore::series::Observation;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for generating synthetic crop seasons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub plots: usize,
    pub season_days: u32,
    /// Inclusive bounds on the gap between consecutive acquisitions.
    pub revisit_min: u32,
    pub revisit_max: u32,
    pub noise: f64,
    pub seed: u64,
    pub start: NaiveDate,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            plots: 4,
            season_days: 150,
            revisit_min: 3,
            revisit_max: 7,
            noise: 0.01,
            seed: 0,
            start: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap_or_default(),
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if self.revisit_min == 0 || self.revisit_min > self.revisit_max {
            bail!(
                "revisit gap must satisfy 1 <= min <= max, got {}..={}",
                self.revisit_min,
                self.revisit_max
            );
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            bail!("noise must be a non-negative number, got {}", self.noise);
        }
        Ok(())
    }
}

fn jitter(rng: &mut StdRng, noise: f64) -> f64 {
    if noise > 0.0 {
        rng.gen_range(-noise..noise)
    } else {
        0.0
    }
}

fn build_plot(plot_id: i64, config: &GeneratorConfig, rng: &mut StdRng) -> anyhow::Result<Vec<Observation>> {
    let green_up = rng.gen_range(25.0..45.0);
    let senescence = green_up + rng.gen_range(60.0..80.0);
    let amplitude = rng.gen_range(0.50..0.65);
    let base = 0.12;

    let mut observations = Vec::new();
    let mut day = rng.gen_range(0..config.revisit_max);
    while day <= config.season_days {
        let t = f64::from(day);
        let canopy = double_logistic(t, green_up, senescence, 8.0);
        let ndvi = base + amplitude * canopy + jitter(rng, config.noise);
        let savi = 0.08 + 0.7 * amplitude * canopy + jitter(rng, config.noise);
        // flooded at transplanting, drying as the canopy closes
        let ndwi = 0.55 - 0.6 * logistic(t, green_up - 10.0, 5.0) + jitter(rng, config.noise);

        let date = config
            .start
            .checked_add_signed(Duration::days(i64::from(day)))
            .context("synthetic season runs past the supported date range")?;
        observations.push(Observation::new(plot_id, date, ndvi, savi, ndwi));

        day += rng.gen_range(config.revisit_min..=config.revisit_max);
    }
    Ok(observations)
}

/// Builds seeded synthetic seasons for plots `1..=plots`.
pub fn build_observations(config: &GeneratorConfig) -> anyhow::Result<Vec<Observation>> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut observations = Vec::new();
    for plot_id in 1..=config.plots {
        let plot_id = i64::try_from(plot_id).context("plot count overflows plot ids")?;
        observations.extend(build_plot(plot_id, config, &mut rng)?);
    }
    Ok(observations)
}

/// Synthetic seasons for `plots` plots with default settings.
pub fn build_seasons(plots: usize, seed: u64) -> anyhow::Result<Vec<Observation>> {
    let config = GeneratorConfig {
        plots,
        seed,
        ..Default::default()
    };
    build_observations(&config)
}
