use crate::prelude::{
    ClassificationParams, FeatureRow, PipelineConfig, PlotFrame, ProcessingStage, StageError,
    StageLabel, StageResult,
};
use crate::telemetry::log::LogManager;

/// Slope regime of a smoothed greenness velocity.
///
/// Rising bands exclude each other, falling bands exclude each other;
/// `flatish` may overlap the weak bands at their shared boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlopeBands {
    pub rising_strong: bool,
    pub rising_weak: bool,
    pub flatish: bool,
    pub falling_weak: bool,
    pub falling_strong: bool,
}

impl SlopeBands {
    pub fn of(sg: f64, params: &ClassificationParams) -> Self {
        let rising_strong = sg >= params.rise_strong;
        Self {
            rising_strong,
            rising_weak: sg >= params.rise_weak && !rising_strong,
            flatish: sg.abs() <= params.flat_abs,
            falling_weak: sg <= params.fall_weak && sg > params.fall_strong,
            falling_strong: sg <= params.fall_strong,
        }
    }

    pub fn rising(&self) -> bool {
        self.rising_strong || self.rising_weak
    }

    pub fn falling(&self) -> bool {
        self.falling_weak || self.falling_strong
    }
}

/// Everything a rule may look at for one observation.
pub struct RuleContext<'a> {
    pub features: &'a FeatureRow,
    pub bands: SlopeBands,
    /// Label assigned by the rules applied so far.
    pub current: StageLabel,
    pub params: &'a ClassificationParams,
}

/// One overwrite pass of the classifier.
pub struct StageRule {
    pub name: &'static str,
    pub stage: StageLabel,
    pub matches: fn(&RuleContext<'_>) -> bool,
}

/// Rules in application order. Each pass overwrites every row it matches,
/// so the last matching rule decides a row's label.
pub const STAGE_RULES: [StageRule; 7] = [
    StageRule {
        name: "ripening",
        stage: StageLabel::Ripening,
        matches: |ctx| ctx.bands.falling(),
    },
    StageRule {
        name: "growth",
        stage: StageLabel::Growth,
        matches: |ctx| {
            ctx.features.g >= ctx.params.g_high && (ctx.bands.rising() || ctx.bands.flatish)
        },
    },
    StageRule {
        name: "tillering",
        stage: StageLabel::Tillering,
        matches: |ctx| {
            ctx.features.g >= ctx.params.g_seed_max
                && ctx.features.g < ctx.params.g_high
                && ctx.bands.rising()
        },
    },
    StageRule {
        name: "tillering-plateau",
        stage: StageLabel::Tillering,
        matches: |ctx| {
            ctx.features.g >= ctx.params.g_plateau_min
                && ctx.features.g < ctx.params.g_high
                && ctx.bands.flatish
        },
    },
    StageRule {
        name: "seedling",
        stage: StageLabel::Seedling,
        matches: |ctx| ctx.features.g < ctx.params.g_seed_max && ctx.bands.rising(),
    },
    StageRule {
        name: "seedling-water-override",
        stage: StageLabel::Seedling,
        matches: |ctx| {
            ctx.features.w >= ctx.params.w_water && ctx.features.g < ctx.params.g_water_max
        },
    },
    StageRule {
        name: "low-greenness-flat-override",
        stage: StageLabel::Seedling,
        matches: |ctx| {
            ctx.features.g < ctx.params.g_seed_max
                && ctx.bands.flatish
                && ctx.current == StageLabel::Growth
        },
    },
];

/// Labels every row of smoothed features.
///
/// Rows start as `Bare`; each rule then computes its mask over all rows
/// against the current labels before overwriting the matched ones.
pub fn classify(smoothed: &[FeatureRow], params: &ClassificationParams) -> Vec<StageLabel> {
    let bands: Vec<SlopeBands> = smoothed
        .iter()
        .map(|row| SlopeBands::of(row.sg, params))
        .collect();
    let mut labels = vec![StageLabel::Bare; smoothed.len()];

    for rule in &STAGE_RULES {
        let mask: Vec<bool> = smoothed
            .iter()
            .zip(&bands)
            .zip(&labels)
            .map(|((features, &bands), &current)| {
                (rule.matches)(&RuleContext {
                    features,
                    bands,
                    current,
                    params,
                })
            })
            .collect();

        for (label, hit) in labels.iter_mut().zip(mask) {
            if hit {
                *label = rule.stage;
            }
        }
    }

    labels
}

/// Assigns `stage_4` / `stage4_code` from the smoothed features.
pub struct ClassifierStage {
    params: Option<ClassificationParams>,
    logger: LogManager,
}

impl ClassifierStage {
    pub fn new() -> Self {
        Self {
            params: None,
            logger: LogManager::new(),
        }
    }
}

impl Default for ClassifierStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for ClassifierStage {
    fn name(&self) -> &'static str {
        "ClassifierStage"
    }

    fn initialize(&mut self, config: &PipelineConfig) -> StageResult<()> {
        self.params = Some(config.classification.clone());
        Ok(())
    }

    fn execute(&mut self, mut frame: PlotFrame) -> StageResult<PlotFrame> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let stages = classify(frame.require_smoothed()?, params);
        let bare = stages.iter().filter(|&&s| s == StageLabel::Bare).count();
        self.logger.detail(&format!(
            "plot {} classified {} rows ({} bare)",
            frame.plot_id(),
            stages.len(),
            bare
        ));
        frame.stages = Some(stages);
        Ok(frame)
    }

    fn cleanup(&mut self) {
        self.params = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(g: f64, sg: f64, w: f64) -> StageLabel {
        label_with(g, sg, w, &ClassificationParams::default())
    }

    fn label_with(g: f64, sg: f64, w: f64, params: &ClassificationParams) -> StageLabel {
        classify(&[FeatureRow { g, w, sg }], params)[0]
    }

    #[test]
    fn band_boundaries_are_inclusive() {
        let params = ClassificationParams::default();

        let at_strong = SlopeBands::of(params.rise_strong, &params);
        assert!(at_strong.rising_strong);
        assert!(!at_strong.rising_weak);

        let at_flat = SlopeBands::of(params.flat_abs, &params);
        assert!(at_flat.flatish);
        assert!(at_flat.rising_weak);
        assert!(SlopeBands::of(-params.flat_abs, &params).flatish);

        let at_fall_strong = SlopeBands::of(params.fall_strong, &params);
        assert!(at_fall_strong.falling_strong);
        assert!(!at_fall_strong.falling_weak);
    }

    #[test]
    fn flat_high_greenness_is_growth() {
        assert_eq!(label(0.60, 0.0, 0.1), StageLabel::Growth);
    }

    #[test]
    fn steep_decline_is_ripening_when_nothing_later_matches() {
        let stage = label(0.80, -0.02, 0.1);
        assert_eq!(stage, StageLabel::Ripening);
        assert_eq!(stage.code(), 4);
    }

    #[test]
    fn later_rule_overwrites_ripening() {
        // -0.001 is both falling_weak and flatish; high greenness then makes
        // the growth rule match as well.
        let params = ClassificationParams::default();
        let bands = SlopeBands::of(-0.001, &params);
        assert!(bands.falling() && bands.flatish);
        assert_eq!(label(0.60, -0.001, 0.1), StageLabel::Growth);
    }

    #[test]
    fn rising_rows_follow_greenness_bands() {
        assert_eq!(label(0.20, 0.02, 0.1), StageLabel::Seedling);
        assert_eq!(label(0.20, 0.002, 0.1), StageLabel::Seedling);
        assert_eq!(label(0.40, 0.01, 0.1), StageLabel::Tillering);
        assert_eq!(label(0.55, 0.002, 0.1), StageLabel::Growth);
    }

    #[test]
    fn flat_mid_greenness_needs_plateau_floor() {
        assert_eq!(label(0.40, 0.0, 0.1), StageLabel::Tillering);
        assert_eq!(label(0.32, 0.0, 0.1), StageLabel::Bare);
        assert_eq!(label(0.10, 0.0, 0.1), StageLabel::Bare);
    }

    #[test]
    fn wet_low_greenness_becomes_seedling_even_when_falling() {
        assert_eq!(label(0.32, -0.02, 0.50), StageLabel::Seedling);
        assert_eq!(label(0.36, -0.02, 0.50), StageLabel::Ripening);
    }

    #[test]
    fn low_greenness_growth_is_demoted_to_seedling() {
        let params = ClassificationParams {
            g_high: 0.20,
            ..ClassificationParams::default()
        };
        assert_eq!(label_with(0.25, 0.0, 0.0, &params), StageLabel::Seedling);
        assert_eq!(label_with(0.25, 0.02, 0.0, &params), StageLabel::Seedling);
        assert_eq!(label_with(0.32, 0.0, 0.0, &params), StageLabel::Growth);
    }

    #[test]
    fn rule_order_is_fixed() {
        let names: Vec<&str> = STAGE_RULES.iter().map(|rule| rule.name).collect();
        assert_eq!(
            names,
            vec![
                "ripening",
                "growth",
                "tillering",
                "tillering-plateau",
                "seedling",
                "seedling-water-override",
                "low-greenness-flat-override",
            ]
        );
    }

    #[test]
    fn nan_features_stay_bare() {
        assert_eq!(label(f64::NAN, f64::NAN, f64::NAN), StageLabel::Bare);
    }
}
