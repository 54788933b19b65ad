use tracing::{debug, info, info_span};

use super::aggregate::aggregate;
use super::error::SimError;
use super::params::{
    Inputs, MAX_PATHS, MAX_PERIODS, MIN_PATHS, MIN_PERIODS, SimulationParameters,
};
use super::rng::{Rng, entropy_seed};
use super::sensitivity::{SensitivityConfig, analyze};
use super::types::SimulationResult;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RunConfig {
    pub sensitivity: SensitivityConfig,
}

/// Clamps `inputs` and runs the full simulation with default settings.
pub fn run(inputs: &Inputs) -> Result<SimulationResult, SimError> {
    run_with(&SimulationParameters::from_inputs(inputs), &RunConfig::default())
}

/// Runs the main pass and the sensitivity sweep over already-clamped parameters.
///
/// Either every part of the result is produced or the run fails as a whole.
///
/// `params` must satisfy the bounds [`SimulationParameters::from_inputs`]
/// establishes.
pub fn run_with(
    params: &SimulationParameters,
    config: &RunConfig,
) -> Result<SimulationResult, SimError> {
    debug_assert!(
        (MIN_PERIODS..=MAX_PERIODS).contains(&params.periods),
        "period count {} out of range",
        params.periods
    );
    debug_assert!(
        (MIN_PATHS..=MAX_PATHS).contains(&params.path_count),
        "path count {} out of range",
        params.path_count
    );
    let seed = params.seed.unwrap_or_else(entropy_seed);
    let _span = info_span!(
        "simulation",
        seed,
        periods = params.periods,
        paths = params.path_count,
        distribution = params.demand.distribution.label(),
    )
    .entered();

    let mut rng = Rng::new(seed);
    let aggregate = aggregate(params, &mut rng)?;

    debug!(
        sensitivity_paths = config.sensitivity.path_count,
        sensitivity_seed = config.sensitivity.seed,
        "running sensitivity sweep"
    );
    let tornado = analyze(params, &config.sensitivity)?;

    info!(
        p_shortfall_any = aggregate.metrics.p_shortfall_any,
        p_end_cash_neg = aggregate.metrics.p_end_cash_neg,
        var5 = aggregate.metrics.var5,
        "simulation finished"
    );

    Ok(SimulationResult {
        timeline: (1..=params.periods as u32).collect(),
        bands: aggregate.bands,
        ending_cash: aggregate.ending_cash,
        metrics: aggregate.metrics,
        tornado,
        seed,
    })
}
