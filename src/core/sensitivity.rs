//! One-at-a-time sensitivity sweep ("tornado") over shortfall probability.
//!
//! Every reduced run, the base one included, starts a fresh generator from
//! the same sensitivity seed. Deltas therefore reflect the parameter change
//! rather than sampling noise between runs, and the main run's stream is
//! never touched.

use serde::Serialize;
use tracing::debug;

use super::error::SimError;
use super::params::{SimulationParameters, clamp_dso_days, clamp_fraction};
use super::path::PathSimulator;
use super::rng::Rng;
use super::types::{TornadoItem, TornadoResult};

pub const DEFAULT_SENSITIVITY_PATHS: usize = 3_000;
pub const DEFAULT_SENSITIVITY_STEP: f64 = 0.10;
pub const DEFAULT_SENSITIVITY_SEED: u32 = 1_234_567;
const STD_DEV_FLOOR: f64 = 1e-6;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SensitivityParameter {
    DemandMean,
    DemandStdDev,
    AvgOrderValue,
    CogsFraction,
    VariableCostFraction,
    FixedCost,
    DsoDays,
}

impl SensitivityParameter {
    pub const ALL: [SensitivityParameter; 7] = [
        SensitivityParameter::DemandMean,
        SensitivityParameter::DemandStdDev,
        SensitivityParameter::AvgOrderValue,
        SensitivityParameter::CogsFraction,
        SensitivityParameter::VariableCostFraction,
        SensitivityParameter::FixedCost,
        SensitivityParameter::DsoDays,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SensitivityParameter::DemandMean => "Demand mean",
            SensitivityParameter::DemandStdDev => "Demand std",
            SensitivityParameter::AvgOrderValue => "Average order value",
            SensitivityParameter::CogsFraction => "COGS %",
            SensitivityParameter::VariableCostFraction => "Var Opex %",
            SensitivityParameter::FixedCost => "Fixed cost",
            SensitivityParameter::DsoDays => "DSO days",
        }
    }

    pub fn get(self, params: &SimulationParameters) -> f64 {
        match self {
            SensitivityParameter::DemandMean => params.demand.mean,
            SensitivityParameter::DemandStdDev => params.demand.std_dev,
            SensitivityParameter::AvgOrderValue => params.avg_order_value,
            SensitivityParameter::CogsFraction => params.cogs_fraction,
            SensitivityParameter::VariableCostFraction => params.variable_cost_fraction,
            SensitivityParameter::FixedCost => params.fixed_cost_per_period,
            SensitivityParameter::DsoDays => params.days_sales_outstanding,
        }
    }

    /// Stores `value`, re-applying the bound that field carries.
    fn set(self, params: &mut SimulationParameters, value: f64) {
        match self {
            SensitivityParameter::DemandMean => params.demand.mean = value,
            SensitivityParameter::DemandStdDev => {
                params.demand.std_dev = if value > 0.0 { value } else { STD_DEV_FLOOR };
            }
            SensitivityParameter::AvgOrderValue => params.avg_order_value = value,
            SensitivityParameter::CogsFraction => params.cogs_fraction = clamp_fraction(value),
            SensitivityParameter::VariableCostFraction => {
                params.variable_cost_fraction = clamp_fraction(value);
            }
            SensitivityParameter::FixedCost => params.fixed_cost_per_period = value,
            SensitivityParameter::DsoDays => params.days_sales_outstanding = clamp_dso_days(value),
        }
    }

    /// Independent copy of `base` with this parameter scaled by `1 + relative_change`.
    pub fn perturbed(
        self,
        base: &SimulationParameters,
        relative_change: f64,
    ) -> SimulationParameters {
        let mut params = base.clone();
        self.set(&mut params, self.get(base) * (1.0 + relative_change));
        params
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SensitivityConfig {
    pub path_count: usize,
    pub step: f64,
    pub seed: u32,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            path_count: DEFAULT_SENSITIVITY_PATHS,
            step: DEFAULT_SENSITIVITY_STEP,
            seed: DEFAULT_SENSITIVITY_SEED,
        }
    }
}

/// Share of `path_count` fresh paths that ever fall below the threshold.
pub fn shortfall_probability(
    params: &SimulationParameters,
    path_count: usize,
    seed: u32,
) -> Result<f64, SimError> {
    if path_count == 0 {
        return Ok(0.0);
    }
    let mut rng = Rng::new(seed);
    let mut simulator = PathSimulator::new(params);
    let mut hits = 0_usize;
    for path in 0..path_count {
        if simulator.hits_shortfall(path, &mut rng)? {
            hits += 1;
        }
    }
    Ok(hits as f64 / path_count as f64)
}

/// Fails as a whole if any perturbed run produces a non-finite balance.
pub fn analyze(
    params: &SimulationParameters,
    config: &SensitivityConfig,
) -> Result<TornadoResult, SimError> {
    let risk = |p: &SimulationParameters| shortfall_probability(p, config.path_count, config.seed);
    let base = risk(params)?;

    let items = SensitivityParameter::ALL
        .iter()
        .map(|&parameter| -> Result<TornadoItem, SimError> {
            let low = risk(&parameter.perturbed(params, -config.step))?;
            let high = risk(&parameter.perturbed(params, config.step))?;
            debug!(parameter = parameter.label(), low, high, base, "sensitivity point");
            Ok(TornadoItem {
                name: parameter.label(),
                key: parameter,
                delta_low: low - base,
                delta_high: high - base,
            })
        })
        .collect::<Result<Vec<_>, SimError>>()?;

    Ok(TornadoResult { base, items })
}
