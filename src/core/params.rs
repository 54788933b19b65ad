pub const MIN_PERIODS: usize = 3;
pub const MAX_PERIODS: usize = 60;
pub const MIN_PATHS: usize = 1_000;
pub const MAX_PATHS: usize = 100_000;
pub const MAX_DSO_DAYS: f64 = 120.0;
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DemandDistribution {
    #[default]
    Normal,
    Poisson,
    Lognormal,
}

impl DemandDistribution {
    /// Unrecognised labels fall back to the normal sampler.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "poisson" => DemandDistribution::Poisson,
            "lognormal" => DemandDistribution::Lognormal,
            _ => DemandDistribution::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DemandDistribution::Normal => "normal",
            DemandDistribution::Poisson => "poisson",
            DemandDistribution::Lognormal => "lognormal",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DemandModel {
    pub distribution: DemandDistribution,
    pub mean: f64,
    pub std_dev: f64,
}

/// Run request as received from a caller, before any clamping.
///
/// Percentages are on the 0-100 scale and DSO is in days. Numbers may be
/// non-finite when the caller's text could not be coerced.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub periods: f64,
    pub simulations: f64,
    pub seed: Option<i64>,
    pub demand_distribution: DemandDistribution,
    pub demand_mean: f64,
    pub demand_std_dev: f64,
    pub avg_order_value: f64,
    pub cogs_pct: f64,
    pub variable_cost_pct: f64,
    pub starting_cash: f64,
    pub fixed_cost: f64,
    pub dso_days: f64,
    pub late_payment_pct: f64,
    pub tax_rate_pct: f64,
    pub shortfall_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    pub periods: usize,
    pub path_count: usize,
    pub seed: Option<u32>,
    pub demand: DemandModel,
    pub avg_order_value: f64,
    pub fixed_cost_per_period: f64,
    pub cogs_fraction: f64,
    pub variable_cost_fraction: f64,
    pub tax_rate_fraction: f64,
    pub late_payment_fraction: f64,
    pub starting_cash: f64,
    pub days_sales_outstanding: f64,
    pub shortfall_threshold: f64,
}

impl SimulationParameters {
    pub fn from_inputs(inputs: &Inputs) -> Self {
        Self {
            periods: clamp_count(inputs.periods, MIN_PERIODS, MAX_PERIODS),
            path_count: clamp_count(inputs.simulations, MIN_PATHS, MAX_PATHS),
            // Two's-complement truncation keeps any integer seed usable.
            seed: inputs.seed.map(|seed| seed as u32),
            demand: DemandModel {
                distribution: inputs.demand_distribution,
                mean: finite_or_zero(inputs.demand_mean),
                std_dev: finite_or_zero(inputs.demand_std_dev),
            },
            avg_order_value: clamp_non_negative(inputs.avg_order_value),
            fixed_cost_per_period: clamp_non_negative(inputs.fixed_cost),
            cogs_fraction: pct_to_fraction(inputs.cogs_pct),
            variable_cost_fraction: pct_to_fraction(inputs.variable_cost_pct),
            tax_rate_fraction: pct_to_fraction(inputs.tax_rate_pct),
            late_payment_fraction: pct_to_fraction(inputs.late_payment_pct),
            starting_cash: finite_or_zero(inputs.starting_cash),
            days_sales_outstanding: clamp_dso_days(inputs.dso_days),
            shortfall_threshold: finite_or_zero(inputs.shortfall_threshold),
        }
    }

    /// Collection lag in whole months.
    pub fn dso_months(&self) -> usize {
        (self.days_sales_outstanding / DAYS_PER_MONTH).round() as usize
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn clamp_count(value: f64, min: usize, max: usize) -> usize {
    if value.is_nan() {
        return min;
    }
    // Fractional counts truncate toward zero before clamping.
    let truncated = value.trunc();
    if truncated <= min as f64 {
        min
    } else if truncated >= max as f64 {
        max
    } else {
        truncated as usize
    }
}

fn clamp_non_negative(value: f64) -> f64 {
    finite_or_zero(value).max(0.0)
}

pub(crate) fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

fn pct_to_fraction(pct: f64) -> f64 {
    clamp_fraction(pct / 100.0)
}

pub(crate) fn clamp_dso_days(days: f64) -> f64 {
    if days.is_nan() {
        return 0.0;
    }
    days.clamp(0.0, MAX_DSO_DAYS)
}
