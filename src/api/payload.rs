use clap::{Args, ValueEnum};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::{
    DEFAULT_SENSITIVITY_PATHS, DEFAULT_SENSITIVITY_SEED, DemandDistribution, Inputs, MAX_PATHS,
    RunConfig, SensitivityConfig,
};

const SEED_MODULUS: f64 = 4_294_967_296.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliDemandDistribution {
    Normal,
    Poisson,
    Lognormal,
}

impl From<CliDemandDistribution> for DemandDistribution {
    fn from(value: CliDemandDistribution) -> Self {
        match value {
            CliDemandDistribution::Normal => DemandDistribution::Normal,
            CliDemandDistribution::Poisson => DemandDistribution::Poisson,
            CliDemandDistribution::Lognormal => DemandDistribution::Lognormal,
        }
    }
}

impl From<DemandDistribution> for CliDemandDistribution {
    fn from(value: DemandDistribution) -> Self {
        match value {
            DemandDistribution::Normal => CliDemandDistribution::Normal,
            DemandDistribution::Poisson => CliDemandDistribution::Poisson,
            DemandDistribution::Lognormal => CliDemandDistribution::Lognormal,
        }
    }
}

/// Every run parameter with its default. Shared by the CLI and the HTTP API.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value_t = 12.0, help = "Monthly periods (3-60)")]
    pub periods: f64,
    #[arg(long, default_value_t = 10_000.0, help = "Monte Carlo paths (1000-100000)")]
    pub sims: f64,
    #[arg(long, allow_negative_numbers = true, help = "Random seed; omitted draws a fresh one")]
    pub seed: Option<i64>,
    #[arg(long, value_enum, default_value_t = CliDemandDistribution::Normal)]
    pub dist: CliDemandDistribution,
    #[arg(long, default_value_t = 100.0, help = "Mean units demanded per period")]
    pub demand_mean: f64,
    #[arg(long, default_value_t = 20.0, help = "Std-dev of units demanded per period")]
    pub demand_std: f64,
    #[arg(long, default_value_t = 50.0, help = "Average order value")]
    pub aov: f64,
    #[arg(long, default_value_t = 40.0, help = "COGS in percent of revenue")]
    pub cogs_pct: f64,
    #[arg(long, default_value_t = 10.0, help = "Variable opex in percent of revenue")]
    pub var_cost_pct: f64,
    #[arg(long, default_value_t = 5_000.0, allow_negative_numbers = true)]
    pub starting_cash: f64,
    #[arg(long, default_value_t = 2_000.0, help = "Fixed cost per period")]
    pub fixed_cost: f64,
    #[arg(long, default_value_t = 30.0, help = "Days sales outstanding (0-120)")]
    pub dso_days: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Share of receivables paid one month late, in percent"
    )]
    pub late_pay_pct: f64,
    #[arg(long, default_value_t = 25.0, help = "Tax rate on positive pretax profit, in percent")]
    pub tax_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Cash below this in any period counts as a shortfall"
    )]
    pub shortfall_thresh: f64,
    #[arg(long, default_value_t = DEFAULT_SENSITIVITY_PATHS, help = "Paths per sensitivity run")]
    pub sensitivity_sims: usize,
    #[arg(
        long,
        default_value_t = DEFAULT_SENSITIVITY_SEED,
        help = "Seed shared by every sensitivity run"
    )]
    pub sensitivity_seed: u32,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            periods: 12.0,
            sims: 10_000.0,
            seed: None,
            dist: CliDemandDistribution::Normal,
            demand_mean: 100.0,
            demand_std: 20.0,
            aov: 50.0,
            cogs_pct: 40.0,
            var_cost_pct: 10.0,
            starting_cash: 5_000.0,
            fixed_cost: 2_000.0,
            dso_days: 30.0,
            late_pay_pct: 10.0,
            tax_rate: 25.0,
            shortfall_thresh: 0.0,
            sensitivity_sims: DEFAULT_SENSITIVITY_PATHS,
            sensitivity_seed: DEFAULT_SENSITIVITY_SEED,
        }
    }
}

impl RunArgs {
    pub fn inputs(&self) -> Inputs {
        Inputs {
            periods: self.periods,
            simulations: self.sims,
            seed: self.seed,
            demand_distribution: self.dist.into(),
            demand_mean: self.demand_mean,
            demand_std_dev: self.demand_std,
            avg_order_value: self.aov,
            cogs_pct: self.cogs_pct,
            variable_cost_pct: self.var_cost_pct,
            starting_cash: self.starting_cash,
            fixed_cost: self.fixed_cost,
            dso_days: self.dso_days,
            late_payment_pct: self.late_pay_pct,
            tax_rate_pct: self.tax_rate,
            shortfall_threshold: self.shortfall_thresh,
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            sensitivity: SensitivityConfig {
                path_count: self.sensitivity_sims.clamp(1, MAX_PATHS),
                seed: self.sensitivity_seed,
                ..SensitivityConfig::default()
            },
        }
    }
}

/// Flat request body for `/api/simulate`, keyed like the browser input form.
///
/// Every field is optional. Numbers are coerced leniently: numeric strings
/// parse, blanks count as absent, and anything else becomes NaN so that
/// clamping decides the value instead of the request failing.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatePayload {
    #[serde(deserialize_with = "lenient_number")]
    pub periods: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub sims: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub seed: Option<f64>,
    #[serde(deserialize_with = "lenient_label")]
    pub demand_dist: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub demand_mu: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub demand_sigma: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub aov: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub cogs_pct: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub var_cost_pct: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub starting_cash: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub fixed_cost: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub dso_days: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub late_pay_pct: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub tax_rate: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub shortfall_thresh: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub sensitivity_sims: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub sensitivity_seed: Option<f64>,
}

/// Parameters as carried by a `run` message; demand is grouped the way the
/// worker protocol sends it.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunParams {
    #[serde(deserialize_with = "lenient_number")]
    pub periods: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub sims: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub seed: Option<f64>,
    pub demand: DemandPayload,
    #[serde(deserialize_with = "lenient_number")]
    pub aov: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub cogs_pct: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub var_cost_pct: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub starting_cash: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub fixed_cost: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub dso_days: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub late_pay_pct: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub tax_rate: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub shortfall_thresh: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DemandPayload {
    #[serde(deserialize_with = "lenient_label")]
    pub dist: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub mu: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub sigma: Option<f64>,
}

impl From<RunParams> for SimulatePayload {
    fn from(params: RunParams) -> Self {
        Self {
            periods: params.periods,
            sims: params.sims,
            seed: params.seed,
            demand_dist: params.demand.dist,
            demand_mu: params.demand.mu,
            demand_sigma: params.demand.sigma,
            aov: params.aov,
            cogs_pct: params.cogs_pct,
            var_cost_pct: params.var_cost_pct,
            starting_cash: params.starting_cash,
            fixed_cost: params.fixed_cost,
            dso_days: params.dso_days,
            late_pay_pct: params.late_pay_pct,
            tax_rate: params.tax_rate,
            shortfall_thresh: params.shortfall_thresh,
            sensitivity_sims: None,
            sensitivity_seed: None,
        }
    }
}

/// Overlays the provided payload fields onto the defaults.
pub fn run_args_from_payload(payload: SimulatePayload) -> RunArgs {
    let mut args = RunArgs::default();

    if let Some(v) = payload.periods {
        args.periods = v;
    }
    if let Some(v) = payload.sims {
        args.sims = v;
    }
    // A seed that is not a finite number is treated as absent.
    args.seed = payload.seed.filter(|v| v.is_finite()).map(|v| i64::from(wrap_seed(v)));
    if let Some(v) = payload.demand_dist {
        args.dist = DemandDistribution::from_label(&v).into();
    }
    if let Some(v) = payload.demand_mu {
        args.demand_mean = v;
    }
    if let Some(v) = payload.demand_sigma {
        args.demand_std = v;
    }
    if let Some(v) = payload.aov {
        args.aov = v;
    }
    if let Some(v) = payload.cogs_pct {
        args.cogs_pct = v;
    }
    if let Some(v) = payload.var_cost_pct {
        args.var_cost_pct = v;
    }
    if let Some(v) = payload.starting_cash {
        args.starting_cash = v;
    }
    if let Some(v) = payload.fixed_cost {
        args.fixed_cost = v;
    }
    if let Some(v) = payload.dso_days {
        args.dso_days = v;
    }
    if let Some(v) = payload.late_pay_pct {
        args.late_pay_pct = v;
    }
    if let Some(v) = payload.tax_rate {
        args.tax_rate = v;
    }
    if let Some(v) = payload.shortfall_thresh {
        args.shortfall_thresh = v;
    }
    if let Some(v) = payload.sensitivity_sims.filter(|v| v.is_finite()) {
        args.sensitivity_sims = v.max(0.0) as usize;
    }
    if let Some(v) = payload.sensitivity_seed.filter(|v| v.is_finite()) {
        args.sensitivity_seed = wrap_seed(v);
    }

    args
}

/// Truncates toward zero and wraps modulo 2^32, so magnitudes beyond the
/// integer range still map to a distinct seed.
fn wrap_seed(value: f64) -> u32 {
    value.trunc().rem_euclid(SEED_MODULUS) as u32
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().parse::<f64>().unwrap_or(f64::NAN)),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Array(_) | Value::Object(_) => Some(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimulationParameters;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: RunArgs,
    }

    fn payload_from_json(json: &str) -> SimulatePayload {
        serde_json::from_str(json).expect("payload parses")
    }

    #[test]
    fn clap_defaults_match_api_defaults() {
        let parsed = TestCli::parse_from(["cashrisk"]).args;
        let defaults = RunArgs::default();
        assert_eq!(format!("{parsed:?}"), format!("{defaults:?}"));
    }

    #[test]
    fn clap_accepts_negative_money_and_seed() {
        let parsed = TestCli::parse_from([
            "cashrisk",
            "--starting-cash",
            "-2500",
            "--shortfall-thresh",
            "-100",
            "--seed",
            "-7",
            "--dist",
            "lognormal",
        ])
        .args;
        assert_eq!(parsed.starting_cash, -2_500.0);
        assert_eq!(parsed.shortfall_thresh, -100.0);
        assert_eq!(parsed.seed, Some(-7));
        assert_eq!(parsed.dist, CliDemandDistribution::Lognormal);
    }

    #[test]
    fn payload_parses_form_keys() {
        let payload = payload_from_json(
            r#"{
                "periods": 24, "sims": 2000, "seed": 42,
                "demandDist": "poisson", "demandMu": 30, "demandSigma": 4,
                "aov": 75, "cogsPct": 35, "varCostPct": 5,
                "startingCash": -1000, "fixedCost": 900, "dsoDays": 45,
                "latePayPct": 20, "taxRate": 30, "shortfallThresh": 250
            }"#,
        );
        let args = run_args_from_payload(payload);
        let params = SimulationParameters::from_inputs(&args.inputs());
        assert_eq!(params.periods, 24);
        assert_eq!(params.path_count, 2_000);
        assert_eq!(params.seed, Some(42));
        assert_eq!(params.demand.distribution, DemandDistribution::Poisson);
        assert_eq!(params.demand.mean, 30.0);
        assert_eq!(params.avg_order_value, 75.0);
        assert_eq!(params.starting_cash, -1_000.0);
        assert_eq!(params.dso_months(), 2);
        assert_eq!(params.shortfall_threshold, 250.0);
    }

    #[test]
    fn numeric_strings_and_garbage_are_coerced() {
        let payload = payload_from_json(
            r#"{"periods": " 18 ", "sims": "lots", "cogsPct": "150",
                "aov": "", "seed": "abc", "fixedCost": [1]}"#,
        );
        let args = run_args_from_payload(payload);
        assert_eq!(args.periods, 18.0);
        assert!(args.sims.is_nan());
        assert_eq!(args.aov, 50.0);
        assert_eq!(args.seed, None);

        let params = SimulationParameters::from_inputs(&args.inputs());
        assert_eq!(params.path_count, 1_000);
        assert_eq!(params.cogs_fraction, 1.0);
        assert_eq!(params.fixed_cost_per_period, 0.0);
    }

    #[test]
    fn unknown_distribution_falls_back_to_normal() {
        let args = run_args_from_payload(payload_from_json(r#"{"demandDist": "pareto"}"#));
        assert_eq!(args.dist, CliDemandDistribution::Normal);
    }

    #[test]
    fn empty_payload_uses_defaults() {
        let args = run_args_from_payload(payload_from_json("{}"));
        let defaults = RunArgs::default();
        assert_eq!(format!("{args:?}"), format!("{defaults:?}"));
    }

    #[test]
    fn run_params_flatten_nested_demand() {
        let params: RunParams = serde_json::from_str(
            r#"{"sims": 1500, "demand": {"dist": "lognormal", "mu": 80, "sigma": "12"}}"#,
        )
        .expect("run params parse");
        let args = run_args_from_payload(params.into());
        assert_eq!(args.sims, 1_500.0);
        assert_eq!(args.dist, CliDemandDistribution::Lognormal);
        assert_eq!(args.demand_mean, 80.0);
        assert_eq!(args.demand_std, 12.0);
    }

    #[test]
    fn large_and_negative_seeds_wrap_to_u32() {
        let args = run_args_from_payload(payload_from_json(r#"{"seed": 1e20}"#));
        assert_eq!(args.seed, Some(1_661_992_960));

        let args = run_args_from_payload(payload_from_json(r#"{"seed": -1}"#));
        assert_eq!(args.seed, Some(i64::from(u32::MAX)));

        let args = run_args_from_payload(payload_from_json(r#"{"seed": 4294967338.9}"#));
        assert_eq!(args.seed, Some(42));

        let args = run_args_from_payload(payload_from_json(r#"{"sensitivitySeed": -2.5}"#));
        assert_eq!(args.run_config().sensitivity.seed, u32::MAX - 1);
    }

    #[test]
    fn sensitivity_overrides_are_bounded() {
        let args = run_args_from_payload(payload_from_json(
            r#"{"sensitivitySims": 0, "sensitivitySeed": 99}"#,
        ));
        let config = args.run_config();
        assert_eq!(config.sensitivity.path_count, 1);
        assert_eq!(config.sensitivity.seed, 99);
    }
}
