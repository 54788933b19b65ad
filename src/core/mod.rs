mod aggregate;
mod demand;
mod engine;
mod error;
mod params;
mod path;
mod rng;
mod sensitivity;
mod types;

pub use aggregate::{BAND_QUANTILES, aggregate, quantile_sorted};
pub use demand::sample_demand;
pub use engine::{RunConfig, run, run_with};
pub use error::SimError;
pub use params::{
    DemandDistribution, DemandModel, Inputs, MAX_DSO_DAYS, MAX_PATHS, MAX_PERIODS, MIN_PATHS,
    MIN_PERIODS, SimulationParameters,
};
pub use path::{PathSimulator, simulate_one_path};
pub use rng::{Rng, entropy_seed};
pub use sensitivity::{
    DEFAULT_SENSITIVITY_PATHS, DEFAULT_SENSITIVITY_SEED, DEFAULT_SENSITIVITY_STEP,
    SensitivityConfig, SensitivityParameter, analyze, shortfall_probability,
};
pub use types::{
    AggregateResult, Metrics, PathResult, QuantileBands, SimulationResult, TornadoItem,
    TornadoResult,
};
