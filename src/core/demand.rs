use super::params::{DemandDistribution, DemandModel};
use super::rng::Rng;

const LOGNORMAL_FLOOR: f64 = 1e-9;

/// Draws one period's demand. Always finite-or-zero and never negative.
pub fn sample_demand(model: &DemandModel, rng: &mut Rng) -> f64 {
    let draw = match model.distribution {
        DemandDistribution::Normal => model.mean + model.std_dev * rng.standard_normal(),
        DemandDistribution::Poisson => sample_poisson(model.mean, rng),
        DemandDistribution::Lognormal => sample_lognormal(model.mean, model.std_dev, rng),
    };
    // `f64::max` discards NaN, so degenerate draws land on zero as well.
    draw.max(0.0)
}

fn sample_poisson(mean: f64, rng: &mut Rng) -> f64 {
    let limit = (-mean.max(0.0)).exp();
    let mut draws = 0_u64;
    let mut product = 1.0;
    loop {
        draws += 1;
        product *= rng.next_f64();
        if product <= limit {
            break;
        }
    }
    (draws - 1) as f64
}

/// `mean` and `std_dev` are moments of the observed value, not of its log.
fn sample_lognormal(mean: f64, std_dev: f64, rng: &mut Rng) -> f64 {
    let m = mean.max(LOGNORMAL_FLOOR);
    let s = std_dev.max(LOGNORMAL_FLOOR);
    let phi = (1.0 + (s * s) / (m * m)).sqrt();
    let mu_log = (m / phi).ln();
    let sigma_log = (phi * phi).ln().sqrt();
    (mu_log + sigma_log * rng.standard_normal()).exp()
}
