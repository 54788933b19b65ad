use tracing::debug;

use super::error::SimError;
use super::params::SimulationParameters;
use super::path::PathSimulator;
use super::rng::Rng;
use super::types::{AggregateResult, Metrics, QuantileBands};

pub const BAND_QUANTILES: [f64; 5] = [0.05, 0.25, 0.50, 0.75, 0.95];
const VAR_QUANTILE: f64 = 0.05;
const MEDIAN_QUANTILE: f64 = 0.50;

/// Linear interpolation between order statistics at `(n - 1) * q`.
///
/// `sorted` must be ascending. An empty slice yields 0.0.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let Some(&last) = sorted.last() else {
        return 0.0;
    };
    if sorted.len() == 1 {
        return last;
    }

    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let (a, b) = (sorted[lower], sorted[upper]);
    let rest = position - lower as f64;
    (a + rest * (b - a)).max(a).min(b)
}

fn sort_ascending(values: &mut [f64]) {
    values.sort_unstable_by(|a, b| a.total_cmp(b));
}

/// Runs `path_count` paths off one shared generator and summarizes them.
pub fn aggregate(
    params: &SimulationParameters,
    rng: &mut Rng,
) -> Result<AggregateResult, SimError> {
    let periods = params.periods;
    let path_count = params.path_count;

    // Period-major so each period's column can be sorted and released in turn.
    let mut cash_by_period: Vec<Vec<f64>> = (0..periods)
        .map(|_| Vec::with_capacity(path_count))
        .collect();
    let mut ending_cash = Vec::with_capacity(path_count);
    let mut shortfall_paths = 0_usize;
    let mut negative_end_paths = 0_usize;

    let mut simulator = PathSimulator::new(params);
    for path_index in 0..path_count {
        let path = simulator.simulate(rng);
        if let Some(period) = path.balances.iter().position(|b| !b.is_finite()) {
            return Err(SimError::NonFiniteBalance {
                path: path_index,
                period,
            });
        }

        for (column, balance) in cash_by_period.iter_mut().zip(&path.balances) {
            column.push(*balance);
        }
        if path.ever_below_threshold {
            shortfall_paths += 1;
        }
        if path.final_balance < 0.0 {
            negative_end_paths += 1;
        }
        ending_cash.push(path.final_balance);
    }
    debug!(path_count, shortfall_paths, negative_end_paths, "paths simulated");

    let mut bands = QuantileBands::with_periods(periods);
    for mut column in cash_by_period {
        sort_ascending(&mut column);
        bands.push(BAND_QUANTILES.map(|q| quantile_sorted(&column, q)));
    }

    let mut sorted_end = ending_cash.clone();
    sort_ascending(&mut sorted_end);
    let n = path_count as f64;
    let metrics = Metrics {
        p_shortfall_any: shortfall_paths as f64 / n,
        p_end_cash_neg: negative_end_paths as f64 / n,
        var5: quantile_sorted(&sorted_end, VAR_QUANTILE),
        median_end: quantile_sorted(&sorted_end, MEDIAN_QUANTILE),
        mean_end: ending_cash.iter().sum::<f64>() / n,
    };

    Ok(AggregateResult {
        bands,
        ending_cash,
        metrics,
    })
}
