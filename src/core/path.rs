use super::demand::sample_demand;
use super::error::SimError;
use super::params::SimulationParameters;
use super::rng::Rng;
use super::types::PathResult;

/// Simulates cash paths for one parameter set, reusing its per-path buffers.
///
/// Each path is two passes: operating flows for every period first, then the
/// cash timing pass, because collections in period `t` read revenue booked
/// `dso_months` (and, for late payers, one more) periods earlier.
pub struct PathSimulator<'a> {
    params: &'a SimulationParameters,
    dso_months: usize,
    revenue: Vec<f64>,
    outflow: Vec<f64>,
}

impl<'a> PathSimulator<'a> {
    pub fn new(params: &'a SimulationParameters) -> Self {
        Self {
            params,
            dso_months: params.dso_months(),
            revenue: vec![0.0; params.periods],
            outflow: vec![0.0; params.periods],
        }
    }

    pub fn simulate(&mut self, rng: &mut Rng) -> PathResult {
        self.fill_operating_flows(rng);

        let threshold = self.params.shortfall_threshold;
        let mut balances = Vec::with_capacity(self.params.periods);
        let mut cash = self.params.starting_cash;
        let mut ever_below_threshold = false;
        for t in 0..self.params.periods {
            cash = cash + self.collected(t) - self.outflow[t];
            balances.push(cash);
            if cash < threshold {
                ever_below_threshold = true;
            }
        }

        PathResult {
            balances,
            ever_below_threshold,
            final_balance: cash,
        }
    }

    /// Same draws and recurrence as [`PathSimulator::simulate`] without
    /// keeping the balances. `path` only labels the error.
    ///
    /// Every period is still checked after a breach, so a path fails here
    /// exactly when the full simulation would reject it.
    pub fn hits_shortfall(&mut self, path: usize, rng: &mut Rng) -> Result<bool, SimError> {
        self.fill_operating_flows(rng);

        let threshold = self.params.shortfall_threshold;
        let mut cash = self.params.starting_cash;
        let mut breached = false;
        for period in 0..self.params.periods {
            cash = cash + self.collected(period) - self.outflow[period];
            if !cash.is_finite() {
                return Err(SimError::NonFiniteBalance { path, period });
            }
            breached |= cash < threshold;
        }
        Ok(breached)
    }

    fn fill_operating_flows(&mut self, rng: &mut Rng) {
        let p = self.params;
        for t in 0..p.periods {
            let demand = sample_demand(&p.demand, rng);
            let revenue = demand * p.avg_order_value;
            let cogs_cost = revenue * p.cogs_fraction;
            let variable_cost = revenue * p.variable_cost_fraction;
            let fixed = p.fixed_cost_per_period;
            let pretax_profit = revenue - (cogs_cost + variable_cost + fixed);
            let tax_paid = if pretax_profit > 0.0 {
                p.tax_rate_fraction * pretax_profit
            } else {
                0.0
            };

            self.revenue[t] = revenue;
            self.outflow[t] = cogs_cost + variable_cost + fixed - tax_paid;
        }
    }

    fn collected(&self, t: usize) -> f64 {
        let late_share = self.params.late_payment_fraction;
        let Some(on_time) = t.checked_sub(self.dso_months) else {
            return 0.0;
        };
        let mut collected = self.revenue[on_time] * (1.0 - late_share);
        if let Some(late) = on_time.checked_sub(1) {
            collected += self.revenue[late] * late_share;
        }
        collected
    }
}

pub fn simulate_one_path(params: &SimulationParameters, rng: &mut Rng) -> PathResult {
    PathSimulator::new(params).simulate(rng)
}
