use serde::Serialize;

use super::sensitivity::SensitivityParameter;

#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub balances: Vec<f64>,
    pub ever_below_threshold: bool,
    pub final_balance: f64,
}

/// Per-period cash quantiles; every vector has one entry per period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuantileBands {
    pub p5: Vec<f64>,
    pub p25: Vec<f64>,
    pub p50: Vec<f64>,
    pub p75: Vec<f64>,
    pub p95: Vec<f64>,
}

impl QuantileBands {
    pub fn with_periods(periods: usize) -> Self {
        let make = || Vec::with_capacity(periods);
        Self {
            p5: make(),
            p25: make(),
            p50: make(),
            p75: make(),
            p95: make(),
        }
    }

    pub fn push(&mut self, [p5, p25, p50, p75, p95]: [f64; 5]) {
        self.p5.push(p5);
        self.p25.push(p25);
        self.p50.push(p50);
        self.p75.push(p75);
        self.p95.push(p95);
    }

    pub fn len(&self) -> usize {
        self.p50.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p50.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub p_shortfall_any: f64,
    pub p_end_cash_neg: f64,
    pub var5: f64,
    pub median_end: f64,
    pub mean_end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub bands: QuantileBands,
    pub ending_cash: Vec<f64>,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TornadoItem {
    pub name: &'static str,
    pub key: SensitivityParameter,
    pub delta_low: f64,
    pub delta_high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TornadoResult {
    pub base: f64,
    pub items: Vec<TornadoItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub timeline: Vec<u32>,
    pub bands: QuantileBands,
    pub ending_cash: Vec<f64>,
    pub metrics: Metrics,
    pub tornado: TornadoResult,
    pub seed: u32,
}
